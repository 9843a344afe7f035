use ratatui::layout::Rect;
use std::cmp;
use std::fmt;

/// Text buffer behind the form fields and the grid's inline cell editor.
///
/// A single-line editor never holds more than one line; `insert_newline`
/// is a no-op there and pasted newlines become spaces.
#[derive(Debug, Clone)]
pub struct Editor {
    pub lines: Vec<String>,
    pub cursor_line: usize,
    pub cursor_col: usize,
    pub scroll_offset: usize,
    pub scroll_col: usize,
    single_line: bool,
    history: Vec<(Vec<String>, usize, usize)>,
}

const MAX_HISTORY: usize = 100;

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}

impl Editor {
    pub fn new() -> Self {
        Self {
            lines: vec![String::new()],
            cursor_line: 0,
            cursor_col: 0,
            scroll_offset: 0,
            scroll_col: 0,
            single_line: false,
            history: Vec::new(),
        }
    }

    pub fn single_line(content: &str) -> Self {
        let mut editor = Self::from_string(content.replace('\n', " "));
        editor.single_line = true;
        editor
    }

    /// Cursor starts at the end of the content
    pub fn from_string(content: String) -> Self {
        let mut lines: Vec<String> = content.lines().map(|s| s.to_string()).collect();
        if lines.is_empty() {
            lines.push(String::new());
        }
        let cursor_line = lines.len() - 1;
        let cursor_col = lines[cursor_line].chars().count();
        Self {
            lines,
            cursor_line,
            cursor_col,
            ..Self::new()
        }
    }

    fn line_len(&self, line: usize) -> usize {
        self.lines.get(line).map(|l| l.chars().count()).unwrap_or(0)
    }

    fn clamp_cursor(&mut self) {
        if self.lines.is_empty() {
            self.lines.push(String::new());
        }
        self.cursor_line = cmp::min(self.cursor_line, self.lines.len() - 1);
        self.cursor_col = cmp::min(self.cursor_col, self.line_len(self.cursor_line));
    }

    fn record(&mut self) {
        self.history.push((self.lines.clone(), self.cursor_line, self.cursor_col));
        if self.history.len() > MAX_HISTORY {
            self.history.remove(0);
        }
    }

    pub fn insert_char(&mut self, ch: char) {
        if ch == '\n' {
            if self.single_line {
                return self.insert_char(' ');
            }
            return self.insert_newline();
        }
        self.record();
        self.clamp_cursor();
        let line = &mut self.lines[self.cursor_line];
        let mut chars: Vec<char> = line.chars().collect();
        chars.insert(self.cursor_col, ch);
        *line = chars.into_iter().collect();
        self.cursor_col += 1;
    }

    pub fn insert_str(&mut self, text: &str) {
        for ch in text.chars().filter(|c| *c != '\r') {
            self.insert_char(ch);
        }
    }

    /// Backspace: delete before the cursor, joining lines at column 0
    pub fn delete_char(&mut self) {
        self.clamp_cursor();
        if self.cursor_col > 0 {
            self.record();
            let line = &mut self.lines[self.cursor_line];
            let mut chars: Vec<char> = line.chars().collect();
            chars.remove(self.cursor_col - 1);
            *line = chars.into_iter().collect();
            self.cursor_col -= 1;
        } else if self.cursor_line > 0 {
            self.record();
            let current = self.lines.remove(self.cursor_line);
            self.cursor_line -= 1;
            self.cursor_col = self.line_len(self.cursor_line);
            self.lines[self.cursor_line].push_str(&current);
        }
    }

    /// Delete key: remove the character under the cursor
    pub fn delete_forward(&mut self) {
        self.clamp_cursor();
        let len = self.line_len(self.cursor_line);
        if self.cursor_col < len {
            self.record();
            let line = &mut self.lines[self.cursor_line];
            let mut chars: Vec<char> = line.chars().collect();
            chars.remove(self.cursor_col);
            *line = chars.into_iter().collect();
        } else if self.cursor_line + 1 < self.lines.len() {
            self.record();
            let next = self.lines.remove(self.cursor_line + 1);
            self.lines[self.cursor_line].push_str(&next);
        }
    }

    pub fn insert_newline(&mut self) {
        if self.single_line {
            return;
        }
        self.record();
        self.clamp_cursor();
        let line = &mut self.lines[self.cursor_line];
        let mut chars: Vec<char> = line.chars().collect();
        let rest: String = chars.split_off(self.cursor_col).into_iter().collect();
        *line = chars.into_iter().collect();
        self.lines.insert(self.cursor_line + 1, rest);
        self.cursor_line += 1;
        self.cursor_col = 0;
    }

    pub fn move_cursor_up(&mut self) {
        if self.cursor_line > 0 {
            self.cursor_line -= 1;
            self.cursor_col = cmp::min(self.cursor_col, self.line_len(self.cursor_line));
        }
    }

    pub fn move_cursor_down(&mut self) {
        if self.cursor_line + 1 < self.lines.len() {
            self.cursor_line += 1;
            self.cursor_col = cmp::min(self.cursor_col, self.line_len(self.cursor_line));
        }
    }

    pub fn move_cursor_left(&mut self) {
        if self.cursor_col > 0 {
            self.cursor_col -= 1;
        } else if self.cursor_line > 0 {
            self.cursor_line -= 1;
            self.cursor_col = self.line_len(self.cursor_line);
        }
    }

    pub fn move_cursor_right(&mut self) {
        if self.cursor_col < self.line_len(self.cursor_line) {
            self.cursor_col += 1;
        } else if self.cursor_line + 1 < self.lines.len() {
            self.cursor_line += 1;
            self.cursor_col = 0;
        }
    }

    pub fn move_cursor_home(&mut self) {
        self.cursor_col = 0;
    }

    pub fn move_cursor_end(&mut self) {
        self.cursor_col = self.line_len(self.cursor_line);
    }

    pub fn move_cursor_word_left(&mut self) {
        if self.cursor_col == 0 {
            return self.move_cursor_left();
        }
        let chars: Vec<char> = self.lines[self.cursor_line].chars().collect();
        let mut pos = cmp::min(self.cursor_col, chars.len());
        while pos > 0 && chars[pos - 1].is_whitespace() {
            pos -= 1;
        }
        while pos > 0 && is_word_char(chars[pos - 1]) {
            pos -= 1;
        }
        self.cursor_col = pos;
    }

    pub fn move_cursor_word_right(&mut self) {
        let chars: Vec<char> = match self.lines.get(self.cursor_line) {
            Some(line) => line.chars().collect(),
            None => return,
        };
        if self.cursor_col >= chars.len() {
            return self.move_cursor_right();
        }
        let mut pos = self.cursor_col;
        while pos < chars.len() && is_word_char(chars[pos]) {
            pos += 1;
        }
        while pos < chars.len() && chars[pos].is_whitespace() {
            pos += 1;
        }
        self.cursor_col = pos;
    }

    /// Restore the state before the last change. Returns false when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        match self.history.pop() {
            Some((lines, line, col)) => {
                self.lines = lines;
                self.cursor_line = line;
                self.cursor_col = col;
                true
            }
            None => false,
        }
    }

    /// Keep the cursor inside a viewport of the given size (borders excluded)
    pub fn update_scroll(&mut self, viewport_height: usize, viewport_width: usize) {
        if self.cursor_line < self.scroll_offset {
            self.scroll_offset = self.cursor_line;
        } else if viewport_height > 0 && self.cursor_line >= self.scroll_offset + viewport_height {
            self.scroll_offset = self.cursor_line + 1 - viewport_height;
        }

        if self.cursor_col < self.scroll_col {
            self.scroll_col = self.cursor_col;
        } else if viewport_width > 0 && self.cursor_col >= self.scroll_col + viewport_width {
            self.scroll_col = self.cursor_col + 1 - viewport_width;
        }
    }

    /// Lines inside the viewport after both scroll offsets are applied
    pub fn visible_lines(&self, viewport_height: usize, viewport_width: usize) -> Vec<String> {
        self.lines
            .iter()
            .skip(self.scroll_offset)
            .take(viewport_height)
            .map(|line| line.chars().skip(self.scroll_col).take(viewport_width).collect())
            .collect()
    }

    /// Terminal position of the cursor for an editor drawn inside a bordered `area`
    pub fn cursor_screen_pos(&self, area: Rect) -> Option<(u16, u16)> {
        let inner_width = area.width.saturating_sub(2) as usize;
        let inner_height = area.height.saturating_sub(2) as usize;
        let row = self.cursor_line.checked_sub(self.scroll_offset)?;
        let col = self.cursor_col.checked_sub(self.scroll_col)?;
        if row >= inner_height || col > inner_width {
            return None;
        }
        Some((area.x + 1 + col as u16, area.y + 1 + row as u16))
    }
}

impl fmt::Display for Editor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.lines.join("\n"))
    }
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_backspace() {
        let mut editor = Editor::new();
        for ch in "fix printr".chars() {
            editor.insert_char(ch);
        }
        editor.delete_char();
        editor.insert_str("er");
        assert_eq!(editor.to_string(), "fix printer");
    }

    #[test]
    fn test_multi_line_newline_and_join() {
        let mut editor = Editor::from_string("first".to_string());
        editor.insert_newline();
        editor.insert_str("second");
        assert_eq!(editor.lines, vec!["first", "second"]);

        editor.move_cursor_home();
        editor.delete_char();
        assert_eq!(editor.to_string(), "firstsecond");
        assert_eq!(editor.cursor_col, 5);
    }

    #[test]
    fn test_single_line_ignores_newlines() {
        let mut editor = Editor::single_line("2025-08-15");
        editor.insert_newline();
        editor.insert_str("\nx");
        assert_eq!(editor.lines.len(), 1);
        assert_eq!(editor.to_string(), "2025-08-15 x");
    }

    #[test]
    fn test_undo_restores_previous_text() {
        let mut editor = Editor::single_line("abc");
        editor.delete_char();
        editor.insert_char('z');
        assert_eq!(editor.to_string(), "abz");
        assert!(editor.undo());
        assert!(editor.undo());
        assert_eq!(editor.to_string(), "abc");
        assert!(!editor.undo());
    }

    #[test]
    fn test_word_movement() {
        let mut editor = Editor::single_line("email server down");
        editor.move_cursor_word_left();
        assert_eq!(editor.cursor_col, 13);
        editor.move_cursor_word_left();
        assert_eq!(editor.cursor_col, 6);
        editor.move_cursor_word_right();
        assert_eq!(editor.cursor_col, 13);
    }

    #[test]
    fn test_scroll_keeps_cursor_visible() {
        let mut editor = Editor::single_line("0123456789");
        editor.update_scroll(1, 4);
        assert_eq!(editor.scroll_col, 7);
        assert_eq!(editor.visible_lines(1, 4), vec!["789"]);
        assert_eq!(editor.cursor_screen_pos(Rect::new(0, 0, 6, 3)), Some((4, 1)));
    }
}
