use ratatui::layout::{Constraint, Direction, Layout as RatLayout, Rect};

pub struct Layout {
    pub inner_area: Rect, // Area inside the outer border
    pub tabs_area: Rect,
    pub main_area: Rect,
    pub filters_area: Rect,
    pub status_area: Rect,
}

impl Layout {
    /// Minimum terminal dimensions required for the application
    /// Width: 60 columns fits the six grid columns with a short description
    /// Height: 12 lines (2 outer borders + 1 tabs + 5 content + 3 filters + 1 status)
    pub const MIN_WIDTH: u16 = 60;
    pub const MIN_HEIGHT: u16 = 12;

    pub fn calculate(size: Rect) -> Self {
        let width = size.width.max(Self::MIN_WIDTH);
        let height = size.height.max(Self::MIN_HEIGHT);
        let size = Rect::new(size.x, size.y, width, height);

        // 1 char of outer border on each side
        let inner_area = Rect::new(
            size.x + 1,
            size.y + 1,
            size.width.saturating_sub(2),
            size.height.saturating_sub(2),
        );

        let vertical = RatLayout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Tabs
                Constraint::Min(1),    // Grid, board or charts
                Constraint::Length(3), // Filters (borders + content)
                Constraint::Length(1), // Status
            ])
            .split(inner_area);

        Self {
            inner_area,
            tabs_area: vertical[0],
            main_area: vertical[1],
            filters_area: vertical[2],
            status_area: vertical[3],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_stacks_areas() {
        let layout = Layout::calculate(Rect::new(0, 0, 100, 30));
        assert_eq!(layout.inner_area, Rect::new(1, 1, 98, 28));
        assert_eq!(layout.tabs_area.height, 1);
        assert_eq!(layout.filters_area.height, 3);
        assert_eq!(layout.status_area.height, 1);
        assert_eq!(layout.main_area.height, 23);
        assert_eq!(layout.status_area.y + 1, 29);
    }

    #[test]
    fn test_layout_enforces_minimum_size() {
        let layout = Layout::calculate(Rect::new(0, 0, 20, 5));
        assert_eq!(layout.inner_area.width, Layout::MIN_WIDTH - 2);
        assert_eq!(layout.inner_area.height, Layout::MIN_HEIGHT - 2);
    }
}
