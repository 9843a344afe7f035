use ratatui::widgets::{Bar, BarChart, BarGroup, Block, Borders, Paragraph};
use ratatui::style::{Modifier, Style};
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span};
use crate::models::{Status, Ticket};
use crate::stats::{open_count, priority_counts, status_by_month};
use crate::Config;
use crate::tui::widgets::color::{parse_color, priority_color, status_color};

const STATUS_CHART_TITLE: &str = "Task ticket status per month";
const PRIORITY_CHART_TITLE: &str = "Current task ticket priorities";

/// Open-ticket metric on top, the two bar charts side by side below.
/// Always computed over the whole working set, filters do not apply.
pub fn render_statistics(f: &mut Frame, area: Rect, tickets: &[Ticket], config: &Config) {
    let active_theme = config.get_active_theme();
    let fg_color = parse_color(&active_theme.fg);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(6)])
        .split(area);

    let metric = Paragraph::new(Line::from(vec![
        Span::raw("Number of open task tickets: "),
        Span::styled(
            open_count(tickets).to_string(),
            Style::default().fg(status_color(Status::Open)).add_modifier(Modifier::BOLD),
        ),
    ]))
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL))
    .style(Style::default().fg(fg_color));
    f.render_widget(metric, vertical[0]);

    let charts = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(vertical[1]);

    render_status_chart(f, charts[0], tickets, config);
    render_priority_chart(f, charts[1], tickets, config);
}

/// Bar width so that `groups` groups of `bars_per_group` bars fit in `width`
fn bar_width_for(width: u16, groups: usize, bars_per_group: usize, group_gap: u16) -> u16 {
    if groups == 0 || bars_per_group == 0 {
        return 1;
    }
    let per_group = (width as usize / groups).saturating_sub(group_gap as usize);
    ((per_group / bars_per_group) as u16).clamp(1, 7)
}

fn render_status_chart(f: &mut Frame, area: Rect, tickets: &[Ticket], config: &Config) {
    let fg_color = parse_color(&config.get_active_theme().fg);
    let months = status_by_month(tickets);

    let block = Block::default().borders(Borders::ALL).title(STATUS_CHART_TITLE);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(inner);

    let group_gap = 2;
    let bar_width = bar_width_for(sections[0].width, months.len(), Status::ALL.len(), group_gap);

    let mut chart = BarChart::default()
        .bar_width(bar_width)
        .bar_gap(0)
        .group_gap(group_gap)
        .style(Style::default().fg(fg_color));
    for month in &months {
        let bars: Vec<Bar> = Status::ALL
            .iter()
            .map(|status| {
                Bar::default()
                    .value(month.count(*status))
                    .style(Style::default().fg(status_color(*status)))
            })
            .collect();
        chart = chart.data(BarGroup::default().label(Line::from(month.month.label())).bars(&bars));
    }
    f.render_widget(chart, sections[0]);

    // Legend
    let mut legend = Vec::new();
    for status in Status::ALL {
        legend.push(Span::styled("■ ", Style::default().fg(status_color(status))));
        legend.push(Span::raw(format!("{}   ", status)));
    }
    f.render_widget(Paragraph::new(Line::from(legend)).alignment(Alignment::Center), sections[1]);
}

fn render_priority_chart(f: &mut Frame, area: Rect, tickets: &[Ticket], config: &Config) {
    let fg_color = parse_color(&config.get_active_theme().fg);
    let counts = priority_counts(tickets);

    let block = Block::default().borders(Borders::ALL).title(PRIORITY_CHART_TITLE);
    let inner = block.inner(area);

    let bars: Vec<Bar> = counts
        .iter()
        .map(|(priority, count)| {
            Bar::default()
                .value(*count)
                .label(Line::from(priority.as_str()))
                .style(Style::default().fg(priority_color(*priority)))
        })
        .collect();

    let bar_gap = 2;
    let bar_width = bar_width_for(inner.width, counts.len(), 1, bar_gap);
    let chart = BarChart::default()
        .block(block)
        .bar_width(bar_width)
        .bar_gap(bar_gap)
        .style(Style::default().fg(fg_color))
        .data(BarGroup::default().bars(&bars));
    f.render_widget(chart, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bar_width_fits_groups() {
        // 7 months of 3 bars in 60 columns: 60/7 = 8, minus gap 2 = 6, / 3 = 2
        assert_eq!(bar_width_for(60, 7, 3, 2), 2);
        assert_eq!(bar_width_for(10, 20, 3, 2), 1);
        assert_eq!(bar_width_for(300, 1, 3, 2), 7);
        assert_eq!(bar_width_for(60, 0, 3, 2), 1);
    }
}
