pub mod board;
pub mod charts;
pub mod color;
pub mod confirm_delete;
pub mod editor;
pub mod filter_modal;
pub mod filters_box;
pub mod form;
pub mod help;
pub mod status_bar;
pub mod tabs;
pub mod ticket_table;

use ratatui::layout::{Constraint, Flex, Layout, Rect};

/// Centered rect taking the given percentages of `area`
pub fn popup_area(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let vertical = Layout::vertical([Constraint::Percentage(percent_y)]).flex(Flex::Center);
    let horizontal = Layout::horizontal([Constraint::Percentage(percent_x)]).flex(Flex::Center);
    let [area] = vertical.areas(area);
    let [area] = horizontal.areas(area);
    area
}
