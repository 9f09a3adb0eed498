use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Defines different styles for text elements.
pub enum StyleType {
    TotalLabel,
    Error,
}

/// Applies a consistent style to a string.
pub fn style_text(text: &str, style_type: StyleType) -> String {
    let styled = match style_type {
        StyleType::TotalLabel => style(text).bold(),
        StyleType::Error => style(text).red(),
    };
    styled.to_string()
}

/// Creates a new `comfy_table::Table` with standard styling.
pub fn new_styled_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Creates a styled header cell for a table.
pub fn header_cell(text: &str) -> Cell {
    Cell::new(text)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

/// Creates a cell for an estimated growth rate, green when non-negative and
/// red otherwise. Values the provider left empty show as "N/A".
pub fn growth_cell(raw: &str) -> Cell {
    let raw = raw.trim();
    match raw.parse::<f64>() {
        Ok(change) if change.is_finite() => {
            let color = if change >= 0.0 { Color::Green } else { Color::Red };
            Cell::new(format!("{raw}%"))
                .fg(color)
                .set_alignment(CellAlignment::Right)
        }
        _ => na_cell(),
    }
}

/// Formats the weighted average for the footer row.
pub fn average_cell(average: f64) -> Cell {
    let color = if average >= 0.0 { Color::Green } else { Color::Red };
    Cell::new(format!("{average:.6}%"))
        .add_attribute(Attribute::Bold)
        .fg(color)
        .set_alignment(CellAlignment::Right)
}

pub fn na_cell() -> Cell {
    Cell::new("N/A")
        .fg(Color::DarkGrey)
        .set_alignment(CellAlignment::Right)
}

/// Creates a new `indicatif::ProgressBar` with standard styling.
pub fn new_progress_bar(len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    if let Ok(bar_style) = ProgressStyle::default_bar()
        .template("{spinner:.green} {msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len}")
    {
        pb.set_style(bar_style.progress_chars("#>-"));
    }
    pb
}
