use super::ui;
use crate::core::{FanOutCoordinator, InstrumentRequest, Report};
use anyhow::{Context, Result};
use comfy_table::{Attribute, Cell, CellAlignment};

impl Report {
    pub fn display_as_table(&self) -> String {
        let mut table = ui::new_styled_table();

        table.set_header(vec![
            ui::header_cell("ID"),
            ui::header_cell("Name"),
            ui::header_cell("Time"),
            ui::header_cell("Est. Growth"),
            ui::header_cell("Weight"),
        ]);

        for item in &self.items {
            let quote = &item.quote;
            table.add_row(vec![
                Cell::new(&quote.identifier),
                Cell::new(&quote.display_name),
                Cell::new(&quote.as_of),
                ui::growth_cell(&quote.change_percent),
                Cell::new(item.weight).set_alignment(CellAlignment::Right),
            ]);
        }

        table.add_row(vec![
            Cell::new("Avg").add_attribute(Attribute::Bold),
            Cell::new(""),
            Cell::new(""),
            ui::average_cell(self.average),
            Cell::new(""),
        ]);

        table.to_string()
    }
}

/// Fetches every request and prints the report table on stdout.
pub async fn run(coordinator: &FanOutCoordinator, requests: &[InstrumentRequest]) -> Result<()> {
    let pb = ui::new_progress_bar(requests.len() as u64);
    pb.set_message("Fetching valuations...");

    let result = coordinator
        .run_with_progress(requests, &|| pb.inc(1))
        .await;
    pb.finish_and_clear();

    let report = result.context("Failed to build fund report")?;
    println!("{}", report.display_as_table());

    for failure in &report.failures {
        eprintln!(
            "{} {}: {}",
            ui::style_text("Skipped", ui::StyleType::Error),
            ui::style_text(&failure.identifier, ui::StyleType::TotalLabel),
            failure.message
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Quote, WeightedQuote};

    fn report() -> Report {
        Report::build(vec![
            WeightedQuote::new(
                Quote {
                    identifier: "110011".to_string(),
                    display_name: "Mid Cap".to_string(),
                    as_of: "2024-05-06 15:00".to_string(),
                    change_percent: "3.0".to_string(),
                },
                1.0,
            ),
            WeightedQuote::new(
                Quote {
                    identifier: "161725".to_string(),
                    display_name: "Baijiu Index".to_string(),
                    as_of: "2024-05-06 15:00".to_string(),
                    change_percent: "1.0".to_string(),
                },
                2.0,
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_table_lists_funds_by_weight_with_average_footer() {
        let table = report().display_as_table();

        for column in ["ID", "Name", "Time", "Est. Growth", "Weight"] {
            assert!(table.contains(column), "missing column {column}");
        }
        let heavy = table.find("161725").unwrap();
        let light = table.find("110011").unwrap();
        assert!(heavy < light);

        let footer = table.lines().find(|l| l.contains("Avg")).unwrap();
        assert!(footer.contains("1.666667%"), "footer was {footer}");
    }

    #[test]
    fn test_missing_growth_shows_na() {
        let cell = ui::growth_cell("");
        assert_eq!(cell.content(), "N/A");
        assert_eq!(ui::growth_cell("-0.5").content(), "-0.5%");
    }
}
