//! Reads the `identifier,weight` fund list.
//!
//! Blank lines are ignored. A weight that does not parse counts as zero. A
//! line without a comma, or with an empty identifier, is skipped.

use super::quote::InstrumentRequest;
use anyhow::{Context, Result};
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, warn};

/// Loads requests from `path`. A missing file yields an empty list.
pub fn load_requests(path: &Path) -> Result<Vec<InstrumentRequest>> {
    debug!("Load fund list from: {}", path.display());
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(parse_requests(&content)),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("Fund list {} does not exist", path.display());
            Ok(Vec::new())
        }
        Err(e) => {
            Err(e).with_context(|| format!("Failed to read fund list: {}", path.display()))
        }
    }
}

pub fn parse_requests(content: &str) -> Vec<InstrumentRequest> {
    content
        .lines()
        .enumerate()
        .filter_map(|(index, line)| parse_line(index + 1, line))
        .collect()
}

fn parse_line(line_no: usize, line: &str) -> Option<InstrumentRequest> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let Some((identifier, weight)) = line.split_once(',') else {
        warn!(line = line_no, content = %line, "Skipping fund list line without a weight");
        return None;
    };

    let identifier = identifier.trim();
    if identifier.is_empty() {
        warn!(line = line_no, content = %line, "Skipping fund list line without an identifier");
        return None;
    }

    let weight = match weight.trim().parse::<f64>() {
        Ok(w) if w.is_finite() => w,
        Ok(w) => {
            warn!(line = line_no, weight = %w, "Non-finite weight, using 0");
            0.0
        }
        Err(e) => {
            warn!(line = line_no, weight = %weight, error = %e, "Invalid weight, using 0");
            0.0
        }
    };

    Some(InstrumentRequest::new(identifier, weight))
}
