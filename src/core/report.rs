//! Weighted-average aggregation of fetched quotes

use super::error::{FetchFailure, ReportError};
use super::quote::WeightedQuote;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    /// Quotes ordered by descending weight.
    #[serde(rename = "Funds")]
    pub items: Vec<WeightedQuote>,
    /// Weight-normalized average of the estimated growth rates.
    #[serde(rename = "Avg")]
    pub average: f64,
    /// Identifiers that could not be fetched in a partial run.
    #[serde(rename = "Failures", skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<FetchFailure>,
}

impl Report {
    /// Sorts `items` by weight (heaviest first, stable on ties) and computes
    /// the weighted average growth.
    ///
    /// Returns [`ReportError::DivisionByZero`] when the weights sum to zero
    /// or the sum or average is not finite.
    pub fn build(mut items: Vec<WeightedQuote>) -> Result<Self, ReportError> {
        items.sort_by(|a, b| b.weight.total_cmp(&a.weight));

        let (total, total_weight) = items.iter().fold((0.0, 0.0), |(sum, weights), item| {
            (sum + item.quote.change() * item.weight, weights + item.weight)
        });

        if total_weight == 0.0 || !total_weight.is_finite() {
            return Err(ReportError::DivisionByZero);
        }

        let average = total / total_weight;
        if !average.is_finite() {
            return Err(ReportError::DivisionByZero);
        }

        Ok(Report {
            items,
            average,
            failures: Vec::new(),
        })
    }

    pub fn with_failures(mut self, failures: Vec<FetchFailure>) -> Self {
        self.failures = failures;
        self
    }

    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }
}
