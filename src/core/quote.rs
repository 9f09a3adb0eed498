//! Quote abstractions and core types

use super::error::FetchError;
use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};

/// One instrument to fetch, with its weight in the aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentRequest {
    #[serde(rename = "Id")]
    pub identifier: String,
    #[serde(rename = "Weight", default)]
    pub weight: f64,
}

impl InstrumentRequest {
    pub fn new(identifier: impl Into<String>, weight: f64) -> Self {
        Self {
            identifier: identifier.into(),
            weight,
        }
    }
}

/// Valuation estimate for a single fund, as reported by the provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    #[serde(rename = "FCODE", default, deserialize_with = "null_as_empty")]
    pub identifier: String,
    #[serde(rename = "SHORTNAME", default, deserialize_with = "null_as_empty")]
    pub display_name: String,
    #[serde(rename = "GZTIME", default, deserialize_with = "null_as_empty")]
    pub as_of: String,
    #[serde(rename = "GSZZL", default, deserialize_with = "null_as_empty")]
    pub change_percent: String,
}

impl Quote {
    /// Estimated growth as a number. Empty or non-numeric values count as zero.
    pub fn change(&self) -> f64 {
        self.change_percent
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .unwrap_or(0.0)
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// A quote paired with the weight of the request that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightedQuote {
    #[serde(flatten)]
    pub quote: Quote,
    #[serde(rename = "Weight")]
    pub weight: f64,
}

impl WeightedQuote {
    pub fn new(quote: Quote, weight: f64) -> Self {
        Self { quote, weight }
    }
}

#[async_trait]
pub trait QuoteProvider: Send + Sync {
    async fn fetch_quote(&self, identifier: &str) -> Result<Quote, FetchError>;
}
