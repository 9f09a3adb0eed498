//! Core business logic: quote model, concurrent collection and aggregation

pub mod config;
pub mod error;
pub mod fanout;
pub mod fund_list;
pub mod log;
pub mod quote;
pub mod report;

// Re-export main types for cleaner imports
pub use error::{FetchError, FetchFailure, ReportError};
pub use fanout::{FailurePolicy, FanOutCoordinator, FanOutOptions};
pub use quote::{InstrumentRequest, Quote, QuoteProvider, WeightedQuote};
pub use report::Report;
