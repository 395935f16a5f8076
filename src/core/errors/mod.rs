//! Error handling for the report pipeline.

mod types;

pub use types::{ProcessingStage, ReportError, ReportResult};
