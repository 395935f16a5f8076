//! Configuration management for the report pipeline.
//!
//! This module provides configuration types, validation traits, and utilities
//! for managing the rule tables and stage tunables.

pub mod errors;
pub mod pipeline;
pub mod rules;

// Re-export commonly used types
pub use errors::{ConfigError, ConfigValidator};
pub use pipeline::{
    FingerprintConfig, LayoutConfig, MergeConfig, ReportConfig, SessionConfig, TesseractConfig,
};
pub use rules::{CompletenessRules, DocumentRules, DocumentTypeRule};
