//! Domain-level structures shared across the report pipeline.
//!
//! This module groups the input types handed over by the layout model
//! (tokens) with the higher-level results the pipeline produces.

pub mod structure;
pub mod token;

pub use structure::*;
pub use token::{Entity, Role, Token, dedup_window_tokens, trim_key};
