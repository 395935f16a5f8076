//! # OAR Report
//!
//! Layout reconstruction and duplicate-photo detection for scanned field
//! reports.
//!
//! An external layout model classifies every sub-word token of a report page
//! and hands over `{text, label, box, page}` tokens. This crate turns them into
//! structured data and checks it:
//!
//! - tokens sharing a box and label are merged back into words
//! - `_KEY`/`_HEADER` entities are paired with `_VALUE` entities, first on the
//!   same visual line and then by looking straight below
//! - the document type is inferred and its required fields are validated
//! - a checklist of required phrases is matched against the whole token stream
//! - photos extracted from the report are fingerprinted through OCR of their
//!   metadata stamp and looked up in a master index persisted across sessions
//!
//! ## Modules
//!
//! * [`core`] - Configuration, constants and error types
//! * [`domain`] - Tokens, entities and the report types handed to collaborators
//! * [`processors`] - Box geometry and text normalization
//! * [`predictors`] - OCR backends for photo metadata stamps
//! * [`report`] - The pipeline stages and the session that drives them
//! * [`utils`] - Image helpers, image discovery and logging setup
//!
//! ## Quick Start
//!
//! ```rust
//! use oar_report::domain::Token;
//! use oar_report::report::{SpatialKeyValueReconstructor, TokenEntityMerger};
//!
//! let tokens = vec![
//!     Token::new("ĠPRO", "PROYEK_KEY", [50, 100, 150, 120], 1),
//!     Token::new("YEK", "PROYEK_KEY", [50, 100, 150, 120], 1),
//!     Token::new("ĠJakarta", "PROYEK_VALUE", [200, 100, 400, 120], 1),
//! ];
//!
//! let entities = TokenEntityMerger::default().merge(&tokens);
//! let record = SpatialKeyValueReconstructor::default().reconstruct(&entities);
//! assert_eq!(record.get(1, "PROYEK"), Some("Jakarta"));
//! ```

pub mod core;
pub mod domain;
pub mod predictors;
pub mod processors;
pub mod report;
pub mod utils;

pub use crate::core::{ReportError, ReportResult};
