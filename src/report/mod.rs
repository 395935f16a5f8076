//! The report pipeline.
//!
//! Stages, in the order a document flows through them:
//! - [`TokenEntityMerger`] rebuilds words from classified sub-word tokens
//! - [`SpatialKeyValueReconstructor`] pairs keys with values per page
//! - [`DocumentTypeClassifier`] and [`FieldValidator`] check required fields
//! - [`CompletenessChecker`] looks for required phrases in the token stream
//! - [`DuplicatePhotoIndex`] fingerprints extracted photos against the [`MasterIndex`]
//!
//! [`SessionContext`] runs all of them for a batch of documents.

pub mod completeness;
pub mod doc_type;
pub mod fields;
pub mod key_value;
pub mod merger;
pub mod photo_index;
pub mod session;

pub use completeness::CompletenessChecker;
pub use doc_type::{DetectionSource, DocumentTypeClassifier};
pub use fields::FieldValidator;
pub use key_value::{PairMatch, PairPhase, SpatialKeyValueReconstructor};
pub use merger::TokenEntityMerger;
pub use photo_index::{DuplicatePhotoIndex, MasterIndex, PhotoBatch, PhotoOutcome, relative_path};
pub use session::{DocumentInput, SessionContext, generate_session_id};
