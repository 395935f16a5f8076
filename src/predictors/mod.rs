//! Recognition backends.

pub mod metadata_ocr;

pub use metadata_ocr::{MetadataRecognizer, TesseractRecognizer};
