//! Geometry and text processing primitives shared by the pipeline stages.

pub mod geometry;
pub mod text;

pub use geometry::NormBox;
pub use text::{normalize_alnum, normalize_fingerprint, strip_leading_marker};
