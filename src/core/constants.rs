//! Constants shared across the report pipeline.

/// Upper bound of the normalized box coordinate space (`0..=1000`).
pub const NORMALIZED_COORD_MAX: i32 = 1000;

/// Maximum vertical-center spread (in normalized units) for entities on one line.
pub const DEFAULT_LINE_CENTER_TOLERANCE: f32 = 10.0;

/// Sub-word marker emitted by byte-level BPE tokenizers in front of a new word.
pub const DEFAULT_CONTINUATION_MARKER: char = 'Ġ';

/// Fingerprints shorter than this are treated as non-distinctive.
pub const DEFAULT_MIN_FINGERPRINT_LEN: usize = 5;

/// Grayscale values at or above this become white when binarizing photos.
pub const DEFAULT_BINARIZE_CUTOFF: u8 = 128;

/// Characters the metadata OCR is allowed to emit.
pub const DEFAULT_OCR_CHAR_WHITELIST: &str =
    "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz .,:-/|°";

/// Image extensions picked up when scanning a project directory for photos.
pub const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "bmp"];

/// Key of the sentinel that marks a structured record as failed upstream.
pub const UPSTREAM_ERROR_KEY: &str = "error";
