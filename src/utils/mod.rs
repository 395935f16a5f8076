//! Utility functions for the report pipeline.
//!
//! This module provides image helpers used for photo fingerprinting, image file
//! discovery, and logging setup.

pub mod discovery;
pub mod image;

pub use discovery::{collect_images, is_image_file};
pub use image::{binarize, load_binarized, load_gray};

/// Installs a `tracing` fmt subscriber filtered by `RUST_LOG` (default `info`).
///
/// Calling it more than once is harmless; only the first call installs the
/// subscriber.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_is_idempotent() {
        init_tracing();
        init_tracing();
        tracing::info!("tracing initialized twice");
    }
}
