//! Image helpers for photo fingerprinting.

use crate::core::errors::ReportResult;
use image::GrayImage;
use imageproc::contrast::{ThresholdType, threshold};
use std::path::Path;

/// Loads an image from disk and converts it to 8-bit grayscale.
pub fn load_gray(path: &Path) -> ReportResult<GrayImage> {
    Ok(image::open(path)?.to_luma8())
}

/// Binarizes a grayscale image: pixels `>= cutoff` become white, the rest black.
pub fn binarize(gray: &GrayImage, cutoff: u8) -> GrayImage {
    if cutoff == 0 {
        return GrayImage::from_pixel(gray.width(), gray.height(), image::Luma([255]));
    }
    // `threshold` whitens pixels strictly above its argument.
    threshold(gray, cutoff - 1, ThresholdType::Binary)
}

/// Loads an image and binarizes it in one go.
pub fn load_binarized(path: &Path, cutoff: u8) -> ReportResult<GrayImage> {
    let gray = load_gray(path)?;
    Ok(binarize(&gray, cutoff))
}
