//! Metadata stamp recognition
//!
//! Photos taken in the field carry a burned-in stamp (date, coordinates,
//! location). This module provides the seam through which that stamp is read
//! as text, plus a backend driving the `tesseract` command line tool.

use crate::core::config::TesseractConfig;
use crate::core::constants::DEFAULT_OCR_CHAR_WHITELIST;
use crate::core::errors::{ReportError, ReportResult};
use image::{GrayImage, ImageFormat};
use std::ffi::OsString;
use std::path::Path;
use std::process::Command;

/// Reads raw text from a preprocessed (grayscale, binarized) photo.
pub trait MetadataRecognizer: Send + Sync {
    /// Backend name used in logs and errors.
    fn name(&self) -> &str;

    /// Returns the raw recognized text; normalization happens downstream.
    fn recognize(&self, image: &GrayImage) -> ReportResult<String>;
}

/// Recognizer backed by the Tesseract CLI.
#[derive(Debug, Clone)]
pub struct TesseractRecognizer {
    config: TesseractConfig,
    whitelist: String,
}

impl Default for TesseractRecognizer {
    fn default() -> Self {
        Self::new(TesseractConfig::default())
    }
}

impl TesseractRecognizer {
    pub fn new(config: TesseractConfig) -> Self {
        Self {
            config,
            whitelist: DEFAULT_OCR_CHAR_WHITELIST.to_string(),
        }
    }

    /// Restricts recognition to the given characters.
    pub fn with_whitelist(mut self, whitelist: impl Into<String>) -> Self {
        self.whitelist = whitelist.into();
        self
    }

    /// True when the configured binary answers `--version`.
    pub fn is_available(&self) -> bool {
        Command::new(&self.config.binary)
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    /// Arguments for one invocation reading `input` and printing to stdout.
    fn command_args(&self, input: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            input.as_os_str().to_owned(),
            "stdout".into(),
            "--oem".into(),
            self.config.oem.to_string().into(),
            "--psm".into(),
            self.config.psm.to_string().into(),
        ];
        if let Some(language) = &self.config.language {
            args.push("-l".into());
            args.push(language.into());
        }
        if !self.whitelist.is_empty() {
            args.push("-c".into());
            args.push(format!("tessedit_char_whitelist={}", self.whitelist).into());
        }
        args
    }
}

impl MetadataRecognizer for TesseractRecognizer {
    fn name(&self) -> &str {
        "tesseract"
    }

    fn recognize(&self, image: &GrayImage) -> ReportResult<String> {
        let input = tempfile::Builder::new()
            .prefix("oar-report-")
            .suffix(".png")
            .tempfile()?;
        image
            .save_with_format(input.path(), ImageFormat::Png)
            .map_err(|e| ReportError::recognition_error(self.name(), "writing input image", e))?;

        let output = Command::new(&self.config.binary)
            .args(self.command_args(input.path()))
            .output()
            .map_err(|e| {
                ReportError::recognition_error(
                    self.name(),
                    format!("failed to run '{}'", self.config.binary.display()),
                    e,
                )
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ReportError::recognition_failed(
                self.name(),
                format!(
                    "exit code {}: {}",
                    output.status.code().unwrap_or(-1),
                    stderr.trim()
                ),
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
