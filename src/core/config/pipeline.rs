//! Tunables for the individual pipeline stages and the aggregate [`ReportConfig`].

use super::errors::{ConfigError, ConfigValidator, check_range};
use super::rules::{CompletenessRules, DocumentRules};
use crate::core::constants::{
    DEFAULT_BINARIZE_CUTOFF, DEFAULT_CONTINUATION_MARKER, DEFAULT_LINE_CENTER_TOLERANCE,
    DEFAULT_MIN_FINGERPRINT_LEN, DEFAULT_OCR_CHAR_WHITELIST, NORMALIZED_COORD_MAX,
};
use crate::core::errors::{ReportError, ReportResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Token-to-entity merge settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeConfig {
    /// Marker character the layout tokenizer puts in front of a new word.
    #[serde(default = "MergeConfig::default_continuation_marker")]
    pub continuation_marker: char,
}

impl MergeConfig {
    /// Sets the continuation marker.
    pub fn with_continuation_marker(mut self, marker: char) -> Self {
        self.continuation_marker = marker;
        self
    }

    fn default_continuation_marker() -> char {
        DEFAULT_CONTINUATION_MARKER
    }
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            continuation_marker: Self::default_continuation_marker(),
        }
    }
}

/// Spatial reconstruction settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Maximum spread of vertical box centers inside one line, in normalized units.
    #[serde(default = "LayoutConfig::default_line_center_tolerance")]
    pub line_center_tolerance: f32,
}

impl LayoutConfig {
    /// Sets the line tolerance.
    pub fn with_line_center_tolerance(mut self, tolerance: f32) -> Self {
        self.line_center_tolerance = tolerance;
        self
    }

    fn default_line_center_tolerance() -> f32 {
        DEFAULT_LINE_CENTER_TOLERANCE
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            line_center_tolerance: Self::default_line_center_tolerance(),
        }
    }
}

impl ConfigValidator for LayoutConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !self.line_center_tolerance.is_finite()
            || self.line_center_tolerance <= 0.0
            || self.line_center_tolerance > NORMALIZED_COORD_MAX as f32
        {
            return Err(ConfigError::OutOfRange {
                field: "line_center_tolerance".to_string(),
                min: 1,
                max: NORMALIZED_COORD_MAX as i64,
                actual: self.line_center_tolerance as i64,
            });
        }
        Ok(())
    }
}

/// Photo fingerprinting settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerprintConfig {
    /// Fingerprints shorter than this many characters are not indexed.
    #[serde(default = "FingerprintConfig::default_min_length")]
    pub min_length: usize,
    /// Grayscale values at or above the cutoff become white.
    #[serde(default = "FingerprintConfig::default_binarize_cutoff")]
    pub binarize_cutoff: u8,
    /// Characters the OCR backend is restricted to.
    #[serde(default = "FingerprintConfig::default_char_whitelist")]
    pub char_whitelist: String,
}

impl FingerprintConfig {
    /// Sets the minimum fingerprint length.
    pub fn with_min_length(mut self, min_length: usize) -> Self {
        self.min_length = min_length;
        self
    }

    /// Sets the binarization cutoff.
    pub fn with_binarize_cutoff(mut self, cutoff: u8) -> Self {
        self.binarize_cutoff = cutoff;
        self
    }

    fn default_min_length() -> usize {
        DEFAULT_MIN_FINGERPRINT_LEN
    }

    fn default_binarize_cutoff() -> u8 {
        DEFAULT_BINARIZE_CUTOFF
    }

    fn default_char_whitelist() -> String {
        DEFAULT_OCR_CHAR_WHITELIST.to_string()
    }
}

impl Default for FingerprintConfig {
    fn default() -> Self {
        Self {
            min_length: Self::default_min_length(),
            binarize_cutoff: Self::default_binarize_cutoff(),
            char_whitelist: Self::default_char_whitelist(),
        }
    }
}

impl ConfigValidator for FingerprintConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        check_range("min_length", self.min_length as i64, 1, 256)?;
        check_range("binarize_cutoff", self.binarize_cutoff as i64, 1, 255)?;
        if self.char_whitelist.is_empty() {
            return Err(ConfigError::Empty {
                field: "char_whitelist".to_string(),
            });
        }
        Ok(())
    }
}

/// Settings for the Tesseract command line backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TesseractConfig {
    /// Path to the `tesseract` binary; relies on `PATH` by default.
    #[serde(default = "TesseractConfig::default_binary")]
    pub binary: PathBuf,
    /// Optional language pack, e.g. `eng` or `ind+eng`.
    #[serde(default)]
    pub language: Option<String>,
    /// Page segmentation mode.
    #[serde(default = "TesseractConfig::default_psm")]
    pub psm: u8,
    /// OCR engine mode.
    #[serde(default = "TesseractConfig::default_oem")]
    pub oem: u8,
}

impl TesseractConfig {
    /// Sets the binary path.
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Sets the language pack.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    fn default_binary() -> PathBuf {
        PathBuf::from("tesseract")
    }

    fn default_psm() -> u8 {
        6
    }

    fn default_oem() -> u8 {
        3
    }
}

impl Default for TesseractConfig {
    fn default() -> Self {
        Self {
            binary: Self::default_binary(),
            language: None,
            psm: Self::default_psm(),
            oem: Self::default_oem(),
        }
    }
}

impl ConfigValidator for TesseractConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        check_range("psm", self.psm as i64, 0, 13)?;
        check_range("oem", self.oem as i64, 0, 3)?;
        if self.binary.as_os_str().is_empty() {
            return Err(ConfigError::Empty {
                field: "binary".to_string(),
            });
        }
        Ok(())
    }
}

/// Session-level switches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Drop repeated `(text, box)` tokens emitted by overlapping model windows.
    #[serde(default)]
    pub dedup_window_tokens: bool,
}

/// Complete configuration of the report pipeline.
///
/// Every section is optional in the JSON form and falls back to its defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default)]
    pub document_rules: DocumentRules,
    #[serde(default)]
    pub completeness: CompletenessRules,
    #[serde(default)]
    pub merge: MergeConfig,
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub fingerprint: FingerprintConfig,
    #[serde(default)]
    pub tesseract: TesseractConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

impl ReportConfig {
    /// Reads and validates a configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> ReportResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate().map_err(|e| {
            ReportError::config_error_detailed(path.display().to_string(), e.to_string())
        })?;
        Ok(config)
    }
}

impl ConfigValidator for ReportConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.document_rules.validate()?;
        self.completeness.validate()?;
        self.layout.validate()?;
        self.fingerprint.validate()?;
        self.tesseract.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ReportConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.merge.continuation_marker, 'Ġ');
        assert_eq!(config.layout.line_center_tolerance, 10.0);
        assert_eq!(config.fingerprint.min_length, 5);
        assert_eq!(config.tesseract.psm, 6);
    }

    #[test]
    fn test_partial_json_falls_back_to_defaults() {
        let config: ReportConfig =
            serde_json::from_str(r#"{"fingerprint": {"min_length": 8}}"#).unwrap();
        assert_eq!(config.fingerprint.min_length, 8);
        assert_eq!(config.fingerprint.binarize_cutoff, 128);
        assert_eq!(config.document_rules, DocumentRules::default());
    }

    #[test]
    fn test_invalid_tolerance_is_rejected() {
        let layout = LayoutConfig::default().with_line_center_tolerance(0.0);
        assert!(layout.validate().is_err());
    }

    #[test]
    fn test_from_json_file_reports_validation_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"tesseract": {"psm": 42}}"#).unwrap();
        let err = ReportConfig::from_json_file(&path).unwrap_err();
        assert!(matches!(err, ReportError::ConfigError { .. }));
    }
}
