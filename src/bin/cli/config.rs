//! Configuration and input files for the CLI.

use oar_report::core::config::ReportConfig;
use oar_report::domain::{StructuredRecord, Token};
use oar_report::report::DocumentInput;
use oar_report::utils::collect_images;
use oar_report::{ReportError, ReportResult};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Options shared by every subcommand.
#[derive(Clone, Debug)]
pub struct CliConfig {
    pub config_file: Option<PathBuf>,
    pub tesseract: Option<PathBuf>,
    pub language: Option<String>,
}

impl CliConfig {
    /// Loads the pipeline configuration and applies command line overrides.
    pub fn load(&self) -> ReportResult<ReportConfig> {
        let mut config = match &self.config_file {
            Some(path) => ReportConfig::from_json_file(path)?,
            None => ReportConfig::default(),
        };
        if let Some(binary) = &self.tesseract {
            config.tesseract = config.tesseract.with_binary(binary.clone());
        }
        if let Some(language) = &self.language {
            config.tesseract = config.tesseract.with_language(language.clone());
        }
        Ok(config)
    }
}

/// Reads a JSON array of tokens.
pub fn read_tokens(path: &Path) -> ReportResult<Vec<Token>> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Reads a JSON object as a structured record.
pub fn read_record(path: &Path) -> ReportResult<StructuredRecord> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// One document of a session manifest.
///
/// Relative paths are resolved against the manifest's directory.
#[derive(Debug, Deserialize)]
pub struct ManifestEntry {
    pub file_name: String,
    /// Inline tokens.
    #[serde(default)]
    pub tokens: Vec<Token>,
    /// Tokens stored in a separate JSON file; appended after inline tokens.
    #[serde(default)]
    pub tokens_file: Option<PathBuf>,
    #[serde(default)]
    pub images: Vec<PathBuf>,
    /// Directory scanned recursively for additional images.
    #[serde(default)]
    pub image_dir: Option<PathBuf>,
    #[serde(default)]
    pub structured: Option<StructuredRecord>,
}

impl ManifestEntry {
    fn into_input(self, base: &Path) -> ReportResult<DocumentInput> {
        let mut tokens = self.tokens;
        if let Some(file) = &self.tokens_file {
            tokens.extend(read_tokens(&base.join(file))?);
        }
        let mut images: Vec<PathBuf> = self.images.iter().map(|p| base.join(p)).collect();
        if let Some(dir) = &self.image_dir {
            images.extend(collect_images(base.join(dir))?);
        }
        Ok(DocumentInput {
            file_name: self.file_name,
            tokens,
            images,
            structured: self.structured,
        })
    }
}

/// Reads a session manifest: a JSON array of [`ManifestEntry`].
pub fn read_manifest(path: &Path) -> ReportResult<Vec<DocumentInput>> {
    let raw = std::fs::read_to_string(path)?;
    let entries: Vec<ManifestEntry> = serde_json::from_str(&raw)?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    entries
        .into_iter()
        .map(|entry| entry.into_input(base))
        .collect()
}

/// Picks a project name for a bare image directory.
pub fn project_name_for(dir: &Path) -> ReportResult<String> {
    dir.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| {
            ReportError::config_error_detailed(
                "project",
                format!("cannot derive a project name from '{}'", dir.display()),
            )
        })
}
