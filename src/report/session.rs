//! Session orchestration.
//!
//! A session processes a batch of documents against one [`MasterIndex`]. The
//! index is loaded when the session opens, shared by every document, and
//! written back once when the session finishes. Documents are processed one at
//! a time through `&mut self`, which gives the index a single writer.

use super::completeness::CompletenessChecker;
use super::doc_type::DocumentTypeClassifier;
use super::fields::FieldValidator;
use super::key_value::SpatialKeyValueReconstructor;
use super::merger::TokenEntityMerger;
use super::photo_index::{DuplicatePhotoIndex, MasterIndex, PhotoBatch};
use crate::core::config::{ConfigValidator, ReportConfig};
use crate::core::errors::{ReportError, ReportResult};
use crate::domain::{DocumentReport, SessionReport, StructuredRecord, Token, dedup_window_tokens};
use crate::predictors::{MetadataRecognizer, TesseractRecognizer};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Everything the collaborators hand over for one document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentInput {
    /// Original file name of the document; also used as the project name.
    pub file_name: String,
    /// Classified tokens of every page.
    #[serde(default)]
    pub tokens: Vec<Token>,
    /// Photos extracted from the document.
    #[serde(default)]
    pub images: Vec<PathBuf>,
    /// Record produced by an external model. When absent, the reconstructed
    /// key-value pairs are flattened instead.
    #[serde(default)]
    pub structured: Option<StructuredRecord>,
}

/// Generates a session id of the form `YYYYMMDD-HHMMSS_xxxxxxxx`.
pub fn generate_session_id() -> String {
    let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("{}_{}", stamp, &suffix[..8])
}

/// Owns the master index and every pipeline stage for one session.
#[derive(Debug)]
pub struct SessionContext {
    id: String,
    root: PathBuf,
    index_path: PathBuf,
    index: MasterIndex,
    dedup_window_tokens: bool,
    merger: TokenEntityMerger,
    reconstructor: SpatialKeyValueReconstructor,
    completeness: CompletenessChecker,
    validator: FieldValidator,
    classifier: DocumentTypeClassifier,
    photos: DuplicatePhotoIndex,
    summary: SessionReport,
}

impl SessionContext {
    /// Opens a session rooted at an existing directory.
    ///
    /// The session id is the name of `root`. Failing to load the index is
    /// fatal; a missing index file starts an empty one.
    pub fn open(
        config: ReportConfig,
        root: impl Into<PathBuf>,
        index_path: impl Into<PathBuf>,
        recognizer: Box<dyn MetadataRecognizer>,
    ) -> ReportResult<Self> {
        config.validate()?;
        let root = root.into();
        let index_path = index_path.into();
        let id = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                ReportError::config_error_detailed(
                    "session root",
                    format!("'{}' has no directory name", root.display()),
                )
            })?;
        let index = MasterIndex::load(&index_path)?;

        let ReportConfig {
            document_rules,
            completeness,
            merge,
            layout,
            fingerprint,
            tesseract: _,
            session,
        } = config;

        tracing::info!(session = %id, "session opened at {}", root.display());
        Ok(Self {
            summary: SessionReport {
                session_id: id.clone(),
                ..SessionReport::default()
            },
            id,
            root,
            index_path,
            index,
            dedup_window_tokens: session.dedup_window_tokens,
            merger: TokenEntityMerger::new(merge.clone()),
            reconstructor: SpatialKeyValueReconstructor::new(layout),
            completeness: CompletenessChecker::new(completeness).with_marker(merge.continuation_marker),
            validator: FieldValidator::new(),
            classifier: DocumentTypeClassifier::new(document_rules)?,
            photos: DuplicatePhotoIndex::new(recognizer, fingerprint),
        })
    }

    /// Creates a fresh session directory under `sessions_dir` and opens it.
    pub fn create(
        config: ReportConfig,
        sessions_dir: impl AsRef<Path>,
        index_path: impl Into<PathBuf>,
        recognizer: Box<dyn MetadataRecognizer>,
    ) -> ReportResult<Self> {
        let root = sessions_dir.as_ref().join(generate_session_id());
        std::fs::create_dir_all(&root)?;
        Self::open(config, root, index_path, recognizer)
    }

    /// Opens a session that reads photo stamps with the Tesseract CLI.
    pub fn open_with_tesseract(
        config: ReportConfig,
        root: impl Into<PathBuf>,
        index_path: impl Into<PathBuf>,
    ) -> ReportResult<Self> {
        let recognizer = TesseractRecognizer::new(config.tesseract.clone())
            .with_whitelist(config.fingerprint.char_whitelist.clone());
        Self::open(config, root, index_path, Box::new(recognizer))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The in-memory index, including updates made during this session.
    pub fn index(&self) -> &MasterIndex {
        &self.index
    }

    /// The summary accumulated so far.
    pub fn summary(&self) -> &SessionReport {
        &self.summary
    }

    /// Runs every check on one document.
    pub fn process_document(&mut self, input: DocumentInput) -> DocumentReport {
        self.process_document_with_progress(input, &mut |_, _| {})
    }

    /// Runs every check on one document, reporting photo progress.
    pub fn process_document_with_progress(
        &mut self,
        input: DocumentInput,
        progress: &mut dyn FnMut(usize, usize),
    ) -> DocumentReport {
        let DocumentInput {
            file_name,
            tokens,
            images,
            structured,
        } = input;
        tracing::info!(session = %self.id, "processing {}", file_name);

        let tokens = if self.dedup_window_tokens {
            dedup_window_tokens(tokens)
        } else {
            tokens
        };

        let entities = self.merger.merge(&tokens);
        let key_values = self.reconstructor.reconstruct(&entities);
        let structured = structured.unwrap_or_else(|| key_values.to_structured_record());

        let rule = self.classifier.classify(&structured, &file_name);
        let document_type = rule.code.clone();
        let fields = self.validator.validate(&structured, rule);
        let completeness = self.completeness.check(&tokens);

        let photos = self.photos.process_with_progress(
            PhotoBatch {
                images: &images,
                project_name: &file_name,
                session_root: &self.root,
            },
            &mut self.index,
            progress,
        );

        let report = DocumentReport {
            file_name,
            document_type,
            key_values,
            structured,
            completeness,
            fields,
            photos,
        };
        self.summary.absorb(&report);
        report
    }

    /// Writes the index back in full and returns the session summary.
    pub fn finish(self) -> ReportResult<SessionReport> {
        self.index.save(&self.index_path)?;
        tracing::info!(
            session = %self.id,
            "session finished: {} documents, {} duplicates",
            self.summary.projects.len(),
            self.summary.total_duplicates
        );
        Ok(self.summary)
    }
}
