//! Cross-session duplicate photo detection.
//!
//! Every photo is reduced to a fingerprint: the normalized OCR text of its
//! burned-in metadata stamp. The [`MasterIndex`] remembers, for every
//! fingerprint, where it was seen first. It is read once when a session opens
//! and written back in full when the session finishes; in between it lives in
//! memory and is shared by every document of the session.

use crate::core::config::FingerprintConfig;
use crate::core::errors::{ProcessingStage, ReportError, ReportResult};
use crate::domain::{BatchStatus, DuplicateDetail, DuplicateReport, IndexEntry};
use crate::predictors::MetadataRecognizer;
use crate::processors::normalize_fingerprint;
use crate::utils::load_binarized;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::error::Error;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Persistent map from fingerprint to first-seen provenance.
///
/// Entries are never overwritten: the first writer of a fingerprint wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MasterIndex {
    entries: BTreeMap<String, IndexEntry>,
}

impl MasterIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the index from `path`. A missing file yields an empty index.
    pub fn load(path: impl AsRef<Path>) -> ReportResult<Self> {
        let path = path.as_ref();
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("no master index at {}, starting empty", path.display());
                return Ok(Self::new());
            }
            Err(e) => {
                return Err(ReportError::IndexLoad {
                    path: path.to_path_buf(),
                    source: Box::new(e),
                });
            }
        };
        let index: Self = serde_json::from_str(&raw).map_err(|e| ReportError::IndexLoad {
            path: path.to_path_buf(),
            source: Box::new(e),
        })?;
        tracing::info!(
            stage = %ProcessingStage::Persistence,
            "loaded master index with {} fingerprints from {}",
            index.len(),
            path.display()
        );
        Ok(index)
    }

    /// Writes the whole index to `path`, replacing any previous content.
    ///
    /// The data goes to a temporary file next to `path` first and is then
    /// renamed over it, so readers never observe a half-written index.
    pub fn save(&self, path: impl AsRef<Path>) -> ReportResult<()> {
        let path = path.as_ref();
        self.write_atomically(path)
            .map_err(|source| ReportError::IndexSave {
                path: path.to_path_buf(),
                source,
            })?;
        tracing::info!(
            stage = %ProcessingStage::Persistence,
            "saved master index with {} fingerprints to {}",
            self.len(),
            path.display()
        );
        Ok(())
    }

    fn write_atomically(&self, path: &Path) -> Result<(), Box<dyn Error + Send + Sync>> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;
        let mut file = NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut file, &self.entries)?;
        file.write_all(b"\n")?;
        file.as_file().sync_all()?;
        file.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    /// Provenance of a fingerprint, if indexed.
    pub fn get(&self, fingerprint: &str) -> Option<&IndexEntry> {
        self.entries.get(fingerprint)
    }

    pub fn contains(&self, fingerprint: &str) -> bool {
        self.entries.contains_key(fingerprint)
    }

    /// Inserts `entry` unless the fingerprint is already indexed.
    ///
    /// Returns the existing entry, untouched, when there is one.
    pub fn insert_if_absent(
        &mut self,
        fingerprint: impl Into<String>,
        entry: IndexEntry,
    ) -> Option<&IndexEntry> {
        match self.entries.entry(fingerprint.into()) {
            Entry::Occupied(existing) => Some(&*existing.into_mut()),
            Entry::Vacant(slot) => {
                slot.insert(entry);
                None
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &IndexEntry)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// What happened to one photo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhotoOutcome {
    /// Fingerprint too short to tell photos apart; nothing recorded.
    NonDistinctive,
    /// Fingerprint was already indexed.
    Duplicate(DuplicateDetail),
    /// Fingerprint was new and is now indexed.
    Indexed,
}

/// Where a batch of photos comes from.
#[derive(Debug, Clone, Copy)]
pub struct PhotoBatch<'a> {
    /// Absolute paths of the photos.
    pub images: &'a [PathBuf],
    /// Project (document) the photos were extracted from.
    pub project_name: &'a str,
    /// Root directory of the session; provenance paths are relative to it.
    pub session_root: &'a Path,
}

/// Fingerprints photos and checks them against a [`MasterIndex`].
pub struct DuplicatePhotoIndex {
    recognizer: Box<dyn MetadataRecognizer>,
    config: FingerprintConfig,
}

impl std::fmt::Debug for DuplicatePhotoIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuplicatePhotoIndex")
            .field("recognizer", &self.recognizer.name())
            .field("config", &self.config)
            .finish()
    }
}

impl DuplicatePhotoIndex {
    pub fn new(recognizer: Box<dyn MetadataRecognizer>, config: FingerprintConfig) -> Self {
        Self { recognizer, config }
    }

    /// Reads and normalizes the metadata stamp of one photo.
    pub fn fingerprint(&self, path: &Path) -> ReportResult<String> {
        let image = load_binarized(path, self.config.binarize_cutoff)?;
        let raw = self.recognizer.recognize(&image)?;
        Ok(normalize_fingerprint(&raw))
    }

    /// Processes a batch without progress reporting.
    pub fn process(&self, batch: PhotoBatch<'_>, index: &mut MasterIndex) -> DuplicateReport {
        self.process_with_progress(batch, index, &mut |_, _| {})
    }

    /// Processes every photo of `batch` in order, updating `index`.
    ///
    /// `progress` is called with `(done, total)` after each photo. A failing
    /// photo is logged, noted in the report's error log, and skipped. An empty
    /// batch is reported as skipped and leaves the index alone.
    pub fn process_with_progress(
        &self,
        batch: PhotoBatch<'_>,
        index: &mut MasterIndex,
        progress: &mut dyn FnMut(usize, usize),
    ) -> DuplicateReport {
        let total = batch.images.len();
        if total == 0 {
            return DuplicateReport::skipped("no images to process");
        }

        let session_id = session_id_of(batch.session_root);
        let mut report = DuplicateReport {
            status: BatchStatus::Completed,
            message: None,
            total,
            succeeded: 0,
            duplicate_count: 0,
            new_unique_count: 0,
            duplicates: Vec::new(),
            error_log: Vec::new(),
        };

        for (i, path) in batch.images.iter().enumerate() {
            match self.process_one(path, &batch, &session_id, index) {
                Ok(outcome) => {
                    report.succeeded += 1;
                    match outcome {
                        PhotoOutcome::NonDistinctive => {}
                        PhotoOutcome::Duplicate(detail) => {
                            report.duplicate_count += 1;
                            report.duplicates.push(detail);
                        }
                        PhotoOutcome::Indexed => report.new_unique_count += 1,
                    }
                }
                Err(err) => {
                    let name = path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_else(|| path.display().to_string());
                    let message = format!("error on file {}: {}", name, error_chain(&err));
                    let stage = err.stage().unwrap_or(ProcessingStage::Fingerprinting);
                    tracing::warn!(stage = %stage, "{}", message);
                    report.error_log.push(message);
                }
            }
            progress(i + 1, total);
        }

        tracing::info!(
            project = batch.project_name,
            "photos: {} processed, {} ok, {} duplicates, {} new",
            report.total,
            report.succeeded,
            report.duplicate_count,
            report.new_unique_count
        );
        report
    }

    fn process_one(
        &self,
        path: &Path,
        batch: &PhotoBatch<'_>,
        session_id: &str,
        index: &mut MasterIndex,
    ) -> ReportResult<PhotoOutcome> {
        let fingerprint = self.fingerprint(path)?;
        if fingerprint.chars().count() < self.config.min_length {
            tracing::debug!("non-distinctive fingerprint '{}' for {}", fingerprint, path.display());
            return Ok(PhotoOutcome::NonDistinctive);
        }

        let relative_path = relative_path(path, batch.session_root);
        let entry = IndexEntry {
            session_id: session_id.to_string(),
            project_name: batch.project_name.to_string(),
            relative_path: relative_path.clone(),
        };
        match index.insert_if_absent(fingerprint, entry) {
            Some(original) => Ok(PhotoOutcome::Duplicate(DuplicateDetail {
                path: relative_path,
                original: original.clone(),
            })),
            None => Ok(PhotoOutcome::Indexed),
        }
    }
}

/// The session id is the name of the session root directory.
fn session_id_of(session_root: &Path) -> String {
    session_root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| session_root.display().to_string())
}

/// Path of `path` relative to `root`, with `/` separators.
///
/// Paths outside `root` are kept whole.
pub fn relative_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

fn error_chain(err: &dyn Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};
    use std::collections::HashMap;

    /// Answers with a fixed text per image width.
    struct StubRecognizer {
        by_width: HashMap<u32, String>,
    }

    impl StubRecognizer {
        fn boxed(pairs: &[(u32, &str)]) -> Box<dyn MetadataRecognizer> {
            Box::new(Self {
                by_width: pairs.iter().map(|(w, t)| (*w, t.to_string())).collect(),
            })
        }
    }

    impl MetadataRecognizer for StubRecognizer {
        fn name(&self) -> &str {
            "stub"
        }

        fn recognize(&self, image: &GrayImage) -> ReportResult<String> {
            self.by_width
                .get(&image.width())
                .cloned()
                .ok_or_else(|| ReportError::recognition_failed("stub", "unreadable stamp"))
        }
    }

    fn write_png(dir: &Path, rel: &str, width: u32) -> PathBuf {
        let path = dir.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        GrayImage::from_pixel(width, 2, Luma([255])).save(&path).unwrap();
        path
    }

    fn photo_index(pairs: &[(u32, &str)]) -> DuplicatePhotoIndex {
        DuplicatePhotoIndex::new(StubRecognizer::boxed(pairs), FingerprintConfig::default())
    }

    #[test]
    fn test_second_image_with_same_fingerprint_is_duplicate() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("20240307-101500_abcd1234");
        let first = write_png(&root, "proyek_a/halaman_1/img_0.png", 10);
        let second = write_png(&root, "proyek_a/halaman_2/img_0.png", 11);
        let photos = photo_index(&[(10, "07/03/2024 10:15 Jakarta"), (11, "07/03/2024   10:15 Jakarta!")]);

        let mut index = MasterIndex::new();
        let images = vec![first, second];
        let report = photos.process(
            PhotoBatch {
                images: &images,
                project_name: "proyek_a.pdf",
                session_root: &root,
            },
            &mut index,
        );

        assert_eq!(report.status, BatchStatus::Completed);
        assert_eq!((report.total, report.succeeded), (2, 2));
        assert_eq!(report.new_unique_count, 1);
        assert_eq!(report.duplicate_count, 1);
        assert_eq!(report.duplicates.len(), 1);
        let detail = &report.duplicates[0];
        assert_eq!(detail.path, "proyek_a/halaman_2/img_0.png");
        assert_eq!(detail.original.relative_path, "proyek_a/halaman_1/img_0.png");
        assert_eq!(detail.original.session_id, "20240307-101500_abcd1234");

        assert_eq!(index.len(), 1);
        let entry = index.get("07-03-2024 10:15 Jakarta").unwrap();
        assert_eq!(entry.relative_path, "proyek_a/halaman_1/img_0.png");
        assert_eq!(entry.project_name, "proyek_a.pdf");
    }

    #[test]
    fn test_existing_entry_from_earlier_session_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("session_2");
        let image = write_png(&root, "p/img.png", 12);
        let photos = photo_index(&[(12, "ODP-JKT-01 -6.2 106.8")]);

        let earlier = IndexEntry {
            session_id: "session_1".to_string(),
            project_name: "old.pdf".to_string(),
            relative_path: "old/img.png".to_string(),
        };
        let mut index = MasterIndex::new();
        index.insert_if_absent("ODP-JKT-01 -6.2 106.8", earlier.clone());

        let images = vec![image];
        let report = photos.process(
            PhotoBatch {
                images: &images,
                project_name: "new.pdf",
                session_root: &root,
            },
            &mut index,
        );
        assert_eq!(report.duplicate_count, 1);
        assert_eq!(report.duplicates[0].original, earlier);
        assert_eq!(index.get("ODP-JKT-01 -6.2 106.8"), Some(&earlier));
    }

    #[test]
    fn test_short_fingerprint_is_non_distinctive() {
        let dir = tempfile::tempdir().unwrap();
        let image = write_png(dir.path(), "a.png", 5);
        let photos = photo_index(&[(5, " 1 2 ")]);
        let mut index = MasterIndex::new();
        let images = vec![image];
        let report = photos.process(
            PhotoBatch {
                images: &images,
                project_name: "p",
                session_root: dir.path(),
            },
            &mut index,
        );
        assert_eq!(report.succeeded, 1);
        assert_eq!(report.duplicate_count + report.new_unique_count, 0);
        assert!(index.is_empty());
    }

    #[test]
    fn test_failures_are_logged_and_batch_continues() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.png");
        let unreadable = write_png(dir.path(), "unreadable.png", 7);
        let good = write_png(dir.path(), "good.png", 8);
        let photos = photo_index(&[(8, "12/1/2023 Bekasi")]);

        let mut index = MasterIndex::new();
        let images = vec![missing, unreadable, good];
        let report = photos.process(
            PhotoBatch {
                images: &images,
                project_name: "p",
                session_root: dir.path(),
            },
            &mut index,
        );
        assert_eq!(report.total, 3);
        assert_eq!(report.succeeded, 1);
        assert_eq!(report.new_unique_count, 1);
        assert_eq!(report.error_log.len(), 2);
        assert!(report.error_log[0].contains("missing.png"));
        assert!(report.error_log[1].contains("unreadable stamp"));
        assert!(index.contains("12-1-2023 Bekasi"));
    }

    #[test]
    fn test_empty_batch_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let photos = photo_index(&[]);
        let mut index = MasterIndex::new();
        let report = photos.process(
            PhotoBatch {
                images: &[],
                project_name: "p",
                session_root: dir.path(),
            },
            &mut index,
        );
        assert_eq!(report.status, BatchStatus::Skipped);
        assert!(report.message.is_some());
        assert!(index.is_empty());
    }

    #[test]
    fn test_progress_is_reported_after_each_file() {
        let dir = tempfile::tempdir().unwrap();
        let images = vec![
            write_png(dir.path(), "a.png", 20),
            dir.path().join("missing.png"),
            write_png(dir.path(), "c.png", 21),
        ];
        let photos = photo_index(&[(20, "fingerprint one"), (21, "fingerprint two")]);
        let mut calls = Vec::new();
        let mut index = MasterIndex::new();
        photos.process_with_progress(
            PhotoBatch {
                images: &images,
                project_name: "p",
                session_root: dir.path(),
            },
            &mut index,
            &mut |done, total| calls.push((done, total)),
        );
        assert_eq!(calls, vec![(1, 3), (2, 3), (3, 3)]);
    }

    #[test]
    fn test_relative_path() {
        let root = Path::new("/data/sessions/s1");
        assert_eq!(
            relative_path(Path::new("/data/sessions/s1/p/halaman_1/img.png"), root),
            "p/halaman_1/img.png"
        );
        assert_eq!(
            relative_path(Path::new("/elsewhere/img.png"), root),
            "/elsewhere/img.png"
        );
    }

    #[test]
    fn test_master_index_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let index = MasterIndex::load(dir.path().join("master_index.json")).unwrap();
        assert!(index.is_empty());
    }

    #[test]
    fn test_master_index_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/master_index.json");
        let mut index = MasterIndex::new();
        index.insert_if_absent(
            "07-03-2024 Jakarta",
            IndexEntry {
                session_id: "s1".to_string(),
                project_name: "a.pdf".to_string(),
                relative_path: "a/img.png".to_string(),
            },
        );
        index.save(&path).unwrap();
        assert_eq!(MasterIndex::load(&path).unwrap(), index);

        // A second save replaces the file in full.
        MasterIndex::new().save(&path).unwrap();
        assert!(MasterIndex::load(&path).unwrap().is_empty());
    }

    #[test]
    fn test_master_index_reads_legacy_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("master_index.json");
        std::fs::write(
            &path,
            r#"{"07-03-2024 Jakarta": {"sesi_asli": "s0", "proyek_asli": "x.pdf", "path_relatif_di_sesi": "x/img.png"}}"#,
        )
        .unwrap();
        let index = MasterIndex::load(&path).unwrap();
        assert_eq!(index.get("07-03-2024 Jakarta").unwrap().session_id, "s0");
    }

    #[test]
    fn test_master_index_corrupt_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("master_index.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = MasterIndex::load(&path).unwrap_err();
        assert!(matches!(err, ReportError::IndexLoad { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_master_index_save_failure_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "").unwrap();
        let err = MasterIndex::new()
            .save(blocker.join("master_index.json"))
            .unwrap_err();
        assert!(matches!(err, ReportError::IndexSave { .. }));
    }
}
