//! Result and report types exposed to the orchestration layer.
//!
//! Field names of the reports follow the JSON contract consumed by the
//! existing front end, which is why several of them serialize under their
//! Indonesian names.

use crate::core::constants::UPSTREAM_ERROR_KEY;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Key-value pairs reconstructed for one page.
pub type PagePairs = BTreeMap<String, String>;

/// Key-value pairs per page.
///
/// Serializes as `{"<page>": {"<key>": "<value>"}}`. Pages without a single
/// pair are never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyValueRecord {
    pages: BTreeMap<u32, PagePairs>,
}

impl KeyValueRecord {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a pair, returning the value it replaced on that page.
    pub fn insert(
        &mut self,
        page: u32,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Option<String> {
        self.pages
            .entry(page)
            .or_default()
            .insert(key.into(), value.into())
    }

    /// Adds all pairs of one page; empty maps are ignored.
    pub fn extend_page(&mut self, page: u32, pairs: PagePairs) {
        if pairs.is_empty() {
            return;
        }
        self.pages.entry(page).or_default().extend(pairs);
    }

    /// Pairs of one page.
    pub fn page(&self, page: u32) -> Option<&PagePairs> {
        self.pages.get(&page)
    }

    /// Looks up a single value.
    pub fn get(&self, page: u32, key: &str) -> Option<&str> {
        self.page(page)?.get(key).map(String::as_str)
    }

    /// Iterates pages in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &PagePairs)> {
        self.pages.iter().map(|(page, pairs)| (*page, pairs))
    }

    /// True when no page produced a pair.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Number of pages with at least one pair.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Total number of pairs across pages.
    pub fn pair_count(&self) -> usize {
        self.pages.values().map(BTreeMap::len).sum()
    }

    /// Flattens all pages into one record; on a repeated key the lowest page wins.
    pub fn to_structured_record(&self) -> StructuredRecord {
        let mut record = StructuredRecord::new();
        for (_, pairs) in self.iter() {
            for (key, value) in pairs {
                if record.get(key).is_none() {
                    record.insert(key.clone(), Value::String(value.clone()));
                }
            }
        }
        record
    }
}

/// A string-keyed structured record, as produced by the reconstructor or by an
/// external text-generation model.
///
/// A record holding an `error` key signals that the stage producing it failed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StructuredRecord {
    fields: Map<String, Value>,
}

impl StructuredRecord {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a record that carries only the upstream error sentinel.
    pub fn upstream_error(detail: impl Into<String>) -> Self {
        let mut record = Self::new();
        record.insert(UPSTREAM_ERROR_KEY, Value::String(detail.into()));
        record
    }

    /// Sets a field.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.fields.insert(key.into(), value)
    }

    /// Raw access to a field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// The upstream error detail, when the sentinel is present.
    pub fn error(&self) -> Option<String> {
        self.fields.get(UPSTREAM_ERROR_KEY).map(value_to_text)
    }

    /// A present field rendered as text, `null` included (as `"null"`).
    pub fn stringified(&self, key: &str) -> Option<String> {
        self.fields.get(key).map(value_to_text)
    }

    /// A field rendered as text; `null` and absent fields yield `None`.
    pub fn field_text(&self, key: &str) -> Option<String> {
        match self.fields.get(key)? {
            Value::Null => None,
            value => Some(value_to_text(value)),
        }
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True when the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl From<Map<String, Value>> for StructuredRecord {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Outcome of a validation check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportStatus {
    /// Everything required was found.
    Complete,
    /// Something required is missing.
    Incomplete,
    /// Nothing to check.
    Skipped,
    /// The check could not run because an earlier stage failed.
    Failed,
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportStatus::Complete => write!(f, "COMPLETE"),
            ReportStatus::Incomplete => write!(f, "INCOMPLETE"),
            ReportStatus::Skipped => write!(f, "SKIPPED"),
            ReportStatus::Failed => write!(f, "FAILED"),
        }
    }
}

/// Result of the required-phrase check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletenessReport {
    pub status: ReportStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Phrases found, in checklist order and original spelling.
    #[serde(rename = "frasa_ditemukan", default)]
    pub found: Vec<String>,
    /// Phrases not found, in checklist order and original spelling.
    #[serde(rename = "frasa_tidak_ditemukan", default)]
    pub missing: Vec<String>,
}

/// Result of the required-field check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldValidationReport {
    pub status: ReportStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Error carried by the record when `status` is `FAILED`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail_error: Option<String>,
    #[serde(rename = "field_wajib", default)]
    pub required: Vec<String>,
    #[serde(rename = "field_terisi", default)]
    pub filled: Vec<String>,
    #[serde(rename = "field_kosong", default)]
    pub missing: Vec<String>,
}

/// First-seen provenance of a photo fingerprint.
///
/// Index files written with the Indonesian keys (`sesi_asli`,
/// `proyek_asli`, `path_relatif_di_sesi`) are accepted on input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    #[serde(alias = "sesi_asli")]
    pub session_id: String,
    #[serde(alias = "proyek_asli")]
    pub project_name: String,
    /// Slash-separated path relative to the session root.
    #[serde(alias = "path_relatif_di_sesi")]
    pub relative_path: String,
}

/// A photo whose fingerprint was already indexed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateDetail {
    /// Path of the duplicate, relative to the current session root.
    #[serde(rename = "duplikat_ditemukan")]
    pub path: String,
    /// The entry that indexed the fingerprint first.
    #[serde(rename = "duplikat_dari_petunjuk")]
    pub original: IndexEntry,
}

/// Whether a photo batch ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchStatus {
    Completed,
    Skipped,
}

/// Result of fingerprinting one project's photos.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateReport {
    pub status: BatchStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Number of images handed in.
    #[serde(rename = "jumlah_gambar_diproses")]
    pub total: usize,
    /// Images processed without error, non-distinctive ones included.
    #[serde(rename = "berhasil_diproses")]
    pub succeeded: usize,
    #[serde(rename = "duplikat_ditemukan")]
    pub duplicate_count: usize,
    #[serde(rename = "file_unik_baru_dicatat")]
    pub new_unique_count: usize,
    #[serde(rename = "detail_duplikat", default)]
    pub duplicates: Vec<DuplicateDetail>,
    #[serde(default)]
    pub error_log: Vec<String>,
}

impl DuplicateReport {
    /// Report for an empty image list.
    pub fn skipped(message: impl Into<String>) -> Self {
        Self {
            status: BatchStatus::Skipped,
            message: Some(message.into()),
            total: 0,
            succeeded: 0,
            duplicate_count: 0,
            new_unique_count: 0,
            duplicates: Vec::new(),
            error_log: Vec::new(),
        }
    }
}

/// Everything produced for one document of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentReport {
    #[serde(rename = "nama_file")]
    pub file_name: String,
    /// Detected document type code.
    #[serde(rename = "tipe_dokumen")]
    pub document_type: String,
    #[serde(rename = "data_key_value")]
    pub key_values: KeyValueRecord,
    #[serde(rename = "data_terstruktur")]
    pub structured: StructuredRecord,
    #[serde(rename = "validasi_kelengkapan")]
    pub completeness: CompletenessReport,
    #[serde(rename = "validasi_isian_data")]
    pub fields: FieldValidationReport,
    #[serde(rename = "validasi_duplikasi_foto")]
    pub photos: DuplicateReport,
}

/// Per-project line of the session summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSummary {
    #[serde(rename = "nama_file")]
    pub file_name: String,
    #[serde(rename = "status_kelengkapan")]
    pub completeness_status: ReportStatus,
}

/// Aggregate over every document processed in a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionReport {
    #[serde(rename = "id_sesi")]
    pub session_id: String,
    #[serde(rename = "proyek_yang_diproses")]
    pub projects: Vec<ProjectSummary>,
    #[serde(rename = "total_gambar_diproses")]
    pub total_images: usize,
    #[serde(rename = "total_duplikat_ditemukan")]
    pub total_duplicates: usize,
    #[serde(rename = "total_file_unik_baru")]
    pub total_new_unique: usize,
    #[serde(rename = "semua_detail_duplikat")]
    pub duplicates: Vec<DuplicateDetail>,
    #[serde(rename = "semua_error_log")]
    pub error_log: Vec<String>,
}

impl SessionReport {
    /// Folds one document's results into the summary.
    pub fn absorb(&mut self, document: &DocumentReport) {
        self.projects.push(ProjectSummary {
            file_name: document.file_name.clone(),
            completeness_status: document.completeness.status,
        });
        self.total_images += document.photos.total;
        self.total_duplicates += document.photos.duplicate_count;
        self.total_new_unique += document.photos.new_unique_count;
        self.duplicates
            .extend(document.photos.duplicates.iter().cloned());
        self.error_log.extend(document.photos.error_log.iter().cloned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_key_value_record_serializes_pages_as_strings() {
        let mut record = KeyValueRecord::new();
        record.insert(2, "PROYEK", "Jakarta");
        record.insert(10, "WITEL", "Bekasi");
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            json!({"2": {"PROYEK": "Jakarta"}, "10": {"WITEL": "Bekasi"}})
        );
        let back: KeyValueRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_extend_page_ignores_empty_pages() {
        let mut record = KeyValueRecord::new();
        record.extend_page(3, PagePairs::new());
        assert!(record.is_empty());
        assert_eq!(record.page_count(), 0);
    }

    #[test]
    fn test_to_structured_record_prefers_lowest_page() {
        let mut record = KeyValueRecord::new();
        record.insert(2, "PROYEK", "Second");
        record.insert(1, "PROYEK", "First");
        record.insert(2, "TANGGAL", "7-3-2024");
        let flat = record.to_structured_record();
        assert_eq!(flat.field_text("PROYEK").as_deref(), Some("First"));
        assert_eq!(flat.field_text("TANGGAL").as_deref(), Some("7-3-2024"));
        assert_eq!(record.pair_count(), 3);
    }

    #[test]
    fn test_structured_record_error_sentinel() {
        let record = StructuredRecord::upstream_error("model output was not JSON");
        assert_eq!(record.error().as_deref(), Some("model output was not JSON"));
        assert!(StructuredRecord::new().error().is_none());
    }

    #[test]
    fn test_field_text_stringifies_values() {
        let record: StructuredRecord =
            serde_json::from_value(json!({"A": " x ", "B": 12, "C": null, "D": true}))
                .unwrap();
        assert_eq!(record.field_text("A").as_deref(), Some(" x "));
        assert_eq!(record.field_text("B").as_deref(), Some("12"));
        assert_eq!(record.field_text("C"), None);
        assert_eq!(record.field_text("D").as_deref(), Some("true"));
        assert_eq!(record.field_text("E"), None);
    }

    #[test]
    fn test_reports_use_contract_field_names() {
        let report = CompletenessReport {
            status: ReportStatus::Incomplete,
            message: None,
            found: vec!["LAPORAN".to_string()],
            missing: vec!["BOQ UJI TERIMA".to_string()],
        };
        assert_eq!(
            serde_json::to_value(&report).unwrap(),
            json!({
                "status": "INCOMPLETE",
                "frasa_ditemukan": ["LAPORAN"],
                "frasa_tidak_ditemukan": ["BOQ UJI TERIMA"]
            })
        );
    }

    #[test]
    fn test_index_entry_reads_legacy_keys() {
        let entry: IndexEntry = serde_json::from_value(json!({
            "sesi_asli": "20240101-101010_abcd1234",
            "proyek_asli": "proyek.pdf",
            "path_relatif_di_sesi": "proyek/halaman_1/img_0.png"
        }))
        .unwrap();
        assert_eq!(entry.session_id, "20240101-101010_abcd1234");
        assert_eq!(entry.relative_path, "proyek/halaman_1/img_0.png");
    }

    #[test]
    fn test_skipped_duplicate_report() {
        let report = DuplicateReport::skipped("no images");
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["status"], "SKIPPED");
        assert_eq!(value["jumlah_gambar_diproses"], 0);
        assert_eq!(value["detail_duplikat"], json!([]));
    }
}
