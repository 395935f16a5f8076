//! Required-field validation of structured records.

use crate::core::config::DocumentTypeRule;
use crate::domain::{FieldValidationReport, ReportStatus, StructuredRecord};

/// Checks that the fields a document type requires are filled.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldValidator;

impl FieldValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validates `record` against the required fields of `rule`.
    ///
    /// A record carrying the upstream `error` sentinel short-circuits into
    /// `FAILED` without looking at any field. Otherwise a field is filled when
    /// it is present and non-blank once stringified; `null` stringifies to
    /// `"null"` and so counts as filled.
    pub fn validate(&self, record: &StructuredRecord, rule: &DocumentTypeRule) -> FieldValidationReport {
        if let Some(detail) = record.error() {
            tracing::warn!("field validation skipped for {}: upstream error: {}", rule.code, detail);
            return FieldValidationReport {
                status: ReportStatus::Failed,
                message: Some("structured record carries an upstream error".to_string()),
                detail_error: Some(detail),
                required: rule.required_fields.clone(),
                filled: Vec::new(),
                missing: Vec::new(),
            };
        }

        let (filled, missing): (Vec<String>, Vec<String>) =
            rule.required_fields.iter().cloned().partition(|field| {
                record
                    .stringified(field)
                    .is_some_and(|text| !text.trim().is_empty())
            });

        FieldValidationReport {
            status: if missing.is_empty() {
                ReportStatus::Complete
            } else {
                ReportStatus::Incomplete
            },
            message: None,
            detail_error: None,
            required: rule.required_fields.clone(),
            filled,
            missing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rule() -> DocumentTypeRule {
        DocumentTypeRule::new("BACT", "Berita Acara Commissioning Test")
            .with_required_fields(["PROYEK", "TANGGAL", "TAHUN"])
    }

    fn record(value: serde_json::Value) -> StructuredRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_missing_field_is_reported() {
        let report = FieldValidator::new().validate(
            &record(json!({"PROYEK": "Jakarta", "TAHUN": 2024})),
            &rule(),
        );
        assert_eq!(report.status, ReportStatus::Incomplete);
        assert_eq!(report.missing, vec!["TANGGAL"]);
        assert!(!report.filled.contains(&"TANGGAL".to_string()));
        assert_eq!(report.filled, vec!["PROYEK", "TAHUN"]);
        assert_eq!(report.required.len(), 3);
    }

    #[test]
    fn test_blank_field_is_missing() {
        let report = FieldValidator::new().validate(
            &record(json!({"PROYEK": "   ", "TANGGAL": "\t\n", "TAHUN": "2024"})),
            &rule(),
        );
        assert_eq!(report.missing, vec!["PROYEK", "TANGGAL"]);
        assert_eq!(report.filled, vec!["TAHUN"]);
    }

    #[test]
    fn test_null_field_counts_as_filled() {
        let report = FieldValidator::new().validate(
            &record(json!({"PROYEK": null, "TANGGAL": false, "TAHUN": 0})),
            &rule(),
        );
        assert_eq!(report.status, ReportStatus::Complete);
        assert_eq!(report.filled, vec!["PROYEK", "TANGGAL", "TAHUN"]);
    }

    #[test]
    fn test_all_filled_is_complete() {
        let report = FieldValidator::new().validate(
            &record(json!({"PROYEK": "A", "TANGGAL": "7", "TAHUN": "2024", "EXTRA": ""})),
            &rule(),
        );
        assert_eq!(report.status, ReportStatus::Complete);
        assert!(report.missing.is_empty());
    }

    #[test]
    fn test_upstream_error_fails_without_checking_fields() {
        let report = FieldValidator::new().validate(
            &StructuredRecord::upstream_error("generation timed out"),
            &rule(),
        );
        assert_eq!(report.status, ReportStatus::Failed);
        assert_eq!(report.detail_error.as_deref(), Some("generation timed out"));
        assert!(report.filled.is_empty());
        assert!(report.missing.is_empty());
    }

    #[test]
    fn test_rule_without_required_fields_is_complete() {
        let report = FieldValidator::new().validate(
            &StructuredRecord::new(),
            &DocumentTypeRule::new("X", "Nothing required"),
        );
        assert_eq!(report.status, ReportStatus::Complete);
    }
}
