//! Document-type rule table and completeness checklist.

use super::errors::{ConfigError, ConfigValidator};
use crate::processors::normalize_alnum;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Rule for one document type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentTypeRule {
    /// Short type code, e.g. `BAUT`.
    pub code: String,
    /// Human readable document name.
    pub display_name: String,
    /// Fields that must be filled in a structured record of this type.
    #[serde(default)]
    pub required_fields: Vec<String>,
    /// Phrases that identify this type in a title field or file name.
    #[serde(default)]
    pub identifying_phrases: Vec<String>,
}

impl DocumentTypeRule {
    /// Creates a rule with no required fields and no identifying phrases.
    pub fn new(code: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            display_name: display_name.into(),
            required_fields: Vec::new(),
            identifying_phrases: Vec::new(),
        }
    }

    /// Sets the required fields.
    pub fn with_required_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the identifying phrases.
    pub fn with_identifying_phrases<I, S>(mut self, phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.identifying_phrases = phrases.into_iter().map(Into::into).collect();
        self
    }
}

/// Rule table used by the document-type classifier and the field validator.
///
/// The order of `types` is the detection precedence: when phrases of several
/// types match, the type listed first wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRules {
    /// Known document types in precedence order.
    pub types: Vec<DocumentTypeRule>,
    /// Code of the fallback type; must be present in `types`.
    pub default_type: String,
    /// Record fields inspected first when looking for identifying phrases.
    #[serde(default = "DocumentRules::default_title_fields")]
    pub title_fields: Vec<String>,
}

impl DocumentRules {
    /// Looks up a rule by its code.
    pub fn rule(&self, code: &str) -> Option<&DocumentTypeRule> {
        self.types.iter().find(|rule| rule.code == code)
    }

    /// Types that take part in phrase detection, in precedence order.
    pub fn detectable_types(&self) -> impl Iterator<Item = &DocumentTypeRule> {
        self.types
            .iter()
            .filter(|rule| !rule.identifying_phrases.is_empty())
    }

    fn default_title_fields() -> Vec<String> {
        vec!["SECTION".to_string(), "Tipe_Dokumen".to_string()]
    }
}

impl Default for DocumentRules {
    fn default() -> Self {
        let shared = ["PROYEK", "KONTRAK", "WITEL", "DISTRICT", "LOKASI", "PELAKSANA"];
        Self {
            types: vec![
                DocumentTypeRule::new("BACT", "Berita Acara Commissioning Test")
                    .with_required_fields(
                        shared
                            .iter()
                            .copied()
                            .chain(["TANGGAL", "HARI", "BULAN", "TAHUN"]),
                    )
                    .with_identifying_phrases(["COMMISSIONING TEST", "BACT", "BATC"]),
                DocumentTypeRule::new("BAUT", "Berita Acara Uji Terima")
                    .with_required_fields(shared.iter().copied().chain([
                        "NO_BAUT",
                        "TANGGAL",
                        "SP",
                        "S_PERMOHONAN",
                    ]))
                    .with_identifying_phrases(["UJI TERIMA", "BAUT"]),
                DocumentTypeRule::new("UMUM", "Dokumen Umum").with_required_fields(["PROYEK"]),
            ],
            default_type: "UMUM".to_string(),
            title_fields: Self::default_title_fields(),
        }
    }
}

impl ConfigValidator for DocumentRules {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.types.is_empty() {
            return Err(ConfigError::Empty {
                field: "types".to_string(),
            });
        }
        let mut seen = HashSet::new();
        for rule in &self.types {
            if rule.code.trim().is_empty() {
                return Err(ConfigError::Empty {
                    field: "types[].code".to_string(),
                });
            }
            if !seen.insert(rule.code.as_str()) {
                return Err(ConfigError::Duplicate {
                    what: "document type",
                    value: rule.code.clone(),
                });
            }
            if rule.identifying_phrases.iter().any(|p| p.trim().is_empty()) {
                return Err(ConfigError::Empty {
                    field: format!("{}.identifying_phrases[]", rule.code),
                });
            }
        }
        if self.rule(&self.default_type).is_none() {
            return Err(ConfigError::Undefined {
                what: "default document type",
                value: self.default_type.clone(),
            });
        }
        Ok(())
    }
}

/// Required-phrase checklist for the completeness check.
///
/// An empty list is valid: the check is then reported as skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletenessRules {
    /// Phrases that must appear somewhere in the document, in report order.
    #[serde(default)]
    pub required_phrases: Vec<String>,
}

impl CompletenessRules {
    /// Creates a checklist from any list of phrases.
    pub fn new<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            required_phrases: phrases.into_iter().map(Into::into).collect(),
        }
    }
}

impl Default for CompletenessRules {
    fn default() -> Self {
        Self::new([
            "DOKUMEN BERITA ACARA UJI TERIMA KESATU",
            "CHECKLIST VERIFIKASI BA UJI TERIMA",
            "BERITA ACARA",
            "LAPORAN",
            "DAFTAR HADIR UJI TERIMA",
            "BOQ UJI TERIMA",
            "DOKUMENTASI UJI TERIMA",
            "FORM PENGUKURAN OPM",
            "PENGUKURAN OPM",
            "PENGUKURAN OTDR",
            "REPORT OTDR",
            "DOKUMENTASI PEKERJAAN",
            "AS BUILT DRAWING",
            "LAMPIRAN MANCORE",
            "LAMPIRAN KML",
        ])
    }
}

impl ConfigValidator for CompletenessRules {
    fn validate(&self) -> Result<(), ConfigError> {
        // A phrase that normalizes to "" would always match.
        if let Some(phrase) = self
            .required_phrases
            .iter()
            .find(|p| normalize_alnum(p).is_empty())
        {
            return Err(ConfigError::Empty {
                field: format!("required_phrases['{phrase}']"),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rules_are_valid() {
        let rules = DocumentRules::default();
        assert!(rules.validate().is_ok());
        assert_eq!(rules.types[0].code, "BACT");
        assert_eq!(rules.rule("BAUT").unwrap().required_fields.len(), 10);
        assert_eq!(rules.detectable_types().count(), 2);
    }

    #[test]
    fn test_missing_default_type_is_rejected() {
        let rules = DocumentRules {
            default_type: "GENERIC".to_string(),
            ..DocumentRules::default()
        };
        assert_eq!(
            rules.validate().unwrap_err(),
            ConfigError::Undefined {
                what: "default document type",
                value: "GENERIC".to_string()
            }
        );
    }

    #[test]
    fn test_duplicate_type_code_is_rejected() {
        let mut rules = DocumentRules::default();
        rules.types.push(DocumentTypeRule::new("BAUT", "Copy"));
        assert!(matches!(
            rules.validate(),
            Err(ConfigError::Duplicate { .. })
        ));
    }

    #[test]
    fn test_rules_deserialize_with_default_title_fields() {
        let json = r#"{
            "types": [{"code": "UMUM", "display_name": "Dokumen Umum"}],
            "default_type": "UMUM"
        }"#;
        let rules: DocumentRules = serde_json::from_str(json).unwrap();
        assert_eq!(rules.title_fields, vec!["SECTION", "Tipe_Dokumen"]);
        assert!(rules.types[0].required_fields.is_empty());
    }

    #[test]
    fn test_punctuation_only_phrase_is_rejected() {
        let rules = CompletenessRules::new(["BERITA ACARA", " - "]);
        assert!(rules.validate().is_err());
        assert!(CompletenessRules::default().validate().is_ok());
        assert!(CompletenessRules::new(Vec::<String>::new()).validate().is_ok());
    }

    #[test]
    fn test_non_ascii_only_phrase_is_rejected() {
        assert!(CompletenessRules::new(["é"]).validate().is_err());
        assert!(CompletenessRules::new(["ÉTAT 2"]).validate().is_ok());
    }
}
