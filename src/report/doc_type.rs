//! Document type detection.

use crate::core::config::{ConfigError, ConfigValidator, DocumentRules, DocumentTypeRule};
use crate::core::errors::ReportResult;
use crate::domain::StructuredRecord;

/// Where a document type was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionSource {
    /// An identifying phrase occurred in one of the title fields.
    TitleField,
    /// An identifying phrase occurred in the file name.
    FileName,
    /// Nothing matched; the default type was used.
    Fallback,
}

/// Infers the document type from a structured record or a file name.
#[derive(Debug, Clone)]
pub struct DocumentTypeClassifier {
    rules: DocumentRules,
    default_index: usize,
}

impl DocumentTypeClassifier {
    /// Creates a classifier, validating the rule table first.
    pub fn new(rules: DocumentRules) -> ReportResult<Self> {
        rules.validate()?;
        let default_index = rules
            .types
            .iter()
            .position(|rule| rule.code == rules.default_type)
            .ok_or_else(|| ConfigError::Undefined {
                what: "default document type",
                value: rules.default_type.clone(),
            })?;
        Ok(Self {
            rules,
            default_index,
        })
    }

    /// The rule table in use.
    pub fn rules(&self) -> &DocumentRules {
        &self.rules
    }

    /// The fallback rule.
    pub fn default_rule(&self) -> &DocumentTypeRule {
        &self.rules.types[self.default_index]
    }

    /// Returns the detected rule.
    pub fn classify(&self, record: &StructuredRecord, file_name: &str) -> &DocumentTypeRule {
        self.classify_with_source(record, file_name).0
    }

    /// Returns the detected rule and where it was detected.
    ///
    /// Title fields are inspected before the file name. Within each source the
    /// rule table is walked in order, so the first listed type whose phrase
    /// occurs wins. Matching is a case-insensitive substring test.
    pub fn classify_with_source(
        &self,
        record: &StructuredRecord,
        file_name: &str,
    ) -> (&DocumentTypeRule, DetectionSource) {
        let titles: Vec<String> = self
            .rules
            .title_fields
            .iter()
            .filter_map(|field| record.field_text(field))
            .map(|text| text.to_uppercase())
            .collect();
        if let Some(rule) = self.first_match(&titles) {
            tracing::debug!("document type {} detected from title fields", rule.code);
            return (rule, DetectionSource::TitleField);
        }

        if let Some(rule) = self.first_match(&[file_name.to_uppercase()]) {
            tracing::debug!("document type {} detected from file name '{}'", rule.code, file_name);
            return (rule, DetectionSource::FileName);
        }

        let rule = self.default_rule();
        tracing::debug!("no identifying phrase for '{}', using {}", file_name, rule.code);
        (rule, DetectionSource::Fallback)
    }

    fn first_match(&self, haystacks: &[String]) -> Option<&DocumentTypeRule> {
        if haystacks.is_empty() {
            return None;
        }
        self.rules.detectable_types().find(|rule| {
            rule.identifying_phrases.iter().any(|phrase| {
                let phrase = phrase.to_uppercase();
                haystacks.iter().any(|text| text.contains(&phrase))
            })
        })
    }
}
