//! Required-phrase completeness check over the raw token stream.

use crate::core::config::CompletenessRules;
use crate::core::constants::DEFAULT_CONTINUATION_MARKER;
use crate::domain::{CompletenessReport, ReportStatus, Token};
use crate::processors::{normalize_alnum, strip_leading_marker};

/// Checks that every phrase of a checklist occurs somewhere in a document.
///
/// Matching ignores case, whitespace and punctuation entirely: the document
/// text and every phrase are reduced to `[a-z0-9]` before a substring test, so
/// `B`, `E`, `R`, `I`, `T`, `A` tokens with stray dots in between still match
/// `BERITA`.
#[derive(Debug, Clone)]
pub struct CompletenessChecker {
    rules: CompletenessRules,
    marker: char,
}

impl Default for CompletenessChecker {
    fn default() -> Self {
        Self::new(CompletenessRules::default())
    }
}

impl CompletenessChecker {
    /// Creates a checker for the given checklist.
    pub fn new(rules: CompletenessRules) -> Self {
        Self {
            rules,
            marker: DEFAULT_CONTINUATION_MARKER,
        }
    }

    /// Sets the sub-word marker stripped from each token.
    pub fn with_marker(mut self, marker: char) -> Self {
        self.marker = marker;
        self
    }

    /// The checklist in use.
    pub fn rules(&self) -> &CompletenessRules {
        &self.rules
    }

    /// Runs the check over tokens in the order given; no spatial sorting.
    pub fn check(&self, tokens: &[Token]) -> CompletenessReport {
        if self.rules.required_phrases.is_empty() {
            return CompletenessReport {
                status: ReportStatus::Skipped,
                message: Some("no required phrases configured".to_string()),
                found: Vec::new(),
                missing: Vec::new(),
            };
        }

        let document: String = tokens
            .iter()
            .map(|t| strip_leading_marker(&t.text, self.marker))
            .collect();
        let document = normalize_alnum(&document);

        let (found, missing): (Vec<String>, Vec<String>) = self
            .rules
            .required_phrases
            .iter()
            .cloned()
            .partition(|phrase| document.contains(&normalize_alnum(phrase)));

        tracing::debug!(
            "completeness: {}/{} phrases found",
            found.len(),
            self.rules.required_phrases.len()
        );

        CompletenessReport {
            status: if missing.is_empty() {
                ReportStatus::Complete
            } else {
                ReportStatus::Incomplete
            },
            message: None,
            found,
            missing,
        }
    }
}
