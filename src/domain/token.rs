//! Classified tokens, roles and merged entities.
//!
//! Tokens are what the external layout-classification model hands over: a
//! piece of text, the label it was classified as, its normalized box and the
//! page it came from. Entities are runs of tokens that share box and label.

use crate::core::errors::{ReportError, ReportResult};
use crate::processors::NormBox;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

fn default_page() -> u32 {
    1
}

/// One classified token from the layout model.
///
/// The legacy field names `token` (for `text`) and `halaman_asal` (for `page`)
/// are accepted on input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Token text, possibly starting with a sub-word marker.
    #[serde(alias = "token")]
    pub text: String,
    /// Label predicted by the layout model, e.g. `PROYEK_KEY`.
    pub label: String,
    /// Normalized bounding box.
    #[serde(rename = "box")]
    pub bbox: NormBox,
    /// 1-based page number.
    #[serde(default = "default_page", alias = "halaman_asal")]
    pub page: u32,
}

impl Token {
    /// Creates a token.
    pub fn new(
        text: impl Into<String>,
        label: impl Into<String>,
        bbox: impl Into<NormBox>,
        page: u32,
    ) -> Self {
        Self {
            text: text.into(),
            label: label.into(),
            bbox: bbox.into(),
            page,
        }
    }

    /// Rejects tokens the rest of the pipeline cannot reason about.
    pub fn validate(&self) -> ReportResult<()> {
        if self.label.trim().is_empty() {
            return Err(ReportError::invalid_token(&self.text, "empty label"));
        }
        self.bbox
            .check_normalized()
            .map_err(|message| ReportError::invalid_token(&self.text, message))
    }
}

/// Removes tokens repeated by overlapping model windows.
///
/// Two tokens are repeats when both text and box are identical; the first
/// occurrence is kept and the input order is preserved.
pub fn dedup_window_tokens(tokens: Vec<Token>) -> Vec<Token> {
    let mut seen = HashSet::new();
    tokens
        .into_iter()
        .filter(|token| seen.insert((token.text.clone(), token.bbox)))
        .collect()
}

/// Role of an entity in key-value reconstruction, derived from its label suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Label ends in `_KEY`.
    Key,
    /// Label ends in `_HEADER`; pairs like a key.
    Header,
    /// Label ends in `_VALUE`.
    Value,
    /// Any other label.
    Unassigned,
}

impl Role {
    /// Derives the role from a layout label.
    pub fn from_label(label: &str) -> Self {
        if label.ends_with("_KEY") {
            Role::Key
        } else if label.ends_with("_HEADER") {
            Role::Header
        } else if label.ends_with("_VALUE") {
            Role::Value
        } else {
            Role::Unassigned
        }
    }

    /// True for roles that act as the key side of a pair.
    pub fn is_key(self) -> bool {
        matches!(self, Role::Key | Role::Header)
    }

    /// True for the value side of a pair.
    pub fn is_value(self) -> bool {
        self == Role::Value
    }
}

/// A merged run of tokens sharing one box and one label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    /// Visible text, marker-free and trimmed; never empty.
    pub text: String,
    /// Shared bounding box of the merged tokens.
    #[serde(rename = "box")]
    pub bbox: NormBox,
    /// Shared label of the merged tokens.
    pub label: String,
    /// Role derived from `label`.
    pub role: Role,
    /// Page the tokens came from.
    pub page: u32,
}

impl Entity {
    /// Creates an entity, deriving its role from the label.
    pub fn new(text: impl Into<String>, bbox: NormBox, label: impl Into<String>, page: u32) -> Self {
        let label = label.into();
        Self {
            text: text.into(),
            bbox,
            role: Role::from_label(&label),
            label,
            page,
        }
    }

    /// Text with trailing colons and whitespace removed, for use as a key.
    pub fn key_text(&self) -> &str {
        trim_key(&self.text)
    }
}

/// Strips trailing `:` and whitespace from a key candidate.
pub fn trim_key(text: &str) -> &str {
    text.trim_end_matches(|c: char| c == ':' || c.is_whitespace())
        .trim_start()
}
