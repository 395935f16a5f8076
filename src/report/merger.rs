//! Token-to-entity merging.
//!
//! The layout model classifies sub-word tokens. Tokens that belong to the
//! same visual word come out with the very same box and label, so grouping on
//! that pair rebuilds the word. Boxes must match exactly: pieces of one word
//! emitted with slightly different boxes stay separate entities.

use crate::core::config::MergeConfig;
use crate::core::errors::ProcessingStage;
use crate::domain::{Entity, Token};
use crate::processors::NormBox;
use std::collections::HashMap;

struct TokenGroup<'a> {
    bbox: NormBox,
    label: &'a str,
    page: u32,
    text: String,
}

/// Groups classified tokens into entities.
#[derive(Debug, Clone, Default)]
pub struct TokenEntityMerger {
    config: MergeConfig,
}

impl TokenEntityMerger {
    /// Creates a merger with the given configuration.
    pub fn new(config: MergeConfig) -> Self {
        Self { config }
    }

    /// Merges tokens sharing `(page, box, label)` into entities.
    ///
    /// Texts are concatenated in input order. Every continuation marker is
    /// turned into a space and the result trimmed, so a leading marker simply
    /// disappears. Groups with no visible text are dropped. Tokens with a
    /// malformed box or label are logged and skipped.
    ///
    /// The result is sorted by `(page, top, left)`; ties keep input order.
    pub fn merge(&self, tokens: &[Token]) -> Vec<Entity> {
        let mut slots: HashMap<(u32, NormBox, &str), usize> = HashMap::new();
        let mut groups: Vec<TokenGroup<'_>> = Vec::new();
        let mut rejected = 0usize;

        for token in tokens {
            if let Err(err) = token.validate() {
                tracing::warn!(stage = %ProcessingStage::TokenIngestion, "skipping token: {}", err);
                rejected += 1;
                continue;
            }
            let key = (token.page, token.bbox, token.label.as_str());
            let slot = *slots.entry(key).or_insert_with(|| {
                groups.push(TokenGroup {
                    bbox: token.bbox,
                    label: &token.label,
                    page: token.page,
                    text: String::new(),
                });
                groups.len() - 1
            });
            groups[slot].text.push_str(&token.text);
        }

        let marker = self.config.continuation_marker;
        let mut entities: Vec<Entity> = groups
            .into_iter()
            .filter_map(|group| {
                let text = group.text.replace(marker, " ");
                let text = text.trim();
                if text.is_empty() {
                    return None;
                }
                Some(Entity::new(text, group.bbox, group.label, group.page))
            })
            .collect();

        entities.sort_by_key(|e| (e.page, e.bbox.top(), e.bbox.left()));

        tracing::debug!(
            stage = %ProcessingStage::EntityMerge,
            "merged {} tokens into {} entities ({} rejected)",
            tokens.len(),
            entities.len(),
            rejected
        );
        entities
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Role;

    fn merger() -> TokenEntityMerger {
        TokenEntityMerger::default()
    }

    #[test]
    fn test_empty_input() {
        assert!(merger().merge(&[]).is_empty());
    }

    #[test]
    fn test_subword_tokens_rebuild_visible_text() {
        let b = [100, 50, 200, 70];
        let tokens = vec![
            Token::new("ĠPRO", "PROYEK_KEY", b, 1),
            Token::new("YEK", "PROYEK_KEY", b, 1),
        ];
        let entities = merger().merge(&tokens);
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].text, "PROYEK");
        assert_eq!(entities[0].role, Role::Key);
        assert_eq!(entities[0].bbox, NormBox::from(b));
    }

    #[test]
    fn test_concatenation_follows_input_order_not_position() {
        let b = [0, 0, 300, 20];
        let tokens = vec![
            Token::new("ĠJak", "LOKASI_VALUE", b, 1),
            Token::new("arta", "LOKASI_VALUE", b, 1),
            Token::new("ĠSelatan", "LOKASI_VALUE", b, 1),
        ];
        let entities = merger().merge(&tokens);
        assert_eq!(entities[0].text, "Jakarta Selatan");
    }

    #[test]
    fn test_same_box_different_label_stays_separate() {
        let b = [0, 0, 100, 20];
        let tokens = vec![
            Token::new("ĠA", "X_KEY", b, 1),
            Token::new("ĠB", "X_VALUE", b, 1),
        ];
        let entities = merger().merge(&tokens);
        assert_eq!(entities.len(), 2);
    }

    #[test]
    fn test_slightly_different_boxes_are_not_merged() {
        let tokens = vec![
            Token::new("ĠTANG", "TANGGAL_KEY", [0, 0, 100, 20], 1),
            Token::new("GAL", "TANGGAL_KEY", [0, 0, 101, 20], 1),
        ];
        let texts: Vec<_> = merger()
            .merge(&tokens)
            .into_iter()
            .map(|e| e.text)
            .collect();
        assert_eq!(texts, vec!["TANG", "GAL"]);
    }

    #[test]
    fn test_whitespace_only_groups_are_dropped() {
        let tokens = vec![
            Token::new("Ġ", "OTHER", [0, 0, 10, 10], 1),
            Token::new("  ", "OTHER", [20, 0, 30, 10], 1),
            Token::new("ĠOK", "OTHER", [40, 0, 50, 10], 1),
        ];
        let entities = merger().merge(&tokens);
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].text, "OK");
    }

    #[test]
    fn test_output_sorted_by_page_top_left() {
        let tokens = vec![
            Token::new("c", "O", [10, 10, 20, 20], 2),
            Token::new("b", "O", [50, 10, 60, 20], 1),
            Token::new("a", "O", [10, 10, 20, 20], 1),
            Token::new("d", "O", [0, 5, 5, 9], 2),
        ];
        let texts: Vec<_> = merger()
            .merge(&tokens)
            .into_iter()
            .map(|e| e.text)
            .collect();
        assert_eq!(texts, vec!["a", "b", "d", "c"]);
    }

    #[test]
    fn test_same_box_on_different_pages_is_not_merged() {
        let b = [0, 0, 100, 20];
        let tokens = vec![
            Token::new("ĠA", "O", b, 1),
            Token::new("ĠB", "O", b, 2),
        ];
        let entities = merger().merge(&tokens);
        assert_eq!(entities.len(), 2);
        assert_eq!((entities[0].page, entities[1].page), (1, 2));
    }

    #[test]
    fn test_malformed_tokens_are_skipped() {
        let tokens = vec![
            Token::new("ĠBAD", "O", [0, 0, 2000, 20], 1),
            Token::new("ĠGOOD", "O", [0, 0, 100, 20], 1),
        ];
        let entities = merger().merge(&tokens);
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].text, "GOOD");
    }

    #[test]
    fn test_custom_marker() {
        let merger = TokenEntityMerger::new(MergeConfig::default().with_continuation_marker('▁'));
        let b = [0, 0, 100, 20];
        let tokens = vec![Token::new("▁Uji", "O", b, 1), Token::new("▁Terima", "O", b, 1)];
        assert_eq!(merger.merge(&tokens)[0].text, "Uji Terima");
    }
}
