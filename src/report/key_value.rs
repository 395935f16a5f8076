//! Spatial key-value reconstruction.
//!
//! Pairs key-like entities (`_KEY`, `_HEADER`) with value entities on each page
//! in two phases:
//!
//! 1. **Line pairing**: entities are grouped into visual lines by vertical
//!    center. A line holding both keys and values yields one pair made of all
//!    its keys joined left to right and all its values joined left to right.
//!    Every entity of such a line is consumed, unassigned ones included.
//! 2. **Vertical fallback**: each key left over is paired with the closest
//!    unconsumed value that starts strictly below it and shares part of its
//!    horizontal span.
//!
//! Keys and values matched by neither phase are dropped silently.

use crate::core::config::LayoutConfig;
use crate::core::errors::ProcessingStage;
use crate::domain::{Entity, KeyValueRecord, PagePairs, trim_key};
use itertools::Itertools;
use std::collections::BTreeMap;

/// Which phase produced a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairPhase {
    /// Key and value found on the same line.
    Line,
    /// Value found below the key.
    Vertical,
}

/// A reconstructed pair together with the entities it was built from.
#[derive(Debug, Clone)]
pub struct PairMatch<'a> {
    pub key: String,
    pub value: String,
    pub phase: PairPhase,
    /// Key-side entities, left to right.
    pub keys: Vec<&'a Entity>,
    /// Value-side entities, left to right.
    pub values: Vec<&'a Entity>,
}

/// Builds key-value records from merged entities.
#[derive(Debug, Clone, Default)]
pub struct SpatialKeyValueReconstructor {
    config: LayoutConfig,
}

impl SpatialKeyValueReconstructor {
    /// Creates a reconstructor with the given layout configuration.
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    /// Reconstructs pairs for every page; pages without pairs are omitted.
    ///
    /// When a key repeats on one page, the pair found later wins.
    pub fn reconstruct(&self, entities: &[Entity]) -> KeyValueRecord {
        let mut by_page: BTreeMap<u32, Vec<&Entity>> = BTreeMap::new();
        for entity in entities {
            by_page.entry(entity.page).or_default().push(entity);
        }

        let mut record = KeyValueRecord::new();
        for (page, page_entities) in by_page {
            let mut pairs = PagePairs::new();
            for m in self.match_page(&page_entities) {
                if let Some(previous) = pairs.insert(m.key.clone(), m.value) {
                    tracing::debug!(page, key = %m.key, "replacing earlier value '{}'", previous);
                }
            }
            tracing::debug!(
                stage = %ProcessingStage::Reconstruction,
                page,
                "{} entities -> {} pairs",
                page_entities.len(),
                pairs.len()
            );
            record.extend_page(page, pairs);
        }
        record
    }

    /// Runs both phases over the entities of a single page.
    ///
    /// Matches are returned in discovery order: line pairs top to bottom,
    /// then vertical pairs in key order.
    pub fn match_page<'a>(&self, entities: &[&'a Entity]) -> Vec<PairMatch<'a>> {
        let mut sorted: Vec<&'a Entity> = entities.to_vec();
        sorted.sort_by_key(|e| (e.bbox.top(), e.bbox.left()));

        let mut consumed = vec![false; sorted.len()];
        let mut matches = Vec::new();

        for line in self.group_lines(&sorted) {
            let keys: Vec<&'a Entity> = line
                .iter()
                .map(|&i| sorted[i])
                .filter(|e| e.role.is_key())
                .collect();
            let values: Vec<&'a Entity> = line
                .iter()
                .map(|&i| sorted[i])
                .filter(|e| e.role.is_value())
                .collect();
            if keys.is_empty() || values.is_empty() {
                continue;
            }

            let joined_keys = keys.iter().map(|e| e.text.as_str()).join(" ");
            let key = trim_key(&joined_keys).to_string();
            let value = values
                .iter()
                .map(|e| e.text.as_str())
                .join(" ")
                .trim()
                .to_string();

            for &i in &line {
                consumed[i] = true;
            }
            if key.is_empty() || value.is_empty() {
                continue;
            }
            matches.push(PairMatch {
                key,
                value,
                phase: PairPhase::Line,
                keys,
                values,
            });
        }

        for k in 0..sorted.len() {
            let key_entity = sorted[k];
            if consumed[k] || !key_entity.role.is_key() {
                continue;
            }
            let key = key_entity.key_text();
            if key.is_empty() {
                continue;
            }
            let Some(v) = Self::closest_value_below(&sorted, &consumed, key_entity) else {
                continue;
            };
            consumed[k] = true;
            consumed[v] = true;
            matches.push(PairMatch {
                key: key.to_string(),
                value: sorted[v].text.clone(),
                phase: PairPhase::Vertical,
                keys: vec![key_entity],
                values: vec![sorted[v]],
            });
        }

        matches
    }

    /// Groups entities (sorted by `(top, left)`) into lines of indices.
    ///
    /// An entity joins the current line only while the spread of vertical
    /// centers in the line stays below the tolerance, so any two members
    /// of a line differ by less than the tolerance. Each line is ordered
    /// left to right.
    pub fn group_lines(&self, sorted: &[&Entity]) -> Vec<Vec<usize>> {
        let tolerance = self.config.line_center_tolerance;
        let mut lines: Vec<Vec<usize>> = Vec::new();
        let mut current: Vec<usize> = Vec::new();
        let (mut lo, mut hi) = (0.0f32, 0.0f32);

        for (i, entity) in sorted.iter().enumerate() {
            let c = entity.bbox.center_y();
            if !current.is_empty() && hi.max(c) - lo.min(c) < tolerance {
                lo = lo.min(c);
                hi = hi.max(c);
                current.push(i);
                continue;
            }
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            lo = c;
            hi = c;
            current.push(i);
        }
        if !current.is_empty() {
            lines.push(current);
        }

        for line in &mut lines {
            line.sort_by_key(|&i| sorted[i].bbox.left());
        }
        lines
    }

    /// Picks the unconsumed value strictly below `key` with horizontal overlap
    /// and the smallest vertical gap.
    ///
    /// Ties on the gap go to the leftmost value, then the smallest box, then
    /// the one earliest in `(top, left)` order.
    fn closest_value_below(sorted: &[&Entity], consumed: &[bool], key: &Entity) -> Option<usize> {
        sorted
            .iter()
            .enumerate()
            .filter(|&(i, v)| {
                !consumed[i]
                    && v.role.is_value()
                    && v.bbox.top() > key.bbox.bottom()
                    && key.bbox.horizontal_overlap(&v.bbox) > 0
            })
            .min_by_key(|&(i, v)| (key.bbox.gap_below(&v.bbox), v.bbox.left(), v.bbox.area(), i))
            .map(|(i, _)| i)
    }
}
