//! Selection & highlight state machine.
//!
//! Three selection slots coexist in storage (node, keyword, category) but
//! resolve with strict priority for the primary highlight pass: keyword >
//! node > category > none. A category selection additionally unions its
//! matching records into whatever the primary tier produced.

use rustc_hash::FxHashSet;
use tracing::warn;

use crate::config::SelectionOptions;
use crate::ingest::Dataset;
use crate::record::NodeId;

/// Both spellings of the devolved parliament select the same records.
const PARLIAMENT_ALIASES: [&str; 2] = ["Parliament", "Scottish Government and Parliament"];

fn category_matches(selected: &str, fine_type: &str) -> bool {
    if selected == fine_type {
        return true;
    }
    PARLIAMENT_ALIASES.contains(&selected) && PARLIAMENT_ALIASES.contains(&fine_type)
}

#[derive(Debug, Clone, Default)]
pub struct SelectionState {
    /// Anchor node: the originally clicked record backing a node- or
    /// keyword-tier selection.
    node: Option<NodeId>,
    keyword: Option<String>,
    /// Fine-grained category string, independent of node/keyword state.
    category: Option<String>,
    /// Timestamp of the last selection-causing click, for the reset
    /// debounce window.
    last_click_ms: Option<u64>,
}

impl SelectionState {
    pub fn anchor(&self) -> Option<&NodeId> {
        self.node.as_ref()
    }

    pub fn keyword(&self) -> Option<&str> {
        self.keyword.as_deref()
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    /// True when any tier would drive a dim/highlight pass.
    pub fn is_active(&self) -> bool {
        self.node.is_some() || self.keyword.is_some() || self.category.is_some()
    }

    /// True when a node- or keyword-tier selection is anchored to a record
    /// (category selections have no anchor and never auto-clear).
    pub fn has_anchor(&self) -> bool {
        self.node.is_some()
    }

    /// Marker click: replaces any prior node/keyword selection and records
    /// the anchor. Unknown ids no-op with a warning.
    pub fn select_node(&mut self, dataset: &Dataset, id: NodeId, now_ms: u64) -> bool {
        if dataset.index_of(&id).is_none() {
            warn!(%id, "node selection ignored: id not in index");
            return false;
        }
        self.node = Some(id);
        self.keyword = None;
        self.last_click_ms = Some(now_ms);
        true
    }

    /// Keyword-chip click: enters the keyword tier, keeping the anchor node
    /// recorded so it stays visually included.
    pub fn select_keyword(&mut self, dataset: &Dataset, keyword: &str, now_ms: u64) -> bool {
        if dataset.with_keyword(keyword).is_empty() {
            warn!(keyword, "keyword selection ignored: not in index");
            return false;
        }
        self.keyword = Some(keyword.to_string());
        self.last_click_ms = Some(now_ms);
        true
    }

    /// Category/dropdown click: combines with node/keyword state.
    pub fn select_category(&mut self, category: &str, now_ms: u64) {
        self.category = Some(category.to_string());
        self.last_click_ms = Some(now_ms);
    }

    /// Empty-canvas click or panel close. Suppressed when a selection-
    /// causing click landed within the debounce window (a bubbled duplicate
    /// of the same gesture must not undo the selection it raced).
    pub fn background_reset(&mut self, opts: &SelectionOptions, now_ms: u64) -> bool {
        if let Some(last) = self.last_click_ms {
            if now_ms.saturating_sub(last) < opts.reset_debounce_ms {
                return false;
            }
        }
        self.clear();
        true
    }

    /// Unconditional reset (timeline loop wrap, anchor disappearance).
    pub fn clear(&mut self) {
        self.node = None;
        self.keyword = None;
        self.category = None;
    }

    /// Resolves the highlighted record-index set under the priority rules.
    pub fn highlight_set(&self, dataset: &Dataset) -> FxHashSet<usize> {
        let mut set = FxHashSet::default();

        if let Some(keyword) = &self.keyword {
            set.extend(dataset.with_keyword(keyword).iter().copied());
            if let Some(anchor) = &self.node {
                if let Some(idx) = dataset.index_of(anchor) {
                    set.insert(idx);
                }
            }
        } else if let Some(anchor) = &self.node {
            if let Some(idx) = dataset.index_of(anchor) {
                set.insert(idx);
                // Everything sharing at least one keyword with the anchor.
                for kw in &dataset.records()[idx].keywords {
                    set.extend(dataset.with_keyword(kw).iter().copied());
                }
            }
        }

        if let Some(category) = &self.category {
            for (idx, rec) in dataset.records().iter().enumerate() {
                if category_matches(category, &rec.fine_type) {
                    set.insert(idx);
                }
            }
        }

        set
    }
}

/// Glow strength of a rendered marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Glow {
    None,
    Faint,
    Strong,
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct MarkerAppearance {
    pub opacity: f64,
    pub glow: Glow,
    /// Raised stacking order, for highlighted markers.
    pub raised: bool,
}

/// Per-marker opacity/glow contract. Timeline-hidden markers are fully
/// transparent regardless of highlight status.
pub fn marker_appearance(
    timeline_visible: bool,
    selection_active: bool,
    highlighted: bool,
) -> MarkerAppearance {
    if !timeline_visible {
        return MarkerAppearance {
            opacity: 0.0,
            glow: Glow::None,
            raised: false,
        };
    }
    if !selection_active {
        return MarkerAppearance {
            opacity: 0.8,
            glow: Glow::Faint,
            raised: false,
        };
    }
    if highlighted {
        MarkerAppearance {
            opacity: 1.0,
            glow: Glow::Strong,
            raised: true,
        }
    } else {
        MarkerAppearance {
            opacity: 0.1,
            glow: Glow::Faint,
            raised: false,
        }
    }
}
