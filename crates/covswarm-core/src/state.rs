//! Engine facade: one state object, event-driven transitions.
//!
//! All mutable visualization state lives in [`VisualizationState`]; hosts
//! feed it [`Event`]s and apply the returned [`Scene`]. Every transition is
//! applied atomically within one call, so no observer can see a half-updated
//! selection or timeline.

use std::path::Path;

use chrono::Datelike;
use tracing::debug;

use crate::config::VizConfig;
use crate::connections::{Connection, build_connections};
use crate::error::Result;
use crate::ingest::{self, Dataset, RawRow};
use crate::record::NodeId;
use crate::scene::{Scene, build_scene};
use crate::selection::SelectionState;
use crate::timeline::TimelineState;
use bumble::{CalendarDay, Marker, MonthBand, XorShift64Star};

/// One host interaction or frame callback. `now_ms` is the host's
/// millisecond clock; injecting it keeps debounce and idle logic testable.
#[derive(Debug, Clone)]
pub enum Event {
    NodeClick { id: NodeId, now_ms: u64 },
    KeywordClick { keyword: String, now_ms: u64 },
    CategoryClick { category: String, now_ms: u64 },
    BackgroundClick { now_ms: u64 },
    PanelClose { now_ms: u64 },
    Scrub { time: f64, now_ms: u64 },
    Play,
    Pause,
    Tick { now_ms: u64 },
}

#[derive(Debug, Clone)]
pub struct VisualizationState {
    config: VizConfig,
    dataset: Dataset,
    timeline: TimelineState,
    selection: SelectionState,
    connections: Vec<Connection>,
    bands: Vec<MonthBand>,
    panel_open: bool,
    rng: XorShift64Star,
}

impl VisualizationState {
    /// Builds the full pipeline from pre-read rows: ingestion, temporal
    /// layout, and the one-time collision relaxation pass.
    pub fn from_rows(rows: &[RawRow], config: VizConfig) -> Result<Self> {
        config.validate()?;
        let mut rng = XorShift64Star::new(config.random_seed);
        let dataset = ingest::ingest_rows(rows, &config, &mut rng);
        Self::assemble(dataset, config, rng)
    }

    /// Loads from a CSV path, falling back to sample data on read failure.
    pub fn from_csv_path(path: &Path, config: VizConfig) -> Result<Self> {
        config.validate()?;
        let mut rng = XorShift64Star::new(config.random_seed);
        let dataset = ingest::load_or_sample(path, &config, &mut rng);
        Self::assemble(dataset, config, rng)
    }

    /// Builds from the generated sample dataset.
    pub fn from_sample(config: VizConfig) -> Result<Self> {
        config.validate()?;
        let mut rng = XorShift64Star::new(config.random_seed);
        let rows = ingest::generate_sample_rows(&config, &mut rng);
        let dataset = ingest::ingest_rows(&rows, &config, &mut rng);
        Self::assemble(dataset, config, rng)
    }

    fn assemble(mut dataset: Dataset, config: VizConfig, rng: XorShift64Star) -> Result<Self> {
        let bands = if dataset.is_empty() {
            Vec::new()
        } else {
            Self::run_layout(&mut dataset, &config)?
        };
        let span = dataset
            .date_span
            .unwrap_or((config.ingest.min_date, config.ingest.max_date));
        Ok(Self {
            timeline: TimelineState::new(span),
            selection: SelectionState::default(),
            connections: Vec::new(),
            bands,
            panel_open: false,
            dataset,
            config,
            rng,
        })
    }

    /// Relaxation is a one-time post-ingestion pass; playback only changes
    /// opacity, never `display_x`/`display_y`.
    fn run_layout(dataset: &mut Dataset, config: &VizConfig) -> Result<Vec<MonthBand>> {
        let markers: Vec<Marker> = dataset
            .records()
            .iter()
            .map(|rec| Marker {
                lane: rec.group.lane(),
                date: CalendarDay::new(
                    rec.parsed_date.year(),
                    rec.parsed_date.month(),
                    rec.parsed_date.day(),
                ),
                radius: rec.radius,
            })
            .collect();
        let opts = config.layout.to_layout_options(config.random_seed);
        let result = bumble::layout(&markers, &opts)?;
        for (rec, pos) in dataset.records_mut().iter_mut().zip(&result.positions) {
            rec.display_x = pos.x;
            rec.display_y = pos.y;
        }
        debug!(
            records = markers.len(),
            iterations = result.stats.iterations,
            converged = result.stats.converged,
            "layout relaxed"
        );
        Ok(result.bands)
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn timeline(&self) -> &TimelineState {
        &self.timeline
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Month bands of the density-aware time axis, for axis rendering.
    pub fn bands(&self) -> &[MonthBand] {
        &self.bands
    }

    pub fn config(&self) -> &VizConfig {
        &self.config
    }

    fn reset_interaction_state(&mut self) {
        self.selection.clear();
        self.connections.clear();
        self.panel_open = false;
    }

    /// Rebuilds connector descriptors for the active keyword's node list.
    fn rebuild_connections(&mut self) {
        self.connections = match self.selection.keyword() {
            Some(keyword) => {
                let indices: Vec<usize> =
                    self.dataset.with_keyword(keyword).to_vec();
                build_connections(
                    &self.dataset,
                    &indices,
                    &self.config.connections,
                    &mut self.rng,
                )
            }
            None => Vec::new(),
        };
    }

    /// A node- or keyword-tier selection must not persist pointing at an
    /// invisible anchor; category-only selections are unaffected.
    fn auto_clear_invisible_anchor(&mut self) {
        let Some(anchor) = self.selection.anchor() else {
            return;
        };
        let visible = self
            .dataset
            .by_id(anchor)
            .is_some_and(|rec| self.timeline.visible(rec));
        if !visible {
            debug!("anchor left the visible window; clearing selection");
            self.reset_interaction_state();
        }
    }

    /// Applies one event atomically and returns the recomputed scene.
    pub fn apply(&mut self, event: Event) -> Scene {
        match event {
            Event::NodeClick { id, now_ms } => {
                self.timeline.note_interaction(now_ms, true);
                if self.selection.select_node(&self.dataset, id, now_ms) {
                    self.panel_open = true;
                    self.connections.clear();
                }
            }
            Event::KeywordClick { keyword, now_ms } => {
                self.timeline.note_interaction(now_ms, true);
                if self.selection.select_keyword(&self.dataset, &keyword, now_ms) {
                    self.rebuild_connections();
                }
            }
            Event::CategoryClick { category, now_ms } => {
                self.timeline.note_interaction(now_ms, true);
                self.selection.select_category(&category, now_ms);
                self.panel_open = false;
            }
            Event::BackgroundClick { now_ms } => {
                self.timeline.note_interaction(now_ms, false);
                if self
                    .selection
                    .background_reset(&self.config.selection, now_ms)
                {
                    self.connections.clear();
                    self.panel_open = false;
                }
            }
            Event::PanelClose { now_ms } => {
                self.timeline.note_interaction(now_ms, false);
                self.reset_interaction_state();
            }
            Event::Scrub { time, now_ms } => {
                self.timeline.scrub(time, now_ms);
                self.auto_clear_invisible_anchor();
            }
            Event::Play => self.timeline.play(),
            Event::Pause => self.timeline.pause(),
            Event::Tick { now_ms } => {
                let outcome = self.timeline.tick(&self.config.timeline, now_ms);
                if outcome.wrapped {
                    // Loop restart is a full reset.
                    self.reset_interaction_state();
                } else {
                    self.auto_clear_invisible_anchor();
                }
            }
        }

        let mut scene = build_scene(
            &self.dataset,
            &mut self.timeline,
            &self.selection,
            &self.connections,
            &self.config,
        );
        if !self.panel_open {
            scene.panel = None;
        }
        scene
    }
}
