#![forbid(unsafe_code)]

//! Web-archive beeswarm data model + interaction engine (headless).
//!
//! Design goals:
//! - deterministic, testable outputs (seeded RNG for every randomized step)
//! - runtime-agnostic: no rendering library, no animation-frame provider;
//!   hosts feed [`Event`]s and apply the returned [`Scene`]
//! - recoverable data handling: bad rows are substituted, never dropped
//!   (except by the explicit keyword filter) and never fatal

pub mod config;
pub mod connections;
pub mod dates;
pub mod error;
pub mod ingest;
pub mod record;
pub mod scene;
pub mod selection;
pub mod state;
pub mod timeline;

pub use config::{ColumnMap, VizConfig};
pub use error::{Error, Result};
pub use ingest::{Dataset, RawRow};
pub use record::{Group, NodeId, Record};
pub use scene::{Scene, SceneSignal};
pub use selection::SelectionState;
pub use state::{Event, VisualizationState};
pub use timeline::TimelineState;
