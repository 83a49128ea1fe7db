//! Visualization configuration.
//!
//! Every tuning constant of the pipeline is a config field with an explicit
//! default. All structs deserialize leniently (`serde(default)`), so a
//! config file may override any subset.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// CSV column-name mapping. Header names vary across dataset revisions, so
/// nothing is hardcoded at the read site.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMap {
    pub id: String,
    pub title: String,
    pub url: String,
    pub fine_type: String,
    pub first_date: String,
    pub last_date: String,
    pub keywords: String,
    /// Collection-date column; `None` reuses the first-date column.
    pub date: Option<String>,
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self {
            id: "id".into(),
            title: "title".into(),
            url: "url".into(),
            fine_type: "type1".into(),
            first_date: "first_date_parsed".into(),
            last_date: "last_date_parsed".into(),
            keywords: "first_keywords_auto".into(),
            date: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestOptions {
    /// Bounds for synthesized dates when a row's collection date is missing
    /// or unparseable.
    pub min_date: NaiveDate,
    pub max_date: NaiveDate,
    /// Drop rows whose keyword list is empty after cleaning.
    pub require_keywords: bool,
    /// Rows generated when the source file cannot be read.
    pub sample_size: usize,
    /// Marker radius range the sqrt size scale maps into.
    pub radius_range: (f64, f64),
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            min_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or_default(),
            max_date: NaiveDate::from_ymd_opt(2021, 12, 31).unwrap_or_default(),
            require_keywords: false,
            sample_size: 300,
            radius_range: (6.0, 12.0),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub width: f64,
    pub height: f64,
    /// Outer padding of the category point scale, in step units.
    pub lane_padding: f64,
    pub x_jitter: f64,
    pub y_jitter: f64,
    pub base_month_height: f64,
    pub band_jitter_fraction: f64,
    /// Use the plain linear time scale instead of density-aware month bands.
    pub direct_time_scale: bool,
    pub lane_half_width: Option<f64>,
    /// Low-information date range whose month bands are compressed.
    pub quiet_period: Option<(NaiveDate, NaiveDate)>,
    pub quiet_factor: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 2000.0,
            lane_padding: 0.2,
            x_jitter: 50.0,
            y_jitter: 10.0,
            base_month_height: 80.0,
            band_jitter_fraction: 0.15,
            direct_time_scale: false,
            lane_half_width: None,
            quiet_period: None,
            quiet_factor: 0.45,
        }
    }
}

fn to_calendar_day(date: NaiveDate) -> bumble::CalendarDay {
    use chrono::Datelike;
    bumble::CalendarDay::new(date.year(), date.month(), date.day())
}

impl LayoutConfig {
    pub fn to_layout_options(&self, random_seed: u64) -> bumble::LayoutOptions {
        bumble::LayoutOptions {
            lanes: bumble::LaneOptions {
                lane_count: crate::record::Group::LANE_ORDER.len(),
                range: (0.0, self.width),
                padding: self.lane_padding,
                x_jitter: self.x_jitter,
                y_jitter: self.y_jitter,
            },
            temporal: bumble::TemporalOptions {
                policy: if self.direct_time_scale {
                    bumble::TimePolicy::Direct
                } else {
                    bumble::TimePolicy::DensityAware
                },
                y_top: 0.0,
                y_bottom: self.height,
                base_month_height: self.base_month_height,
                jitter_fraction: self.band_jitter_fraction,
                quiet_periods: self
                    .quiet_period
                    .map(|(from, to)| {
                        vec![bumble::QuietPeriod {
                            from: to_calendar_day(from),
                            to: to_calendar_day(to),
                            factor: self.quiet_factor,
                        }]
                    })
                    .unwrap_or_default(),
                ..bumble::TemporalOptions::default()
            },
            relax: bumble::RelaxOptions {
                lane_half_width: self.lane_half_width,
                viewport: Some(bumble::Viewport {
                    x_min: 0.0,
                    x_max: self.width,
                    y_min: 0.0,
                    y_max: self.height,
                }),
                ..bumble::RelaxOptions::default()
            },
            random_seed,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineOptions {
    /// `current_time` increment per tick.
    pub tick_step: f64,
    pub looped: bool,
    /// Auto-play resumes after this much time without interaction.
    pub idle_timeout_ms: u64,
}

impl Default for TimelineOptions {
    fn default() -> Self {
        Self {
            tick_step: 0.00005,
            looped: true,
            idle_timeout_ms: 60_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionOptions {
    /// Background-click resets are suppressed this long after a node or
    /// category click, so a bubbled event cannot race the selection.
    pub reset_debounce_ms: u64,
}

impl Default for SelectionOptions {
    fn default() -> Self {
        Self {
            reset_debounce_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionOptions {
    /// Pair cap; beyond it a uniformly random subset is drawn.
    pub max_connections: usize,
    /// Control-point offset as a fraction of segment length.
    pub curve_offset: f64,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            max_connections: 500,
            curve_offset: 0.1,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VizConfig {
    pub columns: ColumnMap,
    pub ingest: IngestOptions,
    pub layout: LayoutConfig,
    pub timeline: TimelineOptions,
    pub selection: SelectionOptions,
    pub connections: ConnectionOptions,
    pub random_seed: u64,
}

impl VizConfig {
    /// Rejects configurations no pipeline stage can recover from.
    pub fn validate(&self) -> Result<()> {
        if self.ingest.min_date > self.ingest.max_date {
            return Err(Error::InvalidDateBounds {
                min: self.ingest.min_date.to_string(),
                max: self.ingest.max_date.to_string(),
            });
        }
        let (lo, hi) = self.ingest.radius_range;
        if !(lo > 0.0) || hi < lo {
            return Err(Error::InvalidRadiusRange { lo, hi });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        VizConfig::default().validate().unwrap();
    }

    #[test]
    fn inverted_date_bounds_are_rejected() {
        let mut cfg = VizConfig::default();
        cfg.ingest.min_date = NaiveDate::from_ymd_opt(2022, 1, 1).unwrap();
        assert!(matches!(
            cfg.validate(),
            Err(Error::InvalidDateBounds { .. })
        ));
    }

    #[test]
    fn zero_radius_range_is_rejected() {
        let mut cfg = VizConfig::default();
        cfg.ingest.radius_range = (0.0, 12.0);
        assert!(matches!(
            cfg.validate(),
            Err(Error::InvalidRadiusRange { .. })
        ));
    }

    #[test]
    fn quiet_period_maps_onto_the_temporal_options() {
        let cfg = LayoutConfig {
            quiet_period: Some((
                NaiveDate::from_ymd_opt(2020, 8, 1).unwrap(),
                NaiveDate::from_ymd_opt(2020, 10, 31).unwrap(),
            )),
            ..LayoutConfig::default()
        };
        let opts = cfg.to_layout_options(1);
        assert_eq!(opts.temporal.quiet_periods.len(), 1);
        let q = opts.temporal.quiet_periods[0];
        assert_eq!((q.from.year, q.from.month), (2020, 8));
        assert!((q.factor - 0.45).abs() < 1e-12);
    }

    #[test]
    fn partial_json_overrides_fall_back_to_defaults() {
        let cfg: VizConfig =
            serde_json::from_str(r#"{"timeline": {"tick_step": 0.001}}"#).unwrap();
        assert!((cfg.timeline.tick_step - 0.001).abs() < 1e-12);
        assert_eq!(cfg.connections.max_connections, 500);
        assert_eq!(cfg.columns.fine_type, "type1");
    }
}
