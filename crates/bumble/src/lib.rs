#![forbid(unsafe_code)]

//! Headless beeswarm layout algorithms.
//!
//! `bumble` places dated, categorized markers into vertical lanes: an ordinal
//! point scale spreads the lanes horizontally, a temporal policy assigns each
//! marker a vertical target (see [`temporal`]), and an iterative collision
//! pass separates overlapping markers (see [`relax`]). The crate is
//! runtime-agnostic and fully deterministic from a caller-supplied seed.

pub mod error;
pub mod relax;
pub mod rng;
pub mod scale;
pub mod temporal;

pub use error::{Error, Result};
pub use relax::{RelaxNode, RelaxOptions, RelaxStats, Viewport};
pub use rng::XorShift64Star;
pub use scale::{LinearScale, PointScale};
pub use temporal::{
    CalendarDay, MonthBand, MonthBoost, QuietPeriod, TemporalOptions, TimePolicy,
};

/// One record to place: a lane index, a calendar date, and a circle radius.
#[derive(Debug, Clone, Copy)]
pub struct Marker {
    pub lane: usize,
    pub date: CalendarDay,
    pub radius: f64,
}

#[derive(Debug, Clone)]
pub struct LaneOptions {
    pub lane_count: usize,
    /// Horizontal pixel range the lanes are spread over.
    pub range: (f64, f64),
    /// Outer padding in step units (point-scale semantics).
    pub padding: f64,
    /// Start-position jitter around the lane center.
    pub x_jitter: f64,
    /// Start-position jitter around the temporal target.
    pub y_jitter: f64,
}

impl Default for LaneOptions {
    fn default() -> Self {
        Self {
            lane_count: 4,
            range: (0.0, 1200.0),
            padding: 0.2,
            x_jitter: 50.0,
            y_jitter: 10.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LayoutOptions {
    pub lanes: LaneOptions,
    pub temporal: TemporalOptions,
    pub relax: RelaxOptions,
    pub random_seed: u64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Default)]
pub struct LayoutResult {
    /// Final marker positions, index-aligned with the input slice.
    pub positions: Vec<Point>,
    /// Lane center x per lane index.
    pub lane_centers: Vec<f64>,
    pub bands: Vec<MonthBand>,
    pub stats: RelaxStats,
}

/// Headless layout entry point: lane assignment, temporal placement, then
/// collision relaxation, all driven by one seeded random stream.
pub fn layout(markers: &[Marker], opts: &LayoutOptions) -> Result<LayoutResult> {
    let lane_count = opts.lanes.lane_count.max(1);
    for (index, m) in markers.iter().enumerate() {
        if !(m.radius > 0.0) {
            return Err(Error::InvalidRadius {
                index,
                radius: m.radius,
            });
        }
        if m.lane >= lane_count {
            return Err(Error::LaneOutOfBounds {
                index,
                lane: m.lane,
                lanes: lane_count,
            });
        }
    }

    let scale = PointScale::new(lane_count, opts.lanes.range, opts.lanes.padding);
    let lane_centers: Vec<f64> = (0..lane_count).map(|i| scale.position(i)).collect();

    if markers.is_empty() {
        return Ok(LayoutResult {
            lane_centers,
            ..LayoutResult::default()
        });
    }

    let mut rng = XorShift64Star::new(opts.random_seed);
    let dates: Vec<CalendarDay> = markers.iter().map(|m| m.date).collect();
    let (target_ys, bands) = temporal::layout_y(&dates, &opts.temporal, &mut rng);

    let mut nodes: Vec<RelaxNode> = markers
        .iter()
        .zip(&target_ys)
        .map(|(m, &ty)| {
            let cx = lane_centers[m.lane];
            RelaxNode {
                lane: m.lane,
                target_x: cx,
                target_y: ty,
                radius: m.radius,
                x: cx + rng.next_f64_signed() * opts.lanes.x_jitter,
                y: ty + rng.next_f64_signed() * opts.lanes.y_jitter,
            }
        })
        .collect();

    let stats = relax::relax(&mut nodes, &opts.relax, &mut rng)?;

    Ok(LayoutResult {
        positions: nodes.iter().map(|n| Point { x: n.x, y: n.y }).collect(),
        lane_centers,
        bands,
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn markers(count: usize, lanes: usize) -> Vec<Marker> {
        (0..count)
            .map(|i| Marker {
                lane: i % lanes,
                date: CalendarDay::new(2020, 1 + (i as u32 % 12), 1 + (i as u32 % 28)),
                radius: 8.0,
            })
            .collect()
    }

    #[test]
    fn layout_is_reproducible_from_a_seed() {
        let ms = markers(120, 4);
        let opts = LayoutOptions {
            random_seed: 17,
            ..LayoutOptions::default()
        };
        let a = layout(&ms, &opts).unwrap();
        let b = layout(&ms, &opts).unwrap();
        assert_eq!(a.positions, b.positions);
    }

    #[test]
    fn every_marker_gets_a_position_in_input_order() {
        let ms = markers(50, 4);
        let result = layout(&ms, &LayoutOptions::default()).unwrap();
        assert_eq!(result.positions.len(), 50);
        assert_eq!(result.lane_centers.len(), 4);
    }

    #[test]
    fn empty_input_yields_lane_centers_but_no_positions() {
        let result = layout(&[], &LayoutOptions::default()).unwrap();
        assert!(result.positions.is_empty());
        assert_eq!(result.lane_centers.len(), 4);
        assert_eq!(result.stats.iterations, 0);
    }

    #[test]
    fn out_of_range_lane_is_rejected() {
        let ms = vec![Marker {
            lane: 9,
            date: CalendarDay::new(2020, 3, 1),
            radius: 6.0,
        }];
        let err = layout(&ms, &LayoutOptions::default()).unwrap_err();
        assert!(matches!(err, Error::LaneOutOfBounds { lane: 9, lanes: 4, .. }));
    }

    #[test]
    fn markers_cluster_around_their_lane_centers() {
        let ms = markers(200, 4);
        let opts = LayoutOptions {
            relax: RelaxOptions {
                lane_half_width: Some(130.0),
                ..RelaxOptions::default()
            },
            ..LayoutOptions::default()
        };
        let result = layout(&ms, &opts).unwrap();
        for (m, p) in ms.iter().zip(&result.positions) {
            assert!((p.x - result.lane_centers[m.lane]).abs() <= 130.0 + 1e-9);
        }
    }
}
