//! Scene emission: the rendering contract.
//!
//! The engine never touches a drawing library; each state change emits a
//! [`Scene`] of plain draw instructions (circles, curved lines, panel
//! content) that any rendering surface can apply. This is the only layer
//! that knows about pixel-level presentation values.

use serde::Serialize;

use crate::config::VizConfig;
use crate::connections::{Connection, control_point};
use crate::dates::{format_month_year, format_uk};
use crate::ingest::Dataset;
use crate::record::NodeId;
use crate::selection::{Glow, SelectionState, marker_appearance};
use crate::timeline::TimelineState;

/// Opacity of a connector whose endpoints are both visible.
const CONNECTION_OPACITY: f64 = 0.6;

#[derive(Debug, Clone, Serialize)]
pub struct CircleUpdate {
    pub id: NodeId,
    pub x: f64,
    pub y: f64,
    pub r: f64,
    pub fill: &'static str,
    pub opacity: f64,
    pub glow: Glow,
    pub raised: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct LineUpdate {
    pub id: String,
    pub from: NodeId,
    pub to: NodeId,
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    /// Quadratic control point for the arc.
    pub cx: f64,
    pub cy: f64,
    pub opacity: f64,
}

/// One keyword chip placed radially around the panel center.
#[derive(Debug, Clone, Serialize)]
pub struct KeywordChip {
    pub keyword: String,
    pub dx: f64,
    pub dy: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PanelContent {
    pub title: String,
    pub url: String,
    pub date_label: String,
    pub fine_type: String,
    pub group_color: &'static str,
    pub keywords: Vec<KeywordChip>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SceneSignal {
    /// Zero records after filtering: show the empty-state message instead
    /// of the chart.
    EmptyDataset,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Scene {
    pub circles: Vec<CircleUpdate>,
    pub lines: Vec<LineUpdate>,
    pub panel: Option<PanelContent>,
    pub signal: Option<SceneSignal>,
    pub cursor_label: String,
    pub current_time: f64,
    /// False right after a manual scrub: apply updates instantly instead of
    /// easing.
    pub eased: bool,
}

/// Radial chip offsets around the panel center: a single ellipse ring for up
/// to eight keywords, an inner-6/outer split above that.
pub fn radial_chip_offsets(count: usize) -> Vec<(f64, f64)> {
    use std::f64::consts::PI;
    let polar = |i: usize, n: usize, rx: f64, ry: f64| {
        let angle = (i as f64) / (n as f64) * 2.0 * PI - PI / 2.0;
        (rx * angle.cos(), ry * angle.sin())
    };
    (0..count)
        .map(|i| {
            if count <= 8 {
                polar(i, count, 200.0, 220.0)
            } else if i < 6 {
                polar(i, 6, 140.0, 170.0)
            } else {
                polar(i - 6, count - 6, 220.0, 240.0)
            }
        })
        .collect()
}

fn panel_for(dataset: &Dataset, anchor: &NodeId) -> Option<PanelContent> {
    let rec = dataset.by_id(anchor)?;
    let offsets = radial_chip_offsets(rec.keywords.len());
    Some(PanelContent {
        title: rec.title.clone(),
        url: rec.url.clone(),
        date_label: format_uk(rec.parsed_date),
        fine_type: rec.fine_type.clone(),
        group_color: rec.group.color(),
        keywords: rec
            .keywords
            .iter()
            .zip(offsets)
            .map(|(kw, (dx, dy))| KeywordChip {
                keyword: kw.clone(),
                dx,
                dy,
            })
            .collect(),
    })
}

/// Assembles the full scene for the current state. Pure data out; the caller
/// owns all four state pieces.
pub fn build_scene(
    dataset: &Dataset,
    timeline: &mut TimelineState,
    selection: &SelectionState,
    connections: &[Connection],
    cfg: &VizConfig,
) -> Scene {
    if dataset.is_empty() {
        return Scene {
            signal: Some(SceneSignal::EmptyDataset),
            eased: true,
            ..Scene::default()
        };
    }

    let highlight = selection.highlight_set(dataset);
    let active = selection.is_active();
    let current = timeline.current_date();

    let circles = dataset
        .records()
        .iter()
        .enumerate()
        .map(|(idx, rec)| {
            let appearance = marker_appearance(
                rec.visible_at(current),
                active,
                highlight.contains(&idx),
            );
            CircleUpdate {
                id: rec.id.clone(),
                x: rec.display_x,
                y: rec.display_y,
                r: rec.radius,
                fill: rec.group.color(),
                opacity: appearance.opacity,
                glow: appearance.glow,
                raised: appearance.raised,
            }
        })
        .collect();

    // Line visibility tracks both endpoints' current timeline state,
    // independent of the selection event that created the lines.
    let lines = connections
        .iter()
        .map(|conn| {
            let a = &dataset.records()[conn.from_index];
            let b = &dataset.records()[conn.to_index];
            let visible = a.visible_at(current) && b.visible_at(current);
            let (cx, cy) = control_point(
                a.display_x,
                a.display_y,
                b.display_x,
                b.display_y,
                cfg.connections.curve_offset,
            );
            LineUpdate {
                id: format!("{}-{}", conn.from, conn.to),
                from: conn.from.clone(),
                to: conn.to.clone(),
                x1: a.display_x,
                y1: a.display_y,
                x2: b.display_x,
                y2: b.display_y,
                cx,
                cy,
                opacity: if visible { CONNECTION_OPACITY } else { 0.0 },
            }
        })
        .collect();

    Scene {
        circles,
        lines,
        panel: selection.anchor().and_then(|id| panel_for(dataset, id)),
        signal: None,
        cursor_label: format_month_year(current),
        current_time: timeline.current_time(),
        eased: !timeline.take_scrubbed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_keyword_sets_use_a_single_ellipse_ring() {
        let offsets = radial_chip_offsets(8);
        assert_eq!(offsets.len(), 8);
        for (dx, dy) in offsets {
            // On the rx=200 / ry=220 ellipse.
            let v = (dx / 200.0).powi(2) + (dy / 220.0).powi(2);
            assert!((v - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn large_keyword_sets_split_into_inner_and_outer_rings() {
        let offsets = radial_chip_offsets(10);
        for (dx, dy) in &offsets[..6] {
            let v = (dx / 140.0).powi(2) + (dy / 170.0).powi(2);
            assert!((v - 1.0).abs() < 1e-9);
        }
        for (dx, dy) in &offsets[6..] {
            let v = (dx / 220.0).powi(2) + (dy / 240.0).powi(2);
            assert!((v - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn first_chip_sits_at_the_top_of_the_ring() {
        let offsets = radial_chip_offsets(4);
        let (dx, dy) = offsets[0];
        assert!(dx.abs() < 1e-9);
        assert!((dy + 220.0).abs() < 1e-9);
    }
}
