//! Connection-line descriptors between keyword-sharing markers.

use rustc_hash::FxHashSet;
use tracing::debug;

use crate::config::ConnectionOptions;
use crate::ingest::Dataset;
use crate::record::NodeId;
use bumble::XorShift64Star;

/// One connector between two records. Geometry is resolved at scene
/// emission; visibility tracks both endpoints' timeline state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub from: NodeId,
    pub to: NodeId,
    pub from_index: usize,
    pub to_index: usize,
}

/// Quadratic control point for a gentle arc: segment midpoint displaced
/// along the 90°-rotated segment vector, magnitude proportional to length.
pub fn control_point(x1: f64, y1: f64, x2: f64, y2: f64, offset: f64) -> (f64, f64) {
    let mx = (x1 + x2) / 2.0;
    let my = (y1 + y2) / 2.0;
    let dx = x2 - x1;
    let dy = y2 - y1;
    (mx - dy * offset, my + dx * offset)
}

fn pair_at(indices: &[usize], mut p: usize) -> (usize, usize) {
    let k = indices.len();
    for i in 0..k {
        let row = k - 1 - i;
        if p < row {
            return (indices[i], indices[i + 1 + p]);
        }
        p -= row;
    }
    // p is always < k(k-1)/2 for callers in this module.
    (indices[0], indices[k - 1])
}

/// Builds connector descriptors for every pair in `indices`, capped at
/// `max_connections` by uniform random sampling (never a prefix, so the
/// visual impression of connectivity stays representative).
pub fn build_connections(
    dataset: &Dataset,
    indices: &[usize],
    opts: &ConnectionOptions,
    rng: &mut XorShift64Star,
) -> Vec<Connection> {
    let k = indices.len();
    if k < 2 {
        return Vec::new();
    }
    let total = k * (k - 1) / 2;

    let make = |a: usize, b: usize| Connection {
        from: dataset.records()[a].id.clone(),
        to: dataset.records()[b].id.clone(),
        from_index: a,
        to_index: b,
    };

    let mut connections = Vec::new();
    if total <= opts.max_connections {
        for i in 0..k {
            for j in (i + 1)..k {
                connections.push(make(indices[i], indices[j]));
            }
        }
    } else {
        let mut chosen = FxHashSet::default();
        while chosen.len() < opts.max_connections {
            chosen.insert(rng.next_usize(total));
        }
        let mut codes: Vec<usize> = chosen.into_iter().collect();
        codes.sort_unstable();
        for code in codes {
            let (a, b) = pair_at(indices, code);
            connections.push(make(a, b));
        }
        debug!(total, sampled = connections.len(), "connection pairs sampled");
    }
    connections
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VizConfig;
    use crate::ingest::{RawRow, ingest_rows};

    fn dataset(n: usize) -> Dataset {
        let rows: Vec<RawRow> = (0..n)
            .map(|i| RawRow {
                id: (i + 1).to_string(),
                fine_type: "News".to_string(),
                first_date: "2020-03-01".to_string(),
                last_date: "2020-12-01".to_string(),
                keywords: "shared".to_string(),
                ..RawRow::default()
            })
            .collect();
        ingest_rows(&rows, &VizConfig::default(), &mut XorShift64Star::new(1))
    }

    #[test]
    fn small_sets_connect_every_pair() {
        let ds = dataset(4);
        let indices: Vec<usize> = (0..4).collect();
        let conns = build_connections(
            &ds,
            &indices,
            &ConnectionOptions::default(),
            &mut XorShift64Star::new(1),
        );
        assert_eq!(conns.len(), 6);
    }

    #[test]
    fn large_sets_are_capped_by_random_sampling() {
        let ds = dataset(60); // 1770 pairs
        let indices: Vec<usize> = (0..60).collect();
        let opts = ConnectionOptions::default();
        let conns =
            build_connections(&ds, &indices, &opts, &mut XorShift64Star::new(9));
        assert_eq!(conns.len(), opts.max_connections);

        // Distinct, ordered pairs only.
        let mut seen = FxHashSet::default();
        for c in &conns {
            assert!(c.from_index < c.to_index);
            assert!(seen.insert((c.from_index, c.to_index)));
        }
        // A uniform sample must not be the all-pairs prefix.
        let prefix: Vec<(usize, usize)> = {
            let mut p = Vec::new();
            'outer: for i in 0..60 {
                for j in (i + 1)..60 {
                    p.push((i, j));
                    if p.len() == opts.max_connections {
                        break 'outer;
                    }
                }
            }
            p
        };
        let sampled: Vec<(usize, usize)> =
            conns.iter().map(|c| (c.from_index, c.to_index)).collect();
        assert_ne!(sampled, prefix);
    }

    #[test]
    fn pair_decode_enumerates_the_upper_triangle() {
        let indices = [10, 20, 30, 40];
        let pairs: Vec<(usize, usize)> = (0..6).map(|p| pair_at(&indices, p)).collect();
        assert_eq!(
            pairs,
            vec![(10, 20), (10, 30), (10, 40), (20, 30), (20, 40), (30, 40)]
        );
    }

    #[test]
    fn fewer_than_two_nodes_yield_no_lines() {
        let ds = dataset(1);
        assert!(
            build_connections(
                &ds,
                &[0],
                &ConnectionOptions::default(),
                &mut XorShift64Star::new(1)
            )
            .is_empty()
        );
    }

    #[test]
    fn control_point_is_perpendicular_to_the_segment() {
        // Horizontal segment: the control point displaces vertically.
        let (cx, cy) = control_point(0.0, 0.0, 10.0, 0.0, 0.1);
        assert!((cx - 5.0).abs() < 1e-9);
        assert!((cy - 1.0).abs() < 1e-9);
        // Offset scales with segment length.
        let (_, cy2) = control_point(0.0, 0.0, 20.0, 0.0, 0.1);
        assert!((cy2 - 2.0).abs() < 1e-9);
    }
}
