//! Iterative collision relaxation.
//!
//! An explicit position-update solver rather than a physics-engine
//! dependency: markers are pulled toward their lane center and temporal
//! target while overlapping pairs push apart, with a per-step displacement
//! clamp and a cooling schedule. Owning the solver keeps every tuning
//! constant in this crate and makes output reproducible from a seed.

use crate::error::{Error, Result};
use crate::rng::XorShift64Star;
use rustc_hash::FxHashMap;

#[derive(Debug, Clone)]
pub struct RelaxNode {
    pub lane: usize,
    /// Lane center the marker is attracted to.
    pub target_x: f64,
    /// Temporal coordinate the marker is attracted to.
    pub target_y: f64,
    pub radius: f64,
    /// Working position; pre-seeded with jitter, overwritten in place.
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

#[derive(Debug, Clone)]
pub struct RelaxOptions {
    /// Pull toward the lane center. Strong enough that markers never drift
    /// into a neighboring category's lane.
    pub lane_strength: f64,
    /// Pull toward the temporal target; weaker, so crowded months may wiggle
    /// vertically to resolve overlaps.
    pub time_strength: f64,
    pub collide_strength: f64,
    /// Extra separation beyond the radii sum.
    pub collide_buffer: f64,
    /// Fixed iteration budget; `None` scales inversely with dataset size.
    pub iterations: Option<usize>,
    /// Per-iteration displacement cap per marker.
    pub max_step: f64,
    /// Repel only same-lane pairs. Lane attraction already segregates the
    /// groups, so this is the cheaper default.
    pub partition_by_lane: bool,
    /// Above this node count, neighbor queries go through a uniform grid.
    pub grid_threshold: usize,
    /// Horizontal half-width each marker is clamped to around its lane.
    pub lane_half_width: Option<f64>,
    pub viewport: Option<Viewport>,
}

impl Default for RelaxOptions {
    fn default() -> Self {
        Self {
            lane_strength: 0.1,
            time_strength: 0.2,
            collide_strength: 1.0,
            collide_buffer: 8.0,
            iterations: None,
            max_step: 24.0,
            partition_by_lane: true,
            grid_threshold: 1024,
            lane_half_width: None,
            viewport: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RelaxStats {
    pub iterations: usize,
    pub converged: bool,
}

const CONVERGENCE_CHECK_PERIOD: usize = 10;

fn iteration_budget(n: usize, opts: &RelaxOptions) -> usize {
    if let Some(fixed) = opts.iterations {
        return fixed;
    }
    if n > 2000 {
        100
    } else if n > 1000 {
        150
    } else {
        200
    }
}

/// Relaxes `nodes` in place until the displacement budget is spent or the
/// system settles. Returns how many iterations ran.
pub fn relax(
    nodes: &mut [RelaxNode],
    opts: &RelaxOptions,
    rng: &mut XorShift64Star,
) -> Result<RelaxStats> {
    for (index, n) in nodes.iter().enumerate() {
        if !(n.radius > 0.0) {
            return Err(Error::InvalidRadius {
                index,
                radius: n.radius,
            });
        }
    }
    if nodes.is_empty() {
        return Ok(RelaxStats::default());
    }

    let n = nodes.len();
    let budget = iteration_budget(n, opts);
    let use_grid = n > opts.grid_threshold;
    let max_radius = nodes.iter().map(|m| m.radius).fold(0.0_f64, f64::max);
    let cell = (2.0 * max_radius + opts.collide_buffer).max(1.0);

    // Convergence threshold scales with the population, mirroring the
    // per-node displacement threshold of the spring embedder this solver is
    // modeled on.
    let settle_threshold = 0.05 * (n as f64);

    let mut disps: Vec<(f64, f64)> = vec![(0.0, 0.0); n];
    let mut grid: FxHashMap<(i64, i64), Vec<usize>> = FxHashMap::default();
    let mut stats = RelaxStats::default();

    for iter in 0..budget {
        stats.iterations = iter + 1;
        let alpha = 1.0 - (iter as f64) / (budget as f64);

        for (i, node) in nodes.iter().enumerate() {
            disps[i] = (
                (node.target_x - node.x) * opts.lane_strength * alpha.max(0.3),
                (node.target_y - node.y) * opts.time_strength * alpha.max(0.3),
            );
        }

        if use_grid {
            grid.clear();
            for (i, node) in nodes.iter().enumerate() {
                let key = ((node.x / cell).floor() as i64, (node.y / cell).floor() as i64);
                grid.entry(key).or_default().push(i);
            }
            for i in 0..n {
                let kx = (nodes[i].x / cell).floor() as i64;
                let ky = (nodes[i].y / cell).floor() as i64;
                for dx in -1..=1 {
                    for dy in -1..=1 {
                        let Some(bucket) = grid.get(&(kx + dx, ky + dy)) else {
                            continue;
                        };
                        for &j in bucket {
                            if j <= i {
                                continue;
                            }
                            resolve_pair(nodes, &mut disps, i, j, opts, rng);
                        }
                    }
                }
            }
        } else {
            for i in 0..n {
                for j in (i + 1)..n {
                    resolve_pair(nodes, &mut disps, i, j, opts, rng);
                }
            }
        }

        let mut total = 0.0;
        for (i, node) in nodes.iter_mut().enumerate() {
            let (mut dx, mut dy) = disps[i];
            let mag = (dx * dx + dy * dy).sqrt();
            if mag > opts.max_step {
                let s = opts.max_step / mag;
                dx *= s;
                dy *= s;
            }
            node.x += dx;
            node.y += dy;
            total += dx.abs() + dy.abs();
        }

        if (iter + 1) % CONVERGENCE_CHECK_PERIOD == 0 && total < settle_threshold {
            stats.converged = true;
            break;
        }
    }

    clamp_to_bounds(nodes, opts);
    Ok(stats)
}

fn resolve_pair(
    nodes: &[RelaxNode],
    disps: &mut [(f64, f64)],
    i: usize,
    j: usize,
    opts: &RelaxOptions,
    rng: &mut XorShift64Star,
) {
    if opts.partition_by_lane && nodes[i].lane != nodes[j].lane {
        return;
    }
    let min_dist = nodes[i].radius + nodes[j].radius + opts.collide_buffer;
    let mut dx = nodes[j].x - nodes[i].x;
    let mut dy = nodes[j].y - nodes[i].y;
    let mut dist2 = dx * dx + dy * dy;
    if dist2 >= min_dist * min_dist {
        return;
    }
    if dist2 < 1e-12 {
        // Coincident centers: separate along a random direction so the pair
        // does not stay welded together.
        let angle = rng.next_f64_unit() * std::f64::consts::TAU;
        dx = angle.cos() * 1e-3;
        dy = angle.sin() * 1e-3;
        dist2 = dx * dx + dy * dy;
    }
    let dist = dist2.sqrt();
    let overlap = (min_dist - dist) * 0.5 * opts.collide_strength;
    let ux = dx / dist;
    let uy = dy / dist;
    disps[i].0 -= ux * overlap;
    disps[i].1 -= uy * overlap;
    disps[j].0 += ux * overlap;
    disps[j].1 += uy * overlap;
}

fn clamp_to_bounds(nodes: &mut [RelaxNode], opts: &RelaxOptions) {
    for node in nodes.iter_mut() {
        if let Some(half) = opts.lane_half_width {
            node.x = node.x.clamp(node.target_x - half, node.target_x + half);
        }
        if let Some(v) = opts.viewport {
            node.x = node.x.clamp(v.x_min + node.radius, v.x_max - node.radius);
            node.y = node.y.clamp(v.y_min + node.radius, v.y_max - node.radius);
        }
    }
}
