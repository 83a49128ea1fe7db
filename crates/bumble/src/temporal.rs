//! Temporal (vertical) coordinate assignment.
//!
//! Two policies are supported:
//!
//! - `Direct`: a plain linear time scale over the full date span.
//! - `DensityAware`: the date span is partitioned into calendar-month bands
//!   whose heights grow with record density (and shrink over configured
//!   quiet periods), so crowded months get room to breathe instead of
//!   collapsing into an unreadable strip.

use crate::rng::XorShift64Star;
use crate::scale::LinearScale;
use rustc_hash::FxHashMap;

/// A calendar date. Kept as plain integers so this crate stays free of any
/// datetime dependency; callers validate dates before handing them over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CalendarDay {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl CalendarDay {
    pub fn new(year: i32, month: u32, day: u32) -> Self {
        Self { year, month, day }
    }

    /// Sequential month number (year * 12 + month - 1), used as a band key.
    pub fn month_index(&self) -> i64 {
        (self.year as i64) * 12 + (self.month as i64) - 1
    }

    pub fn days_in_month(&self) -> u32 {
        match self.month {
            1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
            4 | 6 | 9 | 11 => 30,
            2 => {
                let y = self.year;
                if (y % 4 == 0 && y % 100 != 0) || y % 400 == 0 {
                    29
                } else {
                    28
                }
            }
            _ => 31,
        }
    }

    /// Fractional position of this day within its month, in [0, 1).
    pub fn month_progress(&self) -> f64 {
        ((self.day.saturating_sub(1)) as f64) / (self.days_in_month() as f64)
    }

    /// Days since 1970-01-01 (days-from-civil; proleptic Gregorian).
    pub fn day_number(&self) -> i64 {
        let y = if self.month <= 2 {
            self.year as i64 - 1
        } else {
            self.year as i64
        };
        let era = if y >= 0 { y } else { y - 399 } / 400;
        let yoe = y - era * 400;
        let m = self.month as i64;
        let d = self.day as i64;
        let doy = (153 * (if m > 2 { m - 3 } else { m + 9 }) + 2) / 5 + d - 1;
        let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
        era * 146097 + doe - 719468
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimePolicy {
    Direct,
    #[default]
    DensityAware,
}

/// A month with an extra height multiplier (e.g. a pandemic-onset month that
/// deserves more vertical room than its raw density tier would give it).
#[derive(Debug, Clone, Copy)]
pub struct MonthBoost {
    pub year: i32,
    pub month: u32,
    pub factor: f64,
}

/// A low-information date range compressed by `factor` to avoid wasting
/// vertical space on it.
#[derive(Debug, Clone, Copy)]
pub struct QuietPeriod {
    pub from: CalendarDay,
    pub to: CalendarDay,
    pub factor: f64,
}

#[derive(Debug, Clone)]
pub struct TemporalOptions {
    pub policy: TimePolicy,
    pub y_top: f64,
    pub y_bottom: f64,
    /// Base height of one month band before density multipliers.
    pub base_month_height: f64,
    /// Jitter bound as a fraction of the band height.
    pub jitter_fraction: f64,
    pub boosts: Vec<MonthBoost>,
    pub quiet_periods: Vec<QuietPeriod>,
    /// Minimum spread of the produced coordinates as a fraction of the
    /// available height; degenerate spans are stretched up to this.
    pub min_spread_fraction: f64,
}

impl Default for TemporalOptions {
    fn default() -> Self {
        Self {
            policy: TimePolicy::DensityAware,
            y_top: 0.0,
            y_bottom: 2000.0,
            base_month_height: 80.0,
            jitter_fraction: 0.15,
            // March 2020 carries the pandemic onset and is always crowded.
            boosts: vec![MonthBoost {
                year: 2020,
                month: 3,
                factor: 1.5,
            }],
            quiet_periods: Vec::new(),
            min_spread_fraction: 0.25,
        }
    }
}

/// One stacked month band of the density-aware layout.
#[derive(Debug, Clone, Copy)]
pub struct MonthBand {
    pub year: i32,
    pub month: u32,
    pub count: usize,
    pub y_start: f64,
    pub y_end: f64,
}

impl MonthBand {
    pub fn height(&self) -> f64 {
        self.y_end - self.y_start
    }
}

fn density_tier(count: usize) -> f64 {
    if count > 200 {
        3.0
    } else if count > 100 {
        2.0
    } else if count > 50 {
        1.5
    } else {
        1.0
    }
}

fn month_mid_day(year: i32, month: u32) -> CalendarDay {
    CalendarDay::new(year, month, 15)
}

fn quiet_factor(opts: &TemporalOptions, year: i32, month: u32) -> f64 {
    let mid = month_mid_day(year, month);
    let mut factor = 1.0;
    for q in &opts.quiet_periods {
        if mid >= q.from && mid <= q.to {
            factor *= q.factor;
        }
    }
    factor
}

fn boost_factor(opts: &TemporalOptions, year: i32, month: u32) -> f64 {
    let mut factor = 1.0;
    for b in &opts.boosts {
        if b.year == year && b.month == month {
            factor *= b.factor;
        }
    }
    factor
}

/// Stacks one band per calendar month across the dates' span. Months with no
/// records still occupy a base-height band so the axis stays continuous.
pub fn month_bands(dates: &[CalendarDay], opts: &TemporalOptions) -> Vec<MonthBand> {
    let (Some(first), Some(last)) = (dates.iter().min(), dates.iter().max()) else {
        return Vec::new();
    };

    let mut counts: FxHashMap<i64, usize> = FxHashMap::default();
    for d in dates {
        *counts.entry(d.month_index()).or_insert(0) += 1;
    }

    let mut bands = Vec::new();
    let mut cursor = opts.y_top;
    let mut idx = first.month_index();
    let end_idx = last.month_index();
    while idx <= end_idx {
        let year = (idx.div_euclid(12)) as i32;
        let month = (idx.rem_euclid(12) + 1) as u32;
        let count = counts.get(&idx).copied().unwrap_or(0);
        let height = opts.base_month_height
            * density_tier(count)
            * boost_factor(opts, year, month)
            * quiet_factor(opts, year, month);
        bands.push(MonthBand {
            year,
            month,
            count,
            y_start: cursor,
            y_end: cursor + height,
        });
        cursor += height;
        idx += 1;
    }
    bands
}

/// Assigns each record its vertical target coordinate.
///
/// Returns the per-record coordinates plus the month bands (empty for the
/// direct policy). Jitter draws from `rng`, so a fixed seed reproduces the
/// exact layout.
pub fn layout_y(
    dates: &[CalendarDay],
    opts: &TemporalOptions,
    rng: &mut XorShift64Star,
) -> (Vec<f64>, Vec<MonthBand>) {
    if dates.is_empty() {
        return (Vec::new(), Vec::new());
    }

    let (mut ys, bands) = match opts.policy {
        TimePolicy::Direct => {
            let lo = dates.iter().map(|d| d.day_number()).min().unwrap_or(0) as f64;
            let hi = dates.iter().map(|d| d.day_number()).max().unwrap_or(0) as f64;
            let scale = LinearScale::new((lo, hi), (opts.y_top, opts.y_bottom));
            let ys: Vec<f64> = dates
                .iter()
                .map(|d| scale.position(d.day_number() as f64))
                .collect();
            (ys, Vec::new())
        }
        TimePolicy::DensityAware => {
            let bands = month_bands(dates, opts);
            let by_index: FxHashMap<i64, usize> = bands
                .iter()
                .enumerate()
                .map(|(i, b)| (CalendarDay::new(b.year, b.month, 1).month_index(), i))
                .collect();
            let ys: Vec<f64> = dates
                .iter()
                .map(|d| {
                    let band = &bands[by_index[&d.month_index()]];
                    let h = band.height();
                    let jitter = rng.next_f64_signed() * opts.jitter_fraction * h;
                    band.y_start + 0.1 * h + d.month_progress() * 0.8 * h + jitter
                })
                .collect();
            (ys, bands)
        }
    };

    stretch_degenerate_span(&mut ys, opts);
    (ys, bands)
}

/// All records sharing (nearly) one date collapse the vertical spread; keep
/// the picture legible by stretching coordinates about their centroid.
fn stretch_degenerate_span(ys: &mut [f64], opts: &TemporalOptions) {
    if ys.len() < 2 {
        return;
    }
    let available = (opts.y_bottom - opts.y_top).abs();
    let min_spread = opts.min_spread_fraction * available;
    if min_spread <= 0.0 {
        return;
    }
    let lo = ys.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = ys.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let spread = hi - lo;
    if spread >= min_spread {
        return;
    }
    let centroid = ys.iter().sum::<f64>() / (ys.len() as f64);
    let factor = if spread > f64::EPSILON {
        min_spread / spread
    } else {
        // Identical coordinates: nothing to scale; fan out uniformly instead.
        let n = ys.len() as f64;
        for (i, y) in ys.iter_mut().enumerate() {
            *y = centroid - min_spread / 2.0 + min_spread * (i as f64) / (n - 1.0);
        }
        return;
    };
    for y in ys.iter_mut() {
        *y = centroid + (*y - centroid) * factor;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> XorShift64Star {
        XorShift64Star::new(1)
    }

    #[test]
    fn day_number_matches_known_anchors() {
        assert_eq!(CalendarDay::new(1970, 1, 1).day_number(), 0);
        assert_eq!(CalendarDay::new(1970, 1, 2).day_number(), 1);
        assert_eq!(CalendarDay::new(2020, 3, 1).day_number(), 18322);
    }

    #[test]
    fn leap_years_get_29_days_in_february() {
        assert_eq!(CalendarDay::new(2020, 2, 1).days_in_month(), 29);
        assert_eq!(CalendarDay::new(2021, 2, 1).days_in_month(), 28);
        assert_eq!(CalendarDay::new(2000, 2, 1).days_in_month(), 29);
        assert_eq!(CalendarDay::new(1900, 2, 1).days_in_month(), 28);
    }

    #[test]
    fn month_bands_cover_the_span_contiguously() {
        let dates = vec![
            CalendarDay::new(2020, 1, 10),
            CalendarDay::new(2020, 4, 2),
            CalendarDay::new(2020, 4, 20),
        ];
        let opts = TemporalOptions::default();
        let bands = month_bands(&dates, &opts);
        assert_eq!(bands.len(), 4); // Jan..Apr, including empty Feb/Mar
        assert_eq!(bands[0].month, 1);
        assert_eq!(bands[3].month, 4);
        for w in bands.windows(2) {
            assert!((w[0].y_end - w[1].y_start).abs() < 1e-9);
        }
        assert_eq!(bands[3].count, 2);
    }

    #[test]
    fn dense_months_get_taller_bands() {
        let mut dates = Vec::new();
        for i in 0..120 {
            dates.push(CalendarDay::new(2020, 5, 1 + (i % 28)));
        }
        dates.push(CalendarDay::new(2020, 6, 3));
        let opts = TemporalOptions {
            boosts: Vec::new(),
            ..TemporalOptions::default()
        };
        let bands = month_bands(&dates, &opts);
        let may = bands.iter().find(|b| b.month == 5).unwrap();
        let june = bands.iter().find(|b| b.month == 6).unwrap();
        // 120 records lands in the ×2 tier.
        assert!((may.height() - 2.0 * june.height()).abs() < 1e-9);
    }

    #[test]
    fn quiet_period_compresses_its_months() {
        let dates = vec![
            CalendarDay::new(2021, 1, 5),
            CalendarDay::new(2021, 2, 5),
            CalendarDay::new(2021, 3, 5),
        ];
        let opts = TemporalOptions {
            boosts: Vec::new(),
            quiet_periods: vec![QuietPeriod {
                from: CalendarDay::new(2021, 2, 1),
                to: CalendarDay::new(2021, 2, 28),
                factor: 0.45,
            }],
            ..TemporalOptions::default()
        };
        let bands = month_bands(&dates, &opts);
        let jan = bands.iter().find(|b| b.month == 1).unwrap();
        let feb = bands.iter().find(|b| b.month == 2).unwrap();
        assert!((feb.height() - 0.45 * jan.height()).abs() < 1e-9);
    }

    #[test]
    fn density_aware_placement_stays_inside_its_band() {
        let dates: Vec<CalendarDay> =
            (1..=28).map(|d| CalendarDay::new(2020, 3, d)).collect();
        let opts = TemporalOptions::default();
        let mut rng = seeded();
        let (ys, bands) = layout_y(&dates, &opts, &mut rng);
        let band = bands[0];
        for y in ys {
            // 0.1h margin + 0.8h body + 0.15h jitter can overshoot the band
            // edge by at most 0.05h.
            assert!(y >= band.y_start - 0.06 * band.height());
            assert!(y <= band.y_end + 0.06 * band.height());
        }
    }

    #[test]
    fn direct_policy_orders_records_linearly() {
        let dates = vec![
            CalendarDay::new(2020, 1, 1),
            CalendarDay::new(2020, 7, 1),
            CalendarDay::new(2021, 1, 1),
        ];
        let opts = TemporalOptions {
            policy: TimePolicy::Direct,
            min_spread_fraction: 0.0,
            ..TemporalOptions::default()
        };
        let mut rng = seeded();
        let (ys, bands) = layout_y(&dates, &opts, &mut rng);
        assert!(bands.is_empty());
        assert!(ys[0] < ys[1] && ys[1] < ys[2]);
        assert!((ys[0] - opts.y_top).abs() < 1e-9);
        assert!((ys[2] - opts.y_bottom).abs() < 1e-9);
    }

    #[test]
    fn single_date_dataset_is_stretched_to_the_minimum_spread() {
        let dates = vec![CalendarDay::new(2020, 3, 14); 10];
        let opts = TemporalOptions {
            y_top: 0.0,
            y_bottom: 1000.0,
            min_spread_fraction: 0.25,
            ..TemporalOptions::default()
        };
        let mut rng = seeded();
        let (ys, _) = layout_y(&dates, &opts, &mut rng);
        let lo = ys.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = ys.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        assert!(hi - lo >= 0.25 * 1000.0 - 1e-6);
    }

    #[test]
    fn layout_is_deterministic_for_a_fixed_seed() {
        let dates: Vec<CalendarDay> =
            (1..=20).map(|d| CalendarDay::new(2020, 6, d)).collect();
        let opts = TemporalOptions::default();
        let (a, _) = layout_y(&dates, &opts, &mut XorShift64Star::new(9));
        let (b, _) = layout_y(&dates, &opts, &mut XorShift64Star::new(9));
        assert_eq!(a, b);
    }
}
