//! Timeline playback controller.
//!
//! `current_time` lives in [0, 1] and maps linearly onto the dataset's date
//! span. Advancing is host-agnostic: whatever event loop exists calls
//! [`TimelineState::tick`] once per frame with a millisecond clock; tests
//! call it synchronously in a loop.

use chrono::NaiveDate;

use crate::config::TimelineOptions;
use crate::record::Record;

#[derive(Debug, Clone)]
pub struct TimelineState {
    current_time: f64,
    playing: bool,
    start: NaiveDate,
    end: NaiveDate,
    /// Last tracked user interaction, for the sliding idle window.
    last_interaction_ms: u64,
    /// Set by manual scrubs; tells the renderer to skip eased transitions
    /// for the next update.
    scrubbed: bool,
}

/// What a tick did, so the caller can run the required follow-ups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickOutcome {
    /// Loop wrap happened: the caller must fully reset selection state and
    /// clear connector lines.
    pub wrapped: bool,
    /// Reached 1.0 without looping and stopped.
    pub finished: bool,
}

impl TimelineState {
    pub fn new(span: (NaiveDate, NaiveDate)) -> Self {
        Self {
            current_time: 0.0,
            playing: false,
            start: span.0,
            end: span.1,
            last_interaction_ms: 0,
            scrubbed: false,
        }
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Cursor date by linear interpolation over the span, in whole days.
    pub fn current_date(&self) -> NaiveDate {
        let span_days = (self.end - self.start).num_days().max(0) as f64;
        let offset = (span_days * self.current_time).floor() as i64;
        self.start + chrono::Duration::days(offset)
    }

    pub fn play(&mut self) {
        self.playing = true;
    }

    /// Stops playback; the host must cancel its pending frame callback so no
    /// further ticks arrive until `play`.
    pub fn pause(&mut self) {
        self.playing = false;
    }

    /// Records a tracked interaction, restarting the idle window. Selection-
    /// causing clicks pause playback first.
    pub fn note_interaction(&mut self, now_ms: u64, pauses_playback: bool) {
        self.last_interaction_ms = now_ms;
        if pauses_playback {
            self.playing = false;
        }
    }

    /// Manual scrub: clamps to [0, 1] and marks the update as instant.
    pub fn scrub(&mut self, t: f64, now_ms: u64) {
        self.current_time = t.clamp(0.0, 1.0);
        self.scrubbed = true;
        self.note_interaction(now_ms, false);
    }

    /// True once after each manual scrub; autonomous ticks use eased motion.
    pub fn take_scrubbed(&mut self) -> bool {
        std::mem::take(&mut self.scrubbed)
    }

    /// Per-frame advance. Applies idle auto-play first, then moves the
    /// cursor when playing.
    pub fn tick(&mut self, opts: &TimelineOptions, now_ms: u64) -> TickOutcome {
        if !self.playing
            && now_ms.saturating_sub(self.last_interaction_ms) >= opts.idle_timeout_ms
        {
            self.playing = true;
        }
        if !self.playing {
            return TickOutcome::default();
        }

        self.current_time += opts.tick_step;
        if self.current_time < 1.0 {
            return TickOutcome::default();
        }

        if opts.looped {
            self.current_time = 0.0;
            TickOutcome {
                wrapped: true,
                finished: false,
            }
        } else {
            self.current_time = 1.0;
            self.playing = false;
            TickOutcome {
                wrapped: false,
                finished: true,
            }
        }
    }

    /// Visibility test for one record at the current cursor.
    pub fn visible(&self, record: &Record) -> bool {
        record.visible_at(self.current_date())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span() -> (NaiveDate, NaiveDate) {
        (
            NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2020, 12, 31).unwrap(),
        )
    }

    fn opts() -> TimelineOptions {
        TimelineOptions::default()
    }

    #[test]
    fn cursor_interpolates_the_date_span() {
        let mut tl = TimelineState::new(span());
        assert_eq!(tl.current_date(), span().0);
        tl.scrub(1.0, 0);
        assert_eq!(tl.current_date(), span().1);
        tl.scrub(0.5, 0);
        assert_eq!(tl.current_date(), NaiveDate::from_ymd_opt(2020, 7, 1).unwrap());
    }

    #[test]
    fn scrub_clamps_and_suppresses_easing_once() {
        let mut tl = TimelineState::new(span());
        tl.scrub(3.5, 0);
        assert!((tl.current_time() - 1.0).abs() < 1e-12);
        assert!(tl.take_scrubbed());
        assert!(!tl.take_scrubbed());
        tl.scrub(-0.5, 0);
        assert_eq!(tl.current_time(), 0.0);
    }

    #[test]
    fn loop_wrap_reports_and_restarts() {
        let mut tl = TimelineState::new(span());
        tl.scrub(0.99999, 0);
        tl.play();
        let mut wrapped = false;
        for _ in 0..10 {
            if tl.tick(&opts(), 0).wrapped {
                wrapped = true;
                break;
            }
        }
        assert!(wrapped);
        assert_eq!(tl.current_time(), 0.0);
        assert!(tl.is_playing());
    }

    #[test]
    fn non_looped_playback_stops_at_the_end() {
        let mut tl = TimelineState::new(span());
        let o = TimelineOptions {
            looped: false,
            ..opts()
        };
        tl.scrub(0.99999, 0);
        tl.play();
        let mut outcome = TickOutcome::default();
        for _ in 0..10 {
            outcome = tl.tick(&o, 0);
            if outcome.finished {
                break;
            }
        }
        assert!(outcome.finished);
        assert!((tl.current_time() - 1.0).abs() < 1e-12);
        assert!(!tl.is_playing());
    }

    #[test]
    fn idle_window_resumes_playback_and_slides_on_interaction() {
        let mut tl = TimelineState::new(span());
        let o = opts();
        tl.note_interaction(0, true);
        assert!(!tl.is_playing());
        tl.tick(&o, 59_999);
        assert!(!tl.is_playing());
        // Interaction slides the window forward.
        tl.note_interaction(59_000, true);
        tl.tick(&o, 60_001);
        assert!(!tl.is_playing());
        tl.tick(&o, 119_000);
        assert!(tl.is_playing());
    }

    #[test]
    fn visibility_toggles_exactly_at_the_interval_bounds() {
        use crate::config::VizConfig;
        use crate::ingest::{RawRow, ingest_rows};
        use bumble::XorShift64Star;

        let rows = vec![RawRow {
            id: "1".to_string(),
            fine_type: "News".to_string(),
            first_date: "2020-03-01".to_string(),
            last_date: "2020-06-30".to_string(),
            keywords: "a".to_string(),
            ..RawRow::default()
        }];
        let ds = ingest_rows(&rows, &VizConfig::default(), &mut XorShift64Star::new(1));
        let rec = &ds.records()[0];

        let mut tl = TimelineState::new(span());
        let mut toggles = 0;
        let mut prev = false;
        let total_days = (span().1 - span().0).num_days();
        for d in 0..=total_days {
            tl.scrub((d as f64) / (total_days as f64), 0);
            let vis = tl.visible(rec);
            if vis != prev {
                toggles += 1;
                prev = vis;
            }
        }
        // On at first, off after last: exactly two toggles, no flicker.
        assert_eq!(toggles, 2);
    }
}
