#![forbid(unsafe_code)]

//! Render-tick pacing.
//!
//! Schedules render callbacks at a fixed target FPS while coalescing any
//! number of `mark_dirty` calls between ticks into a single render, and
//! compensates for a slow frame by shortening the following tick's delay
//! (drift correction) so long-run cadence stays on target.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Frame rates the runtime supports out of the box.
pub const SUPPORTED_FPS: [u32; 3] = [30, 60, 120];

const SAMPLE_WINDOW: usize = 60;

/// Snapshot of the limiter's recent pacing behavior.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FramerateLimiterStats {
    /// Ticks where a render actually ran.
    pub rendered_frames: u64,
    /// Ticks where nothing was dirty, so the render callback was skipped.
    pub skipped_frames: u64,
    /// Renders whose measured time exceeded the target interval.
    pub slow_frames: u64,
    /// `rendered_frames + skipped_frames`.
    pub total_frames: u64,
    /// Frames per second computed from the rolling tick-timestamp window.
    pub actual_fps: f64,
    /// Average of the last (up to 60) recorded render times, in microseconds.
    pub avg_render_time_us: u64,
}

/// Single-threaded cooperative pacer: call [`FramerateLimiter::poll`] on
/// every loop iteration and only render when it returns `true`.
pub struct FramerateLimiter {
    interval: Duration,
    dirty: bool,
    last_tick: Instant,
    next_tick: Instant,
    paused: bool,
    rendered_frames: u64,
    skipped_frames: u64,
    slow_frames: u64,
    render_time_samples: VecDeque<u64>,
    frame_timestamps: VecDeque<Instant>,
}

impl FramerateLimiter {
    /// Construct a limiter targeting `fps` frames per second.
    ///
    /// `fps` is not restricted to [`SUPPORTED_FPS`] at this boundary; callers
    /// that need to enforce the `{30, 60, 120}` contract should validate
    /// before constructing a [`crate::ProgramConfig`].
    #[must_use]
    pub fn new(fps: u32) -> Self {
        let interval = Self::interval_for(fps);
        let now = Instant::now();
        Self {
            interval,
            dirty: false,
            last_tick: now,
            next_tick: now + interval,
            paused: false,
            rendered_frames: 0,
            skipped_frames: 0,
            slow_frames: 0,
            render_time_samples: VecDeque::with_capacity(SAMPLE_WINDOW),
            frame_timestamps: VecDeque::with_capacity(SAMPLE_WINDOW),
        }
    }

    fn interval_for(fps: u32) -> Duration {
        Duration::from_micros(1_000_000 / u64::from(fps.max(1)))
    }

    /// Mark the next tick as needing a render. Callable from any thread in
    /// principle; this runtime only ever calls it from the Runtime task.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Clear the dirty flag, normally called right after a render completes.
    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    /// Whether a render is currently owed.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Cancel the outstanding tick. `poll` will never return `true` while paused.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Re-arm the timer, resetting cadence from now.
    pub fn resume(&mut self) {
        self.paused = false;
        self.last_tick = Instant::now();
        self.next_tick = self.last_tick + self.interval;
    }

    /// Change the target frame rate, rescheduling the next tick from now.
    pub fn set_fps(&mut self, fps: u32) {
        self.interval = Self::interval_for(fps);
        self.next_tick = Instant::now() + self.interval;
    }

    /// Time remaining before the next tick is due. Useful as an event-poll
    /// timeout so the caller wakes up no later than the next scheduled tick.
    #[must_use]
    pub fn time_until_next_tick(&self) -> Duration {
        if self.paused {
            return self.interval;
        }
        self.next_tick.saturating_duration_since(Instant::now())
    }

    /// Call once per loop iteration. Returns `true` exactly when a render
    /// should run now; reschedules the next tick with drift compensation
    /// regardless of the outcome.
    pub fn poll(&mut self) -> bool {
        if self.paused || Instant::now() < self.next_tick {
            return false;
        }

        let should_render = self.dirty;
        if should_render {
            self.rendered_frames += 1;
        } else {
            self.skipped_frames += 1;
        }

        let now = Instant::now();
        self.frame_timestamps.push_back(now);
        if self.frame_timestamps.len() > SAMPLE_WINDOW {
            self.frame_timestamps.pop_front();
        }

        let elapsed = now.saturating_duration_since(self.last_tick);
        let drift = elapsed.as_micros() as i64 - self.interval.as_micros() as i64;
        let next_delay_us = (self.interval.as_micros() as i64 - drift).max(0) as u64;
        self.last_tick = now;
        self.next_tick = now + Duration::from_micros(next_delay_us);

        should_render
    }

    /// Run the render callback's accounting immediately, bypassing pacing.
    /// Callers still invoke the callback themselves; this only updates the
    /// timing bookkeeping a forced render would otherwise skip.
    pub fn render_immediate(&mut self) {
        self.rendered_frames += 1;
        self.last_tick = Instant::now();
        self.next_tick = self.last_tick + self.interval;
    }

    /// Record how long a render callback took, for `stats()` and
    /// `slow_frames` accounting.
    pub fn record_render_time(&mut self, duration: Duration) {
        let us = duration.as_micros() as u64;
        if Duration::from_micros(us) > self.interval {
            self.slow_frames += 1;
        }
        self.render_time_samples.push_back(us);
        if self.render_time_samples.len() > SAMPLE_WINDOW {
            self.render_time_samples.pop_front();
        }
    }

    /// Snapshot current pacing statistics.
    #[must_use]
    pub fn stats(&self) -> FramerateLimiterStats {
        let total_frames = self.rendered_frames + self.skipped_frames;
        let avg_render_time_us = if self.render_time_samples.is_empty() {
            0
        } else {
            self.render_time_samples.iter().sum::<u64>() / self.render_time_samples.len() as u64
        };
        let actual_fps = if self.frame_timestamps.len() >= 2 {
            let span = self
                .frame_timestamps
                .back()
                .expect("len >= 2")
                .saturating_duration_since(*self.frame_timestamps.front().expect("len >= 2"))
                .as_secs_f64();
            if span > 0.0 {
                (self.frame_timestamps.len() - 1) as f64 / span
            } else {
                0.0
            }
        } else {
            0.0
        };
        FramerateLimiterStats {
            rendered_frames: self.rendered_frames,
            skipped_frames: self.skipped_frames,
            slow_frames: self.slow_frames,
            total_frames,
            actual_fps,
            avg_render_time_us,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_schedules_first_tick_one_interval_out() {
        let limiter = FramerateLimiter::new(60);
        let remaining = limiter.time_until_next_tick();
        assert!(remaining <= Duration::from_micros(16_667));
    }

    #[test]
    fn poll_before_interval_elapses_returns_false() {
        let mut limiter = FramerateLimiter::new(30);
        limiter.mark_dirty();
        assert!(!limiter.poll());
    }

    #[test]
    fn dirty_coalesces_to_one_render_per_tick() {
        let mut limiter = FramerateLimiter::new(120);
        for _ in 0..5 {
            limiter.mark_dirty();
        }
        limiter.next_tick = Instant::now();
        assert!(limiter.poll());
        assert_eq!(limiter.stats().rendered_frames, 1);
    }

    #[test]
    fn non_dirty_tick_counts_as_skipped() {
        let mut limiter = FramerateLimiter::new(120);
        limiter.next_tick = Instant::now();
        assert!(!limiter.poll());
        assert_eq!(limiter.stats().skipped_frames, 1);
    }

    #[test]
    fn pause_suppresses_ticks_until_resumed() {
        let mut limiter = FramerateLimiter::new(120);
        limiter.mark_dirty();
        limiter.pause();
        limiter.next_tick = Instant::now();
        assert!(!limiter.poll());
        limiter.resume();
        limiter.next_tick = Instant::now();
        assert!(limiter.poll());
    }

    #[test]
    fn set_fps_changes_interval() {
        let mut limiter = FramerateLimiter::new(30);
        limiter.set_fps(120);
        assert_eq!(limiter.interval, Duration::from_micros(1_000_000 / 120));
    }

    #[test]
    fn record_render_time_over_interval_counts_as_slow() {
        let mut limiter = FramerateLimiter::new(120);
        limiter.record_render_time(Duration::from_millis(20));
        assert_eq!(limiter.stats().slow_frames, 1);
    }

    #[test]
    fn record_render_time_under_interval_not_slow() {
        let mut limiter = FramerateLimiter::new(30);
        limiter.record_render_time(Duration::from_micros(500));
        assert_eq!(limiter.stats().slow_frames, 0);
    }

    #[test]
    fn stats_avg_render_time_averages_samples() {
        let mut limiter = FramerateLimiter::new(60);
        limiter.record_render_time(Duration::from_micros(100));
        limiter.record_render_time(Duration::from_micros(300));
        assert_eq!(limiter.stats().avg_render_time_us, 200);
    }

    #[test]
    fn supported_fps_list_matches_contract() {
        assert_eq!(SUPPORTED_FPS, [30, 60, 120]);
    }
}
