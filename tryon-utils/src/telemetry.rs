//! Scoped timing logs for the try-on pipeline.
//!
//! A [`TimingGuard`] records when it was created and logs the elapsed time under the
//! `tryon::telemetry` target when dropped. Guards only activate when telemetry was switched on with
//! [`configure`] and the requested level passes both the telemetry threshold and the logger filter.

use std::{
    borrow::Cow,
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
    time::{Duration, Instant},
};

use log::{Level, LevelFilter, log, log_enabled};

/// Log target used for every telemetry record.
pub const TELEMETRY_TARGET: &str = "tryon::telemetry";

static TELEMETRY_ENABLED: AtomicBool = AtomicBool::new(false);
static TELEMETRY_LEVEL: AtomicUsize = AtomicUsize::new(LevelFilter::Off as usize);

/// Logs how long a scope took when it goes out of scope.
pub struct TimingGuard {
    label: Cow<'static, str>,
    level: Level,
    start: Instant,
    active: bool,
}

impl TimingGuard {
    /// Returns `true` when dropping the guard will emit a record.
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Consume the guard without logging and return the elapsed time.
    pub fn finish(mut self) -> Duration {
        self.active = false;
        self.start.elapsed()
    }
}

impl Drop for TimingGuard {
    fn drop(&mut self) {
        if !self.active {
            return;
        }
        log!(
            target: TELEMETRY_TARGET,
            self.level,
            "{} took {:.2?}",
            self.label,
            self.start.elapsed()
        );
    }
}

/// Start timing a scope at `level`.
pub fn timing_guard(label: impl Into<Cow<'static, str>>, level: Level) -> TimingGuard {
    timing_guard_if(label, level, true)
}

/// Start timing a scope, additionally gated by a caller-provided switch.
pub fn timing_guard_if(
    label: impl Into<Cow<'static, str>>,
    level: Level,
    enabled: bool,
) -> TimingGuard {
    let active = enabled && telemetry_allows(level) && log_enabled!(target: TELEMETRY_TARGET, level);
    TimingGuard {
        label: label.into(),
        level,
        start: Instant::now(),
        active,
    }
}

/// Update the process-wide telemetry switch and threshold.
pub fn configure(enabled: bool, level: LevelFilter) {
    TELEMETRY_ENABLED.store(enabled, Ordering::Relaxed);
    TELEMETRY_LEVEL.store(level as usize, Ordering::Relaxed);
}

pub fn telemetry_enabled() -> bool {
    TELEMETRY_ENABLED.load(Ordering::Relaxed)
}

pub fn telemetry_level() -> LevelFilter {
    let index = TELEMETRY_LEVEL.load(Ordering::Relaxed);
    LevelFilter::iter()
        .nth(index)
        .unwrap_or(LevelFilter::Off)
}

/// Returns `true` when telemetry is on and `level` is within the configured threshold.
pub fn telemetry_allows(level: Level) -> bool {
    telemetry_enabled() && level <= telemetry_level()
}
