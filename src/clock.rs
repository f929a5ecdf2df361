pub const DEFAULT_TICK_MS: u64 = 100;

/// What a poll of the clock produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClockSignal {
    Tick { remaining_ms: u64, fraction: f64 },
    Expired,
}

#[derive(Debug, Clone, Copy)]
struct Run {
    started_at: u64,
    duration_ms: u64,
    next_tick_at: u64,
}

/// Countdown driven by polling. Remaining time is always derived from the
/// start timestamp, so late or irregular polls never accumulate drift.
#[derive(Debug, Clone)]
pub struct RoundClock {
    period_ms: u64,
    run: Option<Run>,
}

impl Default for RoundClock {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_MS)
    }
}

impl RoundClock {
    pub fn new(period_ms: u64) -> Self {
        Self {
            period_ms: period_ms.max(1),
            run: None,
        }
    }

    /// Start a countdown, replacing any run in progress.
    pub fn start(&mut self, duration_ms: u64, now_ms: u64) {
        self.run = Some(Run {
            started_at: now_ms,
            duration_ms,
            next_tick_at: now_ms,
        });
    }

    pub fn stop(&mut self) {
        self.run = None;
    }

    pub fn is_running(&self) -> bool {
        self.run.is_some()
    }

    pub fn elapsed_ms(&self, now_ms: u64) -> u64 {
        self.run
            .map_or(0, |run| now_ms.saturating_sub(run.started_at))
    }

    pub fn remaining_ms(&self, now_ms: u64) -> u64 {
        self.run.map_or(0, |run| {
            run.duration_ms
                .saturating_sub(now_ms.saturating_sub(run.started_at))
        })
    }

    /// `Tick` at most once per period, then `Expired` exactly once.
    pub fn poll(&mut self, now_ms: u64) -> Option<ClockSignal> {
        let remaining_ms = self.remaining_ms(now_ms);
        let run = self.run.as_mut()?;

        if remaining_ms == 0 {
            self.run = None;
            return Some(ClockSignal::Expired);
        }

        if now_ms < run.next_tick_at {
            return None;
        }

        // Align to the period grid measured from the start
        let since_start = now_ms.saturating_sub(run.started_at);
        run.next_tick_at = run.started_at + (since_start / self.period_ms + 1) * self.period_ms;

        let fraction = if run.duration_ms == 0 {
            0.0
        } else {
            (remaining_ms as f64 / run.duration_ms as f64).clamp(0.0, 1.0)
        };
        Some(ClockSignal::Tick {
            remaining_ms,
            fraction,
        })
    }
}
