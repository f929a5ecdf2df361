use std::cell::Cell;
use std::rc::Rc;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use crate::clock::DEFAULT_TICK_MS;
use crate::config::ArcadeConfig;
use crate::round::{ContentSource, PlayerInput, RoundMachine};

/// Monotonic milliseconds used by the round clock and scheduled advances
pub trait TimeSource {
    fn now_ms(&self) -> u64;
}

/// Production time source measured from construction
#[derive(Clone, Copy, Debug)]
pub struct MonotonicTime {
    origin: Instant,
}

impl MonotonicTime {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicTime {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for MonotonicTime {
    fn now_ms(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

/// Hand-driven time for tests; clones share the same instant.
#[derive(Clone, Debug, Default)]
pub struct ManualTime {
    now: Rc<Cell<u64>>,
}

impl ManualTime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, ms: u64) {
        self.now.set(ms);
    }

    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get().saturating_add(ms));
    }
}

impl TimeSource for ManualTime {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

/// Unified event type consumed by a round machine
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArcadeEvent {
    Input(PlayerInput),
    Start,
    Next,
    Stop,
    Tick,
}

/// Source of shell events (key presses, clicks, control buttons)
pub trait ArcadeEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    /// Returns Ok(event) if an event arrives before the timeout, or Err(Timeout) if it expires.
    fn recv_timeout(&self, timeout: Duration) -> Result<ArcadeEvent, RecvTimeoutError>;
}

/// Event source fed by the shell through an mpsc channel
pub struct ChannelEventSource {
    rx: Receiver<ArcadeEvent>,
}

impl ChannelEventSource {
    pub fn new(rx: Receiver<ArcadeEvent>) -> Self {
        Self { rx }
    }
}

impl ArcadeEventSource for ChannelEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<ArcadeEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// How long the runner waits for input before synthesizing a `Tick`.
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Tick period shared by every round machine, 100 ms unless configured.
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    period: Duration,
}

impl FixedTicker {
    pub fn new(period: Duration) -> Self {
        Self { period }
    }

    /// Zero is bumped to 1 ms so the runner never spins.
    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms.max(1)))
    }

    /// Matches the period the machines' round clocks are aligned to.
    pub fn for_config(config: &ArcadeConfig) -> Self {
        Self::from_millis(config.tick_interval_ms)
    }
}

impl Default for FixedTicker {
    fn default() -> Self {
        Self::from_millis(DEFAULT_TICK_MS)
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.period
    }
}

/// Cooperative loop body: one shell event, or a tick when the shell is quiet.
pub struct Runner<E: ArcadeEventSource, T: Ticker> {
    events: E,
    ticker: T,
}

impl<E: ArcadeEventSource, T: Ticker> Runner<E, T> {
    pub fn new(events: E, ticker: T) -> Self {
        Self { events, ticker }
    }

    /// Waits at most one period. A closed channel also yields `Tick` so
    /// running rounds keep expiring after the shell detaches.
    pub fn step(&self) -> ArcadeEvent {
        self.events
            .recv_timeout(self.ticker.interval())
            .unwrap_or(ArcadeEvent::Tick)
    }

    /// Step once and hand the event to `machine`.
    pub fn drive<C: ContentSource, S: TimeSource>(
        &self,
        machine: &mut RoundMachine<C, S>,
    ) -> ArcadeEvent {
        let event = self.step();
        machine.handle(event.clone());
        event
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn step_returns_tick_on_timeout() {
        let (_tx, rx) = mpsc::channel();
        let es = ChannelEventSource::new(rx);
        let ticker = FixedTicker::new(Duration::from_millis(1));
        let runner = Runner::new(es, ticker);

        // With no events available, step should yield Tick
        assert_eq!(runner.step(), ArcadeEvent::Tick);
    }

    #[test]
    fn step_passes_through_events() {
        let (tx, rx) = mpsc::channel();
        tx.send(ArcadeEvent::Input(PlayerInput::Char('a'))).unwrap();
        let runner = Runner::new(ChannelEventSource::new(rx), FixedTicker::from_millis(10));

        assert_eq!(runner.step(), ArcadeEvent::Input(PlayerInput::Char('a')));
    }

    #[test]
    fn step_ticks_after_sender_dropped() {
        let (tx, rx) = mpsc::channel();
        drop(tx);
        let runner = Runner::new(ChannelEventSource::new(rx), FixedTicker::from_millis(1));
        assert_eq!(runner.step(), ArcadeEvent::Tick);
    }

    #[test]
    fn ticker_follows_config_period() {
        let config = ArcadeConfig {
            tick_interval_ms: 40,
            ..ArcadeConfig::default()
        };
        assert_eq!(
            FixedTicker::for_config(&config).interval(),
            Duration::from_millis(40)
        );
        assert_eq!(FixedTicker::default().interval(), Duration::from_millis(100));
        assert_eq!(FixedTicker::from_millis(0).interval(), Duration::from_millis(1));
    }

    #[test]
    fn manual_time_is_shared_between_clones() {
        let time = ManualTime::new();
        let handle = time.clone();
        handle.advance(250);
        handle.advance(250);
        assert_eq!(time.now_ms(), 500);
        time.set(42);
        assert_eq!(handle.now_ms(), 42);
    }
}
