//! Heartbeat controller
//!
//! Keeps the gateway session alive by sending op 2 frames on a fixed period
//! derived from the server's hello interval.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::connection::Transport;
use crate::protocol::ClientFrame;

/// Lower bound for the tick period
pub const MIN_HEARTBEAT_PERIOD_MS: u64 = 500;

/// How far ahead of the server's deadline each heartbeat is sent
pub const HEARTBEAT_MARGIN_MS: u64 = 1000;

/// Tick period for a server-advertised heartbeat interval
pub fn tick_period(interval_ms: u64) -> Duration {
    Duration::from_millis(
        interval_ms
            .saturating_sub(HEARTBEAT_MARGIN_MS)
            .max(MIN_HEARTBEAT_PERIOD_MS),
    )
}

#[derive(Debug, Default)]
struct HeartbeatState {
    interval_ms: Option<u64>,
    timer: Option<JoinHandle<()>>,
    /// Bumped on every start/stop so a stale timer cannot clear a newer one
    generation: u64,
}

/// Periodic heartbeat sender; at most one timer is live at a time
#[derive(Debug, Clone, Default)]
pub struct HeartbeatController {
    state: Arc<Mutex<HeartbeatState>>,
}

impl HeartbeatController {
    /// Create an idle controller
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or restart) heartbeating on `transport`.
    ///
    /// Returns `false` and leaves any running timer untouched when
    /// `interval_ms` is zero.
    pub fn start(&self, interval_ms: u64, transport: Arc<dyn Transport>) -> bool {
        if interval_ms == 0 {
            tracing::warn!(interval_ms, "Ignoring invalid heartbeat interval");
            return false;
        }

        let period = tick_period(interval_ms);
        let mut state = self.state.lock();
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
        state.generation = state.generation.wrapping_add(1);
        state.interval_ms = Some(interval_ms);

        let generation = state.generation;
        let shared = Arc::clone(&self.state);
        state.timer = Some(tokio::spawn(run_heartbeat(
            shared, generation, period, transport,
        )));

        tracing::debug!(
            interval_ms,
            period_ms = period.as_millis() as u64,
            "Heartbeat started"
        );
        true
    }

    /// Cancel the timer and forget the interval
    pub fn stop(&self) {
        let mut state = self.state.lock();
        if let Some(timer) = state.timer.take() {
            timer.abort();
            tracing::debug!("Heartbeat stopped");
        }
        state.interval_ms = None;
        state.generation = state.generation.wrapping_add(1);
    }

    /// Whether a timer is live
    pub fn is_running(&self) -> bool {
        self.state.lock().timer.is_some()
    }

    /// The server interval the current timer was started with
    pub fn interval_ms(&self) -> Option<u64> {
        self.state.lock().interval_ms
    }

    /// The current tick period, if running
    pub fn period(&self) -> Option<Duration> {
        self.interval_ms().map(tick_period)
    }
}

async fn run_heartbeat(
    state: Arc<Mutex<HeartbeatState>>,
    generation: u64,
    period: Duration,
    transport: Arc<dyn Transport>,
) {
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        if !transport.is_open() {
            let mut state = state.lock();
            if state.generation == generation {
                state.timer = None;
                state.interval_ms = None;
            }
            tracing::debug!("Transport no longer open, heartbeat stopping");
            return;
        }

        let frame = match ClientFrame::heartbeat().to_json() {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode heartbeat");
                continue;
            }
        };

        match transport.send(frame) {
            Ok(()) => tracing::trace!("Heartbeat sent"),
            Err(e) => tracing::warn!(error = %e, "Failed to send heartbeat"),
        }
    }
}
