//! Fixed-cadence status polling, active only while a session may be running.

use std::time::Duration;

use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tracing::debug;

/// Default poll cadence.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// What the engine should do after a push event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollAction {
    /// Nothing to poll.
    None,
    /// The loop just started; poll immediately rather than waiting a tick.
    PollNow,
    /// The loop just stopped; poll once more for the definitive stop value.
    FinalPoll,
}

/// Starts and stops the poll loop from observed `output_active` values.
///
/// The timer is created on the first [`PollScheduler::tick`], so starting and
/// stopping the loop works outside a runtime.
#[derive(Debug)]
pub struct PollScheduler {
    period: Duration,
    running: bool,
    ticker: Option<Interval>,
}

impl PollScheduler {
    /// Create a stopped scheduler with the given cadence.
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            running: false,
            ticker: None,
        }
    }

    /// Whether the poll loop is running.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// React to a `RecordStateChanged` push event.
    pub fn on_push(&mut self, output_active: bool) -> PollAction {
        match (output_active, self.is_running()) {
            (true, false) => {
                self.start();
                PollAction::PollNow
            }
            (false, true) => {
                self.stop();
                PollAction::FinalPoll
            }
            _ => PollAction::None,
        }
    }

    /// React to a poll result; picks up sessions that started while disconnected.
    pub fn on_poll_result(&mut self, output_active: bool) {
        match (output_active, self.is_running()) {
            (true, false) => self.start(),
            (false, true) => self.stop(),
            _ => {}
        }
    }

    /// Stop the loop, e.g. on disconnect.
    pub fn stop(&mut self) {
        self.ticker = None;
        if std::mem::take(&mut self.running) {
            debug!("Poll loop stopped");
        }
    }

    /// Resolve on the next tick; pending forever while stopped.
    pub async fn tick(&mut self) {
        if !self.running {
            return std::future::pending::<()>().await;
        }

        let period = self.period;
        let ticker = self.ticker.get_or_insert_with(|| {
            // The first tick lands one period out; the caller polls immediately.
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker
        });
        ticker.tick().await;
    }

    fn start(&mut self) {
        self.running = true;
        self.ticker = None;
        debug!(period_ms = self.period.as_millis(), "Poll loop started");
    }
}
