use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, Timelike};
use tokio::time::MissedTickBehavior;

use crate::channels::MessageChannel;
use crate::orchestrator::Orchestrator;
use crate::scraping::SignalSource;
use crate::supervisor::Supervisor;

/// Boundary detection for the 5-minute cycle clock. Pure state machine,
/// the async loop lives in [`run_scheduler`].
#[derive(Debug)]
pub struct CycleScheduler {
    boundary_minutes: u32,
    fire_window_secs: u32,
    last_fired_minute: Option<u32>,
}

impl CycleScheduler {
    pub fn new(boundary_minutes: u32, fire_window_secs: u32) -> Self {
        Self {
            boundary_minutes: boundary_minutes.max(1),
            fire_window_secs,
            last_fired_minute: None,
        }
    }

    /// Whether a cycle should fire at `now`. Fires at most once per
    /// boundary minute; a firing consumed while busy is dropped, not
    /// queued. Marks the minute as consumed when it returns true.
    pub fn should_fire(&mut self, now: DateTime<FixedOffset>, busy: bool) -> bool {
        let minute = now.minute();
        if minute % self.boundary_minutes != 0 {
            return false;
        }
        if now.second() >= self.fire_window_secs {
            return false;
        }
        if self.last_fired_minute == Some(minute) {
            return false;
        }
        if busy {
            return false;
        }
        self.last_fired_minute = Some(minute);
        true
    }
}

/// Tick loop in the configured wall-clock timezone. Each firing waits the
/// settle delay before running a cycle, so the site has finished updating
/// its numbers for the new window. The cycle runs in its own task; the
/// loop keeps ticking so liveness reporting stays accurate during long
/// fetches.
pub async fn run_scheduler<S, W, T>(
    orchestrator: Arc<Orchestrator<S, W, T>>,
    supervisor: Arc<Supervisor<S, W, T>>,
) where
    S: SignalSource,
    W: MessageChannel,
    T: MessageChannel,
{
    let config = &orchestrator.config;
    let tz = config.timezone();
    let settle = Duration::from_secs(config.settle_delay_secs);
    let recovery_delay = Duration::from_secs(config.cycle_error_recovery_delay_secs);

    let mut scheduler = CycleScheduler::new(config.boundary_minutes, config.fire_window_secs);
    let mut ticker = tokio::time::interval(Duration::from_millis(config.tick_interval_ms));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tracing::info!(
        boundary_minutes = config.boundary_minutes,
        tick_ms = config.tick_interval_ms,
        "Cycle scheduler started"
    );

    loop {
        ticker.tick().await;
        orchestrator.state.mark_tick();

        let now = chrono::Utc::now().with_timezone(&tz);
        let busy = orchestrator
            .state
            .processing
            .load(std::sync::atomic::Ordering::SeqCst);
        if !scheduler.should_fire(now, busy) {
            continue;
        }

        tracing::info!(
            minute = now.minute(),
            settle_secs = config.settle_delay_secs,
            "Cycle boundary reached"
        );

        let orch = Arc::clone(&orchestrator);
        let sup = Arc::clone(&supervisor);
        tokio::spawn(async move {
            tokio::time::sleep(settle).await;
            if let Err(e) = orch.try_run_cycle(false).await {
                tracing::error!(error = %e, "Cycle failed, scheduling recovery");
                sup.schedule_recovery(recovery_delay);
            }
        });
    }
}
