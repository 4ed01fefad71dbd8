use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use metrics::{counter, gauge};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::channels::MessageChannel;
use crate::orchestrator::Orchestrator;
use crate::scheduler;
use crate::scraping::SignalSource;

/// Periodic safety nets, cheapest first. All three run off one ticking
/// loop instead of independent timers, so they cannot drift apart or pile
/// up while a recovery is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tier {
    /// Scheduler liveness plus send-staleness probe.
    HealthCheck,
    /// Deeper staleness watchdog with a shorter threshold.
    Watchdog,
    /// Last resort: force a cycle when nothing went out for too long.
    ForcedSend,
}

struct TierEntry {
    tier: Tier,
    period: Duration,
    last_run: Instant,
}

/// Owns the scheduler task and the auto-recovery ladder.
pub struct Supervisor<S, W, T> {
    orchestrator: Arc<Orchestrator<S, W, T>>,
    scheduler_task: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl<S, W, T> Supervisor<S, W, T>
where
    S: SignalSource,
    W: MessageChannel,
    T: MessageChannel,
{
    pub fn new(orchestrator: Arc<Orchestrator<S, W, T>>) -> Arc<Self> {
        Arc::new(Self {
            orchestrator,
            scheduler_task: std::sync::Mutex::new(None),
        })
    }

    pub fn spawn_scheduler(self: &Arc<Self>) {
        let orch = Arc::clone(&self.orchestrator);
        let sup = Arc::clone(self);
        let handle = tokio::spawn(scheduler::run_scheduler(orch, sup));
        *self.scheduler_task.lock().expect("scheduler_task lock") = Some(handle);
    }

    pub fn scheduler_alive(&self) -> bool {
        self.scheduler_task
            .lock()
            .expect("scheduler_task lock")
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    fn ensure_scheduler_running(self: &Arc<Self>) {
        if !self.scheduler_alive() {
            tracing::warn!("Scheduler task is not running, respawning");
            self.spawn_scheduler();
        }
    }

    /// Stop the scheduler task. Used when the whole service is torn down.
    pub fn shutdown(&self) {
        if let Some(handle) = self
            .scheduler_task
            .lock()
            .expect("scheduler_task lock")
            .take()
        {
            handle.abort();
        }
    }

    /// Fire-and-forget recovery after a failed cycle. The delay gives a
    /// transient scraper hiccup time to clear before we poke it.
    pub fn schedule_recovery(self: &Arc<Self>, delay: Duration) {
        let sup = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if sup.orchestrator.store.is_running() {
                sup.attempt_auto_recovery().await;
            }
        });
    }

    pub async fn run(self: Arc<Self>) {
        let config = &self.orchestrator.config;
        let mut tiers = vec![
            TierEntry {
                tier: Tier::HealthCheck,
                period: Duration::from_secs(config.health_check_period_secs),
                last_run: Instant::now(),
            },
            TierEntry {
                tier: Tier::Watchdog,
                period: Duration::from_secs(config.watchdog_period_secs),
                last_run: Instant::now(),
            },
            TierEntry {
                tier: Tier::ForcedSend,
                period: Duration::from_secs(config.forced_send_period_secs),
                last_run: Instant::now(),
            },
        ];

        let mut ticker =
            tokio::time::interval(Duration::from_secs(config.supervisor_tick_secs));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        tracing::info!(
            tick_secs = config.supervisor_tick_secs,
            "Supervisor started"
        );

        loop {
            ticker.tick().await;

            let idle_mins = self
                .orchestrator
                .state
                .secs_since_last_send()
                .map(|s| s as f64 / 60.0)
                .unwrap_or(f64::INFINITY);
            if idle_mins.is_finite() {
                gauge!("minutes_since_last_send").set(idle_mins);
            }

            for entry in &mut tiers {
                if entry.last_run.elapsed() >= entry.period {
                    entry.last_run = Instant::now();
                    self.run_tier(entry.tier).await;
                }
            }
        }
    }

    async fn run_tier(self: &Arc<Self>, tier: Tier) {
        let config = &self.orchestrator.config;
        let state = &self.orchestrator.state;

        match tier {
            Tier::HealthCheck => {
                if !self.orchestrator.store.is_running() {
                    return;
                }
                self.ensure_scheduler_running();
                if state.is_send_stale(config.health_stale_secs) {
                    tracing::warn!(
                        threshold_secs = config.health_stale_secs,
                        "Health check: no sends within threshold"
                    );
                    self.attempt_auto_recovery().await;
                }
            }
            Tier::Watchdog => {
                self.ensure_scheduler_running();
                if !self.orchestrator.store.is_running() {
                    return;
                }
                if state.is_send_stale(config.forced_send_after_secs)
                    && !state.recovering.load(Ordering::SeqCst)
                {
                    tracing::warn!(
                        threshold_secs = config.forced_send_after_secs,
                        "Watchdog: send pipeline looks stuck"
                    );
                    self.attempt_auto_recovery().await;
                }
            }
            Tier::ForcedSend => {
                if !self.orchestrator.store.is_running() {
                    return;
                }
                if !state.is_send_stale(config.forced_send_after_secs) {
                    return;
                }
                if !self.orchestrator.source().is_browser_healthy().await
                    || !self.orchestrator.channels_ready().await
                {
                    return;
                }
                tracing::warn!("Forced send: bypassing boundary wait");
                counter!("forced_sends_total").increment(1);
                if let Err(e) = self.orchestrator.try_run_cycle(true).await {
                    tracing::error!(error = %e, "Forced cycle failed");
                }
            }
        }
    }

    /// One recovery attempt: browser, then timers, then a forced cycle.
    /// Single-flight; concurrent triggers are dropped. The fifth
    /// consecutive failure escalates to a full restart.
    pub async fn attempt_auto_recovery(self: &Arc<Self>) {
        let state = &self.orchestrator.state;
        if state.recovering.swap(true, Ordering::SeqCst) {
            tracing::info!("Recovery already in progress, skipping");
            return;
        }

        let attempt = state.recovery_attempts.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::info!(attempt, "Starting auto-recovery");
        counter!("recoveries_total").increment(1);

        match self.recover().await {
            Ok(()) => {
                state.recovery_attempts.store(0, Ordering::SeqCst);
                state.consecutive_empty_random.store(0, Ordering::SeqCst);
                tracing::info!("Auto-recovery succeeded");
            }
            Err(e) => {
                tracing::error!(error = %e, attempt, "Auto-recovery failed");
                if attempt >= self.orchestrator.config.recovery_strike_limit {
                    self.full_restart().await;
                }
            }
        }

        state.recovering.store(false, Ordering::SeqCst);
    }

    async fn recover(self: &Arc<Self>) -> anyhow::Result<()> {
        if !self.orchestrator.source().is_browser_healthy().await {
            tracing::warn!("Browser unhealthy, reinitializing");
            self.orchestrator.source().reinitialize().await?;
        }

        self.ensure_scheduler_running();

        if self.orchestrator.store.is_running() && self.orchestrator.channels_ready().await {
            self.orchestrator.try_run_cycle(true).await?;
        }
        Ok(())
    }

    /// Tear everything down and rebuild. Retries forever with a fixed
    /// pause, since there is nothing useful to do in a half-dead process.
    pub async fn full_restart(self: &Arc<Self>) {
        let config = &self.orchestrator.config;
        counter!("full_restarts_total").increment(1);

        loop {
            tracing::warn!("Full restart: stopping scheduler and rebuilding browser");
            if let Some(handle) = self
                .scheduler_task
                .lock()
                .expect("scheduler_task lock")
                .take()
            {
                handle.abort();
            }

            tokio::time::sleep(Duration::from_secs(config.full_restart_pause_secs)).await;

            match self.orchestrator.source().reinitialize().await {
                Ok(()) => {
                    self.spawn_scheduler();
                    let state = &self.orchestrator.state;
                    state.recovery_attempts.store(0, Ordering::SeqCst);
                    state.consecutive_empty_random.store(0, Ordering::SeqCst);
                    state.processing.store(false, Ordering::SeqCst);
                    tracing::info!("Full restart complete");
                    return;
                }
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        retry_secs = config.full_restart_retry_secs,
                        "Full restart failed, retrying"
                    );
                    tokio::time::sleep(Duration::from_secs(config.full_restart_retry_secs))
                        .await;
                }
            }
        }
    }
}
