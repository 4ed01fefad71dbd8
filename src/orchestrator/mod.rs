use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use metrics::counter;
use tokio::sync::Mutex;

use crate::channels::render::{self, RenderContext};
use crate::channels::MessageChannel;
use crate::config::{AppConfig, ConfigStore};
use crate::engine::{DispatchFanout, ModeRotator, SelectionEngine, SentSignalCache};
use crate::models::{Category, CycleContext, RotationMode, Signal};
use crate::scraping::SignalSource;

/// Per-epoch delivery state. Guarded by one async mutex so exactly one
/// cycle body can touch it at a time.
#[derive(Debug)]
pub struct CycleState {
    /// Signals selected by the previous cycle, for change detection.
    pub last_batch: Vec<Signal>,
    pub sent: SentSignalCache,
}

/// Process-wide mutable state, shared between the cycle body, the
/// supervisor and the admin API. One owned instance, injected everywhere;
/// no statics.
#[derive(Debug)]
pub struct BotState {
    pub started_at: DateTime<Utc>,
    pub cycle: Mutex<CycleState>,
    last_send: std::sync::Mutex<Option<DateTime<Utc>>>,
    last_tick: std::sync::Mutex<Option<DateTime<Utc>>>,
    pub processing: AtomicBool,
    pub recovering: AtomicBool,
    pub recovery_attempts: AtomicU32,
    pub consecutive_empty_random: AtomicU32,
}

impl BotState {
    pub fn new(sent_cache_limit: usize) -> Self {
        Self {
            started_at: Utc::now(),
            cycle: Mutex::new(CycleState {
                last_batch: Vec::new(),
                sent: SentSignalCache::new(sent_cache_limit),
            }),
            last_send: std::sync::Mutex::new(None),
            last_tick: std::sync::Mutex::new(None),
            processing: AtomicBool::new(false),
            recovering: AtomicBool::new(false),
            recovery_attempts: AtomicU32::new(0),
            consecutive_empty_random: AtomicU32::new(0),
        }
    }

    pub fn mark_send(&self) {
        *self.last_send.lock().expect("last_send lock") = Some(Utc::now());
    }

    pub fn last_send(&self) -> Option<DateTime<Utc>> {
        *self.last_send.lock().expect("last_send lock")
    }

    /// Seconds since the last successful send; `None` if nothing was ever
    /// sent (treated as maximally stale by every caller).
    pub fn secs_since_last_send(&self) -> Option<u64> {
        self.last_send()
            .map(|t| (Utc::now() - t).num_seconds().max(0) as u64)
    }

    pub fn is_send_stale(&self, threshold_secs: u64) -> bool {
        match self.secs_since_last_send() {
            Some(secs) => secs > threshold_secs,
            None => true,
        }
    }

    pub fn mark_tick(&self) {
        *self.last_tick.lock().expect("last_tick lock") = Some(Utc::now());
    }

    /// True if the scheduler loop has ticked within the given window.
    pub fn scheduler_alive(&self, within_secs: u64) -> bool {
        self.last_tick
            .lock()
            .expect("last_tick lock")
            .map(|t| (Utc::now() - t).num_seconds() <= within_secs as i64)
            .unwrap_or(false)
    }

    /// Warm reset after an admin resume: everything becomes eligible again
    /// and the next cycle starts deterministically from FAVORITES.
    pub async fn reset_for_resume(&self) {
        let mut cycle = self.cycle.lock().await;
        cycle.last_batch.clear();
        cycle.sent.clear();
        drop(cycle);

        *self.last_send.lock().expect("last_send lock") = None;
        self.consecutive_empty_random.store(0, Ordering::SeqCst);
        self.recovery_attempts.store(0, Ordering::SeqCst);
    }
}

/// Owns the collaborators and runs one fetch→select→dedup→dispatch cycle
/// at a time.
pub struct Orchestrator<S, W, T> {
    pub config: AppConfig,
    pub store: Arc<ConfigStore>,
    pub state: Arc<BotState>,
    pub rotator: ModeRotator,
    source: S,
    fanout: DispatchFanout<W, T>,
    selection: SelectionEngine,
}

impl<S, W, T> Orchestrator<S, W, T>
where
    S: SignalSource,
    W: MessageChannel,
    T: MessageChannel,
{
    pub fn new(
        config: AppConfig,
        store: Arc<ConfigStore>,
        state: Arc<BotState>,
        source: S,
        fanout: DispatchFanout<W, T>,
    ) -> Self {
        let selection = SelectionEngine::new(
            config.random_pick_count,
            config.min_distribution_percent,
        );
        let rotator = ModeRotator::new(Arc::clone(&store));
        Self {
            config,
            store,
            state,
            rotator,
            source,
            fanout,
            selection,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub async fn channels_ready(&self) -> bool {
        self.fanout.any_ready().await
    }

    /// Run one cycle unless one is already in flight. A firing that arrives
    /// while busy is dropped, not queued. Returns whether a cycle body ran.
    pub async fn try_run_cycle(&self, forced: bool) -> anyhow::Result<bool> {
        if self.state.processing.swap(true, Ordering::SeqCst) {
            tracing::debug!("Cycle already in flight, firing dropped");
            return Ok(false);
        }
        let result = self.run_cycle(forced).await;
        self.state.processing.store(false, Ordering::SeqCst);
        result
    }

    async fn run_cycle(&self, forced: bool) -> anyhow::Result<bool> {
        // Paused or not ready: the firing is swallowed, deferred to the
        // next boundary. Not an error.
        if !self.store.is_running() {
            return Ok(false);
        }
        if !self.fanout.any_ready().await {
            tracing::warn!("No messaging channel ready, skipping cycle");
            return Ok(false);
        }

        let category = self.config.main_category;
        if !self.store.category_enabled(category) {
            tracing::debug!(category = %category, "Main category disabled, skipping cycle");
            return Ok(false);
        }

        let mut cycle = self.state.cycle.lock().await;

        // Fresh epoch: dedup state is re-derived from this cycle's own
        // deliveries so changed values on the site are always sent.
        cycle.sent.clear();

        let first_run = cycle.last_batch.is_empty();
        if first_run {
            // Deterministic warm start regardless of the persisted mode.
            self.store.set_rotation(RotationMode::Favorites);
        }

        let mode = self.rotator.current();
        let mut ctx = CycleContext::new(mode, forced);
        tracing::info!(cycle = %ctx.id, mode = %mode, forced, "Cycle started");
        counter!("cycles_total").increment(1);

        let favorites = self.config.favorites(category).to_vec();

        match mode {
            RotationMode::Favorites => {
                self.run_favorites_cycle(&mut cycle, &mut ctx, category, &favorites)
                    .await?
            }
            RotationMode::Random => {
                self.run_random_cycle(&mut cycle, &mut ctx, category, &favorites, first_run)
                    .await?
            }
        }

        tracing::info!(
            cycle = %ctx.id,
            delivered = ctx.delivered_fingerprints.len(),
            "Cycle finished"
        );
        Ok(true)
    }

    /// FAVORITES: search-driven fetch, deliver each match as found. This
    /// path is latency-sensitive, so signals go out one by one instead of
    /// as a batch at cycle end.
    async fn run_favorites_cycle(
        &self,
        cycle: &mut CycleState,
        ctx: &mut CycleContext,
        category: Category,
        favorites: &[String],
    ) -> anyhow::Result<()> {
        let names = (!favorites.is_empty()).then_some(favorites);
        let batch = self
            .source
            .fetch_signals(RotationMode::Favorites, category, names)
            .await?;

        let found = self.selection.filter_favorites(batch, favorites);
        if found.len() < favorites.len() {
            tracing::info!(
                configured = favorites.len(),
                found = found.len(),
                "Not every configured favorite was found this cycle"
            );
        }

        let mut delivered = 0usize;
        for signal in &found {
            if self.deliver_signal(cycle, ctx, signal).await {
                delivered += 1;
            }
        }

        cycle.last_batch = found;
        if delivered > 0 {
            self.state.mark_send();
        }
        self.rotator.toggle();
        Ok(())
    }

    /// RANDOM: full-batch fetch, exclusion filters, uniform sample. An
    /// unchanged sample versus the previous cycle is skipped unless the
    /// staleness override kicks in.
    async fn run_random_cycle(
        &self,
        cycle: &mut CycleState,
        ctx: &mut CycleContext,
        category: Category,
        favorites: &[String],
        first_run: bool,
    ) -> anyhow::Result<()> {
        let batch = self
            .source
            .fetch_signals(RotationMode::Random, category, None)
            .await?;

        let picked = self.selection.pick_random(batch, favorites);

        if picked.is_empty() {
            let empty = self
                .state
                .consecutive_empty_random
                .fetch_add(1, Ordering::SeqCst)
                + 1;
            counter!("empty_cycles_total").increment(1);
            tracing::info!(consecutive = empty, "Random mode produced zero signals");

            if empty >= 2 {
                // Bias back toward guaranteed content.
                self.rotator.force_favorites();
                self.state
                    .consecutive_empty_random
                    .store(0, Ordering::SeqCst);
            } else {
                self.rotator.toggle();
            }
            return Ok(());
        }

        let stale = self.state.is_send_stale(self.config.stale_resend_secs);
        let fresh = first_run || stale || has_new_signals(&picked, &cycle.last_batch);

        if !fresh {
            tracing::debug!("Same signals as last cycle, nothing to send");
            cycle.sent.trim();
            self.rotator.toggle();
            return Ok(());
        }
        if stale && !first_run {
            tracing::info!(
                threshold_secs = self.config.stale_resend_secs,
                "Staleness override: treating batch as new"
            );
        }

        let mut delivered = 0usize;
        for signal in &picked {
            if self.deliver_signal(cycle, ctx, signal).await {
                delivered += 1;
            }
        }

        cycle.last_batch = picked;
        if delivered > 0 {
            self.state.mark_send();
            self.state
                .consecutive_empty_random
                .store(0, Ordering::SeqCst);
        }
        self.rotator.toggle();
        Ok(())
    }

    /// Render and fan out one signal. The fingerprint is recorded iff at
    /// least one destination on at least one channel accepted it.
    async fn deliver_signal(
        &self,
        cycle: &mut CycleState,
        ctx: &mut CycleContext,
        signal: &Signal,
    ) -> bool {
        let fingerprint = signal.fingerprint();
        if cycle.sent.has(&fingerprint) {
            return false;
        }

        let runtime = self.store.snapshot();
        let render_ctx = RenderContext {
            site_name: &runtime.site_name,
            affiliate_link: &runtime.affiliate_link,
            now: Utc::now().with_timezone(&self.config.timezone()),
        };
        let whatsapp_text = render::whatsapp_message(signal, render_ctx);
        let telegram_text = render::telegram_message(signal, render_ctx);

        let result = self
            .fanout
            .deliver(signal, &whatsapp_text, &telegram_text)
            .await;

        if result.delivered() {
            cycle.sent.insert(fingerprint.clone());
            ctx.delivered_fingerprints.push(fingerprint);
            counter!("signals_sent_total").increment(1);
            tracing::info!(
                game = %signal.name,
                whatsapp = result.sent_whatsapp,
                telegram = result.sent_telegram,
                "Signal delivered"
            );
            true
        } else {
            counter!("delivery_failures_total").increment(1);
            tracing::warn!(
                game = %signal.name,
                errors = ?result.errors,
                "Signal not delivered to any destination"
            );
            false
        }
    }
}

/// Change detection between consecutive cycles, by fingerprint set.
fn has_new_signals(current: &[Signal], last: &[Signal]) -> bool {
    if current.len() != last.len() {
        return true;
    }
    let mut a: Vec<String> = current.iter().map(Signal::fingerprint).collect();
    let mut b: Vec<String> = last.iter().map(Signal::fingerprint).collect();
    a.sort();
    b.sort();
    a != b
}
