//! Shared fixtures: scripted fakes for the scraper sidecar and the two
//! messaging channels, plus a fully wired orchestrator harness.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use signalbot::channels::MessageChannel;
use signalbot::config::{AppConfig, ConfigStore};
use signalbot::engine::{ChannelBinding, DispatchFanout};
use signalbot::models::{Category, ChannelKind, RotationMode, Signal};
use signalbot::orchestrator::{BotState, Orchestrator};
use signalbot::scraping::SignalSource;

/// Scripted signal source. Each fetch pops the next scripted batch; an
/// exhausted script yields empty batches.
#[derive(Clone, Default)]
pub struct FakeSource {
    batches: Arc<Mutex<VecDeque<Result<Vec<Signal>, String>>>>,
    pub fetch_count: Arc<AtomicUsize>,
    pub fetched_modes: Arc<Mutex<Vec<RotationMode>>>,
    pub healthy: Arc<AtomicBool>,
    pub reinit_count: Arc<AtomicUsize>,
    /// How many reinitialize calls fail before they start succeeding.
    pub reinit_failures: Arc<AtomicUsize>,
}

impl FakeSource {
    pub fn new() -> Self {
        let source = Self::default();
        source.healthy.store(true, Ordering::SeqCst);
        source
    }

    pub fn push_batch(&self, batch: Vec<Signal>) {
        self.batches.lock().unwrap().push_back(Ok(batch));
    }

    pub fn push_error(&self, message: &str) {
        self.batches.lock().unwrap().push_back(Err(message.into()));
    }
}

impl SignalSource for FakeSource {
    async fn fetch_signals(
        &self,
        mode: RotationMode,
        _category: Category,
        _favorites: Option<&[String]>,
    ) -> anyhow::Result<Vec<Signal>> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        self.fetched_modes.lock().unwrap().push(mode);
        match self.batches.lock().unwrap().pop_front() {
            Some(Ok(batch)) => Ok(batch),
            Some(Err(message)) => Err(anyhow::anyhow!(message)),
            None => Ok(Vec::new()),
        }
    }

    async fn is_browser_healthy(&self) -> bool {
        self.healthy.load(Ordering::SeqCst)
    }

    async fn reinitialize(&self) -> anyhow::Result<()> {
        self.reinit_count.fetch_add(1, Ordering::SeqCst);
        let remaining = self.reinit_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.reinit_failures.store(remaining - 1, Ordering::SeqCst);
            anyhow::bail!("scripted reinitialize failure");
        }
        self.healthy.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// In-memory channel that records everything it accepts.
#[derive(Clone)]
pub struct FakeChannel {
    kind: ChannelKind,
    pub ready: Arc<AtomicBool>,
    pub fail: Arc<AtomicBool>,
    pub sent: Arc<Mutex<Vec<(String, String)>>>,
}

impl FakeChannel {
    pub fn new(kind: ChannelKind) -> Self {
        Self {
            kind,
            ready: Arc::new(AtomicBool::new(true)),
            fail: Arc::new(AtomicBool::new(false)),
            sent: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn sent_texts(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|(_, t)| t.clone()).collect()
    }
}

impl MessageChannel for FakeChannel {
    fn kind(&self) -> ChannelKind {
        self.kind
    }

    async fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    async fn send(
        &self,
        destination: &str,
        text: &str,
        _image: Option<&str>,
    ) -> anyhow::Result<bool> {
        if self.fail.load(Ordering::SeqCst) {
            return Ok(false);
        }
        self.sent
            .lock()
            .unwrap()
            .push((destination.to_string(), text.to_string()));
        Ok(true)
    }
}

pub fn make_signal(name: &str, distribution: f64) -> Signal {
    make_signal_with_bet(name, distribution, 50.0)
}

pub fn make_signal_with_bet(name: &str, distribution: f64, bet_default: f64) -> Signal {
    Signal {
        name: name.to_string(),
        id: Some("1".into()),
        category: Category::Pg,
        distribution_percent: distribution,
        bet_min: Some(20.0),
        bet_default: Some(bet_default),
        bet_max: Some(100.0),
        bet_bonus: None,
        bet_connection: None,
        bet_extra: None,
        image_ref: None,
        href: None,
    }
}

/// Static config with fast timings for tests. Fields mirror production
/// defaults except where a test needs to observe behavior quickly.
pub fn test_config(dir: &Path, favorites: &[&str]) -> AppConfig {
    AppConfig {
        host: "127.0.0.1".into(),
        port: 0,
        api_token: None,
        scraper_base_url: "http://127.0.0.1:9".into(),
        scraper_timeout_secs: 1,
        telegram_bot_token: Some("test-token".into()),
        telegram_chat_ids: vec!["-1001".into()],
        whatsapp_api_url: Some("http://127.0.0.1:9".into()),
        whatsapp_api_token: None,
        whatsapp_group_ids: vec!["group-1".into()],
        main_category: Category::Pg,
        favorites_pg: favorites.iter().map(|s| s.to_string()).collect(),
        favorites_pp: Vec::new(),
        favorites_wg: Vec::new(),
        random_pick_count: 5,
        min_distribution_percent: 80.0,
        sent_cache_limit: 50,
        timezone_offset_hours: -3,
        boundary_minutes: 5,
        fire_window_secs: 30,
        tick_interval_ms: 500,
        settle_delay_secs: 0,
        stale_resend_secs: 600,
        forced_send_after_secs: 900,
        health_stale_secs: 1200,
        supervisor_tick_secs: 1,
        health_check_period_secs: 120,
        watchdog_period_secs: 180,
        forced_send_period_secs: 900,
        recovery_strike_limit: 5,
        cycle_error_recovery_delay_secs: 0,
        full_restart_pause_secs: 0,
        full_restart_retry_secs: 0,
        config_file: dir.join("bot-config.json"),
    }
}

pub struct Harness {
    pub orchestrator: Arc<Orchestrator<FakeSource, FakeChannel, FakeChannel>>,
    pub source: FakeSource,
    pub whatsapp: FakeChannel,
    pub telegram: FakeChannel,
    pub store: Arc<ConfigStore>,
    pub bot: Arc<BotState>,
    _dir: tempfile::TempDir,
}

pub fn build_harness(favorites: &[&str]) -> Harness {
    build_harness_with(favorites, |_| {})
}

pub fn build_harness_with(favorites: &[&str], tweak: impl FnOnce(&mut AppConfig)) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path(), favorites);
    tweak(&mut config);

    let store = Arc::new(ConfigStore::load(config.config_file.clone()));
    let bot = Arc::new(BotState::new(config.sent_cache_limit));

    let source = FakeSource::new();
    let whatsapp = FakeChannel::new(ChannelKind::WhatsApp);
    let telegram = FakeChannel::new(ChannelKind::Telegram);

    let fanout = DispatchFanout::new(
        ChannelBinding::new(Some(whatsapp.clone()), config.whatsapp_group_ids.clone()),
        ChannelBinding::new(Some(telegram.clone()), config.telegram_chat_ids.clone()),
    );

    let orchestrator = Arc::new(Orchestrator::new(
        config,
        Arc::clone(&store),
        Arc::clone(&bot),
        source.clone(),
        fanout,
    ));

    Harness {
        orchestrator,
        source,
        whatsapp,
        telegram,
        store,
        bot,
        _dir: dir,
    }
}
