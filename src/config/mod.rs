pub mod store;

pub use store::ConfigStore;

use chrono::FixedOffset;
use std::env;
use std::path::PathBuf;

use crate::models::{Category, ChannelKind};

const DEFAULT_CONFIG_FILE: &str = "bot-config.json";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Bearer token for the admin API. Unset disables authentication.
    pub api_token: Option<String>,

    // Scraper sidecar
    pub scraper_base_url: String,
    pub scraper_timeout_secs: u64,

    // Messaging channels
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_ids: Vec<String>,
    pub whatsapp_api_url: Option<String>,
    pub whatsapp_api_token: Option<String>,
    pub whatsapp_group_ids: Vec<String>,

    // Signal selection
    pub main_category: Category,
    pub favorites_pg: Vec<String>,
    pub favorites_pp: Vec<String>,
    pub favorites_wg: Vec<String>,
    pub random_pick_count: usize,
    pub min_distribution_percent: f64,
    pub sent_cache_limit: usize,

    // Scheduling. The site refreshes on 5-minute wall-clock boundaries in a
    // fixed timezone, so the scheduler is pinned to an explicit UTC offset
    // instead of the host timezone.
    pub timezone_offset_hours: i32,
    pub boundary_minutes: u32,
    pub fire_window_secs: u32,
    pub tick_interval_ms: u64,
    pub settle_delay_secs: u64,

    // Staleness thresholds (empirically tied to the site's refresh cadence)
    pub stale_resend_secs: u64,
    pub forced_send_after_secs: u64,
    pub health_stale_secs: u64,

    // Supervisor
    pub supervisor_tick_secs: u64,
    pub health_check_period_secs: u64,
    pub watchdog_period_secs: u64,
    pub forced_send_period_secs: u64,
    pub recovery_strike_limit: u32,
    pub cycle_error_recovery_delay_secs: u64,
    pub full_restart_pause_secs: u64,
    pub full_restart_retry_secs: u64,

    // Runtime config file
    pub config_file: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let main_category = env::var("MAIN_CATEGORY")
            .ok()
            .and_then(|s| Category::from_env_str(&s))
            .unwrap_or(Category::Pg);

        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()?,
            api_token: env::var("API_TOKEN").ok().filter(|s| !s.is_empty()),

            scraper_base_url: env::var("SCRAPER_BASE_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:3100".into()),
            scraper_timeout_secs: env_u64("SCRAPER_TIMEOUT_SECS", 90),

            telegram_bot_token: env::var("TELEGRAM_BOT_TOKEN").ok().filter(|s| !s.is_empty()),
            telegram_chat_ids: env_list("TELEGRAM_CHAT_ID"),
            whatsapp_api_url: env::var("WHATSAPP_API_URL").ok().filter(|s| !s.is_empty()),
            whatsapp_api_token: env::var("WHATSAPP_API_TOKEN").ok().filter(|s| !s.is_empty()),
            whatsapp_group_ids: env_list("WHATSAPP_GROUP_ID"),

            main_category,
            favorites_pg: env_list("PG_GAMES_FAVORITES"),
            favorites_pp: env_list("PP_GAMES_FAVORITES"),
            favorites_wg: env_list("WG_GAMES_FAVORITES"),
            random_pick_count: env_u64("RANDOM_PICK_COUNT", 5) as usize,
            min_distribution_percent: env::var("MIN_DISTRIBUTION_PERCENT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(80.0),
            sent_cache_limit: env_u64("SENT_CACHE_LIMIT", 50) as usize,

            timezone_offset_hours: env::var("TIMEZONE_OFFSET_HOURS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(-3),
            boundary_minutes: env_u64("CHECK_INTERVAL_MINUTES", 5) as u32,
            fire_window_secs: env_u64("FIRE_WINDOW_SECS", 30) as u32,
            tick_interval_ms: env_u64("TICK_INTERVAL_MS", 500),
            settle_delay_secs: env_u64("SETTLE_DELAY_SECS", 8),

            stale_resend_secs: env_u64("STALE_RESEND_SECS", 600),
            forced_send_after_secs: env_u64("FORCED_SEND_AFTER_SECS", 900),
            health_stale_secs: env_u64("HEALTH_STALE_SECS", 1200),

            supervisor_tick_secs: env_u64("SUPERVISOR_TICK_SECS", 30),
            health_check_period_secs: env_u64("HEALTH_CHECK_PERIOD_SECS", 120),
            watchdog_period_secs: env_u64("WATCHDOG_PERIOD_SECS", 180),
            forced_send_period_secs: env_u64("FORCED_SEND_PERIOD_SECS", 900),
            recovery_strike_limit: env_u64("RECOVERY_STRIKE_LIMIT", 5) as u32,
            cycle_error_recovery_delay_secs: env_u64("CYCLE_ERROR_RECOVERY_DELAY_SECS", 10),
            full_restart_pause_secs: env_u64("FULL_RESTART_PAUSE_SECS", 5),
            full_restart_retry_secs: env_u64("FULL_RESTART_RETRY_SECS", 30),

            config_file: env::var("BOT_CONFIG_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE)),
        })
    }

    /// The configured favorite game names for a category, in priority order.
    pub fn favorites(&self, category: Category) -> &[String] {
        match category {
            Category::Pg => &self.favorites_pg,
            Category::Pp => &self.favorites_pp,
            Category::Wg => &self.favorites_wg,
        }
    }

    pub fn destinations(&self, kind: ChannelKind) -> &[String] {
        match kind {
            ChannelKind::WhatsApp => &self.whatsapp_group_ids,
            ChannelKind::Telegram => &self.telegram_chat_ids,
        }
    }

    /// Fixed timezone for boundary computation, independent of the host.
    pub fn timezone(&self) -> FixedOffset {
        FixedOffset::east_opt(self.timezone_offset_hours * 3600)
            .unwrap_or_else(|| FixedOffset::east_opt(0).unwrap())
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Parse a comma-separated env var into a trimmed, non-empty list.
fn env_list(key: &str) -> Vec<String> {
    env::var(key)
        .unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
