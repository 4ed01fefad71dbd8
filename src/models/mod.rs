pub mod signal;

pub use signal::Signal;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// Game provider category scraped from the source site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Category {
    Pg,
    Pp,
    Wg,
}

impl Category {
    /// Parse a category from an env value. Tolerates the legacy
    /// `PG_GAMES`-style suffix.
    pub fn from_env_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().replace("_GAMES", "").as_str() {
            "PG" => Some(Category::Pg),
            "PP" => Some(Category::Pp),
            "WG" => Some(Category::Wg),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Pg => "PG",
            Category::Pp => "PP",
            Category::Wg => "WG",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// RotationMode
// ---------------------------------------------------------------------------

/// Which selection strategy the next cycle uses. Exactly one mode is
/// active at any time; it alternates after each cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RotationMode {
    Favorites,
    Random,
}

impl RotationMode {
    pub fn toggled(&self) -> Self {
        match self {
            RotationMode::Favorites => RotationMode::Random,
            RotationMode::Random => RotationMode::Favorites,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RotationMode::Favorites => "FAVORITES",
            RotationMode::Random => "RANDOM",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "FAVORITES" => Some(RotationMode::Favorites),
            "RANDOM" => Some(RotationMode::Random),
            _ => None,
        }
    }
}

impl fmt::Display for RotationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ChannelKind
// ---------------------------------------------------------------------------

/// An outbound messaging system. Each kind has its own client and its own
/// list of destinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChannelKind {
    WhatsApp,
    Telegram,
}

impl ChannelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelKind::WhatsApp => "WhatsApp",
            ChannelKind::Telegram => "Telegram",
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// DeliveryResult
// ---------------------------------------------------------------------------

/// Outcome of fanning one signal out to every configured destination.
#[derive(Debug, Clone, Default)]
pub struct DeliveryResult {
    pub sent_whatsapp: bool,
    pub sent_telegram: bool,
    pub errors: Vec<String>,
}

impl DeliveryResult {
    /// Partial delivery counts as delivered: one successful destination on
    /// one channel is enough to record the fingerprint.
    pub fn delivered(&self) -> bool {
        self.sent_whatsapp || self.sent_telegram
    }
}

// ---------------------------------------------------------------------------
// CycleContext
// ---------------------------------------------------------------------------

/// Ephemeral record describing one scheduler firing. Lives for the duration
/// of the cycle body and is dropped at cycle end.
#[derive(Debug, Clone)]
pub struct CycleContext {
    pub id: Uuid,
    pub fired_at: DateTime<Utc>,
    pub mode: RotationMode,
    pub forced: bool,
    pub delivered_fingerprints: Vec<String>,
}

impl CycleContext {
    pub fn new(mode: RotationMode, forced: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            fired_at: Utc::now(),
            mode,
            forced,
            delivered_fingerprints: Vec::new(),
        }
    }
}
