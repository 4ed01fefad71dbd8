use serde::{Deserialize, Serialize};
use std::fmt;

use super::Category;

/// One game/offer snapshot scraped from the source site.
///
/// A signal is created fresh on every scrape and never mutated. Two signals
/// are the same delivered unit iff name, id, distribution and all three bet
/// percentages are equal; any single changed value is a logically new signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signal {
    pub name: String,
    #[serde(default)]
    pub id: Option<String>,
    pub category: Category,
    /// Win-possibility percentage shown by the site (0–100).
    pub distribution_percent: f64,

    // Bet percentages as displayed by the site.
    #[serde(default)]
    pub bet_min: Option<f64>,
    #[serde(default)]
    pub bet_default: Option<f64>,
    #[serde(default)]
    pub bet_max: Option<f64>,

    // Suggested-bet sub-values, kept as the raw display strings
    // (e.g. "2,50"). The site emits "1,00" as a placeholder.
    #[serde(default)]
    pub bet_bonus: Option<String>,
    #[serde(default)]
    pub bet_connection: Option<String>,
    #[serde(default)]
    pub bet_extra: Option<String>,

    #[serde(default)]
    pub image_ref: Option<String>,
    /// Destination/affiliate link scraped from the game card.
    #[serde(default)]
    pub href: Option<String>,
}

impl Signal {
    /// Deterministic dedup key over the identity + betting fields.
    ///
    /// The key format matches what the dedup store has always used:
    /// `name-id-distribution-betMin-betDefault-betMax`, with missing parts
    /// rendered as empty strings. A change in any value yields a new key,
    /// so a value change on the site always produces a new send.
    pub fn fingerprint(&self) -> String {
        format!(
            "{}-{}-{}-{}-{}-{}",
            self.name,
            self.id.as_deref().unwrap_or(""),
            fmt_pct(Some(self.distribution_percent)),
            fmt_pct(self.bet_min),
            fmt_pct(self.bet_default),
            fmt_pct(self.bet_max),
        )
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Signal: name={} category={} distribution={}%",
            self.name, self.category, self.distribution_percent
        )
    }
}

/// Render a percentage the way the site displays it: integral values
/// without a decimal point ("94"), fractional values as-is ("94.5").
fn fmt_pct(v: Option<f64>) -> String {
    match v {
        None => String::new(),
        Some(v) if v.fract() == 0.0 => format!("{}", v as i64),
        Some(v) => v.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_signal() -> Signal {
        Signal {
            name: "Fortune Tiger".into(),
            id: Some("126".into()),
            category: Category::Pg,
            distribution_percent: 92.0,
            bet_min: Some(40.0),
            bet_default: Some(70.0),
            bet_max: Some(90.0),
            bet_bonus: None,
            bet_connection: None,
            bet_extra: None,
            image_ref: None,
            href: None,
        }
    }

    #[test]
    fn fingerprint_is_stable() {
        let a = base_signal();
        let b = base_signal();
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint(), "Fortune Tiger-126-92-40-70-90");
    }

    #[test]
    fn fingerprint_changes_with_bet_default() {
        // Same name/id, different default bet: logically a new signal.
        let a = base_signal();
        let mut b = base_signal();
        b.bet_default = Some(75.0);
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn fingerprint_tolerates_missing_fields() {
        let mut s = base_signal();
        s.id = None;
        s.bet_min = None;
        assert_eq!(s.fingerprint(), "Fortune Tiger--92--70-90");
    }
}
