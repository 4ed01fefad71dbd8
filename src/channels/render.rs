//! Channel-specific message rendering. Pure functions: a `Signal` plus the
//! runtime branding settings in, the outbound text out.

use chrono::{DateTime, FixedOffset, Timelike};

use crate::models::Signal;

/// Branding and timing inputs for one rendered message.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub site_name: &'a str,
    pub affiliate_link: &'a str,
    pub now: DateTime<FixedOffset>,
}

/// The suggested-bet placeholder the site emits for "no value".
fn is_placeholder(value: &str) -> bool {
    let v = value.trim();
    v.is_empty() || v == "1,00" || v == "1.00"
}

fn bet_emoji(pct: Option<f64>) -> &'static str {
    match pct {
        None => "⚠️",
        Some(p) if p >= 70.0 => "🟢",
        Some(p) if p >= 35.0 => "⚠️",
        Some(_) => "❌",
    }
}

fn fmt_pct(v: Option<f64>) -> String {
    match v {
        None => "N/A".into(),
        Some(v) if v.fract() == 0.0 => format!("{}", v as i64),
        Some(v) => v.to_string(),
    }
}

/// "HH:MM até HH:MM" from now until the next 5-minute wall-clock boundary.
pub fn paying_window(now: DateTime<FixedOffset>) -> String {
    let minute = now.minute();
    let next_boundary = (minute + 1).div_ceil(5) * 5;

    let (end_hour, end_minute) = if next_boundary >= 60 {
        ((now.hour() + 1) % 24, next_boundary - 60)
    } else {
        (now.hour(), next_boundary)
    };

    format!(
        "{:02}:{:02} até {:02}:{:02}",
        now.hour(),
        minute,
        end_hour,
        end_minute
    )
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

/// Shared body assembly; `bold` wraps a fragment in the channel's bold
/// markup and `esc` escapes plain fragments.
fn render(
    signal: &Signal,
    ctx: RenderContext<'_>,
    bold: impl Fn(&str) -> String,
    esc: impl Fn(&str) -> String,
) -> String {
    let mut msg = String::new();

    msg.push_str(&bold(&format!("👑{}👑", ctx.site_name)));
    msg.push_str("\n\n");
    msg.push_str(&bold(&signal.name));
    msg.push_str("\n\n");

    msg.push_str(&format!(
        "Possibilidades de ganhos: {} ⭐️\n\n",
        bold(&format!("{}%", fmt_pct(Some(signal.distribution_percent))))
    ));
    msg.push_str(&format!("Sinal testado na {}✅\n\n", bold(ctx.site_name)));

    msg.push_str(&format!(
        "{} Mínima: {}%\n",
        bet_emoji(signal.bet_min),
        fmt_pct(signal.bet_min)
    ));
    msg.push_str(&format!(
        "{} Padrão: {}%\n",
        bet_emoji(signal.bet_default),
        fmt_pct(signal.bet_default)
    ));
    msg.push_str(&format!(
        "{} Máxima: {}%\n\n",
        bet_emoji(signal.bet_max),
        fmt_pct(signal.bet_max)
    ));

    msg.push_str("Aposta sugerida:\n\n");
    if let Some(v) = signal.bet_bonus.as_deref().filter(|v| !is_placeholder(v)) {
        msg.push_str(&format!("BET BÔNUS ({})\n", esc(v)));
    }
    if let Some(v) = signal.bet_connection.as_deref().filter(|v| !is_placeholder(v)) {
        msg.push_str(&format!("BET CONEXÃO ({})\n", esc(v)));
    }
    if let Some(v) = signal.bet_extra.as_deref().filter(|v| !is_placeholder(v)) {
        msg.push_str(&format!("BET EXTRA ({})\n", esc(v)));
    }

    msg.push_str(&format!(
        "\n{} {}\n\n",
        bold("Horário pagante:"),
        esc(&paying_window(ctx.now))
    ));
    msg.push_str("💰💰💰💰💰💰💰💰💰💰\n\n");

    // Runtime-configured affiliate link wins; the scraped card link is the
    // fallback; no link at all is fine.
    if !ctx.affiliate_link.trim().is_empty() {
        msg.push_str(ctx.affiliate_link.trim());
    } else if let Some(href) = signal.href.as_deref().filter(|h| !h.trim().is_empty()) {
        msg.push_str(href.trim());
    }

    msg
}

pub fn whatsapp_message(signal: &Signal, ctx: RenderContext<'_>) -> String {
    render(signal, ctx, |s| format!("*{s}*"), |s| s.to_string())
}

pub fn telegram_message(signal: &Signal, ctx: RenderContext<'_>) -> String {
    render(
        signal,
        ctx,
        |s| format!("<b>{}</b>", escape_html(s)),
        escape_html,
    )
}
