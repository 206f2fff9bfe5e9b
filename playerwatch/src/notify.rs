//! Notification formatting and delivery.

use chrono::{TimeZone, Utc};
use playerwatch_query::ServerSnapshot;
use poise::serenity_prelude as serenity;
use thiserror::Error;
use tracing::debug;

/// Mail-style channels downstream of the webhook treat "URGENT" subjects as
/// important, which is what makes push notifications fire for them.
pub const SUBJECT_PREFIX: &str = "[URGENT]";

/// Discord rejects message content above 2000 characters.
const MAX_CONTENT_LEN: usize = 2000;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("failed to deliver notification: {0}")]
    Delivery(#[from] serenity::Error),
}

/// Hands a formatted message to the external delivery channel. Failure is
/// reported to the caller, never retried here.
pub trait Notifier {
    async fn send(&self, subject: &str, body: &str) -> Result<(), NotifyError>;
}

/// Delivers notifications through a Discord webhook.
pub struct DiscordNotifier {
    http: serenity::Http,
    webhook_url: String,
}

impl DiscordNotifier {
    pub fn new(webhook_url: impl Into<String>) -> Self {
        // Webhook execution authenticates through the token embedded in the
        // URL; no bot token is involved.
        Self {
            http: serenity::Http::new(""),
            webhook_url: webhook_url.into(),
        }
    }
}

impl Notifier for DiscordNotifier {
    async fn send(&self, subject: &str, body: &str) -> Result<(), NotifyError> {
        let webhook = serenity::Webhook::from_url(&self.http, &self.webhook_url).await?;
        let content = clamp_content(format!("**{subject}**\n{body}"));
        webhook
            .execute(&self.http, true, serenity::ExecuteWebhook::new().content(content))
            .await?;
        debug!("delivered notification");
        Ok(())
    }
}

/// Subject and body for an ALL-mode notification. Every name in
/// `new_players` appears exactly once.
pub fn new_player_message(snapshot: &ServerSnapshot, new_players: &[String]) -> (String, String) {
    let subject = format!("{SUBJECT_PREFIX}Player has joined the server");
    let mut body = format!(
        "Players have joined the server: {}, IP: {}\nPlayers: \n",
        snapshot.server_name, snapshot.server_address
    );
    for name in new_players {
        body.push('[');
        body.push_str(name);
        body.push_str("]\n");
    }
    (subject, body)
}

/// Subject and body for a THRESHOLD-mode notification, including when the
/// next check may fire.
pub fn threshold_message(snapshot: &ServerSnapshot, next_eligible_at: i64) -> (String, String) {
    let count = snapshot.player_count();
    let subject = format!("{SUBJECT_PREFIX}Player count has reached the threshold");
    let body = format!(
        "The player count has reached the threshold: {count}\n\
         Server name: \"{}\"\n\
         IP: \"{}\"\n\
         Player count: {count}\n\
         The next check will happen after {}",
        snapshot.server_name,
        snapshot.server_address,
        format_timestamp(next_eligible_at),
    );
    (subject, body)
}

/// ctime-style rendering of a unix timestamp, e.g.
/// `Tue Nov 14 22:13:20 2023 (UTC)`.
pub fn format_timestamp(unix: i64) -> String {
    match Utc.timestamp_opt(unix, 0).single() {
        Some(at) => format!("{} (UTC)", at.format("%a %b %e %H:%M:%S %Y")),
        None => format!("unix time {unix}"),
    }
}

fn clamp_content(mut content: String) -> String {
    if content.len() > MAX_CONTENT_LEN {
        let mut cut = MAX_CONTENT_LEN;
        while !content.is_char_boundary(cut) {
            cut -= 1;
        }
        content.truncate(cut);
    }
    content
}
