// src/integrations/telegram.rs — Telegram adapter (Bot API)
//
// Uses the Telegram Bot API (https://core.telegram.org/bots/api).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::integrations::types::{IncomingMessage, MessagingAdapter, UpdateBatch};

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";
const BUTTONS_PER_ROW: usize = 2;

/// Telegram integration adapter.
pub struct TelegramAdapter {
    client: Client,
    bot_token: String,
    api_base: String,
}

impl TelegramAdapter {
    pub fn new(bot_token: String) -> Self {
        Self {
            client: Client::new(),
            bot_token,
            api_base: TELEGRAM_API_BASE.to_string(),
        }
    }

    /// Use a local Bot API server or a test double.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    fn api_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.api_base, self.bot_token)
    }

    /// Validate the bot token by calling getMe.
    pub async fn validate(&self) -> anyhow::Result<String> {
        #[derive(Deserialize)]
        struct BotUser {
            username: Option<String>,
            first_name: Option<String>,
        }

        let resp: TelegramResponse<BotUser> = self
            .client
            .get(self.api_url("getMe"))
            .send()
            .await?
            .json()
            .await?;

        if !resp.ok {
            anyhow::bail!(
                "Telegram auth failed: {}",
                resp.description.unwrap_or_else(|| "unknown".into())
            );
        }

        let bot = resp.result.unwrap_or(BotUser {
            username: None,
            first_name: None,
        });
        Ok(format!(
            "Authenticated as @{}",
            bot.username
                .unwrap_or_else(|| bot.first_name.unwrap_or_default())
        ))
    }

    async fn send_message(
        &self,
        body: &serde_json::Value,
    ) -> anyhow::Result<TelegramResponse<SendMessageResp>> {
        let resp = self
            .client
            .post(self.api_url("sendMessage"))
            .json(body)
            .send()
            .await?
            .json()
            .await?;
        Ok(resp)
    }
}

// -- Telegram API response types --

#[derive(Deserialize)]
struct TelegramResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Deserialize)]
struct TgMessage {
    message_id: i64,
    chat: TgChat,
    from: Option<TgUser>,
    text: Option<String>,
    date: i64,
}

#[derive(Deserialize)]
struct TgChat {
    id: i64,
}

#[derive(Deserialize)]
struct TgUser {
    id: i64,
    #[serde(default)]
    is_bot: bool,
    username: Option<String>,
    first_name: Option<String>,
}

#[derive(Deserialize)]
struct TgUpdate {
    update_id: i64,
    message: Option<TgMessage>,
}

#[derive(Deserialize)]
struct SendMessageResp {
    message_id: i64,
}

/// Text messages from people; everything else is skipped.
fn to_incoming(update: TgUpdate) -> Option<IncomingMessage> {
    let m = update.message?;
    let text = m.text?;
    let from = m.from?;
    if from.is_bot {
        return None;
    }
    Some(IncomingMessage {
        id: m.message_id.to_string(),
        target: m.chat.id.to_string(),
        sender_id: from.id.to_string(),
        sender_name: from.first_name.or(from.username),
        content: text,
        timestamp: m.date,
    })
}

/// Reply keyboard with two buttons per row, or keyboard removal.
fn reply_markup(quick_replies: &[String]) -> serde_json::Value {
    if quick_replies.is_empty() {
        return serde_json::json!({ "remove_keyboard": true });
    }
    let rows: Vec<Vec<serde_json::Value>> = quick_replies
        .chunks(BUTTONS_PER_ROW)
        .map(|row| {
            row.iter()
                .map(|label| serde_json::json!({ "text": label }))
                .collect()
        })
        .collect();
    serde_json::json!({
        "keyboard": rows,
        "resize_keyboard": true,
    })
}

fn is_markdown_rejection(description: Option<&str>) -> bool {
    description.is_some_and(|d| d.contains("can't parse entities"))
}

// -- MessagingAdapter implementation --

#[async_trait]
impl MessagingAdapter for TelegramAdapter {
    fn id(&self) -> &str {
        "telegram"
    }

    async fn send(&self, target: &str, content: &str, quick_replies: &[String]) -> anyhow::Result<String> {
        let mut body = serde_json::json!({
            "chat_id": target,
            "text": content,
            "parse_mode": "Markdown",
            "reply_markup": reply_markup(quick_replies),
        });

        let mut resp = self.send_message(&body).await?;

        // Model output often contains stray `*` or `_`; resend unformatted.
        if !resp.ok && is_markdown_rejection(resp.description.as_deref()) {
            tracing::debug!("Telegram rejected Markdown, resending as plain text");
            if let Some(obj) = body.as_object_mut() {
                obj.remove("parse_mode");
            }
            resp = self.send_message(&body).await?;
        }

        if !resp.ok {
            anyhow::bail!(
                "Telegram send failed: {}",
                resp.description.unwrap_or_else(|| "unknown".into())
            );
        }

        Ok(resp
            .result
            .map(|r| r.message_id.to_string())
            .unwrap_or_default())
    }

    async fn poll(&self, offset: Option<i64>, timeout_secs: u64) -> anyhow::Result<UpdateBatch> {
        let mut body = serde_json::json!({
            "timeout": timeout_secs,
            "allowed_updates": ["message"],
        });
        if let Some(offset) = offset {
            body["offset"] = serde_json::json!(offset);
        }

        let resp: TelegramResponse<Vec<TgUpdate>> = self
            .client
            .post(self.api_url("getUpdates"))
            // the server holds the request for up to `timeout_secs`
            .timeout(Duration::from_secs(timeout_secs + 10))
            .json(&body)
            .send()
            .await?
            .json()
            .await?;

        if !resp.ok {
            anyhow::bail!(
                "Telegram getUpdates failed: {}",
                resp.description.unwrap_or_else(|| "unknown".into())
            );
        }

        let updates = resp.result.unwrap_or_default();
        let next_offset = updates.iter().map(|u| u.update_id + 1).max();
        let messages = updates.into_iter().filter_map(to_incoming).collect();

        Ok(UpdateBatch {
            messages,
            next_offset,
        })
    }

    async fn typing(&self, target: &str) -> anyhow::Result<()> {
        let body = serde_json::json!({
            "chat_id": target,
            "action": "typing",
        });
        self.client
            .post(self.api_url("sendChatAction"))
            .json(&body)
            .send()
            .await?;
        Ok(())
    }
}
