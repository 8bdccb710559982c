use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::errors::NotifyError;

const DEFAULT_API_BASE: &str = "https://api.telegram.org";
const REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct Update {
    #[serde(default)]
    message: Option<UpdateMessage>,
    #[serde(default)]
    channel_post: Option<UpdateMessage>,
}

#[derive(Debug, Deserialize)]
struct UpdateMessage {
    chat: Chat,
}

#[derive(Debug, Deserialize)]
struct Chat {
    id: i64,
    #[serde(rename = "type")]
    kind: String,
    title: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
}

/// A chat the bot has seen recently, as reported by `getUpdates`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatSummary {
    pub id: i64,
    pub kind: String,
    pub title: String,
}

impl ChatSummary {
    pub fn marker(&self) -> &'static str {
        match self.kind.as_str() {
            "private" => "👤",
            "group" => "👥",
            "supergroup" => "👥🔒",
            _ => "📢",
        }
    }
}

#[derive(Clone)]
pub struct TelegramClient {
    client: Client,
    api_base: String,
    token: String,
}

impl TelegramClient {
    pub fn new(token: impl Into<String>) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .user_agent(concat!("liquidity-watch/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            api_base: DEFAULT_API_BASE.to_string(),
            token: token.into(),
        })
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.api_base, self.token)
    }

    pub async fn send_message(&self, chat_id: &str, text: &str) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&json!({
                "chat_id": chat_id,
                "text": text,
                "parse_mode": "Markdown",
            }))
            .send()
            .await
            .map_err(redact)?;
        let status = response.status();
        let body: ApiResponse<serde_json::Value> = response.json().await.map_err(redact)?;
        if !body.ok {
            return Err(NotifyError::Telegram(body.description.unwrap_or_else(|| {
                format!("sendMessage returned {status}")
            })));
        }
        Ok(())
    }

    pub async fn recent_chats(&self) -> Result<Vec<ChatSummary>, NotifyError> {
        let response = self
            .client
            .get(self.method_url("getUpdates"))
            .send()
            .await
            .map_err(redact)?;
        let body: ApiResponse<Vec<Update>> = response.json().await.map_err(redact)?;
        if !body.ok {
            return Err(NotifyError::Telegram(
                body.description
                    .unwrap_or_else(|| "getUpdates failed".to_string()),
            ));
        }
        Ok(summarize_chats(body.result.unwrap_or_default()))
    }
}

/// Request URLs embed the bot token; keep them out of error text.
fn redact(err: reqwest::Error) -> NotifyError {
    NotifyError::Http(err.without_url())
}

fn summarize_chats(updates: Vec<Update>) -> Vec<ChatSummary> {
    let mut chats = BTreeMap::new();
    for update in updates {
        let Some(message) = update.message.or(update.channel_post) else {
            continue;
        };
        let chat = message.chat;
        chats.entry(chat.id).or_insert_with(|| {
            let title = chat.title.unwrap_or_else(|| {
                format!(
                    "{} {}",
                    chat.first_name.unwrap_or_default(),
                    chat.last_name.unwrap_or_default()
                )
                .trim()
                .to_string()
            });
            ChatSummary {
                id: chat.id,
                kind: chat.kind,
                title,
            }
        });
    }
    chats.into_values().collect()
}
