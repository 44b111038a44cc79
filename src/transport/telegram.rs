//! Telegram Bot API client over plain HTTPS + JSON

use super::*;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Client for `https://api.telegram.org/bot<token>/<method>`
pub struct TelegramClient {
    base_url: String,
    token: String,
    client: reqwest::Client,
    request_timeout: Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub from: Option<User>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type", default)]
    pub kind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    pub first_name: String,
    #[serde(default)]
    pub username: Option<String>,
}

impl From<User> for ChatUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            is_bot: user.is_bot,
            first_name: user.first_name,
            username: user.username,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatMember {
    user: User,
}

/// Envelope around every Bot API response
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    error_code: Option<i32>,
}

#[derive(Debug, Serialize)]
struct SendMessageParams<'a> {
    chat_id: i64,
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatParams {
    chat_id: i64,
}

#[derive(Debug, Serialize)]
struct GetUpdatesParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<i64>,
    timeout: u64,
    allowed_updates: &'static [&'static str],
}

#[derive(Debug, Serialize)]
struct SetWebhookParams<'a> {
    url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    secret_token: Option<&'a str>,
    allowed_updates: &'static [&'static str],
}

#[derive(Debug, Serialize)]
struct NoParams {}

const ALLOWED_UPDATES: &[&str] = &["message"];

impl TelegramClient {
    /// Create a client for the given API base URL and bot token
    pub fn new(base_url: String, token: String) -> TransportResult<Self> {
        let request_timeout = Duration::from_secs(30);
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| TransportError::Http(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            client,
            request_timeout,
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token, method)
    }

    /// Call a Bot API method and unwrap the `result` field
    async fn call<P, T>(&self, method: &str, params: &P, timeout: Duration) -> TransportResult<T>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.client.post(self.method_url(method)).json(params).send();

        // Strip the URL from errors, it contains the bot token
        let response = tokio::time::timeout(timeout, request)
            .await
            .map_err(|_| TransportError::Timeout(timeout))?
            .map_err(|e| TransportError::Http(e.without_url().to_string()))?;

        let status = response.status();
        let body: ApiResponse<T> = response.json().await.map_err(|e| {
            TransportError::ParseError(format!(
                "{} returned {}: {}",
                method,
                status,
                e.without_url()
            ))
        })?;

        if !body.ok {
            return Err(TransportError::Api {
                code: body.error_code,
                description: body
                    .description
                    .unwrap_or_else(|| format!("{} failed with status {}", method, status)),
            });
        }

        body.result
            .ok_or_else(|| TransportError::ParseError(format!("{} returned no result", method)))
    }

    /// Identity of the bot behind the token
    pub async fn get_me(&self) -> TransportResult<User> {
        self.call("getMe", &NoParams {}, self.request_timeout).await
    }

    /// Long-poll for new updates. `offset` is one past the last processed update id.
    pub async fn get_updates(
        &self,
        offset: Option<i64>,
        poll_timeout: Duration,
    ) -> TransportResult<Vec<Update>> {
        let params = GetUpdatesParams {
            offset,
            timeout: poll_timeout.as_secs(),
            allowed_updates: ALLOWED_UPDATES,
        };

        // Leave the server time to answer an idle long poll
        let timeout = poll_timeout + self.request_timeout;
        self.call("getUpdates", &params, timeout).await
    }

    /// Register a webhook. Telegram stops serving `getUpdates` while one is set.
    pub async fn set_webhook(&self, url: &str, secret_token: Option<&str>) -> TransportResult<()> {
        let params = SetWebhookParams {
            url,
            secret_token,
            allowed_updates: ALLOWED_UPDATES,
        };
        let _: bool = self.call("setWebhook", &params, self.request_timeout).await?;
        Ok(())
    }

    pub async fn delete_webhook(&self) -> TransportResult<()> {
        let _: bool = self
            .call("deleteWebhook", &NoParams {}, self.request_timeout)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl Transport for TelegramClient {
    async fn send_message(&self, chat_id: i64, text: &str) -> TransportResult<()> {
        let params = SendMessageParams { chat_id, text };
        let _: serde_json::Value = self
            .call("sendMessage", &params, self.request_timeout)
            .await?;
        Ok(())
    }

    async fn get_chat_administrators(&self, chat_id: i64) -> TransportResult<Vec<ChatUser>> {
        let members: Vec<ChatMember> = self
            .call(
                "getChatAdministrators",
                &ChatParams { chat_id },
                self.request_timeout,
            )
            .await?;

        Ok(members.into_iter().map(|m| m.user.into()).collect())
    }

    fn name(&self) -> &str {
        "telegram"
    }
}
