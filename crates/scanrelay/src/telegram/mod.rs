//! Minimal Telegram Bot API client: file lookup, file download, send message.

use std::fmt;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::TelegramError;

mod types;

pub use types::{Chat, Message, PhotoSize, TelegramFile, Update, User};

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

#[derive(Clone)]
pub struct TelegramSettings {
    pub bot_token: String,
    pub api_base: String,
}

impl fmt::Debug for TelegramSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramSettings")
            .field("bot_token", &"<redacted>")
            .field("api_base", &self.api_base)
            .finish()
    }
}

#[derive(Clone)]
pub struct TelegramClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl TelegramClient {
    pub fn new(settings: &TelegramSettings) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: settings.api_base.trim_end_matches('/').to_string(),
            token: settings.bot_token.clone(),
        }
    }

    pub async fn get_file(&self, file_id: &str) -> Result<TelegramFile, TelegramError> {
        let request = GetFileRequest { file_id };
        self.post("getFile", &request).await
    }

    /// Downloads file content. Anything other than HTTP 200 is a failure.
    pub async fn download_file(&self, file_path: &str) -> Result<Vec<u8>, TelegramError> {
        let url = format!("{}/file/bot{}/{}", self.base_url, self.token, file_path);
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|err| TelegramError::Transport(err.without_url()))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(TelegramError::Status {
                status: status.as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|err| TelegramError::Transport(err.without_url()))?;
        Ok(bytes.to_vec())
    }

    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<Message, TelegramError> {
        let request = SendMessageRequest { chat_id, text };
        self.post("sendMessage", &request).await
    }

    async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        method: &'static str,
        body: &B,
    ) -> Result<T, TelegramError> {
        let url = format!("{}/bot{}/{}", self.base_url, self.token, method);
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|err| TelegramError::Transport(err.without_url()))?;

        let payload: TelegramResponse<T> = response
            .json()
            .await
            .map_err(|err| TelegramError::Decode(err.without_url()))?;
        payload.into_result(method)
    }
}

/// Bot API envelope. Absent `result`/`description` decode as `None`.
#[derive(Debug, Deserialize)]
struct TelegramResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

impl<T> TelegramResponse<T> {
    fn into_result(self, method: &'static str) -> Result<T, TelegramError> {
        match self {
            Self {
                ok: true,
                result: Some(result),
                ..
            } => Ok(result),
            Self { description, .. } => Err(TelegramError::Api {
                method,
                description: description.unwrap_or_else(|| "Telegram API error".to_string()),
            }),
        }
    }
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GetFileRequest<'a> {
    file_id: &'a str,
}
