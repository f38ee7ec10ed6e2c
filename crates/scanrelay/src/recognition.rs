//! Document recognition over an OpenAI-compatible chat completions API.
//!
//! The photo travels as a base64 data URL appended to a fixed instruction
//! that asks for a single JSON object. Message content is a plain string,
//! which text-only chat endpoints such as `deepseek-chat` accept. The reply is relayed verbatim; nothing here
//! parses or validates it.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::RecognitionError;

pub const DEFAULT_BASE_URL: &str = "https://api.deepseek.com/v1";
pub const DEFAULT_MODEL: &str = "deepseek-chat";
pub const TEMPERATURE: f32 = 0.1;
pub const MAX_TOKENS: u32 = 500;

const CHAT_COMPLETIONS_PATH: &str = "/chat/completions";
const FALLBACK_IMAGE_MIME: &str = "image/jpeg";
const SUPPORTED_IMAGE_MIMES: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/webp"];

const RECOGNITION_PROMPT: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/prompts/recognition_prompt.md"
));

#[derive(Clone)]
pub struct RecognitionSettings {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

impl fmt::Debug for RecognitionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecognitionSettings")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

#[derive(Clone)]
pub struct RecognitionClient {
    settings: RecognitionSettings,
    http: reqwest::Client,
}

impl RecognitionClient {
    pub fn new(settings: RecognitionSettings) -> Self {
        Self {
            settings,
            http: reqwest::Client::new(),
        }
    }

    /// Sends `image` to the provider and returns the first choice's text.
    ///
    /// # Errors
    /// Returns an error on transport failure, any non-200 status, or a body
    /// without a usable choice.
    pub async fn recognize(&self, image: &[u8]) -> Result<String, RecognitionError> {
        let request = ChatCompletionRequest::for_image(&self.settings.model, image);
        let url = format!(
            "{}{}",
            self.settings.base_url.trim_end_matches('/'),
            CHAT_COMPLETIONS_PATH
        );

        let response = self
            .http
            .post(url)
            .bearer_auth(&self.settings.api_key)
            .json(&request)
            .send()
            .await
            .map_err(RecognitionError::Request)?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(RecognitionError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let payload: ChatCompletionResponse =
            response.json().await.map_err(RecognitionError::Decode)?;
        let text = payload.into_first_text()?;
        debug!(chars = text.chars().count(), "recognition succeeded");
        Ok(text)
    }
}

/// `data:` URL for the image, with the MIME type sniffed from its bytes.
pub fn image_data_url(image: &[u8]) -> String {
    let mime = infer::get(image)
        .map(|kind| kind.mime_type())
        .filter(|mime| SUPPORTED_IMAGE_MIMES.contains(mime))
        .unwrap_or(FALLBACK_IMAGE_MIME);
    format!("data:{};base64,{}", mime, BASE64.encode(image))
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatCompletionMessage>,
    temperature: f32,
    max_tokens: u32,
}

impl<'a> ChatCompletionRequest<'a> {
    fn for_image(model: &'a str, image: &[u8]) -> Self {
        Self {
            model,
            messages: vec![ChatCompletionMessage {
                role: "user",
                content: prompt_with_image(image),
            }],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        }
    }
}

/// The instruction followed by the image's data URL on its own line.
fn prompt_with_image(image: &[u8]) -> String {
    format!("{}\n\n{}", RECOGNITION_PROMPT.trim(), image_data_url(image))
}

#[derive(Debug, Serialize)]
struct ChatCompletionMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

impl ChatCompletionResponse {
    fn into_first_text(self) -> Result<String, RecognitionError> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(RecognitionError::MissingChoice)
    }
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}
