//! Routes one Telegram update through the relay pipeline.
//!
//! Photo: fetch the largest size, normalize (when enabled), recognize, reply.
//! Text: ask for a photo. Anything else is acknowledged and dropped. Every
//! failure after a photo arrives produces a chat reply, so the user is never
//! left without an answer unless `sendMessage` itself fails.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::RelayConfig;
use crate::fetch;
use crate::images::{self, NormalizeSettings};
use crate::notify::notify;
use crate::recognition::RecognitionClient;
use crate::telegram::{PhotoSize, TelegramClient, Update};

const TEXT_REPLY_PREFIX: &str =
    "📷 Отправьте фото документа, и я распознаю участок, изделие, номер и дату.\n\nВы написали: ";
/// Telegram rejects `sendMessage` text over 4096 characters.
pub const MAX_ECHO_CHARS: usize = 3900;

pub const RECOGNITION_SUCCESS_PREFIX: &str = "✅ Результат распознавания:\n";
pub const DOWNLOAD_FAILED_MESSAGE: &str = "❌ Не удалось скачать фото. Попробуйте отправить его ещё раз.";
pub const RECOGNITION_FAILED_MESSAGE: &str =
    "❌ Не удалось распознать документ. Попробуйте сделать более чёткое фото.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyStatus {
    Success,
    Error,
}

/// JSON body returned to the webhook caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebhookReply {
    pub status: ReplyStatus,
    pub message: String,
}

impl WebhookReply {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: ReplyStatus::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ReplyStatus::Error,
            message: message.into(),
        }
    }
}

pub struct Dispatcher {
    telegram: TelegramClient,
    recognition: RecognitionClient,
    normalize: NormalizeSettings,
}

impl Dispatcher {
    pub fn new(config: &RelayConfig) -> Self {
        Self {
            telegram: TelegramClient::new(&config.telegram),
            recognition: RecognitionClient::new(config.recognition.clone()),
            normalize: config.normalize,
        }
    }

    pub async fn handle_update(&self, update: Update) -> WebhookReply {
        let Some(message) = update.message else {
            debug!(update_id = update.update_id, "update without message");
            return WebhookReply::success("no message in update");
        };

        let chat_id = message.chat.id;
        info!(
            update_id = update.update_id,
            chat_id,
            sender = message.sender_name(),
            "received message"
        );

        if let Some(photo) = select_largest_photo(message.photo.as_deref()) {
            return self.handle_photo(chat_id, photo).await;
        }

        if let Some(text) = message.text.as_deref() {
            notify(&self.telegram, chat_id, &text_reply(text)).await;
            return WebhookReply::success("text message answered");
        }

        debug!(chat_id, "message has neither photo nor text");
        WebhookReply::success("message ignored")
    }

    async fn handle_photo(&self, chat_id: i64, photo: &PhotoSize) -> WebhookReply {
        info!(
            chat_id,
            file_id = %photo.file_id,
            width = photo.width,
            height = photo.height,
            file_size = photo.file_size,
            "processing photo"
        );

        let bytes = match fetch::fetch_file(&self.telegram, &photo.file_id).await {
            Ok(bytes) => bytes,
            Err(err) => {
                let stage = if err.is_lookup() { "lookup" } else { "download" };
                warn!(chat_id, stage, error = %err, "photo fetch failed");
                notify(&self.telegram, chat_id, DOWNLOAD_FAILED_MESSAGE).await;
                return WebhookReply::error("photo download failed");
            }
        };

        let image = if self.normalize.enabled {
            images::normalize_in_background(bytes, self.normalize.max_dims()).await
        } else {
            bytes
        };

        match self.recognition.recognize(&image).await {
            Ok(text) => {
                info!(chat_id, "photo recognized");
                let reply = format!("{RECOGNITION_SUCCESS_PREFIX}{text}");
                notify(&self.telegram, chat_id, &reply).await;
                WebhookReply::success("photo recognized")
            }
            Err(err) => {
                warn!(chat_id, error = %err, "recognition failed");
                notify(&self.telegram, chat_id, RECOGNITION_FAILED_MESSAGE).await;
                WebhookReply::error("recognition failed")
            }
        }
    }
}

/// Telegram orders photo sizes smallest first; the last entry is the largest.
pub fn select_largest_photo(photos: Option<&[PhotoSize]>) -> Option<&PhotoSize> {
    photos.and_then(<[PhotoSize]>::last)
}

/// Reply for plain text messages. Echoes the text back, cut to
/// [`MAX_ECHO_CHARS`] so the reply stays under Telegram's message limit.
pub fn text_reply(text: &str) -> String {
    let echoed = match text.char_indices().nth(MAX_ECHO_CHARS) {
        Some((end, _)) => format!("{}…", &text[..end]),
        None => text.to_string(),
    };
    format!("{TEXT_REPLY_PREFIX}{echoed}")
}
