use tracing::{debug, error};

use crate::error::NotifyError;
use crate::telegram::{Message, TelegramClient};

/// Sends `text` to `chat_id`. Failures are logged and swallowed.
pub async fn notify(client: &TelegramClient, chat_id: i64, text: &str) -> Option<Message> {
    match client.send_message(chat_id, text).await {
        Ok(message) => {
            debug!(chat_id, message_id = message.message_id, "notification sent");
            Some(message)
        }
        Err(source) => {
            let err = NotifyError { chat_id, source };
            error!(error = %err, "notification failed");
            None
        }
    }
}
