//! Telegram webhook relay for document photos.
//!
//! A photo sent to the bot is downloaded, downscaled, passed to a vision
//! model that extracts section, item, number and date, and the model's reply
//! is sent back to the chat.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod fetch;
pub mod images;
pub mod logging;
pub mod notify;
pub mod recognition;
pub mod server;
pub mod telegram;

pub use config::{Cli, RelayConfig};
pub use dispatch::{Dispatcher, ReplyStatus, WebhookReply};
pub use server::{AppState, router, serve};
