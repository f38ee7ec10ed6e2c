//! Error types for each stage of the relay pipeline.
//!
//! Every component returns its own error enum; the dispatcher decides how a
//! failure is reported to the chat and to the webhook caller.

use std::io;
use std::net::SocketAddr;

use thiserror::Error;

/// Startup configuration problems. Fatal: the server refuses to start.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} is required")]
    Missing { name: &'static str },

    #[error("{name} still holds a placeholder value")]
    Placeholder { name: &'static str },

    #[error("image bounding box must be positive, got {width}x{height}")]
    InvalidBoundingBox { width: u32, height: u32 },
}

/// Failures talking to the Telegram Bot API.
#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("Telegram request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("failed to decode Telegram response: {0}")]
    Decode(#[source] reqwest::Error),

    #[error("Telegram {method} failed: {description}")]
    Api {
        method: &'static str,
        description: String,
    },

    #[error("Telegram returned HTTP {status}")]
    Status { status: u16 },
}

/// File fetch failures, split by the step that failed.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("file lookup failed for {file_id}: {source}")]
    Lookup {
        file_id: String,
        #[source]
        source: TelegramError,
    },

    #[error("file lookup for {file_id} returned no file_path")]
    MissingFilePath { file_id: String },

    #[error("file download failed for {file_path}: {source}")]
    Download {
        file_path: String,
        #[source]
        source: TelegramError,
    },
}

impl FetchError {
    /// True when the metadata call failed and no download was attempted.
    pub fn is_lookup(&self) -> bool {
        matches!(self, Self::Lookup { .. } | Self::MissingFilePath { .. })
    }
}

/// Image decode/resize/encode failures. Never surfaced past the normalizer.
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("decode: {0}")]
    Decode(#[from] image::ImageError),

    #[error("format detection: {0}")]
    Io(#[from] io::Error),

    #[error("resize: {0}")]
    Resize(String),

    #[error("encode: {0}")]
    Encode(#[source] image::ImageError),
}

/// Recognition provider failures.
#[derive(Debug, Error)]
pub enum RecognitionError {
    #[error("recognition request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("recognition provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode recognition response: {0}")]
    Decode(#[source] reqwest::Error),

    #[error("recognition response contained no choices")]
    MissingChoice,
}

/// A reply that could not be delivered. Logged, never escalated.
#[derive(Debug, Error)]
#[error("failed to notify chat {chat_id}: {source}")]
pub struct NotifyError {
    pub chat_id: i64,
    #[source]
    pub source: TelegramError,
}

/// Failures that stop the relay before or while serving. Returned to `main`.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("invalid configuration")]
    Config(#[from] ConfigError),

    #[error("failed to bind {addr}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("HTTP server failed")]
    Serve(#[source] io::Error),
}
