//! Startup configuration.
//!
//! Values come from flags or the environment (via clap) exactly once, are
//! validated, and end up in an immutable [`RelayConfig`] that is handed to
//! every component.

use std::net::{IpAddr, SocketAddr};

use clap::{ArgAction, Parser};

use crate::error::ConfigError;
use crate::images::{DEFAULT_MAX_DIMENSION, NormalizeSettings};
use crate::recognition::{self, RecognitionSettings};
use crate::telegram::{self, TelegramSettings};

/// Values people leave in `.env` templates.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "your_bot_token_here",
    "your_telegram_bot_token",
    "your_api_key_here",
    "your_deepseek_api_key",
    "changeme",
    "xxx",
];

#[derive(Parser, Debug, Clone)]
#[command(name = "scanrelay")]
#[command(version)]
#[command(about = "Telegram webhook relay that recognizes document photos")]
pub struct Cli {
    /// Telegram bot token
    #[arg(long, env = "TELEGRAM_BOT_TOKEN", hide_env_values = true)]
    pub bot_token: Option<String>,

    /// API key for the recognition provider
    #[arg(long, env = "DEEPSEEK_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Address to listen on
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Telegram Bot API base URL
    #[arg(long, env = "TELEGRAM_API_BASE", default_value = telegram::DEFAULT_API_BASE)]
    pub telegram_api_base: String,

    /// Base URL of the OpenAI-compatible recognition API
    #[arg(long, env = "RECOGNITION_BASE_URL", default_value = recognition::DEFAULT_BASE_URL)]
    pub recognition_base_url: String,

    /// Model used for recognition
    #[arg(long, env = "RECOGNITION_MODEL", default_value = recognition::DEFAULT_MODEL)]
    pub recognition_model: String,

    /// Downscale photos before recognition
    #[arg(long, env = "NORMALIZE_IMAGES", default_value_t = true, action = ArgAction::Set)]
    pub normalize_images: bool,

    /// Bounding box width for downscaling
    #[arg(long, env = "IMAGE_MAX_WIDTH", default_value_t = DEFAULT_MAX_DIMENSION)]
    pub image_max_width: u32,

    /// Bounding box height for downscaling
    #[arg(long, env = "IMAGE_MAX_HEIGHT", default_value_t = DEFAULT_MAX_DIMENSION)]
    pub image_max_height: u32,

    /// Default log filter when RUST_LOG is unset
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub listen_addr: SocketAddr,
    pub telegram: TelegramSettings,
    pub recognition: RecognitionSettings,
    pub normalize: NormalizeSettings,
}

impl RelayConfig {
    /// Validates parsed arguments.
    ///
    /// # Errors
    /// Returns an error when a secret is missing or a placeholder, or the
    /// bounding box has a zero side.
    pub fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        let bot_token = required_secret(cli.bot_token, "TELEGRAM_BOT_TOKEN")?;
        let api_key = required_secret(cli.api_key, "DEEPSEEK_API_KEY")?;

        if cli.image_max_width == 0 || cli.image_max_height == 0 {
            return Err(ConfigError::InvalidBoundingBox {
                width: cli.image_max_width,
                height: cli.image_max_height,
            });
        }

        Ok(Self {
            listen_addr: SocketAddr::new(cli.host, cli.port),
            telegram: TelegramSettings {
                bot_token,
                api_base: cli.telegram_api_base,
            },
            recognition: RecognitionSettings {
                api_key,
                base_url: cli.recognition_base_url,
                model: cli.recognition_model,
            },
            normalize: NormalizeSettings {
                enabled: cli.normalize_images,
                max_width: cli.image_max_width,
                max_height: cli.image_max_height,
            },
        })
    }
}

fn required_secret(value: Option<String>, name: &'static str) -> Result<String, ConfigError> {
    let value = value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or(ConfigError::Missing { name })?;

    if PLACEHOLDER_SECRETS
        .iter()
        .any(|placeholder| value.eq_ignore_ascii_case(placeholder))
    {
        return Err(ConfigError::Placeholder { name });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["scanrelay"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_builds_config_from_flags() {
        let config = RelayConfig::from_cli(cli(&[
            "--bot-token",
            "123:abc",
            "--api-key",
            "sk-test",
            "--host",
            "0.0.0.0",
            "--port",
            "8080",
            "--normalize-images",
            "true",
            "--image-max-width",
            "800",
            "--image-max-height",
            "800",
        ]))
        .unwrap();

        assert_eq!(config.listen_addr.to_string(), "0.0.0.0:8080");
        assert_eq!(config.telegram.bot_token, "123:abc");
        assert_eq!(config.recognition.api_key, "sk-test");
        assert_eq!(config.normalize, NormalizeSettings::default());
    }

    #[test]
    fn test_secrets_are_trimmed() {
        let config =
            RelayConfig::from_cli(cli(&["--bot-token", " 123:abc\n", "--api-key", "sk-test "]))
                .unwrap();
        assert_eq!(config.telegram.bot_token, "123:abc");
        assert_eq!(config.recognition.api_key, "sk-test");
    }

    #[test]
    fn test_placeholder_token_is_rejected() {
        let err = RelayConfig::from_cli(cli(&[
            "--bot-token",
            "YOUR_BOT_TOKEN_HERE",
            "--api-key",
            "sk-test",
        ]))
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Placeholder {
                name: "TELEGRAM_BOT_TOKEN"
            }
        ));
    }

    #[test]
    fn test_blank_api_key_is_missing() {
        let err = RelayConfig::from_cli(cli(&["--bot-token", "123:abc", "--api-key", "   "]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Missing {
                name: "DEEPSEEK_API_KEY"
            }
        ));
    }

    #[test]
    fn test_zero_bounding_box_is_rejected() {
        let err = RelayConfig::from_cli(cli(&[
            "--bot-token",
            "123:abc",
            "--api-key",
            "sk-test",
            "--image-max-width",
            "0",
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBoundingBox { width: 0, .. }));
    }

    #[test]
    fn test_normalization_can_be_disabled() {
        let config = RelayConfig::from_cli(cli(&[
            "--bot-token",
            "123:abc",
            "--api-key",
            "sk-test",
            "--normalize-images",
            "false",
        ]))
        .unwrap();
        assert!(!config.normalize.enabled);
    }
}
