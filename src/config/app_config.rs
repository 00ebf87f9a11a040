use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{AppError, AppResult};
use crate::services::generation::{DEFAULT_API_BASE, DEFAULT_MODEL, SUPPORTED_MODELS};
use crate::services::BackoffPolicy;

/// EventBnb - rewrite rental listing descriptions around nearby events
#[derive(Parser, Debug, Clone)]
#[command(name = "eventbnb")]
#[command(author, version, about, long_about = None)]
pub struct AppConfig {
    /// CSV file with one row per (listing, nearby event) pair
    #[arg(long, env = "EVENTBNB_CSV", default_value = "OHY_proj_sample.csv")]
    pub csv_path: PathBuf,

    /// Gemini API key (can also be set inside the session with `key`)
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Gemini model used for generation
    #[arg(long, env = "EVENTBNB_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Base URL of the Gemini REST API
    #[arg(long, env = "GEMINI_API_BASE", default_value = DEFAULT_API_BASE)]
    pub api_base: String,

    /// Seconds to wait after a successful generation before the next one
    #[arg(long, env = "EVENTBNB_COOLDOWN_SECS", default_value_t = 8)]
    pub cooldown_secs: u64,

    /// Attempts per generation when the API is rate-limiting
    #[arg(long, env = "EVENTBNB_MAX_ATTEMPTS", default_value_t = 5)]
    pub max_attempts: u32,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl AppConfig {
    pub fn validate(&self) -> AppResult<()> {
        if self.max_attempts == 0 {
            return Err(AppError::Config("--max-attempts must be at least 1".to_string()));
        }

        if !SUPPORTED_MODELS.contains(&self.model.as_str()) {
            return Err(AppError::Config(format!(
                "Unsupported model '{}'. Choose one of: {}",
                self.model,
                SUPPORTED_MODELS.join(", ")
            )));
        }

        Ok(())
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }

    pub fn backoff_policy(&self) -> BackoffPolicy {
        BackoffPolicy {
            max_attempts: self.max_attempts,
            ..BackoffPolicy::default()
        }
    }
}
