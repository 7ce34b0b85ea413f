use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use crate::bot::BotConfig;
use crate::review::JobContext;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    pub anthropic_api_key: String,
    pub review_channels: HashSet<u64>,
    /// Known-good résumé for formatting comparison. Enables the extended review.
    pub reference_resume_path: Option<PathBuf>,
    pub default_job: JobContext,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            discord_token: require_env("DISCORD_TOKEN")?,
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            review_channels: review_channels_from_env()?,
            reference_resume_path: optional_env("REFERENCE_RESUME_PATH").map(PathBuf::from),
            default_job: JobContext {
                job_title: optional_env("JOB_TITLE"),
                company: optional_env("JOB_COMPANY"),
                min_qualifications: optional_env("JOB_MIN_QUALIFICATIONS"),
                preferred_qualifications: optional_env("JOB_PREFERRED_QUALIFICATIONS"),
            },
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    pub fn bot_config(&self) -> BotConfig {
        BotConfig {
            token: self.discord_token.clone(),
            review_channels: self.review_channels.clone(),
            default_job: self.default_job.clone(),
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Unset and blank are treated the same.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Merges `RESUME_REVIEW_CHANNEL_IDS` with the single-ID production and test
/// channel variables. At least one ID is required.
fn review_channels_from_env() -> Result<HashSet<u64>> {
    let mut channels = HashSet::new();
    for key in [
        "RESUME_REVIEW_CHANNEL_IDS",
        "RESUME_REVIEW_CHANNEL_ID",
        "RESUME_REVIEW_TEST_CHANNEL_ID",
    ] {
        if let Some(value) = optional_env(key) {
            channels.extend(parse_channel_ids(&value).with_context(|| format!("Invalid {key}"))?);
        }
    }
    if channels.is_empty() {
        bail!("No review channel configured; set RESUME_REVIEW_CHANNEL_IDS or RESUME_REVIEW_CHANNEL_ID");
    }
    Ok(channels)
}

/// Parses a comma-separated list of Discord channel IDs.
pub fn parse_channel_ids(value: &str) -> Result<HashSet<u64>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| match s.parse::<u64>() {
            Ok(0) => bail!("channel ID must be non-zero"),
            Ok(id) => Ok(id),
            Err(e) => Err(e).with_context(|| format!("'{s}' is not a channel ID")),
        })
        .collect()
}
