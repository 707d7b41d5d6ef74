//! Process configuration: store location, logging, tokens and service endpoints. Loaded from env.

use std::env;
use std::time::Duration;

use anyhow::Result;
use fx_core::retry::{DEFAULT_BACKOFF, DEFAULT_MAX_ATTEMPTS};
use fx_core::RetryHandler;

pub const DEFAULT_GRAPH_BASE_URL: &str = "https://graph.microsoft.com/v1.0";
pub const DEFAULT_APP_STUDIO_BASE_URL: &str = "https://dev.teams.microsoft.com";
pub const DEFAULT_ARM_BASE_URL: &str = "https://management.azure.com";
pub const DEFAULT_TEMPLATE_BASE_URL: &str =
    "https://github.com/OfficeDev/TeamsFx/releases/latest/download";

/// Read once at startup; never mutated afterwards.
#[derive(Debug, Clone)]
pub struct FxConfig {
    /// TEAMSFX_DATABASE_URL
    pub database_url: String,
    /// LOG_FILE
    pub log_file: String,
    /// GRAPH_TOKEN
    pub graph_token: Option<String>,
    /// APP_STUDIO_TOKEN
    pub app_studio_token: Option<String>,
    /// AZURE_ACCESS_TOKEN
    pub azure_access_token: Option<String>,
    pub graph_base_url: String,
    pub app_studio_base_url: String,
    pub arm_base_url: String,
    pub template_base_url: String,
    /// Folder with bundled template archives used when the download fails.
    pub template_fallback_dir: String,
    pub retry_max_attempts: u32,
    pub retry_backoff_ms: u64,
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

impl FxConfig {
    pub fn load() -> Result<Self> {
        Ok(Self {
            database_url: var_or("TEAMSFX_DATABASE_URL", "./.fx/teamsfx.db"),
            log_file: var_or("LOG_FILE", "logs/teamsfx.log"),
            graph_token: non_empty_var("GRAPH_TOKEN"),
            app_studio_token: non_empty_var("APP_STUDIO_TOKEN"),
            azure_access_token: non_empty_var("AZURE_ACCESS_TOKEN"),
            graph_base_url: var_or("GRAPH_BASE_URL", DEFAULT_GRAPH_BASE_URL),
            app_studio_base_url: var_or("APP_STUDIO_BASE_URL", DEFAULT_APP_STUDIO_BASE_URL),
            arm_base_url: var_or("ARM_BASE_URL", DEFAULT_ARM_BASE_URL),
            template_base_url: var_or("TEMPLATE_BASE_URL", DEFAULT_TEMPLATE_BASE_URL),
            template_fallback_dir: var_or("TEMPLATE_FALLBACK_DIR", "./templates"),
            retry_max_attempts: env::var("RETRY_MAX_ATTEMPTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_MAX_ATTEMPTS),
            retry_backoff_ms: env::var("RETRY_BACKOFF_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_BACKOFF.as_millis() as u64),
        })
    }

    /// All service base URLs must parse.
    pub fn validate(&self) -> Result<()> {
        for (name, url) in [
            ("GRAPH_BASE_URL", &self.graph_base_url),
            ("APP_STUDIO_BASE_URL", &self.app_studio_base_url),
            ("ARM_BASE_URL", &self.arm_base_url),
            ("TEMPLATE_BASE_URL", &self.template_base_url),
        ] {
            if reqwest::Url::parse(url).is_err() {
                anyhow::bail!("{} is set but not a valid URL: {}", name, url);
            }
        }
        if self.retry_max_attempts == 0 {
            anyhow::bail!("RETRY_MAX_ATTEMPTS must be at least 1");
        }
        Ok(())
    }

    pub fn retry_handler(&self) -> RetryHandler {
        RetryHandler::new(
            self.retry_max_attempts,
            Duration::from_millis(self.retry_backoff_ms),
        )
    }
}
