//! Per-invocation context handed to every lifecycle step.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use fx_storage::ConfigRepository;
use tracing::warn;

/// Supplies bearer tokens. `None` means the user is not signed in to that service.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn graph_token(&self) -> Option<String>;
    async fn app_studio_token(&self) -> Option<String>;
    /// Bearer token for Azure Resource Manager.
    async fn azure_credential(&self) -> Option<String>;
}

/// Fixed tokens, e.g. taken from the environment.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenProvider {
    pub graph: Option<String>,
    pub app_studio: Option<String>,
    pub azure: Option<String>,
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn graph_token(&self) -> Option<String> {
        self.graph.clone()
    }

    async fn app_studio_token(&self) -> Option<String> {
        self.app_studio.clone()
    }

    async fn azure_credential(&self) -> Option<String> {
        self.azure.clone()
    }
}

/// Messages the user has to act on.
pub trait UserInteraction: Send + Sync {
    fn show_message(&self, message: &str);
}

/// Sends user messages to the log.
#[derive(Debug, Default)]
pub struct LogInteraction;

impl UserInteraction for LogInteraction {
    fn show_message(&self, message: &str) {
        warn!(message = %message, "action required");
    }
}

pub type Answers = HashMap<String, String>;

pub struct PluginContext {
    pub app_name: String,
    pub env_name: String,
    pub project_root: PathBuf,
    pub answers: Answers,
    pub config_store: Arc<dyn ConfigRepository>,
    pub tokens: Arc<dyn TokenProvider>,
    pub ui: Arc<dyn UserInteraction>,
}

impl PluginContext {
    pub fn new(
        app_name: impl Into<String>,
        env_name: impl Into<String>,
        project_root: impl Into<PathBuf>,
        config_store: Arc<dyn ConfigRepository>,
    ) -> Self {
        Self {
            app_name: app_name.into(),
            env_name: env_name.into(),
            project_root: project_root.into(),
            answers: Answers::new(),
            config_store,
            tokens: Arc::new(StaticTokenProvider::default()),
            ui: Arc::new(LogInteraction),
        }
    }

    pub fn with_answer(mut self, question: &str, value: impl Into<String>) -> Self {
        self.answers.insert(question.to_string(), value.into());
        self
    }

    pub fn with_tokens(mut self, tokens: Arc<dyn TokenProvider>) -> Self {
        self.tokens = tokens;
        self
    }

    pub fn with_ui(mut self, ui: Arc<dyn UserInteraction>) -> Self {
        self.ui = ui;
        self
    }

    /// Non-empty answer to `question`.
    pub fn answer(&self, question: &str) -> Option<&str> {
        self.answers
            .get(question)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}
