//! Maps CLI commands onto lifecycle steps of the bot plugin.

use std::sync::Arc;

use anyhow::{Context, Result};
use fx_core::mask_secret;
use fx_storage::{ConfigEntry, ConfigRepository, SqliteConfigRepository};
use teams_bot::constants::answers;
use teams_bot::{
    BotServices, DeployOutcome, FxConfig, PluginContext, StaticTokenProvider, TeamsBotImpl,
    TokenProvider, UserInteraction,
};
use tracing::info;

use crate::cli::{Cli, Commands};

/// Prints messages the user has to act on.
#[derive(Debug, Default)]
pub struct ConsoleInteraction;

impl UserInteraction for ConsoleInteraction {
    fn show_message(&self, message: &str) {
        println!("{}", message);
    }
}

/// Everything a command needs besides its arguments.
pub struct App {
    pub plugin: TeamsBotImpl,
    pub store: Arc<dyn ConfigRepository>,
    pub tokens: Arc<dyn TokenProvider>,
    pub ui: Arc<dyn UserInteraction>,
}

impl App {
    /// REST clients, SQLite store and env tokens from `config`.
    pub async fn from_config(config: &FxConfig) -> Result<Self> {
        let store = SqliteConfigRepository::new(&config.database_url)
            .await
            .with_context(|| format!("open config store {}", config.database_url))?;
        Ok(Self {
            plugin: TeamsBotImpl::new(BotServices::from_config(config)),
            store: Arc::new(store),
            tokens: Arc::new(StaticTokenProvider {
                graph: config.graph_token.clone(),
                app_studio: config.app_studio_token.clone(),
                azure: config.azure_access_token.clone(),
            }),
            ui: Arc::new(ConsoleInteraction),
        })
    }

    fn context(&self, cli: &Cli) -> PluginContext {
        PluginContext::new(
            cli.app_name.as_str(),
            cli.env.as_str(),
            cli.project_dir.as_path(),
            self.store.clone(),
        )
        .with_tokens(self.tokens.clone())
        .with_ui(self.ui.clone())
    }
}

fn is_secret(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    ["password", "secret", "token"]
        .iter()
        .any(|marker| key.contains(marker))
}

/// One `plugin.key = value` line per entry, secrets masked.
pub fn render_config(entries: &[ConfigEntry]) -> Vec<String> {
    entries
        .iter()
        .map(|e| {
            let value = if is_secret(&e.key) {
                mask_secret(&e.value)
            } else {
                e.value.clone()
            };
            format!("{}.{} = {}", e.plugin, e.key, value)
        })
        .collect()
}

/// Runs one command; returns the lines to print.
pub async fn execute(cli: &Cli, app: &App) -> Result<Vec<String>> {
    let ctx = app.context(cli);
    info!(env = %cli.env, command = cli.command.name(), "running command");

    match &cli.command {
        Commands::Init {
            language,
            way,
            capabilities,
            host_type,
            bot_id,
            bot_password,
        } => {
            let mut ctx = ctx
                .with_answer(answers::PROGRAMMING_LANGUAGE, language.as_str())
                .with_answer(answers::WAY_TO_REGISTER_BOT, way.as_str())
                .with_answer(answers::CAPABILITIES, capabilities.as_str());
            for (question, value) in [
                (answers::HOST_TYPE, host_type),
                (answers::BOT_ID, bot_id),
                (answers::BOT_PASSWORD, bot_password),
            ] {
                if let Some(value) = value {
                    ctx = ctx.with_answer(question, value.as_str());
                }
            }
            app.plugin.pre_scaffold(&ctx).await?;
            app.plugin.scaffold(&ctx).await?;
            Ok(vec![format!(
                "Scaffolded bot in {}",
                TeamsBotImpl::working_dir(&ctx, language.parse().ok()).display()
            )])
        }
        Commands::Provision => {
            app.plugin.pre_provision(&ctx).await?;
            app.plugin.provision(&ctx).await?;
            app.plugin.post_provision(&ctx).await?;
            Ok(vec!["Provision finished".to_string()])
        }
        Commands::Deploy => {
            app.plugin.pre_deploy(&ctx).await?;
            match app.plugin.deploy(&ctx).await? {
                DeployOutcome::Skipped => {
                    Ok(vec!["No change since the last deploy, skipped".to_string()])
                }
                DeployOutcome::Deployed { time } => Ok(vec![format!("Deployed at {}", time)]),
            }
        }
        Commands::LocalDebug { endpoint } => {
            let ctx = match endpoint {
                Some(endpoint) => ctx.with_answer(answers::LOCAL_ENDPOINT, endpoint.as_str()),
                None => ctx,
            };
            app.plugin.local_debug(&ctx).await?;
            app.plugin.post_local_debug(&ctx).await?;
            Ok(vec!["Local debug bot is ready".to_string()])
        }
        Commands::ShowConfig => {
            let entries = app.store.entries(&cli.env).await?;
            Ok(render_config(&entries))
        }
        Commands::Set { plugin, key, value } => {
            app.store.set(&cli.env, plugin, key, value).await?;
            Ok(vec![format!("{}.{} saved", plugin, key)])
        }
    }
}
