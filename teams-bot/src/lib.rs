//! # Teams bot plugin
//!
//! Scaffolds, registers, provisions and deploys a Teams bot. [`TeamsBotImpl`] drives the
//! lifecycle; the REST clients in [`clients`] talk to Graph, the Teams Developer Portal,
//! Azure Resource Manager and Kudu. State is kept in an `fx-storage` config store.

pub mod clients;
pub mod config;
pub mod constants;
pub mod context;
pub mod plugin;

pub use clients::{
    ArmClient, AzureOperations, BotRegistrar, CommandBuilder, HttpTemplateProvider, LocalBuilder,
    RegistrationClient, TemplateProvider,
};
pub use config::{FxConfig, TeamsBotConfig};
pub use context::{
    Answers, LogInteraction, PluginContext, StaticTokenProvider, TokenProvider, UserInteraction,
};
pub use plugin::{BotServices, DeployOutcome, TeamsBotImpl};
