//! Configuration: process-level [`FxConfig`] from env, and the persisted [`TeamsBotConfig`].

mod base;
mod bot_config;

#[cfg(test)]
mod tests;

pub use base::{
    FxConfig, DEFAULT_APP_STUDIO_BASE_URL, DEFAULT_ARM_BASE_URL, DEFAULT_GRAPH_BASE_URL,
    DEFAULT_TEMPLATE_BASE_URL,
};
pub use bot_config::{DeployConfig, LocalDebugConfig, ProvisionConfig, ScaffoldConfig, TeamsBotConfig};
