//! Config tests.

use std::env;

use fx_core::{HostType, PluginActRole, ProgrammingLanguage, WayToRegisterBot};
use fx_storage::{ConfigMap, ConfigRepository, InMemoryConfigRepository};
use serial_test::serial;

use crate::config::{FxConfig, TeamsBotConfig, DEFAULT_ARM_BASE_URL};
use crate::constants::{keys, AAD_PLUGIN, PLUGIN_NAME, SOLUTION_PLUGIN};

const VARS: &[&str] = &[
    "TEAMSFX_DATABASE_URL",
    "LOG_FILE",
    "GRAPH_TOKEN",
    "APP_STUDIO_TOKEN",
    "AZURE_ACCESS_TOKEN",
    "GRAPH_BASE_URL",
    "APP_STUDIO_BASE_URL",
    "ARM_BASE_URL",
    "TEMPLATE_BASE_URL",
    "TEMPLATE_FALLBACK_DIR",
    "RETRY_MAX_ATTEMPTS",
    "RETRY_BACKOFF_MS",
];

fn clear_env() {
    for var in VARS {
        env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_load_config_with_defaults() {
    clear_env();

    let config = FxConfig::load().unwrap();

    assert_eq!(config.database_url, "./.fx/teamsfx.db");
    assert_eq!(config.log_file, "logs/teamsfx.log");
    assert!(config.graph_token.is_none());
    assert_eq!(config.arm_base_url, DEFAULT_ARM_BASE_URL);
    assert_eq!(config.retry_max_attempts, 10);
    assert_eq!(config.retry_backoff_ms, 5000);
    assert!(config.validate().is_ok());
}

#[test]
#[serial]
fn test_load_config_with_custom_values() {
    clear_env();
    env::set_var("TEAMSFX_DATABASE_URL", "sqlite:custom.db");
    env::set_var("GRAPH_TOKEN", "graph");
    env::set_var("AZURE_ACCESS_TOKEN", "");
    env::set_var("RETRY_MAX_ATTEMPTS", "3");
    env::set_var("RETRY_BACKOFF_MS", "0");

    let config = FxConfig::load().unwrap();

    assert_eq!(config.database_url, "sqlite:custom.db");
    assert_eq!(config.graph_token.as_deref(), Some("graph"));
    assert!(config.azure_access_token.is_none());
    let retry = config.retry_handler();
    assert_eq!(retry.max_attempts(), 3);
    assert!(retry.backoff().is_zero());

    clear_env();
}

#[test]
#[serial]
fn test_validate_invalid_url() {
    clear_env();
    env::set_var("ARM_BASE_URL", "not-a-valid-url");

    let config = FxConfig::load().unwrap();
    assert!(config.validate().is_err());

    clear_env();
}

#[tokio::test]
async fn test_bot_config_round_trip_and_foreign_sections() {
    let store = InMemoryConfigRepository::new();
    let mut solution = ConfigMap::new();
    solution.set(keys::SUBSCRIPTION_ID, "sub");
    solution.set(keys::RESOURCE_GROUP, "rg");
    store.save("dev", SOLUTION_PLUGIN, &solution).await.unwrap();
    let mut aad = ConfigMap::new();
    aad.set(keys::TEAMS_CLIENT_ID, "client");
    store.save("dev", AAD_PLUGIN, &aad).await.unwrap();

    let mut config = TeamsBotConfig::restore(&store, "dev").await.unwrap();
    assert_eq!(config.provision.subscription_id.as_deref(), Some("sub"));
    assert_eq!(config.provision.teams_app_client_id.as_deref(), Some("client"));
    assert!(config.is_create_new());

    config.scaffold.bot_id = Some("bot".to_string());
    config.scaffold.bot_password = Some("secret-value".to_string());
    config.scaffold.programming_language = Some(ProgrammingLanguage::TypeScript);
    config.scaffold.way_to_register_bot = Some(WayToRegisterBot::ReuseExisting);
    config.scaffold.host_type = HostType::Functions;
    config.scaffold.act_roles = vec![PluginActRole::Bot, PluginActRole::MessageExtension];
    config.provision.site_name = Some("site".to_string());
    config.provision.provisioned = true;
    config.deploy.last_deploy_time = Some(42);
    config.save(&store, "dev").await.unwrap();

    let restored = TeamsBotConfig::restore(&store, "dev").await.unwrap();
    assert_eq!(restored, config);
    assert!(restored.scaffold.bot_aad_created());
    assert!(!restored.is_create_new());
    assert!(!restored.describe().contains("secret-value"));

    let bot_section = store.load("dev", PLUGIN_NAME).await.unwrap();
    assert_eq!(bot_section.get(keys::SUBSCRIPTION_ID), None);
    assert_eq!(bot_section.get(keys::ACT_ROLES), Some("bot,messaging-extension"));
}
