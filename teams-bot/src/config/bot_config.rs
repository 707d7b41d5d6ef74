//! Typed configuration of the bot plugin, restored from and saved to the config store.
//!
//! The bot section is owned by this plugin. Values owned by other plugins (solution,
//! AAD app for Teams, SQL, identity, function) are read-only here and never saved back.

use fx_core::{
    mask_secret, FxError, FxResult, HostType, PluginActRole, ProgrammingLanguage, WayToRegisterBot,
};
use fx_storage::{ConfigMap, ConfigRepository, StorageError};
use tracing::debug;

use crate::constants::{
    keys, AAD_PLUGIN, FUNCTION_PLUGIN, IDENTITY_PLUGIN, PLUGIN_NAME, SOLUTION_PLUGIN, SQL_PLUGIN,
};

fn storage_error(e: StorageError) -> FxError {
    FxError::Storage(e.to_string())
}

/// Bot identity and scaffolding choices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScaffoldConfig {
    pub bot_id: Option<String>,
    pub bot_password: Option<String>,
    pub object_id: Option<String>,
    pub programming_language: Option<ProgrammingLanguage>,
    pub way_to_register_bot: Option<WayToRegisterBot>,
    pub host_type: HostType,
    pub act_roles: Vec<PluginActRole>,
    pub scaffolded: bool,
}

impl ScaffoldConfig {
    /// Created iff both id and password are known.
    pub fn bot_aad_created(&self) -> bool {
        self.bot_id.is_some() && self.bot_password.is_some()
    }

    fn restore(map: &ConfigMap) -> Self {
        Self {
            bot_id: map.get_string(keys::BOT_ID),
            bot_password: map.get_string(keys::BOT_PASSWORD),
            object_id: map.get_string(keys::OBJECT_ID),
            programming_language: map
                .get(keys::PROGRAMMING_LANGUAGE)
                .and_then(|v| v.parse().ok()),
            way_to_register_bot: map
                .get(keys::WAY_TO_REGISTER_BOT)
                .and_then(|v| v.parse().ok()),
            host_type: map
                .get(keys::HOST_TYPE)
                .and_then(|v| v.parse().ok())
                .unwrap_or_default(),
            act_roles: map
                .get(keys::ACT_ROLES)
                .map(|v| v.split(',').filter_map(|r| r.trim().parse().ok()).collect())
                .unwrap_or_default(),
            scaffolded: map.get_bool(keys::SCAFFOLDED),
        }
    }

    fn save(&self, map: &mut ConfigMap) {
        map.set_opt(keys::BOT_ID, self.bot_id.as_deref());
        map.set_opt(keys::BOT_PASSWORD, self.bot_password.as_deref());
        map.set_opt(keys::OBJECT_ID, self.object_id.as_deref());
        map.set_opt(
            keys::PROGRAMMING_LANGUAGE,
            self.programming_language.map(|l| l.as_str()),
        );
        map.set_opt(
            keys::WAY_TO_REGISTER_BOT,
            self.way_to_register_bot.map(|w| w.as_str()),
        );
        map.set(keys::HOST_TYPE, self.host_type.as_str());
        let roles: Vec<&str> = self.act_roles.iter().map(|r| r.as_str()).collect();
        map.set_opt(
            keys::ACT_ROLES,
            (!roles.is_empty()).then(|| roles.join(",")).as_deref(),
        );
        map.set_bool(keys::SCAFFOLDED, self.scaffolded);
    }
}

/// Azure hosting state plus the inputs other plugins provide for it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvisionConfig {
    pub subscription_id: Option<String>,
    pub resource_group: Option<String>,
    pub location: Option<String>,
    pub resource_name_suffix: Option<String>,
    pub sku_name: Option<String>,
    pub app_service_plan: Option<String>,
    pub site_name: Option<String>,
    pub site_endpoint: Option<String>,
    pub bot_channel_reg_name: Option<String>,
    pub valid_domain: Option<String>,
    pub provisioned: bool,

    pub teams_app_client_id: Option<String>,
    pub teams_app_client_secret: Option<String>,
    pub teams_app_tenant: Option<String>,
    pub application_id_uris: Option<String>,

    pub sql_endpoint: Option<String>,
    pub sql_database_name: Option<String>,
    pub sql_user_name: Option<String>,
    pub sql_password: Option<String>,
    pub identity_id: Option<String>,
    pub function_endpoint: Option<String>,
}

impl ProvisionConfig {
    fn save(&self, map: &mut ConfigMap) {
        map.set_opt(keys::SKU_NAME, self.sku_name.as_deref());
        map.set_opt(keys::APP_SERVICE_PLAN, self.app_service_plan.as_deref());
        map.set_opt(keys::SITE_NAME, self.site_name.as_deref());
        map.set_opt(keys::SITE_ENDPOINT, self.site_endpoint.as_deref());
        map.set_opt(keys::BOT_CHANNEL_REG_NAME, self.bot_channel_reg_name.as_deref());
        map.set_opt(keys::VALID_DOMAIN, self.valid_domain.as_deref());
        map.set_bool(keys::PROVISIONED, self.provisioned);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalDebugConfig {
    pub local_bot_id: Option<String>,
    pub local_bot_password: Option<String>,
    pub local_object_id: Option<String>,
    pub local_endpoint: Option<String>,
}

impl LocalDebugConfig {
    pub fn local_bot_created(&self) -> bool {
        self.local_bot_id.is_some() && self.local_bot_password.is_some()
    }

    fn restore(map: &ConfigMap) -> Self {
        Self {
            local_bot_id: map.get_string(keys::LOCAL_BOT_ID),
            local_bot_password: map.get_string(keys::LOCAL_BOT_PASSWORD),
            local_object_id: map.get_string(keys::LOCAL_OBJECT_ID),
            local_endpoint: map.get_string(keys::LOCAL_ENDPOINT),
        }
    }

    fn save(&self, map: &mut ConfigMap) {
        map.set_opt(keys::LOCAL_BOT_ID, self.local_bot_id.as_deref());
        map.set_opt(keys::LOCAL_BOT_PASSWORD, self.local_bot_password.as_deref());
        map.set_opt(keys::LOCAL_OBJECT_ID, self.local_object_id.as_deref());
        map.set_opt(keys::LOCAL_ENDPOINT, self.local_endpoint.as_deref());
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeployConfig {
    /// Epoch milliseconds of the last successful upload.
    pub last_deploy_time: Option<i64>,
}

/// The whole plugin state for one lifecycle call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeamsBotConfig {
    pub scaffold: ScaffoldConfig,
    pub provision: ProvisionConfig,
    pub local_debug: LocalDebugConfig,
    pub deploy: DeployConfig,
}

impl TeamsBotConfig {
    pub async fn restore(store: &dyn ConfigRepository, env: &str) -> FxResult<Self> {
        let bot = store.load(env, PLUGIN_NAME).await.map_err(storage_error)?;
        let solution = store.load(env, SOLUTION_PLUGIN).await.map_err(storage_error)?;
        let aad = store.load(env, AAD_PLUGIN).await.map_err(storage_error)?;
        let sql = store.load(env, SQL_PLUGIN).await.map_err(storage_error)?;
        let identity = store.load(env, IDENTITY_PLUGIN).await.map_err(storage_error)?;
        let function = store.load(env, FUNCTION_PLUGIN).await.map_err(storage_error)?;

        let provision = ProvisionConfig {
            subscription_id: solution.get_string(keys::SUBSCRIPTION_ID),
            resource_group: solution.get_string(keys::RESOURCE_GROUP),
            location: solution.get_string(keys::LOCATION),
            resource_name_suffix: solution.get_string(keys::RESOURCE_NAME_SUFFIX),
            sku_name: bot.get_string(keys::SKU_NAME),
            app_service_plan: bot.get_string(keys::APP_SERVICE_PLAN),
            site_name: bot.get_string(keys::SITE_NAME),
            site_endpoint: bot.get_string(keys::SITE_ENDPOINT),
            bot_channel_reg_name: bot.get_string(keys::BOT_CHANNEL_REG_NAME),
            valid_domain: bot.get_string(keys::VALID_DOMAIN),
            provisioned: bot.get_bool(keys::PROVISIONED),
            teams_app_client_id: aad.get_string(keys::TEAMS_CLIENT_ID),
            teams_app_client_secret: aad.get_string(keys::TEAMS_CLIENT_SECRET),
            teams_app_tenant: aad.get_string(keys::TEAMS_TENANT_ID),
            application_id_uris: aad.get_string(keys::APPLICATION_ID_URIS),
            sql_endpoint: sql.get_string(keys::SQL_ENDPOINT),
            sql_database_name: sql.get_string(keys::SQL_DATABASE_NAME),
            sql_user_name: sql.get_string(keys::SQL_USER_NAME),
            sql_password: sql.get_string(keys::SQL_PASSWORD),
            identity_id: identity.get_string(keys::IDENTITY_ID),
            function_endpoint: function.get_string(keys::FUNCTION_ENDPOINT),
        };

        let config = Self {
            scaffold: ScaffoldConfig::restore(&bot),
            provision,
            local_debug: LocalDebugConfig::restore(&bot),
            deploy: DeployConfig {
                last_deploy_time: bot.get(keys::LAST_DEPLOY_TIME).and_then(|v| v.parse().ok()),
            },
        };
        debug!(env = %env, config = %config.describe(), "bot config restored");
        Ok(config)
    }

    /// Writes the bot section; other plugins' values are left untouched.
    pub async fn save(&self, store: &dyn ConfigRepository, env: &str) -> FxResult<()> {
        store
            .save(env, PLUGIN_NAME, &self.to_map())
            .await
            .map_err(storage_error)?;
        debug!(env = %env, "bot config saved");
        Ok(())
    }

    pub fn to_map(&self) -> ConfigMap {
        let mut map = ConfigMap::new();
        self.scaffold.save(&mut map);
        self.provision.save(&mut map);
        self.local_debug.save(&mut map);
        if let Some(time) = self.deploy.last_deploy_time {
            map.set(keys::LAST_DEPLOY_TIME, time.to_string());
        }
        map
    }

    pub fn is_create_new(&self) -> bool {
        self.scaffold.way_to_register_bot != Some(WayToRegisterBot::ReuseExisting)
    }

    /// One-line summary with secrets masked.
    pub fn describe(&self) -> String {
        format!(
            "botId={:?} botPassword={} language={:?} host={} siteName={:?} siteEndpoint={:?} provisioned={} localBotId={:?}",
            self.scaffold.bot_id,
            self.scaffold
                .bot_password
                .as_deref()
                .map(mask_secret)
                .unwrap_or_default(),
            self.scaffold.programming_language,
            self.scaffold.host_type.as_str(),
            self.provision.site_name,
            self.provision.site_endpoint,
            self.provision.provisioned,
            self.local_debug.local_bot_id,
        )
    }
}
