//! Bot plugin lifecycle.
//!
//! Every entry point restores [`TeamsBotConfig`] from the store, validates what it needs,
//! performs its side effects and saves the bot section again. Steps that create remote
//! resources save checkpoints so a failed run can be repeated without duplicating them.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use fx_core::{
    FxError, FxResult, HostType, MaxLengths, PluginActRole, ProgrammingLanguage,
    ResourceNameFactory, WayToRegisterBot,
};
use fx_deploy::{
    zip_directory, DeployMgr, FuncHostedDeployMgr, DEFAULT_IGNORE_RULES, FUNC_IGNORE_FILE,
};
use tracing::{debug, info, instrument};

use crate::clients::{
    ensure_resource_providers, extract_template, prepare_template, replace_placeholders_on_disk,
    zip_deploy_endpoint, AppServicePlanSpec, ArmClient, AzureOperations, AzureScope,
    BotChannelSpec, BotPlaceholders, BotRegistrar, BotRegistration, CommandBuilder,
    ExistingAadApp, HttpTemplateProvider, LocalBuilder, RegistrationClient, TemplateProvider,
    WebAppSpec,
};
use crate::config::{FxConfig, TeamsBotConfig};
use crate::constants::{
    answers, app_settings, keys, AUTHORITY_HOST, AUTH_START_PATH, DEFAULT_SKU_NAME,
    LOCAL_DEBUG_BOT_SUFFIX, MESSAGE_ENDPOINT_PATH, REQUIRED_RESOURCE_PROVIDERS,
    WEB_APP_DOMAIN_SUFFIX,
};
use crate::context::PluginContext;

/// External collaborators of the lifecycle.
#[derive(Clone)]
pub struct BotServices {
    pub registrar: Arc<dyn BotRegistrar>,
    pub azure: Arc<dyn AzureOperations>,
    pub templates: Arc<dyn TemplateProvider>,
    pub builder: Arc<dyn LocalBuilder>,
}

impl BotServices {
    /// REST clients pointed at the configured endpoints.
    pub fn from_config(config: &FxConfig) -> Self {
        let retry = config.retry_handler();
        Self {
            registrar: Arc::new(
                RegistrationClient::new(&config.graph_base_url, &config.app_studio_base_url)
                    .with_retry(retry.clone()),
            ),
            azure: Arc::new(ArmClient::new(&config.arm_base_url).with_retry(retry)),
            templates: Arc::new(HttpTemplateProvider::new(
                &config.template_base_url,
                &config.template_fallback_dir,
            )),
            builder: Arc::new(CommandBuilder),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployOutcome {
    /// Nothing changed since the last recorded deploy.
    Skipped,
    Deployed { time: i64 },
}

/// Change tracking for the host the bot runs on.
enum DeployTracker {
    AppService(DeployMgr),
    Functions {
        mgr: FuncHostedDeployMgr,
        ignore_rules: Vec<String>,
    },
}

fn required<'a>(value: &'a Option<String>, name: &str) -> FxResult<&'a str> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| FxError::SomethingMissing(name.to_string()))
}

fn required_language(config: &TeamsBotConfig) -> FxResult<ProgrammingLanguage> {
    config
        .scaffold
        .programming_language
        .ok_or_else(|| FxError::SomethingMissing(keys::PROGRAMMING_LANGUAGE.to_string()))
}

fn answer_as<T: std::str::FromStr>(ctx: &PluginContext, question: &str) -> FxResult<T> {
    ctx.answer(question)
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| FxError::UserInput(question.to_string()))
}

/// `https://<name>.azurewebsites.net`
pub fn is_valid_web_app_endpoint(endpoint: &str) -> bool {
    endpoint
        .strip_prefix("https://")
        .and_then(|host| host.strip_suffix(WEB_APP_DOMAIN_SUFFIX))
        .map(|name| !name.is_empty() && !name.contains('/'))
        .unwrap_or(false)
}

/// An app whose secret was lost gets a new one instead of a second registration.
fn existing_aad_app(
    object_id: &Option<String>,
    client_id: &Option<String>,
) -> Option<ExistingAadApp> {
    match (object_id, client_id) {
        (Some(object_id), Some(client_id)) => Some(ExistingAadApp {
            object_id: object_id.clone(),
            client_id: client_id.clone(),
        }),
        _ => None,
    }
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

pub struct TeamsBotImpl {
    services: BotServices,
}

impl TeamsBotImpl {
    pub fn new(services: BotServices) -> Self {
        Self { services }
    }

    /// Bot source folder: `<root>/bot`, or the root itself for C#.
    pub fn working_dir(ctx: &PluginContext, language: Option<ProgrammingLanguage>) -> PathBuf {
        let folder = language.unwrap_or(ProgrammingLanguage::JavaScript).strategy().bot_folder;
        if folder.is_empty() {
            ctx.project_root.clone()
        } else {
            ctx.project_root.join(folder)
        }
    }

    async fn restore(&self, ctx: &PluginContext) -> FxResult<TeamsBotConfig> {
        TeamsBotConfig::restore(ctx.config_store.as_ref(), &ctx.env_name).await
    }

    async fn save(&self, ctx: &PluginContext, config: &TeamsBotConfig) -> FxResult<()> {
        config.save(ctx.config_store.as_ref(), &ctx.env_name).await
    }

    fn resource_name(
        ctx: &PluginContext,
        config: &TeamsBotConfig,
        limit: usize,
    ) -> FxResult<String> {
        ResourceNameFactory::create_common_name(
            Some(&ctx.app_name),
            config.provision.resource_name_suffix.as_deref(),
            Some(limit),
        )
    }

    async fn azure_scope(ctx: &PluginContext, config: &TeamsBotConfig) -> FxResult<AzureScope> {
        let credential = ctx
            .tokens
            .azure_credential()
            .await
            .filter(|c| !c.is_empty())
            .ok_or_else(|| FxError::Precondition("Failed to get Azure credentials".to_string()))?;
        Ok(AzureScope {
            credential,
            subscription_id: required(&config.provision.subscription_id, keys::SUBSCRIPTION_ID)?
                .to_string(),
            resource_group: required(&config.provision.resource_group, keys::RESOURCE_GROUP)?
                .to_string(),
        })
    }

    #[instrument(skip_all, fields(env = %ctx.env_name))]
    pub async fn pre_scaffold(&self, ctx: &PluginContext) -> FxResult<()> {
        info!("step: pre-scaffold");
        let mut config = self.restore(ctx).await?;

        let language: ProgrammingLanguage = answer_as(ctx, answers::PROGRAMMING_LANGUAGE)?;
        let way: WayToRegisterBot = answer_as(ctx, answers::WAY_TO_REGISTER_BOT)?;
        config.scaffold.programming_language = Some(language);
        config.scaffold.way_to_register_bot = Some(way);

        if ctx.answer(answers::HOST_TYPE).is_some() {
            config.scaffold.host_type = answer_as::<HostType>(ctx, answers::HOST_TYPE)?;
        }
        if let Some(capabilities) = ctx.answer(answers::CAPABILITIES) {
            config.scaffold.act_roles = capabilities
                .split(',')
                .map(|c| c.trim().parse::<PluginActRole>())
                .collect::<FxResult<Vec<_>>>()
                .map_err(|_| FxError::UserInput(answers::CAPABILITIES.to_string()))?;
        }

        if way == WayToRegisterBot::ReuseExisting {
            let bot_id = ctx
                .answer(answers::BOT_ID)
                .ok_or_else(|| FxError::UserInput(answers::BOT_ID.to_string()))?;
            let bot_password = ctx
                .answer(answers::BOT_PASSWORD)
                .ok_or_else(|| FxError::UserInput(answers::BOT_PASSWORD.to_string()))?;
            config.scaffold.bot_id = Some(bot_id.to_string());
            config.scaffold.bot_password = Some(bot_password.to_string());
        }

        self.save(ctx, &config).await
    }

    #[instrument(skip_all, fields(env = %ctx.env_name))]
    pub async fn scaffold(&self, ctx: &PluginContext) -> FxResult<()> {
        info!("step: scaffold");
        let mut config = self.restore(ctx).await?;
        if config.scaffold.scaffolded {
            info!("project already scaffolded, skipping");
            return Ok(());
        }

        let language = required_language(&config)?;
        let group = PluginActRole::template_group(&config.scaffold.act_roles)
            .ok_or_else(|| FxError::SomethingMissing("act roles".to_string()))?;

        let placeholders = if config.is_create_new() {
            None
        } else {
            Some(BotPlaceholders {
                bot_id: required(&config.scaffold.bot_id, keys::BOT_ID)?.to_string(),
                bot_password: required(&config.scaffold.bot_password, keys::BOT_PASSWORD)?
                    .to_string(),
            })
        };

        let archive = self.services.templates.fetch(group, language).await?;
        let archive = prepare_template(
            archive,
            language.strategy().config_files,
            placeholders.as_ref(),
        )?;
        let working_dir = Self::working_dir(ctx, Some(language));
        extract_template(archive, &working_dir).await?;

        config.scaffold.scaffolded = true;
        self.save(ctx, &config).await
    }

    #[instrument(skip_all, fields(env = %ctx.env_name))]
    pub async fn pre_provision(&self, ctx: &PluginContext) -> FxResult<()> {
        info!("step: pre-provision");
        let mut config = self.restore(ctx).await?;

        required_language(&config)?;
        required(&config.provision.subscription_id, keys::SUBSCRIPTION_ID)?;
        required(&config.provision.resource_group, keys::RESOURCE_GROUP)?;
        required(&config.provision.location, keys::LOCATION)?;

        if config.provision.sku_name.is_none() {
            config.provision.sku_name = Some(DEFAULT_SKU_NAME.to_string());
        }
        if config.provision.site_name.is_none() {
            let site_name = Self::resource_name(ctx, &config, MaxLengths::WEB_APP_SITE_NAME)?;
            debug!(site_name = %site_name, "site name generated");
            config.provision.site_name = Some(site_name);
        }

        self.save(ctx, &config).await
    }

    #[instrument(skip_all, fields(env = %ctx.env_name))]
    pub async fn provision(&self, ctx: &PluginContext) -> FxResult<()> {
        info!("step: provision");
        let mut config = self.restore(ctx).await?;
        let scope = Self::azure_scope(ctx, &config).await?;
        let language = required_language(&config)?;
        let location = required(&config.provision.location, keys::LOCATION)?.to_string();
        let site_name = required(&config.provision.site_name, keys::SITE_NAME)?.to_string();

        ensure_resource_providers(
            self.services.azure.as_ref(),
            &scope,
            REQUIRED_RESOURCE_PROVIDERS,
        )
        .await?;

        if config.is_create_new() {
            self.create_new_bot_registration(ctx, &mut config, &scope).await?;

            if config.scaffold.scaffolded {
                let placeholders = BotPlaceholders {
                    bot_id: required(&config.scaffold.bot_id, keys::BOT_ID)?.to_string(),
                    bot_password: required(&config.scaffold.bot_password, keys::BOT_PASSWORD)?
                        .to_string(),
                };
                replace_placeholders_on_disk(
                    &Self::working_dir(ctx, Some(language)),
                    language.strategy().config_files,
                    &placeholders,
                )
                .await?;
            }
        }

        let plan_name = match &config.provision.app_service_plan {
            Some(name) => name.clone(),
            None => Self::resource_name(ctx, &config, MaxLengths::APP_SERVICE_PLAN_NAME)?,
        };
        self.services
            .azure
            .create_or_update_app_service_plan(
                &scope,
                &AppServicePlanSpec {
                    name: plan_name.clone(),
                    location: location.clone(),
                    sku_name: config
                        .provision
                        .sku_name
                        .clone()
                        .unwrap_or_else(|| DEFAULT_SKU_NAME.to_string()),
                },
            )
            .await?;
        config.provision.app_service_plan = Some(plan_name.clone());

        let web_app = self
            .services
            .azure
            .create_or_update_web_app(
                &scope,
                &WebAppSpec {
                    name: site_name.clone(),
                    location,
                    app_service_plan: plan_name,
                    app_settings: language
                        .strategy()
                        .site_app_settings
                        .iter()
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                        .collect(),
                },
            )
            .await?;

        if config.provision.site_endpoint.is_none() {
            config.provision.site_endpoint = Some(format!("https://{}", web_app.default_host_name));
        }
        config.provision.valid_domain = Some(web_app.default_host_name);
        config.provision.provisioned = true;

        info!(site = %site_name, "bot provisioned");
        self.save(ctx, &config).await
    }

    /// AAD app plus Azure bot channel registration, each skipped when already recorded.
    async fn create_new_bot_registration(
        &self,
        ctx: &PluginContext,
        config: &mut TeamsBotConfig,
        scope: &AzureScope,
    ) -> FxResult<()> {
        if config.scaffold.bot_aad_created() {
            debug!("reusing bot AAD app");
        } else {
            let token = ctx.tokens.graph_token().await.unwrap_or_default();
            let display_name = Self::resource_name(ctx, config, MaxLengths::AAD_DISPLAY_NAME)?;
            let existing = existing_aad_app(&config.scaffold.object_id, &config.scaffold.bot_id);
            let credential = self
                .services
                .registrar
                .register_aad_app_by_graph(&token, &display_name, existing.as_ref())
                .await?;
            config.scaffold.bot_id = Some(credential.client_id);
            config.scaffold.bot_password = Some(credential.client_secret);
            config.scaffold.object_id = Some(credential.object_id);
            self.save(ctx, config).await?;
        }

        let bot_id = required(&config.scaffold.bot_id, keys::BOT_ID)?.to_string();
        let reg_name = match &config.provision.bot_channel_reg_name {
            Some(name) => {
                debug!(name = %name, "reusing bot channel registration");
                name.clone()
            }
            None => {
                let name = Self::resource_name(ctx, config, MaxLengths::BOT_CHANNEL_REG_NAME)?;
                self.services
                    .azure
                    .create_bot_channel_registration(
                        scope,
                        &BotChannelSpec {
                            name: name.clone(),
                            display_name: name.clone(),
                            msa_app_id: bot_id,
                            endpoint: String::new(),
                        },
                    )
                    .await?;
                config.provision.bot_channel_reg_name = Some(name.clone());
                self.save(ctx, config).await?;
                name
            }
        };

        self.services.azure.link_teams_channel(scope, &reg_name).await
    }

    #[instrument(skip_all, fields(env = %ctx.env_name))]
    pub async fn post_provision(&self, ctx: &PluginContext) -> FxResult<()> {
        info!("step: post-provision");
        let config = self.restore(ctx).await?;
        let provision = &config.provision;

        let bot_id = required(&config.scaffold.bot_id, keys::BOT_ID)?;
        let bot_password = required(&config.scaffold.bot_password, keys::BOT_PASSWORD)?;
        let client_id = required(&provision.teams_app_client_id, keys::TEAMS_CLIENT_ID)?;
        let client_secret = required(&provision.teams_app_client_secret, keys::TEAMS_CLIENT_SECRET)?;
        let tenant = required(&provision.teams_app_tenant, keys::TEAMS_TENANT_ID)?;
        let id_uris = required(&provision.application_id_uris, keys::APPLICATION_ID_URIS)?;
        let site_endpoint = required(&provision.site_endpoint, keys::SITE_ENDPOINT)?;
        let site_name = required(&provision.site_name, keys::SITE_NAME)?;
        let scope = Self::azure_scope(ctx, &config).await?;

        let mut settings: BTreeMap<String, String> = config
            .scaffold
            .programming_language
            .map(|l| l.strategy().site_app_settings)
            .unwrap_or_default()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let mut put = |key: &str, value: &str| {
            settings.insert(key.to_string(), value.to_string());
        };
        put(app_settings::BOT_ID, bot_id);
        put(app_settings::BOT_PASSWORD, bot_password);
        put(app_settings::M365_CLIENT_ID, client_id);
        put(app_settings::M365_CLIENT_SECRET, client_secret);
        put(app_settings::M365_TENANT_ID, tenant);
        put(app_settings::M365_AUTHORITY_HOST, AUTHORITY_HOST);
        put(
            app_settings::INITIATE_LOGIN_ENDPOINT,
            &format!("{}{}", site_endpoint, AUTH_START_PATH),
        );
        put(app_settings::M365_APPLICATION_ID_URI, id_uris);
        for (key, value) in [
            (app_settings::SQL_ENDPOINT, &provision.sql_endpoint),
            (app_settings::SQL_DATABASE_NAME, &provision.sql_database_name),
            (app_settings::SQL_USER_NAME, &provision.sql_user_name),
            (app_settings::SQL_PASSWORD, &provision.sql_password),
            (app_settings::IDENTITY_ID, &provision.identity_id),
            (app_settings::API_ENDPOINT, &provision.function_endpoint),
        ] {
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                put(key, value);
            }
        }

        self.services
            .azure
            .update_web_app_settings(&scope, site_name, &settings)
            .await?;

        let endpoint = format!("{}{}", site_endpoint, MESSAGE_ENDPOINT_PATH);
        if config.is_create_new() {
            let reg_name = required(&provision.bot_channel_reg_name, keys::BOT_CHANNEL_REG_NAME)?;
            self.services
                .azure
                .update_bot_channel_registration(
                    &scope,
                    &BotChannelSpec {
                        name: reg_name.to_string(),
                        display_name: reg_name.to_string(),
                        msa_app_id: bot_id.to_string(),
                        endpoint,
                    },
                )
                .await?;
        } else {
            ctx.ui.show_message(&format!(
                "Please update the bot's message endpoint manually to {} before you run this bot.",
                endpoint
            ));
        }

        self.save(ctx, &config).await
    }

    #[instrument(skip_all, fields(env = %ctx.env_name))]
    pub async fn pre_deploy(&self, ctx: &PluginContext) -> FxResult<()> {
        info!("step: pre-deploy");
        let config = self.restore(ctx).await?;

        let working_dir = Self::working_dir(ctx, config.scaffold.programming_language);
        if !tokio::fs::try_exists(&working_dir).await.unwrap_or(false) {
            return Err(FxError::PackDirExistence(working_dir.display().to_string()));
        }

        let site_endpoint = required(&config.provision.site_endpoint, keys::SITE_ENDPOINT)?;
        required_language(&config)?;
        required(&config.provision.subscription_id, keys::SUBSCRIPTION_ID)?;
        required(&config.provision.resource_group, keys::RESOURCE_GROUP)?;

        if !is_valid_web_app_endpoint(site_endpoint) {
            return Err(FxError::Validation {
                field: keys::SITE_ENDPOINT.to_string(),
                value: site_endpoint.to_string(),
            });
        }
        Ok(())
    }

    #[instrument(skip_all, fields(env = %ctx.env_name))]
    pub async fn deploy(&self, ctx: &PluginContext) -> FxResult<DeployOutcome> {
        info!("step: deploy");
        let mut config = self.restore(ctx).await?;
        if !config.provision.provisioned {
            return Err(FxError::DeployWithoutProvision);
        }
        let language = required_language(&config)?;
        let site_name = required(&config.provision.site_name, keys::SITE_NAME)?.to_string();
        let working_dir = Self::working_dir(ctx, Some(language));
        if !tokio::fs::try_exists(&working_dir).await.unwrap_or(false) {
            return Err(FxError::PackDirExistence(working_dir.display().to_string()));
        }
        let scope = Self::azure_scope(ctx, &config).await?;

        let tracker = self.change_tracker(ctx, &config, &working_dir).await?;
        let changed = match &tracker {
            DeployTracker::AppService(mgr) => mgr.needs_to_redeploy().await?,
            DeployTracker::Functions { mgr, ignore_rules } => {
                mgr.needs_to_redeploy(ignore_rules).await
            }
        };
        if !changed {
            info!("no change since last deploy, skipping");
            return Ok(DeployOutcome::Skipped);
        }

        let deploy_time = now_ms();
        let package_dir = self.services.builder.build(language, &working_dir).await?;
        let package = self.package(&tracker, &working_dir, &package_dir).await?;

        let credentials = self
            .services
            .azure
            .list_publishing_credentials(&scope, &site_name)
            .await?;
        self.services
            .azure
            .zip_deploy_package(&zip_deploy_endpoint(&site_name), package.clone(), &credentials)
            .await?;
        if matches!(tracker, DeployTracker::Functions { .. }) {
            self.services.azure.restart_web_app(&scope, &site_name).await?;
        }

        match &tracker {
            DeployTracker::AppService(mgr) => mgr.update_last_deploy_time(deploy_time).await,
            DeployTracker::Functions { mgr, .. } => {
                mgr.save_deployment_info(&package, deploy_time).await
            }
        }
        config.deploy.last_deploy_time = Some(deploy_time);
        self.save(ctx, &config).await?;

        info!(site = %site_name, time = deploy_time, "bot deployed");
        Ok(DeployOutcome::Deployed { time: deploy_time })
    }

    async fn change_tracker(
        &self,
        ctx: &PluginContext,
        config: &TeamsBotConfig,
        working_dir: &Path,
    ) -> FxResult<DeployTracker> {
        match config.scaffold.host_type {
            HostType::AppService => {
                let mgr = DeployMgr::new(Some(working_dir.to_path_buf()));
                mgr.init().await?;
                Ok(DeployTracker::AppService(mgr))
            }
            HostType::Functions => {
                let mgr = FuncHostedDeployMgr::new(working_dir, ctx.env_name.as_str());
                mgr.init().await?;
                mgr.ensure_ignore_file(FUNC_IGNORE_FILE).await?;
                let ignore_rules = mgr.get_ignore_rules(FUNC_IGNORE_FILE).await;
                Ok(DeployTracker::Functions { mgr, ignore_rules })
            }
        }
    }

    async fn package(
        &self,
        tracker: &DeployTracker,
        working_dir: &Path,
        package_dir: &Path,
    ) -> FxResult<Vec<u8>> {
        if package_dir != working_dir {
            return zip_directory(package_dir, &[]).await;
        }
        match tracker {
            DeployTracker::AppService(mgr) => mgr.zip_folder(DEFAULT_IGNORE_RULES).await,
            DeployTracker::Functions { mgr, ignore_rules } => mgr.zip_a_folder(ignore_rules).await,
        }
    }

    #[instrument(skip_all, fields(env = %ctx.env_name))]
    pub async fn local_debug(&self, ctx: &PluginContext) -> FxResult<()> {
        info!("step: local debug");
        let mut config = self.restore(ctx).await?;
        required_language(&config)?;

        if config.is_create_new() {
            let graph_token = ctx
                .tokens
                .graph_token()
                .await
                .filter(|t| !t.trim().is_empty())
                .ok_or_else(|| FxError::MissingConfiguration("Graph token".to_string()))?;
            if config.local_debug.local_bot_created() {
                debug!("reusing local bot AAD app");
            } else {
                let display_name = Self::resource_name(ctx, &config, MaxLengths::AAD_DISPLAY_NAME)?;
                let existing = existing_aad_app(
                    &config.local_debug.local_object_id,
                    &config.local_debug.local_bot_id,
                );
                let credential = self
                    .services
                    .registrar
                    .register_aad_app_by_graph(&graph_token, &display_name, existing.as_ref())
                    .await?;
                config.local_debug.local_bot_id = Some(credential.client_id);
                config.local_debug.local_bot_password = Some(credential.client_secret);
                config.local_debug.local_object_id = Some(credential.object_id);
                self.save(ctx, &config).await?;
            }

            let registration = BotRegistration {
                bot_id: required(&config.local_debug.local_bot_id, keys::LOCAL_BOT_ID)?
                    .to_string(),
                name: format!("{}{}", ctx.app_name, LOCAL_DEBUG_BOT_SUFFIX),
                ..BotRegistration::default()
            };
            let token = ctx.tokens.app_studio_token().await.unwrap_or_default();
            self.services
                .registrar
                .create_bot_registration(&token, &registration)
                .await?;
        } else {
            config.local_debug.local_bot_id =
                Some(required(&config.scaffold.bot_id, keys::BOT_ID)?.to_string());
            config.local_debug.local_bot_password =
                Some(required(&config.scaffold.bot_password, keys::BOT_PASSWORD)?.to_string());
        }

        self.save(ctx, &config).await
    }

    #[instrument(skip_all, fields(env = %ctx.env_name))]
    pub async fn post_local_debug(&self, ctx: &PluginContext) -> FxResult<()> {
        info!("step: post local debug");
        let mut config = self.restore(ctx).await?;
        if let Some(endpoint) = ctx.answer(answers::LOCAL_ENDPOINT) {
            config.local_debug.local_endpoint = Some(endpoint.trim_end_matches('/').to_string());
        }
        let local_endpoint = required(&config.local_debug.local_endpoint, keys::LOCAL_ENDPOINT)?;
        let endpoint = format!("{}{}", local_endpoint, MESSAGE_ENDPOINT_PATH);

        if config.is_create_new() {
            let bot_id = required(&config.local_debug.local_bot_id, keys::LOCAL_BOT_ID)?;
            let token = ctx.tokens.app_studio_token().await.unwrap_or_default();
            self.services
                .registrar
                .update_message_endpoint(&token, bot_id, &endpoint)
                .await?;
        } else {
            ctx.ui.show_message(&format!(
                "Please update the bot's message endpoint manually to {} before you run this bot.",
                endpoint
            ));
        }

        self.save(ctx, &config).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_web_app_endpoint_validation() {
        assert!(is_valid_web_app_endpoint("https://mybotbt01.azurewebsites.net"));
        assert!(!is_valid_web_app_endpoint("http://mybotbt01.azurewebsites.net"));
        assert!(!is_valid_web_app_endpoint("https://.azurewebsites.net"));
        assert!(!is_valid_web_app_endpoint("https://mybot.example.com"));
        assert!(!is_valid_web_app_endpoint("https://a/b.azurewebsites.net"));
    }
}
