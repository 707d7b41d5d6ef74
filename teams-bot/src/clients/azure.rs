//! Azure Resource Manager and Kudu operations used to host the bot.

use std::collections::BTreeMap;

use async_trait::async_trait;
use base64::Engine;
use fx_core::{ExternalCall, FxError, FxResult, RemoteError, RetryHandler};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use super::http::{require_token, send, send_json, trim_base};
use crate::config::DEFAULT_ARM_BASE_URL;

const PROVIDERS_API_VERSION: &str = "2021-04-01";
const WEB_API_VERSION: &str = "2022-03-01";
const BOT_SERVICE_API_VERSION: &str = "2021-05-01-preview";

const REGISTERED: &str = "Registered";
const BOT_SERVICE_LOCATION: &str = "global";
const BOT_SERVICE_SKU: &str = "F0";
const TEAMS_CHANNEL_NAME: &str = "MsTeamsChannel";

const GET_PROVIDER: ExternalCall = ExternalCall::idempotent("getProvider");
const REGISTER_PROVIDER: ExternalCall = ExternalCall::idempotent("registerProvider");
const CREATE_APP_SERVICE_PLAN: ExternalCall = ExternalCall::idempotent("createOrUpdateAppServicePlan");
const CREATE_WEB_APP: ExternalCall = ExternalCall::idempotent("createOrUpdateWebApp");
const UPDATE_APP_SETTINGS: ExternalCall = ExternalCall::idempotent("updateWebAppSettings");
const CREATE_BOT_CHANNEL: ExternalCall = ExternalCall::once("createBotChannelRegistration");
const LINK_TEAMS_CHANNEL: ExternalCall = ExternalCall::once("createTeamsChannel");
const UPDATE_BOT_CHANNEL: ExternalCall = ExternalCall::idempotent("updateBotChannelRegistration");
const LIST_PUBLISHING_CREDENTIALS: ExternalCall =
    ExternalCall::idempotent("listPublishingCredentials");
const ZIP_DEPLOY: ExternalCall = ExternalCall::once("zipDeploy");
const RESTART_WEB_APP: ExternalCall = ExternalCall::idempotent("restartWebApp");

/// Credential and resource group every ARM call is scoped to.
#[derive(Debug, Clone)]
pub struct AzureScope {
    pub credential: String,
    pub subscription_id: String,
    pub resource_group: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppServicePlanSpec {
    pub name: String,
    pub location: String,
    pub sku_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebAppSpec {
    pub name: String,
    pub location: String,
    pub app_service_plan: String,
    pub app_settings: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebApp {
    pub default_host_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotChannelSpec {
    pub name: String,
    pub display_name: String,
    pub msa_app_id: String,
    pub endpoint: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishingCredentials {
    pub username: String,
    pub password: String,
}

impl PublishingCredentials {
    /// `Authorization` header value for Kudu.
    pub fn basic_auth_header(&self) -> String {
        let raw = format!("{}:{}", self.username, self.password);
        format!(
            "Basic {}",
            base64::engine::general_purpose::STANDARD.encode(raw)
        )
    }
}

pub fn zip_deploy_endpoint(site_name: &str) -> String {
    format!("https://{}.scm.azurewebsites.net/api/zipdeploy", site_name)
}

#[async_trait]
pub trait AzureOperations: Send + Sync {
    /// Registration state of a resource provider namespace, e.g. `Registered`.
    async fn get_provider_state(&self, scope: &AzureScope, namespace: &str) -> FxResult<String>;
    async fn register_provider(&self, scope: &AzureScope, namespace: &str) -> FxResult<()>;

    async fn create_or_update_app_service_plan(
        &self,
        scope: &AzureScope,
        plan: &AppServicePlanSpec,
    ) -> FxResult<()>;

    async fn create_or_update_web_app(
        &self,
        scope: &AzureScope,
        site: &WebAppSpec,
    ) -> FxResult<WebApp>;

    /// Replaces the app settings of the site.
    async fn update_web_app_settings(
        &self,
        scope: &AzureScope,
        site_name: &str,
        settings: &BTreeMap<String, String>,
    ) -> FxResult<()>;

    async fn create_bot_channel_registration(
        &self,
        scope: &AzureScope,
        bot: &BotChannelSpec,
    ) -> FxResult<()>;

    async fn link_teams_channel(&self, scope: &AzureScope, bot_name: &str) -> FxResult<()>;

    async fn update_bot_channel_registration(
        &self,
        scope: &AzureScope,
        bot: &BotChannelSpec,
    ) -> FxResult<()>;

    async fn list_publishing_credentials(
        &self,
        scope: &AzureScope,
        site_name: &str,
    ) -> FxResult<PublishingCredentials>;

    async fn zip_deploy_package(
        &self,
        endpoint: &str,
        package: Vec<u8>,
        credentials: &PublishingCredentials,
    ) -> FxResult<()>;

    /// Functions hosting only picks up a new package after a restart.
    async fn restart_web_app(&self, scope: &AzureScope, site_name: &str) -> FxResult<()>;
}

/// Registers every namespace that is not `Registered` yet.
pub async fn ensure_resource_providers(
    azure: &dyn AzureOperations,
    scope: &AzureScope,
    namespaces: &[&str],
) -> FxResult<()> {
    for namespace in namespaces {
        let state = azure.get_provider_state(scope, namespace).await?;
        if state == REGISTERED {
            continue;
        }
        info!(namespace = %namespace, state = %state, "registering resource provider");
        azure.register_provider(scope, namespace).await?;
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProviderResponse {
    #[serde(default)]
    registration_state: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SiteProperties {
    default_host_name: String,
}

#[derive(Debug, Deserialize)]
struct SiteResponse {
    properties: SiteProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PublishingUserProperties {
    publishing_user_name: String,
    publishing_password: String,
}

#[derive(Debug, Deserialize)]
struct PublishingUserResponse {
    properties: PublishingUserProperties,
}

/// REST implementation over `management.azure.com`.
#[derive(Debug, Clone)]
pub struct ArmClient {
    http: reqwest::Client,
    base: String,
    retry: RetryHandler,
}

impl Default for ArmClient {
    fn default() -> Self {
        Self::new(DEFAULT_ARM_BASE_URL)
    }
}

impl ArmClient {
    pub fn new(base: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base: trim_base(base),
            retry: RetryHandler::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryHandler) -> Self {
        self.retry = retry;
        self
    }

    fn resource_url(&self, scope: &AzureScope, provider_path: &str, api_version: &str) -> String {
        format!(
            "{}/subscriptions/{}/resourceGroups/{}/providers/{}?api-version={}",
            self.base, scope.subscription_id, scope.resource_group, provider_path, api_version
        )
    }

    fn site_url(&self, scope: &AzureScope, site_name: &str, sub_path: &str) -> String {
        self.resource_url(
            scope,
            &format!("Microsoft.Web/sites/{}{}", site_name, sub_path),
            WEB_API_VERSION,
        )
    }

    fn bot_url(&self, scope: &AzureScope, bot_name: &str, sub_path: &str) -> String {
        self.resource_url(
            scope,
            &format!("Microsoft.BotService/botServices/{}{}", bot_name, sub_path),
            BOT_SERVICE_API_VERSION,
        )
    }

    fn provider_url(&self, scope: &AzureScope, namespace: &str, action: &str) -> String {
        format!(
            "{}/subscriptions/{}/providers/{}{}?api-version={}",
            self.base, scope.subscription_id, namespace, action, PROVIDERS_API_VERSION
        )
    }
}

fn provision_error(resource: String) -> impl FnOnce(RemoteError) -> FxError {
    move |source| FxError::Provision { resource, source }
}

#[async_trait]
impl AzureOperations for ArmClient {
    async fn get_provider_state(&self, scope: &AzureScope, namespace: &str) -> FxResult<String> {
        require_token(&scope.credential, "Azure")?;
        let url = self.provider_url(scope, namespace, "");
        let response = self
            .retry
            .execute(GET_PROVIDER, || {
                send_json::<ProviderResponse>(self.http.get(&url).bearer_auth(&scope.credential))
            })
            .await
            .map_err(|source| FxError::RegisterResourceProvider {
                providers: vec![namespace.to_string()],
                source: Some(source),
            })?;
        Ok(response.registration_state)
    }

    async fn register_provider(&self, scope: &AzureScope, namespace: &str) -> FxResult<()> {
        require_token(&scope.credential, "Azure")?;
        let url = self.provider_url(scope, namespace, "/register");
        self.retry
            .execute(REGISTER_PROVIDER, || {
                send(self.http.post(&url).bearer_auth(&scope.credential))
            })
            .await
            .map_err(|source| FxError::RegisterResourceProvider {
                providers: vec![namespace.to_string()],
                source: Some(source),
            })?;
        Ok(())
    }

    #[instrument(skip(self, scope), fields(plan = %plan.name))]
    async fn create_or_update_app_service_plan(
        &self,
        scope: &AzureScope,
        plan: &AppServicePlanSpec,
    ) -> FxResult<()> {
        require_token(&scope.credential, "Azure")?;
        let url = self.resource_url(
            scope,
            &format!("Microsoft.Web/serverfarms/{}", plan.name),
            WEB_API_VERSION,
        );
        let body = json!({
            "location": plan.location,
            "kind": "app",
            "sku": { "name": plan.sku_name },
        });
        self.retry
            .execute(CREATE_APP_SERVICE_PLAN, || {
                send(self.http.put(&url).bearer_auth(&scope.credential).json(&body))
            })
            .await
            .map_err(provision_error(format!("app service plan {}", plan.name)))?;
        info!("app service plan ready");
        Ok(())
    }

    #[instrument(skip(self, scope, site), fields(site = %site.name))]
    async fn create_or_update_web_app(
        &self,
        scope: &AzureScope,
        site: &WebAppSpec,
    ) -> FxResult<WebApp> {
        require_token(&scope.credential, "Azure")?;
        let url = self.site_url(scope, &site.name, "");
        let server_farm_id = format!(
            "/subscriptions/{}/resourceGroups/{}/providers/Microsoft.Web/serverfarms/{}",
            scope.subscription_id, scope.resource_group, site.app_service_plan
        );
        let app_settings: Vec<_> = site
            .app_settings
            .iter()
            .map(|(name, value)| json!({ "name": name, "value": value }))
            .collect();
        let body = json!({
            "location": site.location,
            "kind": "app",
            "properties": {
                "serverFarmId": server_farm_id,
                "siteConfig": { "appSettings": app_settings },
            },
        });
        let response = self
            .retry
            .execute(CREATE_WEB_APP, || {
                send_json::<SiteResponse>(self.http.put(&url).bearer_auth(&scope.credential).json(&body))
            })
            .await
            .map_err(provision_error(format!("web app {}", site.name)))?;
        info!(host = %response.properties.default_host_name, "web app ready");
        Ok(WebApp {
            default_host_name: response.properties.default_host_name,
        })
    }

    #[instrument(skip(self, scope, settings), fields(count = settings.len()))]
    async fn update_web_app_settings(
        &self,
        scope: &AzureScope,
        site_name: &str,
        settings: &BTreeMap<String, String>,
    ) -> FxResult<()> {
        require_token(&scope.credential, "Azure")?;
        let url = self.site_url(scope, site_name, "/config/appsettings");
        let body = json!({ "properties": settings });
        self.retry
            .execute(UPDATE_APP_SETTINGS, || {
                send(self.http.put(&url).bearer_auth(&scope.credential).json(&body))
            })
            .await
            .map_err(|source| FxError::ConfigUpdating {
                config: format!("app settings of {}", site_name),
                source,
            })?;
        info!("app settings updated");
        Ok(())
    }

    #[instrument(skip(self, scope, bot), fields(bot = %bot.name))]
    async fn create_bot_channel_registration(
        &self,
        scope: &AzureScope,
        bot: &BotChannelSpec,
    ) -> FxResult<()> {
        require_token(&scope.credential, "Azure")?;
        let url = self.bot_url(scope, &bot.name, "");
        let body = json!({
            "location": BOT_SERVICE_LOCATION,
            "kind": "bot",
            "sku": { "name": BOT_SERVICE_SKU },
            "properties": {
                "displayName": bot.display_name,
                "endpoint": bot.endpoint,
                "msaAppId": bot.msa_app_id,
            },
        });
        self.retry
            .execute(CREATE_BOT_CHANNEL, || {
                send(self.http.put(&url).bearer_auth(&scope.credential).json(&body))
            })
            .await
            .map_err(provision_error(format!("bot channel registration {}", bot.name)))?;
        info!("bot channel registration created");
        Ok(())
    }

    async fn link_teams_channel(&self, scope: &AzureScope, bot_name: &str) -> FxResult<()> {
        require_token(&scope.credential, "Azure")?;
        let url = self.bot_url(scope, bot_name, &format!("/channels/{}", TEAMS_CHANNEL_NAME));
        let body = json!({
            "location": BOT_SERVICE_LOCATION,
            "properties": {
                "channelName": TEAMS_CHANNEL_NAME,
                "properties": { "isEnabled": true },
            },
        });
        self.retry
            .execute(LINK_TEAMS_CHANNEL, || {
                send(self.http.put(&url).bearer_auth(&scope.credential).json(&body))
            })
            .await
            .map_err(provision_error(format!("Teams channel of {}", bot_name)))?;
        info!(bot = %bot_name, "Teams channel linked");
        Ok(())
    }

    #[instrument(skip(self, scope, bot), fields(bot = %bot.name))]
    async fn update_bot_channel_registration(
        &self,
        scope: &AzureScope,
        bot: &BotChannelSpec,
    ) -> FxResult<()> {
        require_token(&scope.credential, "Azure")?;
        let url = self.bot_url(scope, &bot.name, "");
        let body = json!({
            "properties": {
                "displayName": bot.display_name,
                "endpoint": bot.endpoint,
                "msaAppId": bot.msa_app_id,
            },
        });
        self.retry
            .execute(UPDATE_BOT_CHANNEL, || {
                send(self.http.patch(&url).bearer_auth(&scope.credential).json(&body))
            })
            .await
            .map_err(|source| FxError::MessageEndpointUpdating {
                endpoint: bot.endpoint.clone(),
                source,
            })?;
        info!(endpoint = %bot.endpoint, "bot channel endpoint updated");
        Ok(())
    }

    async fn list_publishing_credentials(
        &self,
        scope: &AzureScope,
        site_name: &str,
    ) -> FxResult<PublishingCredentials> {
        require_token(&scope.credential, "Azure")?;
        let url = self.site_url(scope, site_name, "/config/publishingcredentials/list");
        let response = self
            .retry
            .execute(LIST_PUBLISHING_CREDENTIALS, || {
                send_json::<PublishingUserResponse>(self.http.post(&url).bearer_auth(&scope.credential))
            })
            .await
            .map_err(|source| FxError::ListPublishingCredentials {
                site: site_name.to_string(),
                source,
            })?;
        Ok(PublishingCredentials {
            username: response.properties.publishing_user_name,
            password: response.properties.publishing_password,
        })
    }

    #[instrument(skip(self, package, credentials), fields(size = package.len()))]
    async fn zip_deploy_package(
        &self,
        endpoint: &str,
        package: Vec<u8>,
        credentials: &PublishingCredentials,
    ) -> FxResult<()> {
        let auth = credentials.basic_auth_header();
        self.retry
            .execute(ZIP_DEPLOY, || {
                send(
                    self.http
                        .post(endpoint)
                        .header(reqwest::header::AUTHORIZATION, auth.as_str())
                        .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
                        .body(package.clone()),
                )
            })
            .await
            .map_err(|source| FxError::ZipDeploy {
                endpoint: endpoint.to_string(),
                source,
            })?;
        info!("zip package deployed");
        Ok(())
    }

    async fn restart_web_app(&self, scope: &AzureScope, site_name: &str) -> FxResult<()> {
        require_token(&scope.credential, "Azure")?;
        let url = self.site_url(scope, site_name, "/restart");
        self.retry
            .execute(RESTART_WEB_APP, || {
                send(self.http.post(&url).bearer_auth(&scope.credential))
            })
            .await
            .map_err(|source| FxError::RestartWebApp {
                site: site_name.to_string(),
                source,
            })?;
        info!(site = %site_name, "web app restarted");
        Ok(())
    }
}
