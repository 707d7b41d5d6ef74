//! Bot identity registration: AAD apps (Graph or AppStudio) and Bot Framework registrations.

use async_trait::async_trait;
use fx_core::{ExternalCall, FxError, FxResult, RemoteError, RetryHandler};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, instrument};

use super::http::{require_token, send, send_json, send_optional_json, trim_base};
use crate::config::{DEFAULT_APP_STUDIO_BASE_URL, DEFAULT_GRAPH_BASE_URL};
use crate::constants::TEAMS_CHANNEL;

const CREATE_AAD_APP: ExternalCall = ExternalCall::idempotent("createAadApp");
const ADD_AAD_PASSWORD: ExternalCall = ExternalCall::idempotent("addAadAppPassword");
const GET_BOT_REGISTRATION: ExternalCall = ExternalCall::idempotent("getBotRegistration");
const CREATE_BOT_REGISTRATION: ExternalCall = ExternalCall::idempotent("createBotRegistration");
const UPDATE_BOT_REGISTRATION: ExternalCall = ExternalCall::idempotent("updateBotRegistration");

const SIGN_IN_AUDIENCE: &str = "AzureADMultipleOrgs";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotAuthCredential {
    pub client_id: String,
    pub client_secret: String,
    pub object_id: String,
}

/// An AAD app created earlier whose secret was never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingAadApp {
    pub object_id: String,
    pub client_id: String,
}

/// Bot Framework registration as exposed by the Developer Portal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotRegistration {
    pub bot_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon_url: String,
    #[serde(default)]
    pub messaging_endpoint: String,
    #[serde(default)]
    pub callback_url: String,
    #[serde(default)]
    pub configured_channels: Vec<String>,
}

#[async_trait]
pub trait BotRegistrar: Send + Sync {
    /// Creates an AAD app unless `existing` is given, then adds a client secret.
    async fn register_aad_app_by_graph(
        &self,
        token: &str,
        display_name: &str,
        existing: Option<&ExistingAadApp>,
    ) -> FxResult<BotAuthCredential>;

    async fn register_aad_app_by_app_studio(
        &self,
        token: &str,
        display_name: &str,
    ) -> FxResult<BotAuthCredential>;

    async fn get_bot_registration(
        &self,
        token: &str,
        bot_id: &str,
    ) -> FxResult<Option<BotRegistration>>;

    /// No-op when a registration with the same bot id exists.
    async fn create_bot_registration(
        &self,
        token: &str,
        registration: &BotRegistration,
    ) -> FxResult<()>;

    async fn update_message_endpoint(
        &self,
        token: &str,
        bot_id: &str,
        endpoint: &str,
    ) -> FxResult<()>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AadApp {
    id: String,
    app_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphPassword {
    secret_text: String,
}

#[derive(Debug, Deserialize)]
struct AppStudioPassword {
    value: String,
}

fn provision_error(resource: &str) -> impl FnOnce(RemoteError) -> FxError + '_ {
    move |source| FxError::Provision {
        resource: resource.to_string(),
        source,
    }
}

/// REST implementation over Microsoft Graph and the Teams Developer Portal.
#[derive(Debug, Clone)]
pub struct RegistrationClient {
    http: reqwest::Client,
    graph_base: String,
    app_studio_base: String,
    retry: RetryHandler,
}

impl Default for RegistrationClient {
    fn default() -> Self {
        Self::new(DEFAULT_GRAPH_BASE_URL, DEFAULT_APP_STUDIO_BASE_URL)
    }
}

impl RegistrationClient {
    pub fn new(graph_base: &str, app_studio_base: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            graph_base: trim_base(graph_base),
            app_studio_base: trim_base(app_studio_base),
            retry: RetryHandler::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryHandler) -> Self {
        self.retry = retry;
        self
    }

    fn bot_url(&self, bot_id: &str) -> String {
        format!("{}/api/botframework/{}", self.app_studio_base, bot_id)
    }
}

#[async_trait]
impl BotRegistrar for RegistrationClient {
    #[instrument(skip(self, token))]
    async fn register_aad_app_by_graph(
        &self,
        token: &str,
        display_name: &str,
        existing: Option<&ExistingAadApp>,
    ) -> FxResult<BotAuthCredential> {
        require_token(token, "Graph")?;

        let app = match existing {
            Some(app) => AadApp {
                id: app.object_id.clone(),
                app_id: app.client_id.clone(),
            },
            None => {
                let url = format!("{}/applications", self.graph_base);
                let body = json!({
                    "displayName": display_name,
                    "signInAudience": SIGN_IN_AUDIENCE,
                });
                self.retry
                    .execute(CREATE_AAD_APP, || {
                        send_json::<AadApp>(self.http.post(&url).bearer_auth(token).json(&body))
                    })
                    .await
                    .map_err(provision_error("AAD app"))?
            }
        };

        let url = format!("{}/applications/{}/addPassword", self.graph_base, app.id);
        let body = json!({ "passwordCredential": { "displayName": "default" } });
        let password = self
            .retry
            .execute(ADD_AAD_PASSWORD, || {
                send_json::<GraphPassword>(self.http.post(&url).bearer_auth(token).json(&body))
            })
            .await
            .map_err(provision_error("AAD app secret"))?;

        info!(client_id = %app.app_id, "AAD app registered");
        Ok(BotAuthCredential {
            client_id: app.app_id,
            client_secret: password.secret_text,
            object_id: app.id,
        })
    }

    #[instrument(skip(self, token))]
    async fn register_aad_app_by_app_studio(
        &self,
        token: &str,
        display_name: &str,
    ) -> FxResult<BotAuthCredential> {
        require_token(token, "AppStudio")?;

        let url = format!("{}/api/aadapp/v2", self.app_studio_base);
        let body = json!({ "displayName": display_name });
        let app = self
            .retry
            .execute(CREATE_AAD_APP, || {
                send_json::<AadApp>(self.http.post(&url).bearer_auth(token).json(&body))
            })
            .await
            .map_err(provision_error("AAD app"))?;

        let url = format!("{}/api/aadapp/v2/{}/passwords", self.app_studio_base, app.app_id);
        let password = self
            .retry
            .execute(ADD_AAD_PASSWORD, || {
                send_json::<AppStudioPassword>(self.http.post(&url).bearer_auth(token).json(&json!({})))
            })
            .await
            .map_err(provision_error("AAD app secret"))?;

        info!(client_id = %app.app_id, "AAD app registered through AppStudio");
        Ok(BotAuthCredential {
            client_id: app.app_id,
            client_secret: password.value,
            object_id: app.id,
        })
    }

    async fn get_bot_registration(
        &self,
        token: &str,
        bot_id: &str,
    ) -> FxResult<Option<BotRegistration>> {
        require_token(token, "AppStudio")?;
        let url = self.bot_url(bot_id);
        self.retry
            .execute(GET_BOT_REGISTRATION, || {
                send_optional_json::<BotRegistration>(self.http.get(&url).bearer_auth(token))
            })
            .await
            .map_err(provision_error("bot registration"))
    }

    #[instrument(skip(self, token, registration), fields(bot_id = %registration.bot_id))]
    async fn create_bot_registration(
        &self,
        token: &str,
        registration: &BotRegistration,
    ) -> FxResult<()> {
        require_token(token, "AppStudio")?;
        if self
            .get_bot_registration(token, &registration.bot_id)
            .await?
            .is_some()
        {
            info!("bot registration already exists, skipping creation");
            return Ok(());
        }

        let url = format!("{}/api/botframework", self.app_studio_base);
        self.retry
            .execute(CREATE_BOT_REGISTRATION, || {
                send(self.http.post(&url).bearer_auth(token).json(registration))
            })
            .await
            .map_err(provision_error("bot registration"))?;

        info!("bot registration created");
        Ok(())
    }

    #[instrument(skip(self, token))]
    async fn update_message_endpoint(
        &self,
        token: &str,
        bot_id: &str,
        endpoint: &str,
    ) -> FxResult<()> {
        require_token(token, "AppStudio")?;
        let mut registration = self
            .get_bot_registration(token, bot_id)
            .await?
            .ok_or_else(|| FxError::BotRegistrationNotFound(bot_id.to_string()))?;

        registration.messaging_endpoint = endpoint.to_string();
        if registration.configured_channels.is_empty() {
            registration.configured_channels = vec![TEAMS_CHANNEL.to_string()];
        }

        let url = self.bot_url(bot_id);
        self.retry
            .execute(UPDATE_BOT_REGISTRATION, || {
                send(self.http.post(&url).bearer_auth(token).json(&registration))
            })
            .await
            .map_err(|source| FxError::MessageEndpointUpdating {
                endpoint: endpoint.to_string(),
                source,
            })?;

        info!("message endpoint updated");
        Ok(())
    }
}
