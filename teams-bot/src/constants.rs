//! Names shared with other plugins and with the hosted bot runtime.

/// Config section owned by this plugin.
pub const PLUGIN_NAME: &str = "fx-resource-bot";
pub const SOLUTION_PLUGIN: &str = "solution";
pub const AAD_PLUGIN: &str = "fx-resource-aad-app-for-teams";
pub const SQL_PLUGIN: &str = "fx-resource-azure-sql";
pub const IDENTITY_PLUGIN: &str = "fx-resource-identity";
pub const FUNCTION_PLUGIN: &str = "fx-resource-function";

pub const DEFAULT_SKU_NAME: &str = "F1";
pub const REQUIRED_RESOURCE_PROVIDERS: &[&str] = &["Microsoft.Web", "Microsoft.BotService"];
pub const AUTHORITY_HOST: &str = "https://login.microsoftonline.com";
pub const MESSAGE_ENDPOINT_PATH: &str = "/api/messages";
pub const AUTH_START_PATH: &str = "/auth-start.html";
pub const WEB_APP_DOMAIN_SUFFIX: &str = ".azurewebsites.net";
pub const LOCAL_DEBUG_BOT_SUFFIX: &str = "-local-debug";
pub const TEAMS_CHANNEL: &str = "msteams";

pub const BOT_ID_PLACEHOLDER: &str = "{BOT_ID}";
pub const BOT_PASSWORD_PLACEHOLDER: &str = "{BOT_PASSWORD}";

/// Question names read from the answers of the caller.
pub mod answers {
    pub const PROGRAMMING_LANGUAGE: &str = "programming-language";
    pub const WAY_TO_REGISTER_BOT: &str = "way-to-register-bot";
    pub const BOT_ID: &str = "bot-id";
    pub const BOT_PASSWORD: &str = "bot-password";
    pub const CAPABILITIES: &str = "capabilities";
    pub const HOST_TYPE: &str = "host-type";
    pub const LOCAL_ENDPOINT: &str = "local-endpoint";
}

/// Keys of persisted configuration.
pub mod keys {
    pub const BOT_ID: &str = "botId";
    pub const BOT_PASSWORD: &str = "botPassword";
    pub const OBJECT_ID: &str = "objectId";
    pub const PROGRAMMING_LANGUAGE: &str = "programmingLanguage";
    pub const WAY_TO_REGISTER_BOT: &str = "wayToRegisterBot";
    pub const HOST_TYPE: &str = "hostType";
    pub const ACT_ROLES: &str = "actRoles";
    pub const SCAFFOLDED: &str = "scaffolded";

    pub const SKU_NAME: &str = "skuName";
    pub const APP_SERVICE_PLAN: &str = "appServicePlan";
    pub const SITE_NAME: &str = "siteName";
    pub const SITE_ENDPOINT: &str = "siteEndpoint";
    pub const BOT_CHANNEL_REG_NAME: &str = "botChannelRegName";
    pub const VALID_DOMAIN: &str = "validDomain";
    pub const PROVISIONED: &str = "provisioned";

    pub const LOCAL_BOT_ID: &str = "localBotId";
    pub const LOCAL_BOT_PASSWORD: &str = "localBotPassword";
    pub const LOCAL_OBJECT_ID: &str = "localObjectId";
    pub const LOCAL_ENDPOINT: &str = "localEndpoint";

    pub const LAST_DEPLOY_TIME: &str = "lastDeployTime";

    // solution
    pub const SUBSCRIPTION_ID: &str = "subscriptionId";
    pub const RESOURCE_GROUP: &str = "resourceGroupName";
    pub const LOCATION: &str = "location";
    pub const RESOURCE_NAME_SUFFIX: &str = "resourceNameSuffix";

    // aad app for teams
    pub const TEAMS_CLIENT_ID: &str = "clientId";
    pub const TEAMS_CLIENT_SECRET: &str = "clientSecret";
    pub const TEAMS_TENANT_ID: &str = "tenantId";
    pub const APPLICATION_ID_URIS: &str = "applicationIdUris";

    // sql, identity, function
    pub const SQL_ENDPOINT: &str = "sqlEndpoint";
    pub const SQL_DATABASE_NAME: &str = "databaseName";
    pub const SQL_USER_NAME: &str = "adminUserName";
    pub const SQL_PASSWORD: &str = "adminPassword";
    pub const IDENTITY_ID: &str = "identityId";
    pub const FUNCTION_ENDPOINT: &str = "functionEndpoint";
}

/// App settings pushed to the web app.
pub mod app_settings {
    pub const BOT_ID: &str = "BOT_ID";
    pub const BOT_PASSWORD: &str = "BOT_PASSWORD";
    pub const M365_CLIENT_ID: &str = "M365_CLIENT_ID";
    pub const M365_CLIENT_SECRET: &str = "M365_CLIENT_SECRET";
    pub const M365_TENANT_ID: &str = "M365_TENANT_ID";
    pub const M365_AUTHORITY_HOST: &str = "M365_AUTHORITY_HOST";
    pub const INITIATE_LOGIN_ENDPOINT: &str = "INITIATE_LOGIN_ENDPOINT";
    pub const M365_APPLICATION_ID_URI: &str = "M365_APPLICATION_ID_URI";
    pub const SQL_ENDPOINT: &str = "SQL_ENDPOINT";
    pub const SQL_DATABASE_NAME: &str = "SQL_DATABASE_NAME";
    pub const SQL_USER_NAME: &str = "SQL_USER_NAME";
    pub const SQL_PASSWORD: &str = "SQL_PASSWORD";
    pub const IDENTITY_ID: &str = "IDENTITY_ID";
    pub const API_ENDPOINT: &str = "API_ENDPOINT";
}
