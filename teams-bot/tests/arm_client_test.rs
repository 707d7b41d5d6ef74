//! HTTP tests for [`teams_bot::ArmClient`] and provider registration against a mockito server.

use std::collections::BTreeMap;
use std::time::Duration;

use fx_core::{FxError, RetryHandler};
use mockito::Matcher;
use serde_json::json;
use teams_bot::clients::{
    ensure_resource_providers, AzureOperations, AzureScope, BotChannelSpec, PublishingCredentials,
    WebAppSpec,
};
use teams_bot::ArmClient;

fn client(server: &mockito::ServerGuard) -> ArmClient {
    ArmClient::new(&server.url()).with_retry(RetryHandler::new(3, Duration::ZERO))
}

fn scope(credential: &str) -> AzureScope {
    AzureScope {
        credential: credential.to_string(),
        subscription_id: "sub-1".to_string(),
        resource_group: "rg-1".to_string(),
    }
}

/// Whole path, with or without the api-version query after it.
fn exact(full: &str) -> Matcher {
    Matcher::Regex(format!("^{}(\\?|$)", full))
}

fn site_path(suffix: &str) -> Matcher {
    exact(&format!(
        "/subscriptions/sub-1/resourceGroups/rg-1/providers/Microsoft.Web/sites/mybotbt01{}",
        suffix
    ))
}

fn bot_path(suffix: &str) -> String {
    format!(
        "/subscriptions/sub-1/resourceGroups/rg-1/providers/Microsoft.BotService/botServices/mybotbt01{}",
        suffix
    )
}

/// **Test: Only unregistered providers are registered.**
///
/// **Setup:** `Microsoft.Web` registered, `Microsoft.BotService` not.
/// **Action:** `ensure_resource_providers()`.
/// **Expected:** one register call, for `Microsoft.BotService`.
#[tokio::test]
async fn test_ensure_resource_providers_registers_missing() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", exact("/subscriptions/sub-1/providers/Microsoft.Web"))
        .match_query(Matcher::UrlEncoded("api-version".into(), "2021-04-01".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"namespace":"Microsoft.Web","registrationState":"Registered"}"#)
        .create_async()
        .await;
    server
        .mock("GET", exact("/subscriptions/sub-1/providers/Microsoft.BotService"))
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"registrationState":"NotRegistered"}"#)
        .create_async()
        .await;
    let web_register = server
        .mock("POST", exact("/subscriptions/sub-1/providers/Microsoft.Web/register"))
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;
    let bot_register = server
        .mock("POST", exact("/subscriptions/sub-1/providers/Microsoft.BotService/register"))
        .match_query(Matcher::Any)
        .with_status(200)
        .expect(1)
        .create_async()
        .await;

    ensure_resource_providers(
        &client(&server),
        &scope("arm-token"),
        &["Microsoft.Web", "Microsoft.BotService"],
    )
    .await
    .unwrap();

    web_register.assert_async().await;
    bot_register.assert_async().await;
}

/// **Test: Provider registration failure names only the failing namespace.**
///
/// **Setup:** `Microsoft.Web` registered; `Microsoft.BotService` lookup answers 403.
/// **Action:** `ensure_resource_providers()`.
/// **Expected:** `RegisterResourceProvider` naming `Microsoft.BotService` alone; user category.
#[tokio::test]
async fn test_ensure_resource_providers_failure() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", exact("/subscriptions/sub-1/providers/Microsoft.Web"))
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"registrationState":"Registered"}"#)
        .create_async()
        .await;
    server
        .mock("GET", exact("/subscriptions/sub-1/providers/Microsoft.BotService"))
        .match_query(Matcher::Any)
        .with_status(403)
        .with_body("forbidden")
        .create_async()
        .await;

    let err = ensure_resource_providers(
        &client(&server),
        &scope("arm-token"),
        &["Microsoft.Web", "Microsoft.BotService"],
    )
    .await
    .unwrap_err();

    match &err {
        FxError::RegisterResourceProvider { providers, .. } => {
            assert_eq!(providers, &["Microsoft.BotService"]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.is_user_error());
}

/// **Test: Missing Azure token.**
///
/// **Setup:** Empty credential.
/// **Action:** `ensure_resource_providers()`.
/// **Expected:** `MissingConfiguration`, not wrapped as a provider error.
#[tokio::test]
async fn test_ensure_resource_providers_without_token() {
    let server = mockito::Server::new_async().await;

    let err = ensure_resource_providers(&client(&server), &scope(""), &["Microsoft.Web"])
        .await
        .unwrap_err();

    assert!(matches!(err, FxError::MissingConfiguration(_)));
}

/// **Test: Web app creation returns the host name.**
///
/// **Setup:** PUT on the site answers with `properties.defaultHostName`.
/// **Action:** `create_or_update_web_app()`.
/// **Expected:** host name returned; plan id and app settings in the body.
#[tokio::test]
async fn test_create_web_app() {
    let mut server = mockito::Server::new_async().await;
    let put = server
        .mock("PUT", site_path(""))
        .match_query(Matcher::UrlEncoded("api-version".into(), "2022-03-01".into()))
        .match_header("authorization", "Bearer arm-token")
        .match_body(Matcher::PartialJson(json!({
            "location": "eastus",
            "properties": {
                "serverFarmId": "/subscriptions/sub-1/resourceGroups/rg-1/providers/Microsoft.Web/serverfarms/plan-1",
                "siteConfig": {
                    "appSettings": [{ "name": "SCM_DO_BUILD_DURING_DEPLOYMENT", "value": "true" }]
                }
            }
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"properties":{"defaultHostName":"mybotbt01.azurewebsites.net"}}"#)
        .create_async()
        .await;
    let site = WebAppSpec {
        name: "mybotbt01".to_string(),
        location: "eastus".to_string(),
        app_service_plan: "plan-1".to_string(),
        app_settings: BTreeMap::from([(
            "SCM_DO_BUILD_DURING_DEPLOYMENT".to_string(),
            "true".to_string(),
        )]),
    };

    let web_app = client(&server)
        .create_or_update_web_app(&scope("arm-token"), &site)
        .await
        .unwrap();

    assert_eq!(web_app.default_host_name, "mybotbt01.azurewebsites.net");
    put.assert_async().await;
}

/// **Test: App settings failure.**
///
/// **Setup:** Settings PUT answers 409.
/// **Action:** `update_web_app_settings()`.
/// **Expected:** `ConfigUpdating`.
#[tokio::test]
async fn test_update_app_settings_failure() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("PUT", site_path("/config/appsettings"))
        .match_query(Matcher::Any)
        .with_status(409)
        .with_body("conflict")
        .create_async()
        .await;
    let settings = BTreeMap::from([("BOT_ID".to_string(), "bot-1".to_string())]);

    let err = client(&server)
        .update_web_app_settings(&scope("arm-token"), "mybotbt01", &settings)
        .await
        .unwrap_err();

    assert_eq!(err.name(), "ConfigUpdatingError");
}

/// **Test: Bot channel creation is attempted once.**
///
/// **Setup:** PUT on the bot service answers 500; retry limit 3.
/// **Action:** `create_bot_channel_registration()`.
/// **Expected:** exactly one request; `Provision` error.
#[tokio::test]
async fn test_create_bot_channel_is_not_retried() {
    let mut server = mockito::Server::new_async().await;
    let put = server
        .mock("PUT", exact(&bot_path("")))
        .match_query(Matcher::Any)
        .with_status(500)
        .expect(1)
        .create_async()
        .await;
    let bot = BotChannelSpec {
        name: "mybotbt01".to_string(),
        display_name: "mybotbt01".to_string(),
        msa_app_id: "bot-1".to_string(),
        endpoint: String::new(),
    };

    let err = client(&server)
        .create_bot_channel_registration(&scope("arm-token"), &bot)
        .await
        .unwrap_err();

    put.assert_async().await;
    assert_eq!(err.name(), "ProvisionError");
}

/// **Test: Endpoint update patches the bot service.**
///
/// **Setup:** PATCH answers 200.
/// **Action:** `update_bot_channel_registration()`.
/// **Expected:** body carries the endpoint and app id.
#[tokio::test]
async fn test_update_bot_channel_endpoint() {
    let mut server = mockito::Server::new_async().await;
    let patch = server
        .mock("PATCH", exact(&bot_path("")))
        .match_query(Matcher::Any)
        .match_body(Matcher::PartialJson(json!({
            "properties": {
                "endpoint": "https://mybotbt01.azurewebsites.net/api/messages",
                "msaAppId": "bot-1"
            }
        })))
        .with_status(200)
        .expect(1)
        .create_async()
        .await;
    let bot = BotChannelSpec {
        name: "mybotbt01".to_string(),
        display_name: "mybotbt01".to_string(),
        msa_app_id: "bot-1".to_string(),
        endpoint: "https://mybotbt01.azurewebsites.net/api/messages".to_string(),
    };

    client(&server)
        .update_bot_channel_registration(&scope("arm-token"), &bot)
        .await
        .unwrap();

    patch.assert_async().await;
}

/// **Test: Teams channel link.**
///
/// **Setup:** PUT on `channels/MsTeamsChannel` answers 200.
/// **Action:** `link_teams_channel()`.
/// **Expected:** one request naming the channel.
#[tokio::test]
async fn test_link_teams_channel() {
    let mut server = mockito::Server::new_async().await;
    let put = server
        .mock("PUT", exact(&bot_path("/channels/MsTeamsChannel")))
        .match_query(Matcher::Any)
        .match_body(Matcher::PartialJson(json!({
            "properties": { "channelName": "MsTeamsChannel" }
        })))
        .with_status(200)
        .expect(1)
        .create_async()
        .await;

    client(&server)
        .link_teams_channel(&scope("arm-token"), "mybotbt01")
        .await
        .unwrap();

    put.assert_async().await;
}

/// **Test: Publishing credentials.**
///
/// **Setup:** `publishingcredentials/list` answers with user name and password.
/// **Action:** `list_publishing_credentials()`.
/// **Expected:** both values returned.
#[tokio::test]
async fn test_list_publishing_credentials() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", site_path("/config/publishingcredentials/list"))
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"properties":{"publishingUserName":"$mybotbt01","publishingPassword":"pw"}}"#,
        )
        .create_async()
        .await;

    let credentials = client(&server)
        .list_publishing_credentials(&scope("arm-token"), "mybotbt01")
        .await
        .unwrap();

    assert_eq!(credentials.username, "$mybotbt01");
    assert_eq!(credentials.password, "pw");
}

/// **Test: Zip deploy uploads once with basic auth.**
///
/// **Setup:** Kudu endpoint answers 200, then a second endpoint answering 500.
/// **Action:** `zip_deploy_package()` to each.
/// **Expected:** payload and headers sent; the failing upload is attempted once.
#[tokio::test]
async fn test_zip_deploy_package() {
    let mut server = mockito::Server::new_async().await;
    let credentials = PublishingCredentials {
        username: "$site".to_string(),
        password: "secret".to_string(),
    };
    let ok = server
        .mock("POST", "/api/zipdeploy")
        .match_header("authorization", "Basic JHNpdGU6c2VjcmV0")
        .match_header("content-type", "application/octet-stream")
        .match_body(Matcher::Exact("PK-payload".to_string()))
        .with_status(200)
        .expect(1)
        .create_async()
        .await;
    let failing = server
        .mock("POST", "/broken/api/zipdeploy")
        .with_status(500)
        .expect(1)
        .create_async()
        .await;
    let arm = client(&server);

    arm.zip_deploy_package(
        &format!("{}/api/zipdeploy", server.url()),
        b"PK-payload".to_vec(),
        &credentials,
    )
    .await
    .unwrap();
    let err = arm
        .zip_deploy_package(
            &format!("{}/broken/api/zipdeploy", server.url()),
            b"PK-payload".to_vec(),
            &credentials,
        )
        .await
        .unwrap_err();

    ok.assert_async().await;
    failing.assert_async().await;
    assert_eq!(err.name(), "ZipDeployError");
}

/// **Test: Web app restart after a functions deploy.**
///
/// **Setup:** `restart` answers 200; a second site answers 500 every time.
/// **Action:** `restart_web_app()` on each.
/// **Expected:** one bearer POST; the failing restart is retried and surfaces `RestartWebApp`.
#[tokio::test]
async fn test_restart_web_app() {
    let mut server = mockito::Server::new_async().await;
    let restart = server
        .mock("POST", site_path("/restart"))
        .match_query(Matcher::Any)
        .match_header("authorization", "Bearer arm-token")
        .with_status(200)
        .expect(1)
        .create_async()
        .await;
    let failing = server
        .mock(
            "POST",
            exact("/subscriptions/sub-1/resourceGroups/rg-1/providers/Microsoft.Web/sites/broken/restart"),
        )
        .match_query(Matcher::Any)
        .with_status(500)
        .expect(3)
        .create_async()
        .await;
    let client = client(&server);

    client
        .restart_web_app(&scope("arm-token"), "mybotbt01")
        .await
        .unwrap();
    let err = client
        .restart_web_app(&scope("arm-token"), "broken")
        .await
        .unwrap_err();

    assert!(matches!(err, FxError::RestartWebApp { ref site, .. } if site == "broken"));
    assert!(!err.is_user_error());
    restart.assert_async().await;
    failing.assert_async().await;
}
