//! HTTP tests for [`teams_bot::RegistrationClient`] against a mockito server.

use std::time::Duration;

use fx_core::{ErrorCategory, FxError, RetryHandler};
use mockito::Matcher;
use serde_json::json;
use teams_bot::clients::{BotRegistrar, BotRegistration, ExistingAadApp};
use teams_bot::RegistrationClient;

const TOKEN: &str = "token-1";

fn client(server: &mockito::ServerGuard) -> RegistrationClient {
    RegistrationClient::new(&server.url(), &server.url())
        .with_retry(RetryHandler::new(3, Duration::ZERO))
}

/// **Test: Graph registration creates an app then a secret.**
///
/// **Setup:** `/applications` returns object and client id; `addPassword` returns a secret.
/// **Action:** `register_aad_app_by_graph()` without an existing app.
/// **Expected:** credential combines both responses; bearer token and audience sent.
#[tokio::test]
async fn test_graph_registration_creates_app_and_secret() {
    let mut server = mockito::Server::new_async().await;
    let create = server
        .mock("POST", "/applications")
        .match_header("authorization", "Bearer token-1")
        .match_body(Matcher::PartialJson(json!({
            "displayName": "mybotbt01",
            "signInAudience": "AzureADMultipleOrgs"
        })))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id":"object-1","appId":"client-1"}"#)
        .expect(1)
        .create_async()
        .await;
    let password = server
        .mock("POST", "/applications/object-1/addPassword")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"secretText":"secret-1"}"#)
        .expect(1)
        .create_async()
        .await;

    let credential = client(&server)
        .register_aad_app_by_graph(TOKEN, "mybotbt01", None)
        .await
        .unwrap();

    assert_eq!(credential.client_id, "client-1");
    assert_eq!(credential.client_secret, "secret-1");
    assert_eq!(credential.object_id, "object-1");
    create.assert_async().await;
    password.assert_async().await;
}

/// **Test: Graph registration with a known app only adds a secret.**
///
/// **Setup:** Existing object id `object-9`.
/// **Action:** `register_aad_app_by_graph()` with the existing app.
/// **Expected:** no create call; secret added to `object-9`.
#[tokio::test]
async fn test_graph_registration_reuses_existing_app() {
    let mut server = mockito::Server::new_async().await;
    let create = server
        .mock("POST", "/applications")
        .expect(0)
        .create_async()
        .await;
    let password = server
        .mock("POST", "/applications/object-9/addPassword")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"secretText":"secret-9"}"#)
        .create_async()
        .await;
    let existing = ExistingAadApp {
        object_id: "object-9".to_string(),
        client_id: "client-9".to_string(),
    };

    let credential = client(&server)
        .register_aad_app_by_graph(TOKEN, "mybotbt01", Some(&existing))
        .await
        .unwrap();

    assert_eq!(credential.client_id, "client-9");
    assert_eq!(credential.client_secret, "secret-9");
    create.assert_async().await;
    password.assert_async().await;
}

/// **Test: Empty token fails before any request.**
///
/// **Setup:** Catch-all mock expecting no calls.
/// **Action:** `register_aad_app_by_graph("")`.
/// **Expected:** `MissingConfiguration`.
#[tokio::test]
async fn test_empty_token_sends_nothing() {
    let mut server = mockito::Server::new_async().await;
    let any = server
        .mock("POST", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let err = client(&server)
        .register_aad_app_by_graph("", "mybotbt01", None)
        .await
        .unwrap_err();

    assert!(matches!(err, FxError::MissingConfiguration(_)));
    any.assert_async().await;
}

/// **Test: Server errors are retried up to the attempt limit.**
///
/// **Setup:** `/applications` always answers 500; retry limit 3.
/// **Action:** `register_aad_app_by_graph()`.
/// **Expected:** three attempts; `Provision` error carrying status 500, system category.
#[tokio::test]
async fn test_graph_failure_is_retried_then_reported() {
    let mut server = mockito::Server::new_async().await;
    let create = server
        .mock("POST", "/applications")
        .with_status(500)
        .with_body("boom")
        .expect(3)
        .create_async()
        .await;

    let err = client(&server)
        .register_aad_app_by_graph(TOKEN, "mybotbt01", None)
        .await
        .unwrap_err();

    create.assert_async().await;
    assert_eq!(err.name(), "ProvisionError");
    assert_eq!(err.inner().and_then(|e| e.status), Some(500));
    assert_eq!(err.category(), ErrorCategory::System);
}

/// **Test: AppStudio registration.**
///
/// **Setup:** `/api/aadapp/v2` and its `passwords` endpoint.
/// **Action:** `register_aad_app_by_app_studio()`.
/// **Expected:** secret requested for the returned client id.
#[tokio::test]
async fn test_app_studio_registration() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/api/aadapp/v2")
        .match_body(Matcher::PartialJson(json!({ "displayName": "mybotbt01" })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id":"object-2","appId":"client-2"}"#)
        .create_async()
        .await;
    let password = server
        .mock("POST", "/api/aadapp/v2/client-2/passwords")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"value":"secret-2"}"#)
        .expect(1)
        .create_async()
        .await;

    let credential = client(&server)
        .register_aad_app_by_app_studio(TOKEN, "mybotbt01")
        .await
        .unwrap();

    assert_eq!(credential.client_id, "client-2");
    assert_eq!(credential.client_secret, "secret-2");
    password.assert_async().await;
}

/// **Test: Creating a registration that already exists.**
///
/// **Setup:** GET `/api/botframework/bot-1` returns a registration.
/// **Action:** `create_bot_registration()`.
/// **Expected:** no POST.
#[tokio::test]
async fn test_create_registration_skips_existing() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/api/botframework/bot-1")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"botId":"bot-1","name":"My Bot-local-debug"}"#)
        .create_async()
        .await;
    let create = server
        .mock("POST", "/api/botframework")
        .expect(0)
        .create_async()
        .await;
    let registration = BotRegistration {
        bot_id: "bot-1".to_string(),
        name: "My Bot-local-debug".to_string(),
        ..BotRegistration::default()
    };

    client(&server)
        .create_bot_registration(TOKEN, &registration)
        .await
        .unwrap();

    create.assert_async().await;
}

/// **Test: Creating a new registration.**
///
/// **Setup:** GET answers 404.
/// **Action:** `create_bot_registration()`.
/// **Expected:** one POST with the camelCase body.
#[tokio::test]
async fn test_create_registration_posts_when_missing() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/api/botframework/bot-1")
        .with_status(404)
        .create_async()
        .await;
    let create = server
        .mock("POST", "/api/botframework")
        .match_body(Matcher::PartialJson(json!({
            "botId": "bot-1",
            "name": "My Bot-local-debug",
            "messagingEndpoint": ""
        })))
        .with_status(200)
        .expect(1)
        .create_async()
        .await;
    let registration = BotRegistration {
        bot_id: "bot-1".to_string(),
        name: "My Bot-local-debug".to_string(),
        ..BotRegistration::default()
    };

    client(&server)
        .create_bot_registration(TOKEN, &registration)
        .await
        .unwrap();

    create.assert_async().await;
}

/// **Test: Updating the message endpoint.**
///
/// **Setup:** Registration without channels.
/// **Action:** `update_message_endpoint()`.
/// **Expected:** POST to the registration with the endpoint and the Teams channel.
#[tokio::test]
async fn test_update_message_endpoint() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/api/botframework/bot-1")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"botId":"bot-1","name":"bot","configuredChannels":[]}"#)
        .create_async()
        .await;
    let update = server
        .mock("POST", "/api/botframework/bot-1")
        .match_body(Matcher::PartialJson(json!({
            "messagingEndpoint": "https://abc.ngrok.io/api/messages",
            "configuredChannels": ["msteams"]
        })))
        .with_status(200)
        .expect(1)
        .create_async()
        .await;

    client(&server)
        .update_message_endpoint(TOKEN, "bot-1", "https://abc.ngrok.io/api/messages")
        .await
        .unwrap();

    update.assert_async().await;
}

/// **Test: Updating a registration that does not exist.**
///
/// **Setup:** GET answers 404.
/// **Action:** `update_message_endpoint()`.
/// **Expected:** `BotRegistrationNotFound`.
#[tokio::test]
async fn test_update_message_endpoint_not_found() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/api/botframework/bot-1")
        .with_status(404)
        .create_async()
        .await;

    let err = client(&server)
        .update_message_endpoint(TOKEN, "bot-1", "https://abc.ngrok.io/api/messages")
        .await
        .unwrap_err();

    assert!(matches!(err, FxError::BotRegistrationNotFound(ref id) if id == "bot-1"));
}
