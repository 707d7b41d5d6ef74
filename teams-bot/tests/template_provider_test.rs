//! Download and fallback behavior of [`teams_bot::HttpTemplateProvider`].

use fx_core::{FxError, ProgrammingLanguage};
use teams_bot::{HttpTemplateProvider, TemplateProvider};

/// **Test: Archive served by the template host.**
///
/// **Setup:** `/bot.js.default.zip` answers 200.
/// **Action:** `fetch("bot", JavaScript)`.
/// **Expected:** the served bytes.
#[tokio::test]
async fn test_fetch_downloads_archive() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/bot.js.default.zip")
        .with_status(200)
        .with_body("remote-zip")
        .expect(1)
        .create_async()
        .await;
    let dir = tempfile::tempdir().unwrap();

    let bytes = HttpTemplateProvider::new(&server.url(), dir.path())
        .fetch("bot", ProgrammingLanguage::JavaScript)
        .await
        .unwrap();

    assert_eq!(bytes, b"remote-zip");
    mock.assert_async().await;
}

/// **Test: Local copy used when the download fails.**
///
/// **Setup:** Template host answers 500; fallback folder holds `bot-msgext.ts.default.zip`.
/// **Action:** `fetch("bot-msgext", TypeScript)`.
/// **Expected:** the local bytes.
#[tokio::test]
async fn test_fetch_falls_back_to_local_copy() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/bot-msgext.ts.default.zip")
        .with_status(500)
        .create_async()
        .await;
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("bot-msgext.ts.default.zip"), b"local-zip").unwrap();

    let bytes = HttpTemplateProvider::new(&server.url(), dir.path())
        .fetch("bot-msgext", ProgrammingLanguage::TypeScript)
        .await
        .unwrap();

    assert_eq!(bytes, b"local-zip");
}

/// **Test: Neither source available.**
///
/// **Setup:** Template host answers 404; empty fallback folder.
/// **Action:** `fetch("bot", CSharp)`.
/// **Expected:** `TemplateZipFallback` naming the group.
#[tokio::test]
async fn test_fetch_without_any_source() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/bot.csharp.default.zip")
        .with_status(404)
        .create_async()
        .await;
    let dir = tempfile::tempdir().unwrap();

    let err = HttpTemplateProvider::new(&server.url(), dir.path())
        .fetch("bot", ProgrammingLanguage::CSharp)
        .await
        .unwrap_err();

    assert!(matches!(err, FxError::TemplateZipFallback { ref group, .. } if group == "bot"));
}
