//! Request helpers shared by the REST clients.

use fx_core::{FxError, FxResult, RemoteError};
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;

/// Fails before any network call when the token is empty.
pub(crate) fn require_token(token: &str, name: &str) -> FxResult<()> {
    if token.trim().is_empty() {
        return Err(FxError::MissingConfiguration(format!("{} token", name)));
    }
    Ok(())
}

/// Sends the request; non-2xx responses become a [`RemoteError`] carrying the body.
pub(crate) async fn send(request: RequestBuilder) -> Result<Response, RemoteError> {
    let response = request
        .send()
        .await
        .map_err(|e| RemoteError::network(e.to_string()))?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(RemoteError::new(Some(status.as_u16()), body))
}

pub(crate) async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, RemoteError> {
    let response = send(request).await?;
    let status = response.status().as_u16();
    response
        .json::<T>()
        .await
        .map_err(|e| RemoteError::new(Some(status), format!("unexpected response body: {}", e)))
}

// 404 -> None
pub(crate) async fn send_optional_json<T: DeserializeOwned>(
    request: RequestBuilder,
) -> Result<Option<T>, RemoteError> {
    match send_json(request).await {
        Ok(value) => Ok(Some(value)),
        Err(RemoteError {
            status: Some(404), ..
        }) => Ok(None),
        Err(e) => Err(e),
    }
}

pub(crate) fn trim_base(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}
