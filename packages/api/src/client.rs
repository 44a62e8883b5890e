//! HTTP plumbing shared by every Matcha REST surface.

use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// Thin wrapper around `reqwest::Client` carrying the base URL and the
/// caller's bearer token.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Create a client against the given API origin, e.g.
    /// `https://app.matcha.dev/api`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            token: None,
        }
    }

    /// Attach the access token sent as a bearer credential on every call.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn url(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{base}/{path}")
    }

    fn authorize(&self, rb: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => rb.bearer_auth(token),
            None => rb,
        }
    }

    /// Send the request, mapping transport and status failures, and
    /// return the raw response body.
    async fn execute(&self, rb: RequestBuilder) -> Result<String, ApiError> {
        let resp = self
            .authorize(rb)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| ApiError::Network(format!("failed to read body: {e}")))?;

        if !status.is_success() {
            tracing::debug!("request failed: HTTP {} {}", status.as_u16(), text);
            return Err(ApiError::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        Ok(text)
    }

    fn decode<T: DeserializeOwned>(text: &str) -> Result<T, ApiError> {
        serde_json::from_str(text).map_err(|e| ApiError::Deserialize(e.to_string()))
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let text = self.execute(self.client.get(self.url(path))).await?;
        Self::decode(&text)
    }

    pub(crate) async fn get_json_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let text = self
            .execute(self.client.get(self.url(path)).query(query))
            .await?;
        Self::decode(&text)
    }

    pub(crate) async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let text = self
            .execute(self.client.post(self.url(path)).json(body))
            .await?;
        Self::decode(&text)
    }

    /// POST with a body where the response body does not matter.
    pub(crate) async fn post_json_unit<B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(), ApiError> {
        self.execute(self.client.post(self.url(path)).json(body))
            .await?;
        Ok(())
    }

    /// POST without a body where the response body does not matter.
    pub(crate) async fn post_unit(&self, path: &str) -> Result<(), ApiError> {
        self.execute(self.client.post(self.url(path))).await?;
        Ok(())
    }

    pub(crate) async fn put_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let text = self
            .execute(self.client.put(self.url(path)).json(body))
            .await?;
        Self::decode(&text)
    }

    pub(crate) async fn delete_unit(&self, path: &str) -> Result<(), ApiError> {
        self.execute(self.client.delete(self.url(path))).await?;
        Ok(())
    }
}
