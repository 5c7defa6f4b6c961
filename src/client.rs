use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::auth::TokenProvider;
use crate::error::BankingError;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Where a service lives and how long to wait for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// JSON-over-HTTP client bound to one service and one token provider.
pub struct ApiClient {
    http: Client,
    base_url: String,
    tokens: Arc<dyn TokenProvider>,
}

impl ApiClient {
    pub fn new(config: &ClientConfig, tokens: Arc<dyn TokenProvider>) -> Result<Self, BankingError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.timeout.min(Duration::from_secs(10)))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            tokens,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn tokens(&self) -> &Arc<dyn TokenProvider> {
        &self.tokens
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorized(&self, builder: RequestBuilder) -> Result<RequestBuilder, BankingError> {
        let token = self.tokens.token().ok_or(BankingError::Unauthenticated)?;
        Ok(builder.bearer_auth(token))
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, BankingError> {
        let request = self.authorized(self.http.get(self.url(path)))?;
        let body = self.send(request).await?;
        Ok(serde_json::from_str(&body)?)
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, BankingError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.authorized(self.http.post(self.url(path)))?.json(body);
        let body = self.send(request).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// POST where only the status code matters
    pub async fn post_unit<B>(&self, path: &str, body: &B) -> Result<(), BankingError>
    where
        B: Serialize + ?Sized,
    {
        let request = self.authorized(self.http.post(self.url(path)))?.json(body);
        self.send(request).await.map(|_| ())
    }

    /// POST without a bearer token, for obtaining one in the first place
    pub async fn post_json_anonymous<B, T>(&self, path: &str, body: &B) -> Result<T, BankingError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.http.post(self.url(path)).json(body);
        let body = self.send(request).await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn send(&self, request: RequestBuilder) -> Result<String, BankingError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(BankingError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}
