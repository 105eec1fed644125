use crate::types::constants::{TOKEN_INVALIDATE_PATH, TOKEN_PATH};
use crate::types::{RealtimeError, Result};
use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;

/// Source of short-lived connection credentials
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Fetches a token to embed in the connection address
    async fn fetch_token(&self) -> Result<String>;

    /// Revokes a token that is no longer needed
    async fn invalidate(&self, _token: &str) -> Result<()> {
        Ok(())
    }
}

/// Envelope used by every archive API response
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
}

#[derive(Debug, Deserialize)]
pub struct TokenData {
    pub token: String,
    #[serde(default)]
    pub expires_at: Option<String>,
}

/// Fetches WebSocket tokens from the archive REST API
pub struct HttpTokenProvider {
    api_url: String,
    auth_token: Option<String>,
    http_client: reqwest::Client,
}

impl HttpTokenProvider {
    pub fn new(api_url: impl Into<String>, auth_token: Option<String>) -> Self {
        Self {
            api_url: api_url.into().trim_end_matches('/').to_string(),
            auth_token,
            http_client: reqwest::Client::new(),
        }
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.api_url, path);
        let mut request = self
            .http_client
            .request(method, &url)
            .header("Accept", "application/json");

        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }
        request
    }
}

#[async_trait]
impl TokenProvider for HttpTokenProvider {
    async fn fetch_token(&self) -> Result<String> {
        let response = self
            .request(Method::GET, TOKEN_PATH)
            .send()
            .await
            .map_err(|e| RealtimeError::Connection(format!("Token request failed: {}", e)))?;

        let status = response.status();
        let body: ApiResponse<TokenData> = response.json().await?;
        let token = token_from_response(body)
            .map_err(|e| RealtimeError::Auth(format!("{} (status {})", e, status)))?;

        tracing::debug!("Fetched WebSocket token");
        Ok(token)
    }

    async fn invalidate(&self, token: &str) -> Result<()> {
        let response = self
            .request(Method::POST, TOKEN_INVALIDATE_PATH)
            .json(&serde_json::json!({ "token": token }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RealtimeError::Auth(format!(
                "Token invalidation failed with status: {}",
                response.status()
            )));
        }

        tracing::debug!("Invalidated WebSocket token");
        Ok(())
    }
}

/// Extracts the token from a decoded token endpoint response
fn token_from_response(body: ApiResponse<TokenData>) -> std::result::Result<String, String> {
    if !body.success {
        return Err(body
            .message
            .unwrap_or_else(|| "Failed to get WebSocket token".to_string()));
    }

    match body.data {
        Some(data) if !data.token.is_empty() => Ok(data.token),
        _ => Err("Token endpoint returned no token".to_string()),
    }
}
