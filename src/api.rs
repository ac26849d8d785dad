use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::ApiConfig;
use crate::error::{Result, RugenError};
use crate::types::{
    GenerationParameters, LoginRequest, RefreshedToken, RegisterRequest, ResultRow, TokenPair,
};

/// REST surface of the generator service.
///
/// `bearer` is the access token to attach, if any. Credential bookkeeping
/// lives in [`crate::auth::AuthGateway`]; implementations only transport.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn generate_data(
        &self,
        params: &GenerationParameters,
        page: u32,
        bearer: Option<&str>,
    ) -> Result<Vec<ResultRow>>;

    async fn login(&self, request: &LoginRequest) -> Result<TokenPair>;
    async fn register(&self, request: &RegisterRequest) -> Result<()>;
    async fn refresh_token(&self, refresh_token: &str) -> Result<RefreshedToken>;
    async fn logout(&self, refresh_token: &str) -> Result<()>;

    async fn block_users(&self, ids: &[String], bearer: Option<&str>) -> Result<()>;
    async fn unblock_users(&self, ids: &[String], bearer: Option<&str>) -> Result<()>;
    async fn delete_users(&self, ids: &[String], bearer: Option<&str>) -> Result<()>;
}

pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl std::fmt::Debug for HttpBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpBackend")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshBody<'a> {
    refresh_token: &'a str,
}

#[derive(Serialize)]
struct IdsBody<'a> {
    ids: &'a [String],
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

impl HttpBackend {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| RugenError::Config(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str, bearer: Option<&str>) -> RequestBuilder {
        let builder = self.client.request(method, self.api_url(path));
        match bearer {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<reqwest::Response> {
        let response = builder.send().await.map_err(|e| {
            tracing::debug!(error = %e, "request failed before a response arrived");
            RugenError::Network(e.to_string())
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .ok()
            .and_then(|b| b.message)
            .unwrap_or_default();
        tracing::debug!(status = status.as_u16(), %message, "server rejected request");

        Err(RugenError::Server {
            status: status.as_u16(),
            message,
        })
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = self.send(builder).await?;
        response
            .json()
            .await
            .map_err(|e| RugenError::Unexpected(e.to_string()))
    }
}

pub fn generate_data_path(params: &GenerationParameters, page: u32) -> String {
    format!(
        "/generate-data?region={}&errors={}&seed={}&page={}",
        urlencoding::encode(params.region.code()),
        params.error_amount,
        params.seed,
        page
    )
}

#[async_trait]
impl Backend for HttpBackend {
    async fn generate_data(
        &self,
        params: &GenerationParameters,
        page: u32,
        bearer: Option<&str>,
    ) -> Result<Vec<ResultRow>> {
        let path = generate_data_path(params, page);
        tracing::debug!(%path, "fetching rows");
        self.send_json(self.request(Method::GET, &path, bearer)).await
    }

    async fn login(&self, request: &LoginRequest) -> Result<TokenPair> {
        self.send_json(self.request(Method::POST, "/auth/login", None).json(request))
            .await
    }

    async fn register(&self, request: &RegisterRequest) -> Result<()> {
        self.send(self.request(Method::POST, "/auth/register", None).json(request))
            .await?;
        Ok(())
    }

    async fn refresh_token(&self, refresh_token: &str) -> Result<RefreshedToken> {
        let body = RefreshBody { refresh_token };
        self.send_json(self.request(Method::POST, "/auth/refresh-token", None).json(&body))
            .await
    }

    async fn logout(&self, refresh_token: &str) -> Result<()> {
        let body = RefreshBody { refresh_token };
        self.send(self.request(Method::POST, "/auth/logout", None).json(&body))
            .await?;
        Ok(())
    }

    async fn block_users(&self, ids: &[String], bearer: Option<&str>) -> Result<()> {
        let body = IdsBody { ids };
        self.send(self.request(Method::PUT, "/users/block", bearer).json(&body))
            .await?;
        Ok(())
    }

    async fn unblock_users(&self, ids: &[String], bearer: Option<&str>) -> Result<()> {
        let body = IdsBody { ids };
        self.send(self.request(Method::PUT, "/users/unblock", bearer).json(&body))
            .await?;
        Ok(())
    }

    async fn delete_users(&self, ids: &[String], bearer: Option<&str>) -> Result<()> {
        let body = IdsBody { ids };
        self.send(self.request(Method::POST, "/users/delete", bearer).json(&body))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Region;

    #[test]
    fn generate_data_path_carries_all_parameters() {
        let params = GenerationParameters::new(Region::FR, 25, 1234);
        assert_eq!(
            generate_data_path(&params, 3),
            "/generate-data?region=FR&errors=25&seed=1234&page=3"
        );
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let backend = HttpBackend::new(&ApiConfig {
            base_url: "http://localhost:8080/api/".to_string(),
            timeout_secs: 5,
        })
        .unwrap();
        assert_eq!(backend.api_url("/auth/login"), "http://localhost:8080/api/auth/login");
    }

    #[test]
    fn error_body_message_is_optional() {
        let body: ErrorBody = serde_json::from_str(r#"{"message":"Seed too large"}"#).unwrap();
        assert_eq!(body.message.as_deref(), Some("Seed too large"));
        let body: ErrorBody = serde_json::from_str(r#"{"error":"x"}"#).unwrap();
        assert!(body.message.is_none());
    }
}
