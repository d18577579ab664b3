use crate::config::Config;
use crate::error::AppError;
use crate::session::credential::Credential;
use crate::transport::headers;
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Debug;
use std::time::Duration;
use tracing::{debug, error, instrument};

/// Typed access to the provider's REST API. Implementations attach the
/// device fingerprint and per-request auth headers.
#[async_trait]
pub trait HingeHttpClient: Send + Sync {
    async fn get_json<T: DeserializeOwned + Debug + Send>(
        &self,
        path: &str,
        credential: &Credential,
    ) -> Result<T, AppError>;

    async fn post_json<B: Serialize + Debug + Sync, T: DeserializeOwned + Debug + Send>(
        &self,
        path: &str,
        body: &B,
        credential: Option<&Credential>,
    ) -> Result<T, AppError>;

    /// POST whose response body is irrelevant; only the status is checked.
    async fn post_no_content<B: Serialize + Debug + Sync>(
        &self,
        path: &str,
        body: &B,
        credential: Option<&Credential>,
    ) -> Result<(), AppError>;
}

/// Reqwest-backed client for the main API host.
#[derive(Debug)]
pub struct HingeRestClient {
    client: Client,
    base_url: String,
}

impl HingeRestClient {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let headers = headers::device_headers(config)?;
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.rest_api.timeout))
            .build()?;

        Ok(Self {
            client,
            base_url: config.rest_api.base_url.clone(),
        })
    }

    async fn handle_response<T: DeserializeOwned + Debug>(response: Response) -> Result<T, AppError> {
        let status = Self::check_status(&response)?;
        let body_text = response.text().await?;

        debug!("Response status: {}", status);

        let body: T = serde_json::from_str(&body_text)?;
        Ok(body)
    }

    async fn handle_response_no_content(response: Response) -> Result<(), AppError> {
        Self::check_status(&response)?;
        Ok(())
    }

    /// Maps provider status codes onto the error taxonomy. 401 means the
    /// credential was rejected; 429 means back off before retrying.
    fn check_status(response: &Response) -> Result<StatusCode, AppError> {
        let status = response.status();
        match status {
            s if s.is_success() => Ok(s),
            StatusCode::UNAUTHORIZED => {
                error!("API request rejected as unauthorized");
                Err(AppError::Unauthorized)
            }
            StatusCode::TOO_MANY_REQUESTS => {
                error!("API request rate limited");
                Err(AppError::RateLimitExceeded)
            }
            StatusCode::NOT_FOUND => Err(AppError::NotFound),
            s => {
                error!("API request failed. Status: {}", s);
                Err(AppError::Unexpected(s))
            }
        }
    }
}

#[async_trait]
impl HingeHttpClient for HingeRestClient {
    #[instrument(skip(self, credential))]
    async fn get_json<T: DeserializeOwned + Debug + Send>(
        &self,
        path: &str,
        credential: &Credential,
    ) -> Result<T, AppError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Sending GET request to {}", url);

        let response = self
            .client
            .get(&url)
            .headers(headers::auth_headers(credential)?)
            .send()
            .await?;

        Self::handle_response(response).await
    }

    #[instrument(skip(self, body, credential))]
    async fn post_json<B: Serialize + Debug + Sync, T: DeserializeOwned + Debug + Send>(
        &self,
        path: &str,
        body: &B,
        credential: Option<&Credential>,
    ) -> Result<T, AppError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Sending POST request to {}", url);

        let mut request = self.client.post(&url).json(body);
        if let Some(credential) = credential {
            request = request.headers(headers::auth_headers(credential)?);
        }
        let response = request.send().await?;

        Self::handle_response(response).await
    }

    #[instrument(skip(self, body, credential))]
    async fn post_no_content<B: Serialize + Debug + Sync>(
        &self,
        path: &str,
        body: &B,
        credential: Option<&Credential>,
    ) -> Result<(), AppError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Sending POST request to {}", url);

        let mut request = self.client.post(&url).json(body);
        if let Some(credential) = credential {
            request = request.headers(headers::auth_headers(credential)?);
        }
        let response = request.send().await?;

        Self::handle_response_no_content(response).await
    }
}


#[cfg(test)]
mod tests_status_mapping {
    use super::*;
    use crate::utils::logger::setup_logger;
    use chrono::Utc;
    use mockito::Server;

    fn test_credential() -> Credential {
        Credential {
            phone_number: "+15550001111".to_string(),
            device_id: "dev123".to_string(),
            install_id: "inst456".to_string(),
            auth_token: "test_token".to_string(),
            session_id: None,
            user_id: "user42".to_string(),
            issued_at: Utc::now(),
            expires_at: None,
        }
    }

    async fn get_with_status(status: usize) -> Result<serde_json::Value, AppError> {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/probe")
            .with_status(status)
            .with_body("{}")
            .create_async()
            .await;

        let mut config = Config::new();
        config.rest_api.base_url = server.url();
        let client = HingeRestClient::new(&config).unwrap();
        client.get_json("/probe", &test_credential()).await
    }

    #[tokio::test]
    async fn test_unauthorized() {
        setup_logger();
        let result = get_with_status(401).await;
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_rate_limited() {
        setup_logger();
        let result = get_with_status(429).await;
        assert!(matches!(result, Err(AppError::RateLimitExceeded)));
    }

    #[tokio::test]
    async fn test_not_found() {
        setup_logger();
        let result = get_with_status(404).await;
        assert!(matches!(result, Err(AppError::NotFound)));
    }

    #[tokio::test]
    async fn test_server_error_is_transient() {
        setup_logger();
        let result = get_with_status(502).await;
        match result {
            Err(e) => {
                assert!(matches!(e, AppError::Unexpected(StatusCode::BAD_GATEWAY)));
                assert!(e.is_transient());
            }
            Ok(_) => panic!("expected error"),
        }
    }

    #[tokio::test]
    async fn test_malformed_body_is_json_error() {
        setup_logger();
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/probe")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let mut config = Config::new();
        config.rest_api.base_url = server.url();
        let client = HingeRestClient::new(&config).unwrap();
        let result: Result<serde_json::Value, AppError> =
            client.get_json("/probe", &test_credential()).await;

        assert!(matches!(result, Err(AppError::Json(_))));
    }
}
