use crate::config::Config;
use crate::constants::MEDIA_UPLOAD_PREFIX;
use crate::error::AppError;
use crate::session::credential::Credential;
use crate::transport::headers;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, error, instrument};

/// Fetches raw image bytes from the media CDN.
#[async_trait]
pub trait MediaClient: Send + Sync {
    async fn get_image(
        &self,
        image_path: &str,
        credential: &Credential,
    ) -> Result<Vec<u8>, AppError>;
}

/// Crop and resize parameters for the CDN's processed-image variants.
#[derive(Debug, Clone)]
pub struct CropSpec {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub output_width: u32,
    pub quality: String,
    pub format: String,
}

impl Default for CropSpec {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 1.0,
            height: 1.0,
            output_width: 864,
            quality: "auto".to_string(),
            format: "webp".to_string(),
        }
    }
}

/// CDN path for an image as uploaded, without any processing applied.
pub fn upload_image_path(cdn_id: &str, ext: &str) -> String {
    format!("{}/{}{}", MEDIA_UPLOAD_PREFIX, cdn_id, ext)
}

/// CDN path for a cropped and resized variant of a stored image.
pub fn processed_image_path(image_id: &str, crop: &CropSpec) -> String {
    format!(
        "{}/x_{:.2},y_{:.2},w_{:.2},h_{:.2},c_crop/w_{},q_{}/f_{}/{}",
        MEDIA_UPLOAD_PREFIX,
        crop.x,
        crop.y,
        crop.width,
        crop.height,
        crop.output_width,
        crop.quality,
        crop.format,
        image_id
    )
}

#[derive(Debug)]
pub struct HingeMediaClient {
    client: Client,
    base_url: String,
}

impl HingeMediaClient {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let headers = headers::media_headers(config)?;
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.media_api.timeout))
            .build()?;

        Ok(Self {
            client,
            base_url: config.media_api.base_url.clone(),
        })
    }
}

#[async_trait]
impl MediaClient for HingeMediaClient {
    #[instrument(skip(self, credential))]
    async fn get_image(
        &self,
        image_path: &str,
        credential: &Credential,
    ) -> Result<Vec<u8>, AppError> {
        let url = format!("{}/{}", self.base_url, image_path);
        debug!("Fetching image from {}", url);

        let response = self
            .client
            .get(&url)
            .headers(headers::auth_headers(credential)?)
            .send()
            .await?;

        let status = response.status();
        match status {
            s if s.is_success() => Ok(response.bytes().await?.to_vec()),
            StatusCode::UNAUTHORIZED => {
                error!("Media request rejected as unauthorized");
                Err(AppError::Unauthorized)
            }
            StatusCode::TOO_MANY_REQUESTS => Err(AppError::RateLimitExceeded),
            StatusCode::NOT_FOUND => Err(AppError::NotFound),
            s => {
                error!("Media request failed. Status: {}", s);
                Err(AppError::Unexpected(s))
            }
        }
    }
}

#[cfg(test)]
mod tests_media_client {
    use super::*;
    use crate::utils::logger::setup_logger;
    use chrono::Utc;
    use mockito::Server;
    use pretty_assertions::assert_eq;

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

    fn create_client(server: &Server) -> HingeMediaClient {
        let mut config = Config::new();
        config.media_api.base_url = server.url();
        config.media_api.timeout = 5;
        HingeMediaClient::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_get_image_returns_bytes() {
        setup_logger();
        let mut server = Server::new_async().await;

        let mock = server
            .mock("GET", "/image/upload/abc123.jpg")
            .match_header("authorization", "Bearer test_token")
            .with_status(200)
            .with_header("content-type", "image/jpeg")
            .with_body(&[0xFF, 0xD8, 0xFF, 0xE0][..])
            .create_async()
            .await;

        let client = create_client(&server);
        let bytes = client
            .get_image("image/upload/abc123.jpg", &test_credential())
            .await
            .unwrap();

        assert_eq!(bytes, vec![0xFF, 0xD8, 0xFF, 0xE0]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_missing_image_is_not_found() {
        setup_logger();
        let mut server = Server::new_async().await;

        let _mock = server
            .mock("GET", "/image/upload/missing.jpg")
            .with_status(404)
            .create_async()
            .await;

        let client = create_client(&server);
        let result = client
            .get_image("image/upload/missing.jpg", &test_credential())
            .await;

        assert!(matches!(result, Err(AppError::NotFound)));
    }

    #[test]
    fn test_upload_image_path() {
        assert_eq!(upload_image_path("abc123", ".jpg"), "image/upload/abc123.jpg");
    }

    #[test]
    fn test_processed_image_path_format() {
        let path = processed_image_path("abc123", &CropSpec::default());
        assert_eq!(
            path,
            "image/upload/x_0.00,y_0.00,w_1.00,h_1.00,c_crop/w_864,q_auto/f_webp/abc123"
        );
    }

    #[test]
    fn test_processed_image_path_custom_crop() {
        let crop = CropSpec {
            x: 0.1,
            y: 0.25,
            width: 0.8,
            height: 0.5,
            output_width: 432,
            quality: "80".to_string(),
            format: "jpg".to_string(),
        };
        let path = processed_image_path("xyz", &crop);
        assert_eq!(
            path,
            "image/upload/x_0.10,y_0.25,w_0.80,h_0.50,c_crop/w_432,q_80/f_jpg/xyz"
        );
    }
}
