use crate::config::Config;
use crate::constants::{AUTH_REFRESH_PATH, INSTALL_PATH, SMS_SEND_PATH, SMS_VERIFY_PATH};
use crate::error::AuthError;
use crate::session::credential::Credential;
use crate::session::interface::{Authenticator, OtpSource};
use crate::transport::http_client::HingeHttpClient;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Serialize)]
struct InstallRequest<'a> {
    #[serde(rename = "installId")]
    install_id: &'a str,
    #[serde(rename = "deviceId")]
    device_id: &'a str,
    #[serde(rename = "appVersion")]
    app_version: &'a str,
    #[serde(rename = "deviceModel")]
    device_model: &'a str,
    #[serde(rename = "osVersion")]
    os_version: &'a str,
    #[serde(rename = "devicePlatform")]
    device_platform: &'a str,
}

#[derive(Debug, Serialize)]
struct SmsSendRequest<'a> {
    #[serde(rename = "phoneNumber")]
    phone_number: &'a str,
    #[serde(rename = "deviceId")]
    device_id: &'a str,
    #[serde(rename = "installId")]
    install_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct SmsSendResponse {
    #[serde(rename = "caseId")]
    case_id: String,
}

#[derive(Debug, Serialize)]
struct SmsVerifyRequest<'a> {
    #[serde(rename = "caseId")]
    case_id: &'a str,
    #[serde(rename = "phoneNumber")]
    phone_number: &'a str,
    #[serde(rename = "otpCode")]
    otp_code: &'a str,
    #[serde(rename = "deviceId")]
    device_id: &'a str,
    #[serde(rename = "installId")]
    install_id: &'a str,
}

#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    token: &'a str,
    #[serde(rename = "deviceId")]
    device_id: &'a str,
    #[serde(rename = "installId")]
    install_id: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    #[serde(rename = "identityId")]
    pub identity_id: String,
    #[serde(rename = "sessionId")]
    pub session_id: Option<String>,
    #[serde(rename = "expiresIn")]
    pub expires_in: Option<i64>,
}

/// Login and refresh against the provider. Login registers the install,
/// requests a one-time passcode for the configured phone number and
/// exchanges it for a bearer token.
pub struct HingeAuth<T: HingeHttpClient> {
    config: Arc<Config>,
    client: Arc<T>,
    otp: Arc<dyn OtpSource>,
}

impl<T: HingeHttpClient> HingeAuth<T> {
    pub fn new(config: Arc<Config>, client: Arc<T>, otp: Arc<dyn OtpSource>) -> Self {
        Self {
            config,
            client,
            otp,
        }
    }

    async fn register_install(&self) -> Result<(), AuthError> {
        let identity = &self.config.identity;
        let device = &self.config.device;
        let request = InstallRequest {
            install_id: &identity.install_id,
            device_id: &identity.device_id,
            app_version: &device.app_version,
            device_model: &device.device_model,
            os_version: &device.os_version,
            device_platform: "android",
        };

        debug!("Registering install {}", identity.install_id);
        self.client
            .post_no_content(INSTALL_PATH, &request, None)
            .await?;
        Ok(())
    }

    async fn request_passcode(&self) -> Result<SmsSendResponse, AuthError> {
        let identity = &self.config.identity;
        let request = SmsSendRequest {
            phone_number: &identity.phone_number,
            device_id: &identity.device_id,
            install_id: &identity.install_id,
        };

        debug!("Requesting login passcode");
        let response = self.client.post_json(SMS_SEND_PATH, &request, None).await?;
        Ok(response)
    }

    async fn verify_passcode(&self, case_id: &str, otp_code: &str) -> Result<AuthResponse, AuthError> {
        let identity = &self.config.identity;
        let request = SmsVerifyRequest {
            case_id,
            phone_number: &identity.phone_number,
            otp_code,
            device_id: &identity.device_id,
            install_id: &identity.install_id,
        };

        debug!("Verifying login passcode");
        let response = self
            .client
            .post_json(SMS_VERIFY_PATH, &request, None)
            .await?;
        Ok(response)
    }

    fn build_credential(&self, auth: AuthResponse) -> Credential {
        let identity = &self.config.identity;
        let issued_at = Utc::now();
        Credential {
            phone_number: identity.phone_number.clone(),
            device_id: identity.device_id.clone(),
            install_id: identity.install_id.clone(),
            auth_token: auth.token,
            session_id: auth
                .session_id
                .or_else(|| Some(Uuid::new_v4().to_string())),
            user_id: auth.identity_id,
            issued_at,
            expires_at: auth.expires_in.map(|secs| issued_at + Duration::seconds(secs)),
        }
    }
}

#[async_trait::async_trait]
impl<T: HingeHttpClient + 'static> Authenticator for HingeAuth<T> {
    async fn login(&self) -> Result<Credential, AuthError> {
        let identity = &self.config.identity;
        if identity.phone_number.is_empty() {
            return Err(AuthError::BadCredentials);
        }

        info!("Logging in install {}", identity.install_id);
        self.register_install().await?;
        let case = self.request_passcode().await?;
        let code = self.otp.passcode(&identity.phone_number).await?;
        let auth = self.verify_passcode(&case.case_id, &code).await?;

        info!("Login succeeded for user {}", auth.identity_id);
        Ok(self.build_credential(auth))
    }

    async fn refresh(&self, credential: &Credential) -> Result<Credential, AuthError> {
        let identity = &self.config.identity;
        let request = RefreshRequest {
            token: &credential.auth_token,
            device_id: &identity.device_id,
            install_id: &identity.install_id,
        };

        info!("Refreshing session for user {}", credential.user_id);
        let auth: AuthResponse = self
            .client
            .post_json(AUTH_REFRESH_PATH, &request, None)
            .await?;

        debug!("Session refreshed for user {}", auth.identity_id);
        Ok(self.build_credential(auth))
    }
}

/// Fixed passcode, for tests and scripted flows.
pub struct StaticOtpSource {
    code: String,
}

impl StaticOtpSource {
    pub fn new(code: impl Into<String>) -> Self {
        Self { code: code.into() }
    }
}

#[async_trait::async_trait]
impl OtpSource for StaticOtpSource {
    async fn passcode(&self, _phone_number: &str) -> Result<String, AuthError> {
        Ok(self.code.clone())
    }
}

/// Reads the passcode from `HINGE_OTP_CODE` at call time, so a caller can
/// start a run, receive the text, and export the code.
pub struct EnvOtpSource;

#[async_trait::async_trait]
impl OtpSource for EnvOtpSource {
    async fn passcode(&self, _phone_number: &str) -> Result<String, AuthError> {
        std::env::var("HINGE_OTP_CODE")
            .map(|code| code.trim().to_string())
            .map_err(|_| AuthError::Other("HINGE_OTP_CODE is not set".to_string()))
    }
}

/// Prompts on stdout and reads the passcode from stdin, for interactive
/// terminal runs.
pub struct PromptOtpSource;

#[async_trait::async_trait]
impl OtpSource for PromptOtpSource {
    async fn passcode(&self, phone_number: &str) -> Result<String, AuthError> {
        println!("Enter the passcode sent to {}:", phone_number);
        let mut line = String::new();
        BufReader::new(tokio::io::stdin())
            .read_line(&mut line)
            .await
            .map_err(AuthError::Io)?;
        let code = line.trim();
        if code.is_empty() {
            return Err(AuthError::Other("no passcode entered".to_string()));
        }
        Ok(code.to_string())
    }
}
