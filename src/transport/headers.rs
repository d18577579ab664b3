use crate::config::Config;
use crate::error::AppError;
use crate::session::credential::Credential;
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT_LANGUAGE, AUTHORIZATION, USER_AGENT,
};

fn insert(headers: &mut HeaderMap, name: &'static str, value: &str) -> Result<(), AppError> {
    let value =
        HeaderValue::from_str(value).map_err(|_| AppError::InvalidHeader(name.to_string()))?;
    headers.insert(HeaderName::from_static(name), value);
    Ok(())
}

/// Device fingerprint sent as default headers on every API request. The
/// provider rejects requests whose fingerprint does not look like the
/// Android app.
pub(crate) fn device_headers(config: &Config) -> Result<HeaderMap, AppError> {
    let mut headers = HeaderMap::new();
    insert(&mut headers, "x-app-version", &config.device.app_version)?;
    insert(&mut headers, "x-os-version", &config.device.os_version)?;
    insert(
        &mut headers,
        "x-os-version-code",
        &config.device.os_version_code,
    )?;
    insert(&mut headers, "x-device-model", &config.device.device_model)?;
    insert(
        &mut headers,
        "x-device-model-code",
        &config.device.device_model,
    )?;
    insert(
        &mut headers,
        "x-device-manufacturer",
        &config.device.device_manufacturer,
    )?;
    insert(&mut headers, "x-build-number", &config.device.build_number)?;
    insert(&mut headers, "x-device-platform", "android")?;
    insert(&mut headers, "x-device-region", "US")?;
    insert(&mut headers, "x-install-id", &config.identity.install_id)?;
    insert(&mut headers, "x-device-id", &config.identity.device_id)?;
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US"));
    let user_agent = HeaderValue::from_str(&config.device.user_agent)
        .map_err(|_| AppError::InvalidHeader("user-agent".to_string()))?;
    headers.insert(USER_AGENT, user_agent);
    Ok(headers)
}

/// Per-request headers carrying the bearer token and, when present, the
/// session id of the current `Credential`.
pub(crate) fn auth_headers(credential: &Credential) -> Result<HeaderMap, AppError> {
    let mut headers = HeaderMap::new();
    let bearer = format!("Bearer {}", credential.auth_token);
    let bearer = HeaderValue::from_str(&bearer)
        .map_err(|_| AppError::InvalidHeader("authorization".to_string()))?;
    headers.insert(AUTHORIZATION, bearer);
    if let Some(session_id) = &credential.session_id {
        insert(&mut headers, "x-session-id", session_id)?;
    }
    Ok(headers)
}

/// Minimal header set for the media CDN host.
pub(crate) fn media_headers(config: &Config) -> Result<HeaderMap, AppError> {
    let mut headers = HeaderMap::new();
    let user_agent = HeaderValue::from_str(&config.device.user_agent)
        .map_err(|_| AppError::InvalidHeader("user-agent".to_string()))?;
    headers.insert(USER_AGENT, user_agent);
    Ok(headers)
}

#[cfg(test)]
mod tests_headers {
    use super::*;
    use chrono::Utc;

    fn test_credential(session_id: Option<&str>) -> Credential {
        Credential {
            phone_number: "+15550001111".to_string(),
            device_id: "dev123".to_string(),
            install_id: "inst456".to_string(),
            auth_token: "tok789".to_string(),
            session_id: session_id.map(|s| s.to_string()),
            user_id: "user42".to_string(),
            issued_at: Utc::now(),
            expires_at: None,
        }
    }

    #[test]
    fn test_device_headers_fingerprint() {
        let config = Config::new();
        let headers = device_headers(&config).unwrap();

        assert_eq!(headers.get("x-device-platform").unwrap(), "android");
        assert_eq!(
            headers.get("x-install-id").unwrap(),
            config.identity.install_id.as_str()
        );
        assert_eq!(
            headers.get("x-app-version").unwrap(),
            config.device.app_version.as_str()
        );
        assert!(headers.get(AUTHORIZATION).is_none());
    }

    #[test]
    fn test_auth_headers_bearer() {
        let headers = auth_headers(&test_credential(Some("sess000"))).unwrap();
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer tok789");
        assert_eq!(headers.get("x-session-id").unwrap(), "sess000");
    }

    #[test]
    fn test_auth_headers_without_session() {
        let headers = auth_headers(&test_credential(None)).unwrap();
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer tok789");
        assert!(headers.get("x-session-id").is_none());
    }

    #[test]
    fn test_invalid_header_value_rejected() {
        let mut credential = test_credential(None);
        credential.auth_token = "bad\ntoken".to_string();
        let result = auth_headers(&credential);
        assert!(matches!(result, Err(AppError::InvalidHeader(_))));
    }

    #[test]
    fn test_media_headers_minimal() {
        let config = Config::new();
        let headers = media_headers(&config).unwrap();
        assert_eq!(
            headers.get(USER_AGENT).unwrap(),
            config.device.user_agent.as_str()
        );
        assert_eq!(headers.len(), 1);
    }
}
