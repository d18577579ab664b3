use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Authenticated session state for one account. Issued by login or refresh,
/// never mutated afterwards; the session manager replaces the whole value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Credential {
    pub phone_number: String,
    pub device_id: String,
    pub install_id: String,
    pub auth_token: String,
    pub session_id: Option<String>,
    pub user_id: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Credential {
    /// Advisory only. The provider does not reliably announce token
    /// lifetime; a 401 from a downstream call is the authoritative signal.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires_at, Some(expires_at) if expires_at <= now)
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{\"phone_number\":\"[REDACTED]\",\"device_id\":\"{}\",\"install_id\":\"{}\",\"auth_token\":\"[REDACTED]\",\"session_id\":{},\"user_id\":\"{}\",\"issued_at\":\"{}\",\"expires_at\":{}}}",
            self.device_id,
            self.install_id,
            self.session_id
                .as_ref()
                .map_or("null".to_string(), |_| "\"[REDACTED]\"".to_string()),
            self.user_id,
            self.issued_at.to_rfc3339(),
            self.expires_at
                .map_or("null".to_string(), |t| format!("\"{}\"", t.to_rfc3339()))
        )
    }
}

#[cfg(test)]
mod tests_credential {
    use super::*;
    use assert_json_diff::assert_json_eq;
    use chrono::Duration;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sample(expires_at: Option<DateTime<Utc>>) -> Credential {
        Credential {
            phone_number: "+15550001111".to_string(),
            device_id: "dev123".to_string(),
            install_id: "inst456".to_string(),
            auth_token: "tok789".to_string(),
            session_id: Some("sess000".to_string()),
            user_id: "user42".to_string(),
            issued_at: Utc::now(),
            expires_at,
        }
    }

    #[test]
    fn test_not_expired_without_expiry() {
        let credential = sample(None);
        assert!(!credential.is_expired(Utc::now() + Duration::days(365)));
    }

    #[test]
    fn test_expired_when_past() {
        let now = Utc::now();
        let credential = sample(Some(now - Duration::seconds(1)));
        assert!(credential.is_expired(now));

        let credential = sample(Some(now + Duration::hours(1)));
        assert!(!credential.is_expired(now));
    }

    #[test]
    fn test_display_redacts_secrets() {
        let credential = sample(None);
        let display_output = credential.to_string();
        let parsed: serde_json::Value = serde_json::from_str(&display_output).unwrap();

        assert_eq!(parsed["phone_number"], "[REDACTED]");
        assert_eq!(parsed["auth_token"], "[REDACTED]");
        assert_eq!(parsed["session_id"], "[REDACTED]");
        assert_eq!(parsed["device_id"], "dev123");
        assert_eq!(parsed["user_id"], "user42");
        assert_eq!(parsed["expires_at"], json!(null));
        assert!(!display_output.contains("tok789"));
        assert!(!display_output.contains("+15550001111"));
    }

    #[test]
    fn test_serde_round_trip() {
        let credential = sample(Some(Utc::now() + Duration::hours(12)));
        let serialized = serde_json::to_string(&credential).unwrap();
        let deserialized: Credential = serde_json::from_str(&serialized).unwrap();
        assert_eq!(credential, deserialized);
    }

    #[test]
    fn test_display_shape() {
        let mut credential = sample(None);
        credential.session_id = None;
        let parsed: serde_json::Value =
            serde_json::from_str(&credential.to_string()).unwrap();
        assert_json_eq!(parsed["session_id"], json!(null));
    }
}
