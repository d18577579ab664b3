use crate::error::AuthError;
use crate::session::credential::Credential;

#[async_trait::async_trait]
pub trait Authenticator: Send + Sync {
    async fn login(&self) -> Result<Credential, AuthError>;
    async fn refresh(&self, credential: &Credential) -> Result<Credential, AuthError>;
}

/// Supplies the one-time passcode the provider texts to the phone number
/// during login. Interactive callers prompt for it; tests hand in a fixed
/// code.
#[async_trait::async_trait]
pub trait OtpSource: Send + Sync {
    async fn passcode(&self, phone_number: &str) -> Result<String, AuthError>;
}
