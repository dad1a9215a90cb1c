//! Google OAuth credentials.
//!
//! Two credential providers sit behind [`TokenSource`]: a service account key
//! for production and an installed-app flow with a persisted user token for
//! everything else. The provider is chosen once, at startup.

mod installed;
mod service_account;
mod token;

pub use installed::{AuthorizedUser, ClientSecrets, InstalledAppTokenSource};
pub use service_account::{ServiceAccountKey, ServiceAccountTokenSource};
pub use token::{AccessToken, TokenResponse};

use async_trait::async_trait;

use crate::error::AuthError;
use crate::models::config::{AuthConfig, AuthMode};

/// Source of valid bearer tokens.
///
/// Implementations cache the current token and refresh or re-authorize
/// internally when it expires.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn access_token(&self) -> Result<String, AuthError>;
}

/// Build the token source selected by `config.mode`.
pub fn token_source(
    config: &AuthConfig,
    http: reqwest::Client,
) -> Result<Box<dyn TokenSource>, AuthError> {
    match config.mode {
        AuthMode::ServiceAccount => Ok(Box::new(ServiceAccountTokenSource::from_file(
            &config.service_account_key_file,
            config.scopes.clone(),
            http,
        )?)),
        AuthMode::Installed => Ok(Box::new(InstalledAppTokenSource::new(
            &config.credentials_file,
            &config.token_file,
            config.scopes.clone(),
            http,
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_account_mode_requires_key_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = AuthConfig {
            mode: AuthMode::ServiceAccount,
            service_account_key_file: dir.path().join("missing.json"),
            ..AuthConfig::default()
        };
        assert!(token_source(&config, reqwest::Client::new()).is_err());
    }

    #[test]
    fn test_installed_mode_is_lazy() {
        let dir = tempfile::tempdir().unwrap();
        let config = AuthConfig {
            mode: AuthMode::Installed,
            credentials_file: dir.path().join("missing.json"),
            token_file: dir.path().join("token.json"),
            ..AuthConfig::default()
        };
        assert!(token_source(&config, reqwest::Client::new()).is_ok());
    }
}
