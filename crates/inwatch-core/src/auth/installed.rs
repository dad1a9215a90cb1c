//! Installed-app OAuth flow with a persisted, refreshable user token.
//!
//! The token file uses the same field names as Google's authorized-user
//! JSON, so tokens written by other Google client libraries load as-is.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use console::style;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use url::Url;
use uuid::Uuid;

use super::token::{request_token, AccessToken, GOOGLE_TOKEN_URI};
use super::TokenSource;
use crate::error::AuthError;

const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";

const SUCCESS_PAGE: &str = "HTTP/1.1 200 OK\r\nContent-Type: text/plain; charset=utf-8\r\nConnection: close\r\n\r\n\
    The authentication flow has completed. You may close this window.";

/// Longest request line accepted on the loopback listener.
const MAX_REQUEST_LINE: u64 = 8192;

const NOT_FOUND_PAGE: &str = "HTTP/1.1 404 Not Found\r\nConnection: close\r\n\r\n";

/// OAuth client registration, from the downloaded client secrets file.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_auth_uri() -> String {
    DEFAULT_AUTH_URI.to_string()
}

fn default_token_uri() -> String {
    GOOGLE_TOKEN_URI.to_string()
}

#[derive(Debug, Deserialize)]
struct ClientSecretsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

impl ClientSecrets {
    /// Load the `installed` (or `web`) section of a client secrets file.
    pub fn from_file(path: &Path) -> Result<Self, AuthError> {
        let content = std::fs::read_to_string(path).map_err(|source| AuthError::File {
            path: path.display().to_string(),
            source,
        })?;
        let file: ClientSecretsFile =
            serde_json::from_str(&content).map_err(|e| AuthError::Malformed {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        file.installed.or(file.web).ok_or_else(|| AuthError::Malformed {
            path: path.display().to_string(),
            reason: "expected an \"installed\" or \"web\" client".to_string(),
        })
    }
}

/// Persisted user credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizedUser {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default)]
    pub expiry: Option<DateTime<Utc>>,
}

impl AuthorizedUser {
    /// Current access token, if it is still usable at `now`.
    pub fn valid_token(&self, now: DateTime<Utc>) -> Option<AccessToken> {
        let token = AccessToken {
            token: self.token.clone()?,
            expires_at: self.expiry,
        };
        token.is_valid_at(now).then_some(token)
    }

    /// Whether the stored credentials cover every scope in `scopes`.
    pub fn has_scopes(&self, scopes: &[String]) -> bool {
        self.scopes.is_empty() || scopes.iter().all(|s| self.scopes.contains(s))
    }
}

/// Token source for interactive (non-production) use.
///
/// Reuses the token file while it is valid, refreshes it when expired,
/// and runs the browser consent flow when there is no token or the refresh
/// fails. Every new token is written back to the token file.
pub struct InstalledAppTokenSource {
    credentials_file: PathBuf,
    token_file: PathBuf,
    scopes: Vec<String>,
    http: reqwest::Client,
    cached: Mutex<Option<AuthorizedUser>>,
}

impl InstalledAppTokenSource {
    pub fn new(
        credentials_file: impl Into<PathBuf>,
        token_file: impl Into<PathBuf>,
        scopes: Vec<String>,
        http: reqwest::Client,
    ) -> Self {
        Self {
            credentials_file: credentials_file.into(),
            token_file: token_file.into(),
            scopes,
            http,
            cached: Mutex::new(None),
        }
    }

    /// Read the token file, if present and readable.
    fn load_token_file(&self) -> Option<AuthorizedUser> {
        let content = match std::fs::read_to_string(&self.token_file) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("Cannot read token file {}: {}", self.token_file.display(), e);
                return None;
            }
        };

        match serde_json::from_str::<AuthorizedUser>(&content) {
            Ok(user) if user.has_scopes(&self.scopes) => Some(user),
            Ok(_) => {
                info!("Stored token does not cover the requested scopes");
                None
            }
            Err(e) => {
                warn!("Ignoring malformed token file {}: {}", self.token_file.display(), e);
                None
            }
        }
    }

    fn save_token_file(&self, user: &AuthorizedUser) -> Result<(), AuthError> {
        let file_error = |source| AuthError::File {
            path: self.token_file.display().to_string(),
            source,
        };

        if let Some(parent) = self.token_file.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(file_error)?;
        }
        let content = serde_json::to_string(user).map_err(|e| AuthError::Malformed {
            path: self.token_file.display().to_string(),
            reason: e.to_string(),
        })?;
        std::fs::write(&self.token_file, content).map_err(file_error)?;

        debug!("Saved token to {}", self.token_file.display());
        Ok(())
    }

    async fn refresh(&self, user: &AuthorizedUser) -> Result<AuthorizedUser, AuthError> {
        let refresh_token = user
            .refresh_token
            .as_deref()
            .ok_or_else(|| AuthError::Flow("no refresh token".to_string()))?;

        let issued_at = Utc::now();
        let response = request_token(
            &self.http,
            &user.token_uri,
            &[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("client_id", user.client_id.as_str()),
                ("client_secret", user.client_secret.as_str()),
            ],
        )
        .await?;

        info!("Refreshed access token");
        Ok(AuthorizedUser {
            token: Some(response.access_token.clone()),
            refresh_token: response.refresh_token.clone().or_else(|| user.refresh_token.clone()),
            expiry: response.expires_at(issued_at),
            ..user.clone()
        })
    }

    /// Run the browser consent flow against a loopback redirect.
    async fn authorize(&self) -> Result<AuthorizedUser, AuthError> {
        let secrets = ClientSecrets::from_file(&self.credentials_file)?;

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| AuthError::Flow(format!("cannot bind loopback listener: {}", e)))?;
        let port = listener
            .local_addr()
            .map_err(|e| AuthError::Flow(e.to_string()))?
            .port();
        let redirect_uri = format!("http://localhost:{}/", port);
        let state = random_state();

        let auth_url = consent_url(&secrets, &redirect_uri, &self.scopes, &state)?;

        println!(
            "{} Please visit this URL to authorize this application:\n{}",
            style("ℹ").blue(),
            style(auth_url.as_str()).cyan()
        );
        if let Err(e) = open::that(auth_url.as_str()) {
            warn!("Could not open a browser: {}", e);
        }

        let code = wait_for_code(&listener, &state).await?;

        let issued_at = Utc::now();
        let response = request_token(
            &self.http,
            &secrets.token_uri,
            &[
                ("grant_type", "authorization_code"),
                ("code", code.as_str()),
                ("client_id", secrets.client_id.as_str()),
                ("client_secret", secrets.client_secret.as_str()),
                ("redirect_uri", redirect_uri.as_str()),
            ],
        )
        .await?;

        println!("{} Authorization complete", style("✓").green());
        Ok(AuthorizedUser {
            token: Some(response.access_token.clone()),
            refresh_token: response.refresh_token.clone(),
            token_uri: secrets.token_uri,
            client_id: secrets.client_id,
            client_secret: secrets.client_secret,
            scopes: self.scopes.clone(),
            expiry: response.expires_at(issued_at),
        })
    }
}

#[async_trait]
impl TokenSource for InstalledAppTokenSource {
    async fn access_token(&self) -> Result<String, AuthError> {
        let mut cached = self.cached.lock().await;
        if cached.is_none() {
            *cached = self.load_token_file();
        }

        if let Some(token) = cached.as_ref().and_then(|u| u.valid_token(Utc::now())) {
            return Ok(token.token);
        }

        let user = match cached.take() {
            Some(user) if user.refresh_token.is_some() => match self.refresh(&user).await {
                Ok(user) => user,
                Err(e) => {
                    error!("Failed to refresh token, re-authorization required: {}", e);
                    self.authorize().await?
                }
            },
            _ => self.authorize().await?,
        };

        self.save_token_file(&user)?;
        let token = user
            .token
            .clone()
            .ok_or_else(|| AuthError::Flow("token endpoint returned no access token".to_string()))?;
        *cached = Some(user);
        Ok(token)
    }
}

/// Build the consent page URL.
fn consent_url(
    secrets: &ClientSecrets,
    redirect_uri: &str,
    scopes: &[String],
    state: &str,
) -> Result<Url, AuthError> {
    let scope = scopes.join(" ");
    Url::parse_with_params(
        &secrets.auth_uri,
        &[
            ("response_type", "code"),
            ("client_id", secrets.client_id.as_str()),
            ("redirect_uri", redirect_uri),
            ("scope", scope.as_str()),
            ("state", state),
            ("access_type", "offline"),
            ("prompt", "consent"),
        ],
    )
    .map_err(|e| AuthError::Flow(format!("invalid auth_uri {}: {}", secrets.auth_uri, e)))
}

/// Unguessable `state` value tying the redirect to this flow.
fn random_state() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Accept loopback requests until one carries the authorization response.
async fn wait_for_code(listener: &TcpListener, state: &str) -> Result<String, AuthError> {
    loop {
        let (mut stream, peer) = listener
            .accept()
            .await
            .map_err(|e| AuthError::Flow(format!("loopback accept failed: {}", e)))?;

        // The request line may arrive split over several segments.
        let mut request_line = String::new();
        BufReader::new(&mut stream)
            .take(MAX_REQUEST_LINE)
            .read_line(&mut request_line)
            .await
            .map_err(|e| AuthError::Flow(format!("loopback read failed: {}", e)))?;
        let request_line = request_line.trim_end();

        match parse_redirect(request_line, state) {
            Some(result) => {
                let page = if result.is_ok() { SUCCESS_PAGE } else { NOT_FOUND_PAGE };
                // The code is already in hand; a failed reply only affects the browser.
                let _ = stream.write_all(page.as_bytes()).await;
                return result;
            }
            None => {
                debug!(%peer, "Ignoring loopback request: {}", request_line);
                let _ = stream.write_all(NOT_FOUND_PAGE.as_bytes()).await;
            }
        }
    }
}

/// Interpret an HTTP request line received on the redirect URI.
///
/// Returns `None` for requests that are not an authorization response
/// (e.g. a favicon fetch).
fn parse_redirect(request_line: &str, expected_state: &str) -> Option<Result<String, AuthError>> {
    let target = request_line.split_whitespace().nth(1)?;
    let url = Url::parse(&format!("http://localhost{}", target)).ok()?;

    let mut code = None;
    let mut state = None;
    let mut error = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            _ => {}
        }
    }

    if let Some(error) = error {
        return Some(Err(AuthError::Flow(format!("consent denied: {}", error))));
    }
    let code = code?;
    if state.as_deref() != Some(expected_state) {
        return Some(Err(AuthError::Flow("state mismatch in redirect".to_string())));
    }
    Some(Ok(code))
}
