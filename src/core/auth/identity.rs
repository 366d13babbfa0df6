// ─── Identity Provider ───
// Microsoft OAuth 2.0 device-code sign-in with a local token cache.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::error::{AuthError, AuthStep};
use crate::core::config::AuthConfig;
use crate::core::error::LauncherError;
use crate::core::http::{HttpRequest, HttpTransport};

const DEVICE_CODE_GRANT: &str = "urn:ietf:params:oauth:grant-type:device_code";
const EXPIRY_SKEW_SECS: i64 = 60;

#[derive(Debug, Clone, PartialEq)]
pub struct IdentityToken {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// With `quick` set, only cached credentials are acceptable.
    async fn acquire(&self, quick: bool) -> Result<IdentityToken, AuthError>;
}

/// What the user needs to finish signing in on another device.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceCodePrompt {
    pub user_code: String,
    pub verification_uri: String,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DeviceCodeResponse {
    device_code: String,
    #[serde(flatten)]
    prompt: DeviceCodePrompt,
    expires_in: u64,
    #[serde(default = "default_interval")]
    interval: u64,
}

fn default_interval() -> u64 {
    5
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    expires_in: i64,
}

#[derive(Debug, Deserialize)]
struct OAuthError {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

// ─── Token cache ────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CachedLogin {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl CachedLogin {
    fn from_response(response: TokenResponse, now: DateTime<Utc>) -> Self {
        Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            expires_at: now + chrono::Duration::seconds(response.expires_in),
        }
    }

    /// Expired, or about to expire within the skew margin.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at - chrono::Duration::seconds(EXPIRY_SKEW_SECS) <= now
    }

    fn token(&self) -> IdentityToken {
        IdentityToken {
            access_token: self.access_token.clone(),
            expires_at: self.expires_at,
        }
    }
}

/// `login_cache.json`; owner-only on Unix.
pub struct TokenCache {
    path: PathBuf,
}

impl TokenCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// An unreadable or corrupt cache counts as empty.
    pub async fn load(&self) -> Option<CachedLogin> {
        let raw = tokio::fs::read(&self.path).await.ok()?;
        match serde_json::from_slice(&raw) {
            Ok(login) => Some(login),
            Err(e) => {
                warn!("Ignoring corrupt login cache {:?}: {}", self.path, e);
                None
            }
        }
    }

    pub async fn save(&self, login: &CachedLogin) -> Result<(), LauncherError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| LauncherError::io(parent, e))?;
        }
        let json = serde_json::to_vec_pretty(login)?;
        tokio::fs::write(&self.path, json)
            .await
            .map_err(|e| LauncherError::io(&self.path, e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .await
                .map_err(|e| LauncherError::io(&self.path, e))?;
        }
        Ok(())
    }

    pub async fn clear(&self) -> Result<(), LauncherError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(LauncherError::io(&self.path, e)),
        }
    }
}

// ─── Device-code provider ───────────────────────────

pub type PromptFn = Arc<dyn Fn(&DeviceCodePrompt) + Send + Sync>;

pub struct MsaDeviceCodeProvider {
    transport: Arc<dyn HttpTransport>,
    config: AuthConfig,
    cache: TokenCache,
    prompt: PromptFn,
}

impl MsaDeviceCodeProvider {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        config: AuthConfig,
        cache: TokenCache,
        prompt: PromptFn,
    ) -> Self {
        Self {
            transport,
            config,
            cache,
            prompt,
        }
    }

    /// Cached token if still valid, else a refresh-token grant.
    async fn acquire_silent(&self) -> Option<IdentityToken> {
        let cached = self.cache.load().await?;
        if !cached.is_expired_at(Utc::now()) {
            debug!("Using cached identity token");
            return Some(cached.token());
        }

        let refresh_token = cached.refresh_token.as_deref()?;
        info!("Cached identity token expired, refreshing");
        match self.refresh(refresh_token).await {
            Ok(login) => Some(login.token()),
            // Revoked or expired grant: the cached login is useless now.
            Err(e @ AuthError::Status { .. }) => {
                warn!("Refresh token rejected: {}", e);
                if let Err(e) = self.cache.clear().await {
                    warn!("Could not clear login cache: {}", e);
                }
                None
            }
            Err(e) => {
                warn!("Token refresh failed: {}", e);
                None
            }
        }
    }

    async fn refresh(&self, refresh_token: &str) -> Result<CachedLogin, AuthError> {
        let request = HttpRequest::post_form(
            &self.config.token_url,
            &[
                ("grant_type", "refresh_token"),
                ("client_id", &self.config.client_id),
                ("refresh_token", refresh_token),
                ("scope", &self.config.scope),
            ],
        );
        let response = self
            .transport
            .execute(request)
            .await
            .map_err(|e| AuthError::network(AuthStep::Identity, e))?;
        if !response.is_success() {
            return Err(AuthError::Status {
                step: AuthStep::Identity,
                status: response.status,
            });
        }
        let tokens: TokenResponse = decode(AuthStep::Identity, &response.body)?;
        self.store(tokens).await
    }

    async fn acquire_interactive(&self) -> Result<CachedLogin, AuthError> {
        let request = HttpRequest::post_form(
            &self.config.device_code_url,
            &[
                ("client_id", &self.config.client_id),
                ("scope", &self.config.scope),
            ],
        );
        let response = self
            .transport
            .execute(request)
            .await
            .map_err(|e| AuthError::network(AuthStep::Identity, e))?;
        if !response.is_success() {
            return Err(AuthError::Status {
                step: AuthStep::Identity,
                status: response.status,
            });
        }
        let device: DeviceCodeResponse = decode(AuthStep::Identity, &response.body)?;
        (self.prompt)(&device.prompt);

        let deadline = tokio::time::Instant::now() + Duration::from_secs(device.expires_in);
        let mut interval = device.interval;

        loop {
            if tokio::time::Instant::now() >= deadline {
                return Err(AuthError::Identity("device code expired".into()));
            }
            tokio::time::sleep(Duration::from_secs(interval)).await;

            let poll = HttpRequest::post_form(
                &self.config.token_url,
                &[
                    ("grant_type", DEVICE_CODE_GRANT),
                    ("client_id", &self.config.client_id),
                    ("device_code", &device.device_code),
                ],
            );
            let response = self
                .transport
                .execute(poll)
                .await
                .map_err(|e| AuthError::network(AuthStep::Identity, e))?;

            if response.is_success() {
                let tokens: TokenResponse = decode(AuthStep::Identity, &response.body)?;
                info!("Signed in with Microsoft account");
                return self.store(tokens).await;
            }

            let error: OAuthError = decode(AuthStep::Identity, &response.body)?;
            match error.error.as_str() {
                "authorization_pending" => {}
                "slow_down" => interval += 5,
                "expired_token" => {
                    return Err(AuthError::Identity("device code expired".into()));
                }
                other => {
                    return Err(AuthError::Identity(
                        error
                            .error_description
                            .unwrap_or_else(|| other.to_string()),
                    ));
                }
            }
        }
    }

    async fn store(&self, tokens: TokenResponse) -> Result<CachedLogin, AuthError> {
        let login = CachedLogin::from_response(tokens, Utc::now());
        if let Err(e) = self.cache.save(&login).await {
            warn!("Could not write login cache: {}", e);
        }
        Ok(login)
    }
}

#[async_trait]
impl IdentityProvider for MsaDeviceCodeProvider {
    async fn acquire(&self, quick: bool) -> Result<IdentityToken, AuthError> {
        if let Some(token) = self.acquire_silent().await {
            return Ok(token);
        }
        if quick {
            return Err(AuthError::QuickAuthUnavailable);
        }
        Ok(self.acquire_interactive().await?.token())
    }
}

pub(crate) fn decode<T: serde::de::DeserializeOwned>(
    step: AuthStep,
    body: &[u8],
) -> Result<T, AuthError> {
    serde_json::from_slice(body).map_err(|e| AuthError::Malformed {
        step,
        reason: e.to_string(),
    })
}
