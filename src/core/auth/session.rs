use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;

use super::error::{AuthError, AuthStep};
use super::identity::decode;
use crate::core::http::{HttpRequest, HttpTransport};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MinecraftSkin {
    pub id: String,
    #[serde(default)]
    pub state: String,
    pub url: String,
    #[serde(default)]
    pub variant: Option<String>,
    #[serde(default)]
    pub alias: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MinecraftCape {
    pub id: String,
    #[serde(default)]
    pub state: String,
    pub url: String,
    #[serde(default)]
    pub alias: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MinecraftProfile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub skins: Vec<MinecraftSkin>,
    #[serde(default)]
    pub capes: Vec<MinecraftCape>,
}

/// The three values a launch needs from a session.
#[derive(Debug, Clone, PartialEq)]
pub struct LaunchAuth {
    pub username: String,
    pub access_token: String,
    pub uuid: String,
}

/// A signed-in game session. Owns its access token; the profile is fetched
/// on first use and cached for the handle's lifetime.
pub struct AuthHandle {
    access_token: String,
    profile: OnceCell<MinecraftProfile>,
    transport: Arc<dyn HttpTransport>,
    profile_url: String,
}

impl std::fmt::Debug for AuthHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthHandle")
            .field("access_token", &"***")
            .field("profile", &self.profile.get())
            .finish()
    }
}

impl AuthHandle {
    pub fn new(
        access_token: String,
        transport: Arc<dyn HttpTransport>,
        profile_url: impl Into<String>,
    ) -> Self {
        Self {
            access_token,
            profile: OnceCell::new(),
            transport,
            profile_url: profile_url.into(),
        }
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub async fn profile(&self) -> Result<&MinecraftProfile, AuthError> {
        self.profile.get_or_try_init(|| self.fetch_profile()).await
    }

    pub async fn launch_auth(&self) -> Result<LaunchAuth, AuthError> {
        let profile = self.profile().await?;
        Ok(LaunchAuth {
            username: profile.name.clone(),
            access_token: self.access_token.clone(),
            uuid: profile.id.clone(),
        })
    }

    async fn fetch_profile(&self) -> Result<MinecraftProfile, AuthError> {
        let request = HttpRequest::get(&self.profile_url).bearer(&self.access_token);
        let response = self
            .transport
            .execute(request)
            .await
            .map_err(|e| AuthError::network(AuthStep::Profile, e))?;

        match response.status {
            404 => Err(AuthError::GameNotOwned),
            status if !(200..300).contains(&status) => Err(AuthError::Status {
                step: AuthStep::Profile,
                status,
            }),
            _ => decode(AuthStep::Profile, &response.body),
        }
    }
}
