// ─── Auth Chain ───
// identity token → Xbox Live user token → XSTS token → game access token.
// Each hop runs once; retrying is the caller's decision.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use super::error::{describe_xerr, AuthError, AuthStep};
use super::identity::{decode, IdentityProvider};
use super::session::AuthHandle;
use crate::core::config::AuthConfig;
use crate::core::http::{HttpRequest, HttpResponse, HttpTransport};

/// Relying party Xbox Live expects for the user token; plain http by protocol.
const XBOX_RELYING_PARTY: &str = "http://auth.xboxlive.com";
const XBOX_SITE_NAME: &str = "user.auth.xboxlive.com";
const GAME_RELYING_PARTY: &str = "rp://api.minecraftservices.com/";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct XboxTokenResponse {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    display_claims: Option<DisplayClaims>,
}

#[derive(Debug, Deserialize)]
struct DisplayClaims {
    #[serde(default)]
    xui: Vec<UserClaim>,
}

#[derive(Debug, Deserialize)]
struct UserClaim {
    #[serde(default)]
    uhs: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct XstsRejection {
    #[serde(rename = "XErr")]
    xerr: u64,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GameLoginResponse {
    #[serde(default)]
    access_token: Option<String>,
}

/// Xbox Live user token plus the user hash from its claims.
#[derive(Debug, Clone, PartialEq)]
pub struct XboxUserToken {
    pub token: String,
    pub uhs: String,
}

pub struct AuthChain {
    identity: Arc<dyn IdentityProvider>,
    transport: Arc<dyn HttpTransport>,
    config: AuthConfig,
}

impl AuthChain {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        transport: Arc<dyn HttpTransport>,
        config: AuthConfig,
    ) -> Self {
        Self {
            identity,
            transport,
            config,
        }
    }

    /// Run all four hops. `quick` restricts step one to cached credentials.
    pub async fn authenticate(&self, quick: bool) -> Result<AuthHandle, AuthError> {
        let identity = self.identity.acquire(quick).await?;
        debug!("Identity token acquired, expires {}", identity.expires_at);

        let user = self.xbox_user_token(&identity.access_token).await?;
        let xsts = self.xsts_token(&user.token).await?;
        let access_token = self.game_login(&user.uhs, &xsts).await?;

        info!("Signed in to game services");
        Ok(AuthHandle::new(
            access_token,
            self.transport.clone(),
            &self.config.profile_url,
        ))
    }

    pub async fn xbox_user_token(&self, identity_token: &str) -> Result<XboxUserToken, AuthError> {
        let body = json!({
            "RelyingParty": XBOX_RELYING_PARTY,
            "TokenType": "JWT",
            "Properties": {
                "AuthMethod": "RPS",
                "SiteName": XBOX_SITE_NAME,
                "RpsTicket": format!("d={}", identity_token),
            }
        });
        let response = self
            .post_xbox(AuthStep::XboxLive, &self.config.xbox_user_auth_url, body)
            .await?;
        let parsed: XboxTokenResponse = decode(AuthStep::XboxLive, &response.body)?;

        let token = non_empty(parsed.token).ok_or(AuthError::AuthorizationFailed {
            step: AuthStep::XboxLive,
        })?;
        let uhs = parsed
            .display_claims
            .and_then(|claims| claims.xui.into_iter().next())
            .and_then(|claim| non_empty(claim.uhs))
            .ok_or_else(|| AuthError::Malformed {
                step: AuthStep::XboxLive,
                reason: "missing DisplayClaims.xui[0].uhs".into(),
            })?;

        Ok(XboxUserToken { token, uhs })
    }

    pub async fn xsts_token(&self, user_token: &str) -> Result<String, AuthError> {
        let body = json!({
            "Properties": {
                "SandboxId": "RETAIL",
                "UserTokens": [user_token],
            },
            "RelyingParty": GAME_RELYING_PARTY,
            "TokenType": "JWT",
        });
        let response = self
            .post_xbox(AuthStep::Xsts, &self.config.xsts_authorize_url, body)
            .await?;
        let parsed: XboxTokenResponse = decode(AuthStep::Xsts, &response.body)?;

        non_empty(parsed.token).ok_or(AuthError::AuthorizationFailed {
            step: AuthStep::Xsts,
        })
    }

    pub async fn game_login(&self, uhs: &str, xsts_token: &str) -> Result<String, AuthError> {
        let body = json!({
            "identityToken": format!("XBL3.0 x={};{}", uhs, xsts_token),
            "ensureLegacyEnabled": true,
        });
        let request = HttpRequest::post_json(&self.config.game_login_url, body)
            .header("Accept", "application/json");
        let response = self.send(AuthStep::GameLogin, request).await?;
        let parsed: GameLoginResponse = decode(AuthStep::GameLogin, &response.body)?;

        non_empty(parsed.access_token).ok_or(AuthError::AuthorizationFailed {
            step: AuthStep::GameLogin,
        })
    }

    async fn post_xbox(
        &self,
        step: AuthStep,
        url: &str,
        body: serde_json::Value,
    ) -> Result<HttpResponse, AuthError> {
        let request = HttpRequest::post_json(url, body)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .header("x-xbl-contract-version", "1");
        self.send(step, request).await
    }

    async fn send(&self, step: AuthStep, request: HttpRequest) -> Result<HttpResponse, AuthError> {
        let response = self
            .transport
            .execute(request)
            .await
            .map_err(|e| AuthError::network(step, e))?;

        if response.is_success() {
            return Ok(response);
        }

        if step == AuthStep::Xsts && response.status == 401 {
            if let Ok(rejection) = serde_json::from_slice::<XstsRejection>(&response.body) {
                let message = rejection
                    .message
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| describe_xerr(rejection.xerr).to_string());
                return Err(AuthError::XboxRejected {
                    code: rejection.xerr,
                    message,
                });
            }
        }

        Err(AuthError::Status {
            step,
            status: response.status,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::auth::identity::{IdentityToken, MockIdentityProvider};
    use crate::core::http::testing::FakeTransport;
    use crate::core::http::RequestBody;
    use chrono::Utc;

    fn identity_ok() -> MockIdentityProvider {
        let mut identity = MockIdentityProvider::new();
        identity.expect_acquire().returning(|_| {
            Ok(IdentityToken {
                access_token: "ms-token".into(),
                expires_at: Utc::now() + chrono::Duration::hours(1),
            })
        });
        identity
    }

    fn route_user_auth(transport: &FakeTransport, config: &AuthConfig) {
        transport.route_json(
            &config.xbox_user_auth_url,
            json!({
                "IssueInstant": "2024-01-01T00:00:00Z",
                "NotAfter": "2024-01-15T00:00:00Z",
                "Token": "xbl-token",
                "DisplayClaims": {"xui": [{"uhs": "1234"}]}
            }),
        );
    }

    #[tokio::test]
    async fn full_chain_produces_game_token() {
        let config = AuthConfig::default();
        let transport = Arc::new(FakeTransport::new());
        route_user_auth(&transport, &config);
        transport.route_json(
            &config.xsts_authorize_url,
            json!({"Token": "xsts-token", "DisplayClaims": {"xui": [{"uhs": "1234"}]}}),
        );
        transport.route_json(
            &config.game_login_url,
            json!({"access_token": "mc-token", "expires_in": 86400}),
        );

        let chain = AuthChain::new(Arc::new(identity_ok()), transport.clone(), config.clone());
        let handle = chain.authenticate(false).await.unwrap();
        assert_eq!(handle.access_token(), "mc-token");

        let requests = transport.requests();
        assert_eq!(requests.len(), 3);
        match &requests[0].body {
            RequestBody::Json(body) => {
                assert_eq!(body["RelyingParty"], "http://auth.xboxlive.com");
                assert_eq!(body["Properties"]["RpsTicket"], "d=ms-token");
            }
            other => panic!("unexpected body {:?}", other),
        }
        match &requests[2].body {
            RequestBody::Json(body) => {
                assert_eq!(body["identityToken"], "XBL3.0 x=1234;xsts-token");
            }
            other => panic!("unexpected body {:?}", other),
        }
    }

    #[tokio::test]
    async fn missing_user_token_stops_before_xsts() {
        let config = AuthConfig::default();
        let transport = Arc::new(FakeTransport::new());
        transport.route_json(
            &config.xbox_user_auth_url,
            json!({"DisplayClaims": {"xui": [{"uhs": "1234"}]}}),
        );

        let chain = AuthChain::new(Arc::new(identity_ok()), transport.clone(), config.clone());
        let err = chain.authenticate(false).await.unwrap_err();

        assert!(matches!(
            err,
            AuthError::AuthorizationFailed {
                step: AuthStep::XboxLive
            }
        ));
        assert_eq!(transport.request_count(&config.xsts_authorize_url), 0);
    }

    #[tokio::test]
    async fn empty_xsts_token_fails_at_xsts_step() {
        let config = AuthConfig::default();
        let transport = Arc::new(FakeTransport::new());
        route_user_auth(&transport, &config);
        transport.route_json(&config.xsts_authorize_url, json!({"Token": ""}));

        let chain = AuthChain::new(Arc::new(identity_ok()), transport.clone(), config.clone());
        let err = chain.authenticate(false).await.unwrap_err();

        assert!(matches!(
            err,
            AuthError::AuthorizationFailed {
                step: AuthStep::Xsts
            }
        ));
        assert_eq!(err.step(), Some(AuthStep::Xsts));
        assert_eq!(transport.request_count(&config.game_login_url), 0);
    }

    #[tokio::test]
    async fn game_login_without_access_token_fails_at_game_login_step() {
        let config = AuthConfig::default();
        let transport = Arc::new(FakeTransport::new());
        route_user_auth(&transport, &config);
        transport.route_json(&config.xsts_authorize_url, json!({"Token": "xsts-token"}));
        transport.route_json(&config.game_login_url, json!({}));

        let chain = AuthChain::new(Arc::new(identity_ok()), transport, config);
        let err = chain.authenticate(false).await.unwrap_err();

        assert!(matches!(
            err,
            AuthError::AuthorizationFailed {
                step: AuthStep::GameLogin
            }
        ));
        assert_eq!(err.step(), Some(AuthStep::GameLogin));
    }

    #[tokio::test]
    async fn unreachable_hop_is_a_network_error_not_a_missing_field() {
        let config = AuthConfig::default();
        let transport = Arc::new(FakeTransport::new());
        route_user_auth(&transport, &config);

        let chain = AuthChain::new(Arc::new(identity_ok()), transport, config);
        let err = chain.authenticate(false).await.unwrap_err();

        assert!(matches!(
            err,
            AuthError::Network {
                step: AuthStep::Xsts,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn xsts_rejection_carries_xerr_detail() {
        let config = AuthConfig::default();
        let transport = Arc::new(FakeTransport::new());
        route_user_auth(&transport, &config);
        transport.route(
            &config.xsts_authorize_url,
            401,
            serde_json::to_vec(&json!({
                "Identity": "0",
                "XErr": 2148916233u64,
                "Message": "",
                "Redirect": "https://start.ui.xboxlive.com/CreateAccount"
            }))
            .unwrap(),
        );

        let chain = AuthChain::new(Arc::new(identity_ok()), transport, config);
        match chain.authenticate(false).await.unwrap_err() {
            AuthError::XboxRejected { code, message } => {
                assert_eq!(code, 2148916233);
                assert!(message.contains("Xbox profile"));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[tokio::test]
    async fn quick_auth_unavailable_is_passed_through_untouched() {
        let mut identity = MockIdentityProvider::new();
        identity
            .expect_acquire()
            .withf(|quick| *quick)
            .times(1)
            .returning(|_| Err(AuthError::QuickAuthUnavailable));
        let transport = Arc::new(FakeTransport::new());

        let chain = AuthChain::new(Arc::new(identity), transport.clone(), AuthConfig::default());
        let err = chain.authenticate(true).await.unwrap_err();

        assert!(matches!(err, AuthError::QuickAuthUnavailable));
        assert_eq!(transport.total_requests(), 0);
    }
}
