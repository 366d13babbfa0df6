use std::fmt;

use thiserror::Error;

use crate::core::error::{ErrorKind, LauncherError};

/// One round trip of the sign-in chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStep {
    Identity,
    XboxLive,
    Xsts,
    GameLogin,
    Profile,
}

impl fmt::Display for AuthStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AuthStep::Identity => "identity provider",
            AuthStep::XboxLive => "Xbox Live user authentication",
            AuthStep::Xsts => "XSTS authorization",
            AuthStep::GameLogin => "game service login",
            AuthStep::Profile => "game profile",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("quick auth unavailable: no valid cached credential")]
    QuickAuthUnavailable,

    #[error("identity provider: {0}")]
    Identity(String),

    #[error("{step}: request failed")]
    Network {
        step: AuthStep,
        #[source]
        source: Box<LauncherError>,
    },

    #[error("{step}: unexpected HTTP status {status}")]
    Status { step: AuthStep, status: u16 },

    /// The response parsed but carried no usable token.
    #[error("{step}: authorization failed, response carried no token")]
    AuthorizationFailed { step: AuthStep },

    #[error("{step}: malformed response: {reason}")]
    Malformed { step: AuthStep, reason: String },

    #[error("Xbox Live rejected the account ({code}): {message}")]
    XboxRejected { code: u64, message: String },

    #[error("this account does not own the game")]
    GameNotOwned,
}

impl AuthError {
    pub fn network(step: AuthStep, source: LauncherError) -> Self {
        AuthError::Network {
            step,
            source: Box::new(source),
        }
    }

    /// The hop that failed, when one applies.
    pub fn step(&self) -> Option<AuthStep> {
        match self {
            AuthError::QuickAuthUnavailable | AuthError::Identity(_) => Some(AuthStep::Identity),
            AuthError::Network { step, .. }
            | AuthError::Status { step, .. }
            | AuthError::AuthorizationFailed { step }
            | AuthError::Malformed { step, .. } => Some(*step),
            AuthError::XboxRejected { .. } => Some(AuthStep::Xsts),
            AuthError::GameNotOwned => Some(AuthStep::Profile),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::Network { .. } | AuthError::Status { .. } => ErrorKind::Network,
            AuthError::AuthorizationFailed { .. } | AuthError::Malformed { .. } => {
                ErrorKind::Decode
            }
            AuthError::QuickAuthUnavailable
            | AuthError::Identity(_)
            | AuthError::XboxRejected { .. }
            | AuthError::GameNotOwned => ErrorKind::State,
        }
    }
}

/// Readable explanation for the XSTS `XErr` codes users actually hit.
pub fn describe_xerr(code: u64) -> &'static str {
    match code {
        2148916233 => "the account has no Xbox profile; sign in at xbox.com first",
        2148916235 => "Xbox Live is not available in the account's region",
        2148916236 | 2148916237 => "the account needs adult verification on xbox.com",
        2148916238 => "child accounts must be added to a family by an adult",
        _ => "unknown XSTS error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_and_empty_response_are_distinguishable() {
        let network = AuthError::network(
            AuthStep::XboxLive,
            LauncherError::Transport {
                url: "https://user.auth.xboxlive.com".into(),
                reason: "timeout".into(),
            },
        );
        let empty = AuthError::AuthorizationFailed {
            step: AuthStep::XboxLive,
        };

        assert_eq!(network.kind(), ErrorKind::Network);
        assert_eq!(empty.kind(), ErrorKind::Decode);
        assert_eq!(network.step(), empty.step());
        assert!(empty.to_string().contains("Xbox Live"));
    }

    #[test]
    fn known_xerr_codes_have_explanations() {
        assert!(describe_xerr(2148916238).contains("family"));
        assert_eq!(describe_xerr(1), "unknown XSTS error");
    }
}
