//! Session contract consumed by the transport and route guards

use async_trait::async_trait;
use reel_core::error::{ReelError, ReelResult};
use serde::{Deserialize, Serialize};
use url::Url;

/// Signed-in user profile as reported by the identity provider
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Profile {
    /// Subject identifier, stable across logins
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
}

/// Identity and session state.
///
/// `get_token` never fails: implementations log the cause and return `None`.
#[async_trait]
pub trait AuthSession: Send + Sync {
    /// Whether a user is signed in
    fn is_authenticated(&self) -> bool;

    /// Whether the session state is still being established
    fn is_loading(&self) -> bool;

    /// Profile of the signed-in user
    fn user(&self) -> Option<Profile>;

    /// URL to send the user to for login; `return_path` is restored afterwards
    fn login(&self, return_path: &str) -> ReelResult<Url>;

    /// Clear local session state and return the provider logout URL
    fn logout(&self) -> ReelResult<Url>;

    /// Access token for outgoing requests
    async fn get_token(&self) -> Option<String>;
}

/// Session with a fixed token, for service accounts and tests
#[derive(Debug, Clone, Default)]
pub struct StaticSession {
    token: Option<String>,
    user: Option<Profile>,
}

impl StaticSession {
    /// Session that always presents `token`
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            user: None,
        }
    }

    /// Session with no token
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Attach a profile
    pub fn with_user(mut self, user: Profile) -> Self {
        self.user = Some(user);
        self
    }
}

#[async_trait]
impl AuthSession for StaticSession {
    fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    fn is_loading(&self) -> bool {
        false
    }

    fn user(&self) -> Option<Profile> {
        self.user.clone()
    }

    fn login(&self, _return_path: &str) -> ReelResult<Url> {
        Err(ReelError::Auth {
            message: "static sessions cannot start an interactive login".to_string(),
        })
    }

    fn logout(&self) -> ReelResult<Url> {
        Err(ReelError::Auth {
            message: "static sessions cannot log out".to_string(),
        })
    }

    async fn get_token(&self) -> Option<String> {
        self.token.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_session_token() {
        let session = StaticSession::new("secret");
        assert!(session.is_authenticated());
        assert!(!session.is_loading());
        assert_eq!(session.get_token().await.as_deref(), Some("secret"));
    }

    #[tokio::test]
    async fn test_anonymous_session() {
        let session = StaticSession::anonymous();
        assert!(!session.is_authenticated());
        assert!(session.get_token().await.is_none());
        assert!(session.user().is_none());
    }

    #[test]
    fn test_static_session_cannot_login() {
        let session = StaticSession::new("secret");
        assert!(matches!(session.login("/"), Err(ReelError::Auth { .. })));
        assert!(matches!(session.logout(), Err(ReelError::Auth { .. })));
    }

    #[test]
    fn test_profile_deserializes_provider_payload() {
        let profile: Profile = serde_json::from_str(
            r#"{"sub":"auth0|42","name":"Linh","email":"linh@reelnet.app","email_verified":true}"#,
        )
        .unwrap();
        assert_eq!(profile.sub, "auth0|42");
        assert_eq!(profile.name.as_deref(), Some("Linh"));
        assert!(profile.picture.is_none());
    }
}
