//! Hosted identity provider session (OIDC authorization-code redirect flow)
//!
//! The provider performs the actual login. This type builds the redirect
//! URLs, carries the return path through the `state` parameter, and holds the
//! tokens handed back by the callback handler via [`HostedSession::complete_login`].

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use reel_config::AuthSettings;
use reel_core::error::{ReelError, ReelResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::Url;

use crate::session::{AuthSession, Profile};

/// Scopes requested on every login
const SCOPES: &str = "openid profile email";

/// Tokens are treated as expired this long before the provider says so
const EXPIRY_LEEWAY_SECS: i64 = 30;

/// Token response from the provider's token endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    /// Lifetime in seconds
    pub expires_in: i64,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoginState {
    #[serde(rename = "returnTo")]
    return_to: String,
}

#[derive(Debug, Clone)]
struct AccessToken {
    value: String,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct SessionState {
    loading: bool,
    user: Option<Profile>,
    token: Option<AccessToken>,
}

/// Session backed by a hosted identity provider
#[derive(Debug)]
pub struct HostedSession {
    settings: AuthSettings,
    state: RwLock<SessionState>,
}

impl HostedSession {
    /// Create a session; it reports `is_loading` until login completes or
    /// [`HostedSession::mark_anonymous`] is called
    pub fn new(settings: AuthSettings) -> ReelResult<Self> {
        settings.validate()?;
        Ok(Self {
            settings,
            state: RwLock::new(SessionState {
                loading: true,
                ..SessionState::default()
            }),
        })
    }

    pub fn settings(&self) -> &AuthSettings {
        &self.settings
    }

    /// Install the tokens and profile obtained by the callback handler
    pub fn complete_login(&self, grant: TokenGrant, profile: Profile) {
        let now = Utc::now();
        let expires_at = Duration::try_seconds(grant.expires_in)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .unwrap_or_else(|| {
                warn!(
                    "Token lifetime of {}s is out of range; treating token as expired",
                    grant.expires_in
                );
                now
            });
        info!("Signed in as {}", profile.sub);

        let mut state = self.state.write();
        state.loading = false;
        state.user = Some(profile);
        state.token = Some(AccessToken {
            value: grant.access_token,
            expires_at,
        });
    }

    /// Finish loading with no signed-in user
    pub fn mark_anonymous(&self) {
        let mut state = self.state.write();
        state.loading = false;
        state.user = None;
        state.token = None;
    }

    /// Recover the return path carried in a callback's `state` parameter
    pub fn decode_return_path(state: &str) -> Option<String> {
        let bytes = URL_SAFE_NO_PAD.decode(state).ok()?;
        let parsed: LoginState = serde_json::from_slice(&bytes).ok()?;
        Some(parsed.return_to)
    }

    fn provider_url(&self, path: &str) -> ReelResult<Url> {
        Url::parse(&format!("https://{}/{}", self.settings.domain, path)).map_err(|e| {
            ReelError::Auth {
                message: format!("Invalid auth domain '{}': {}", self.settings.domain, e),
            }
        })
    }

    fn encode_state(return_path: &str) -> ReelResult<String> {
        let state = LoginState {
            return_to: return_path.to_string(),
        };
        let json = serde_json::to_vec(&state).map_err(|e| ReelError::Auth {
            message: format!("Failed to encode login state: {}", e),
        })?;
        Ok(URL_SAFE_NO_PAD.encode(json))
    }

    fn is_fresh(token: &AccessToken) -> bool {
        token
            .expires_at
            .checked_sub_signed(Duration::seconds(EXPIRY_LEEWAY_SECS))
            .map_or(false, |usable_until| usable_until > Utc::now())
    }

    /// Origin of the callback URL, used as the post-logout destination
    fn app_origin(&self) -> ReelResult<String> {
        let callback = Url::parse(&self.settings.callback_url).map_err(|e| ReelError::Auth {
            message: format!("Invalid callback url: {}", e),
        })?;
        Ok(callback.origin().ascii_serialization())
    }
}

#[async_trait]
impl AuthSession for HostedSession {
    fn is_authenticated(&self) -> bool {
        self.state.read().user.is_some()
    }

    fn is_loading(&self) -> bool {
        self.state.read().loading
    }

    fn user(&self) -> Option<Profile> {
        self.state.read().user.clone()
    }

    fn login(&self, return_path: &str) -> ReelResult<Url> {
        let mut url = self.provider_url("authorize")?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("response_type", "code")
                .append_pair("client_id", &self.settings.client_id)
                .append_pair("redirect_uri", &self.settings.callback_url)
                .append_pair("scope", SCOPES)
                .append_pair("state", &Self::encode_state(return_path)?);
            if let Some(audience) = &self.settings.audience {
                query.append_pair("audience", audience);
            }
        }
        debug!("Built login redirect for return path {}", return_path);
        Ok(url)
    }

    fn logout(&self) -> ReelResult<Url> {
        let mut url = self.provider_url("v2/logout")?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.settings.client_id)
            .append_pair("returnTo", &self.app_origin()?);

        let mut state = self.state.write();
        state.user = None;
        state.token = None;
        state.loading = false;
        info!("Signed out");

        Ok(url)
    }

    async fn get_token(&self) -> Option<String> {
        let state = self.state.read();
        match &state.token {
            Some(token) if Self::is_fresh(token) => {
                Some(token.value.clone())
            }
            Some(token) => {
                warn!("Error getting access token: token expired at {}", token.expires_at);
                None
            }
            None => {
                debug!("No access token available; sending request without authorization");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests;
