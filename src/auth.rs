use std::sync::Arc;

use tokio::sync::Mutex;

use crate::api::Backend;
use crate::error::{Result, RugenError};
use crate::jwt::{self, UserIdentity};
use crate::store::{CredentialStore, ACCESS_TOKEN, REFRESH_TOKEN};
use crate::types::{GenerationParameters, LoginRequest, RegisterRequest, ResultRow};

pub const LOGIN_FAILED: &str = "Invalid credentials. Please try again.";
pub const REGISTER_INVALID: &str = "Invalid data. Please check your input and try again.";
pub const REGISTER_FAILED: &str = "Registration failed. Please try again.";

#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionState {
    #[default]
    Unauthenticated,
    Authenticated(UserIdentity),
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }
}

/// Owns the session and fronts every call to the backend.
///
/// Each outbound request first passes through [`AuthGateway::authorize`],
/// which refreshes an expired access token at most once. The session lock is
/// held for the whole check so concurrent requests never race two refreshes
/// for the same token.
pub struct AuthGateway {
    backend: Arc<dyn Backend>,
    store: Arc<dyn CredentialStore>,
    session: Mutex<SessionState>,
}

impl AuthGateway {
    /// Build the gateway and resolve the initial session from persisted
    /// tokens. An access token that does not decode wipes both tokens.
    pub fn restore(backend: Arc<dyn Backend>, store: Arc<dyn CredentialStore>) -> Self {
        let state = match (store.get(ACCESS_TOKEN), store.get(REFRESH_TOKEN)) {
            (Some(access), Some(_)) => match jwt::decode(&access) {
                Ok(identity) => {
                    tracing::debug!(user = %identity.display_name(), "restored session");
                    SessionState::Authenticated(identity)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "discarding stored credentials");
                    clear_tokens(store.as_ref());
                    SessionState::Unauthenticated
                }
            },
            (None, None) => SessionState::Unauthenticated,
            _ => {
                tracing::warn!("discarding an incomplete stored token pair");
                clear_tokens(store.as_ref());
                SessionState::Unauthenticated
            }
        };

        Self {
            backend,
            store,
            session: Mutex::new(state),
        }
    }

    pub async fn state(&self) -> SessionState {
        self.session.lock().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.session.lock().await.is_authenticated()
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<UserIdentity> {
        let request = LoginRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
        };

        let tokens = self.backend.login(&request).await.map_err(|e| {
            tracing::info!(error = %e, "login rejected");
            RugenError::Auth(LOGIN_FAILED.to_string())
        })?;

        let identity = jwt::decode(&tokens.access_token).map_err(|e| {
            tracing::warn!(error = %e, "login returned an undecodable access token");
            RugenError::Auth(LOGIN_FAILED.to_string())
        })?;

        let mut session = self.session.lock().await;
        self.store.set(ACCESS_TOKEN, &tokens.access_token);
        self.store.set(REFRESH_TOKEN, &tokens.refresh_token);
        *session = SessionState::Authenticated(identity.clone());
        tracing::info!(user = %identity.display_name(), "logged in");

        Ok(identity)
    }

    /// Create an account. The session is left untouched; the caller sends the
    /// user on to the login screen.
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<()> {
        let request = RegisterRequest {
            name: name.trim().to_string(),
            email: email.trim().to_string(),
            password: password.to_string(),
        };

        self.backend.register(&request).await.map_err(|e| {
            tracing::info!(error = %e, "registration rejected");
            match e.status() {
                Some(422) => RugenError::Auth(REGISTER_INVALID.to_string()),
                _ => RugenError::Auth(REGISTER_FAILED.to_string()),
            }
        })
    }

    /// Always ends Unauthenticated. The server is told when possible, but a
    /// failed notification does not keep the local session alive.
    pub async fn logout(&self) {
        let mut session = self.session.lock().await;
        if let Some(refresh) = self.store.get(REFRESH_TOKEN) {
            if let Err(e) = self.backend.logout(&refresh).await {
                tracing::debug!(error = %e, "server logout failed, clearing locally");
            }
        }
        self.end_session(&mut session);
    }

    /// Access token to attach to the next request, refreshing it first when
    /// it has expired. Returns `None` when the request must go out anonymous.
    pub async fn authorize(&self) -> Option<String> {
        let mut session = self.session.lock().await;
        if !session.is_authenticated() {
            clear_tokens(self.store.as_ref());
            return None;
        }

        let Some(access) = self.store.get(ACCESS_TOKEN) else {
            self.end_session(&mut session);
            return None;
        };
        let identity = match jwt::decode(&access) {
            Ok(identity) => identity,
            Err(e) => {
                tracing::warn!(error = %e, "stored access token is unreadable");
                self.end_session(&mut session);
                return None;
            }
        };

        if !identity.is_expired() {
            return Some(access);
        }

        let Some(refresh) = self.store.get(REFRESH_TOKEN) else {
            tracing::info!("access token expired and no refresh token is stored");
            self.end_session(&mut session);
            return None;
        };

        tracing::debug!("access token expired, refreshing");
        let refreshed = match self.backend.refresh_token(&refresh).await {
            Ok(refreshed) => refreshed,
            Err(e) => {
                tracing::info!(error = %e, "token refresh failed");
                self.end_session(&mut session);
                return None;
            }
        };

        match jwt::decode(&refreshed.access_token) {
            Ok(identity) => {
                self.store.set(ACCESS_TOKEN, &refreshed.access_token);
                if let Some(rotated) = &refreshed.refresh_token {
                    self.store.set(REFRESH_TOKEN, rotated);
                }
                *session = SessionState::Authenticated(identity);
                Some(refreshed.access_token)
            }
            Err(e) => {
                tracing::warn!(error = %e, "refresh returned an undecodable access token");
                self.end_session(&mut session);
                None
            }
        }
    }

    pub async fn generate_data(
        &self,
        params: &GenerationParameters,
        page: u32,
    ) -> Result<Vec<ResultRow>> {
        let bearer = self.authorize().await;
        self.backend
            .generate_data(params, page, bearer.as_deref())
            .await
    }

    pub async fn block_users(&self, ids: &[String]) -> Result<()> {
        let bearer = self.authorize().await;
        self.backend.block_users(ids, bearer.as_deref()).await
    }

    pub async fn unblock_users(&self, ids: &[String]) -> Result<()> {
        let bearer = self.authorize().await;
        self.backend.unblock_users(ids, bearer.as_deref()).await
    }

    pub async fn delete_users(&self, ids: &[String]) -> Result<()> {
        let bearer = self.authorize().await;
        self.backend.delete_users(ids, bearer.as_deref()).await
    }

    fn end_session(&self, session: &mut SessionState) {
        clear_tokens(self.store.as_ref());
        if session.is_authenticated() {
            tracing::info!("session ended");
        }
        *session = SessionState::Unauthenticated;
    }
}

fn clear_tokens(store: &dyn CredentialStore) {
    store.remove(ACCESS_TOKEN);
    store.remove(REFRESH_TOKEN);
}
