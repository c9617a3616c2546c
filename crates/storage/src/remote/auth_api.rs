use std::str::FromStr;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use training_core::model::UserId;

use super::RemoteStore;
use crate::auth::{AuthError, AuthProvider, AuthSession, SignupMetadata};

/// GoTrue-style auth adapter sharing the [`RemoteStore`] token state, so
/// data requests pick up the session's access token automatically.
#[derive(Clone)]
pub struct RemoteAuth {
    store: RemoteStore,
    session: Arc<Mutex<Option<AuthSession>>>,
}

#[derive(Debug, Serialize)]
struct CredentialsRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct SignupRequest<'a> {
    email: &'a str,
    password: &'a str,
    data: SignupData<'a>,
}

#[derive(Debug, Serialize)]
struct SignupData<'a> {
    full_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    date_of_birth: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    user: Option<UserPayload>,
}

#[derive(Debug, Deserialize)]
struct UserPayload {
    id: String,
    email: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct ErrorBody {
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

impl ErrorBody {
    fn message(&self) -> &str {
        self.msg
            .as_deref()
            .or(self.error_description.as_deref())
            .unwrap_or_default()
    }
}

fn transport(e: reqwest::Error) -> AuthError {
    AuthError::Transport(e.to_string())
}

fn session_from(payload: &UserPayload, fallback_email: &str) -> Result<AuthSession, AuthError> {
    let user_id =
        UserId::from_str(&payload.id).map_err(|e| AuthError::Transport(e.to_string()))?;
    Ok(AuthSession {
        user_id,
        email: payload
            .email
            .clone()
            .unwrap_or_else(|| fallback_email.to_string()),
    })
}

impl RemoteAuth {
    #[must_use]
    pub fn new(store: RemoteStore) -> Self {
        Self {
            store,
            session: Arc::new(Mutex::new(None)),
        }
    }

    fn remember(&self, session: Option<AuthSession>, token: Option<String>) -> Result<(), AuthError> {
        self.store
            .set_token(token)
            .map_err(|e| AuthError::Transport(e.to_string()))?;
        let mut guard = self
            .session
            .lock()
            .map_err(|e| AuthError::Transport(e.to_string()))?;
        *guard = session;
        Ok(())
    }

    async fn read_error(response: reqwest::Response) -> ErrorBody {
        response.json().await.unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl AuthProvider for RemoteAuth {
    async fn current_session(&self) -> Result<Option<AuthSession>, AuthError> {
        let guard = self
            .session
            .lock()
            .map_err(|e| AuthError::Transport(e.to_string()))?;
        Ok(guard.clone())
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: &SignupMetadata,
    ) -> Result<Option<AuthSession>, AuthError> {
        let payload = SignupRequest {
            email,
            password,
            data: SignupData {
                full_name: &metadata.full_name,
                date_of_birth: metadata.date_of_birth.as_deref(),
            },
        };
        let response = self
            .store
            .client
            .post(self.store.config.auth_url("signup"))
            .header("apikey", &self.store.config.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            let body = Self::read_error(response).await;
            if body.message().to_ascii_lowercase().contains("registered") {
                return Err(AuthError::EmailTaken);
            }
            return Err(AuthError::Transport(body.message().to_string()));
        }

        let body: TokenResponse = response.json().await.map_err(transport)?;
        match (body.access_token, body.user) {
            // Confirmation disabled: the signup response carries a session.
            (Some(token), Some(user)) => {
                let session = session_from(&user, email)?;
                self.remember(Some(session.clone()), Some(token))?;
                Ok(Some(session))
            }
            // Confirmation pending; the user signs in after the email link.
            _ => Ok(None),
        }
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let payload = CredentialsRequest { email, password };
        let response = self
            .store
            .client
            .post(self.store.config.auth_url("token"))
            .header("apikey", &self.store.config.api_key)
            .query(&[("grant_type", "password")])
            .json(&payload)
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            let body = Self::read_error(response).await;
            let message = body.message().to_ascii_lowercase();
            if message.contains("not confirmed") {
                return Err(AuthError::EmailNotConfirmed);
            }
            return Err(AuthError::InvalidCredentials);
        }

        let body: TokenResponse = response.json().await.map_err(transport)?;
        let token = body
            .access_token
            .ok_or_else(|| AuthError::Transport("token missing from response".into()))?;
        let user = body
            .user
            .ok_or_else(|| AuthError::Transport("user missing from response".into()))?;
        let session = session_from(&user, email)?;
        self.remember(Some(session.clone()), Some(token))?;
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let token = {
            let guard = self
                .session
                .lock()
                .map_err(|e| AuthError::Transport(e.to_string()))?;
            guard.clone()
        };
        if token.is_some() {
            // Best effort: the local session is dropped even if revocation
            // cannot reach the backend.
            let _ = self
                .store
                .client
                .post(self.store.config.auth_url("logout"))
                .header("apikey", &self.store.config.api_key)
                .bearer_auth(
                    self.store
                        .bearer()
                        .map_err(|e| AuthError::Transport(e.to_string()))?,
                )
                .send()
                .await;
        }
        self.remember(None, None)
    }
}
