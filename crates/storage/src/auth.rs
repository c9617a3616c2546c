//! Authentication seam.
//!
//! The services crate only ever talks to [`AuthProvider`]; the hosted
//! adapter lives in [`crate::remote`] and tests use [`InMemoryAuth`].

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;
use uuid::Uuid;

use training_core::model::UserId;

/// A live authenticated session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub user_id: UserId,
    pub email: String,
}

/// Profile fields captured at signup and attached to the account.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignupMetadata {
    pub full_name: String,
    pub date_of_birth: Option<String>,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AuthError {
    /// The account exists but the confirmation link was never followed.
    #[error("email not confirmed")]
    EmailNotConfirmed,

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("an account with this email already exists")]
    EmailTaken,

    #[error("auth transport error: {0}")]
    Transport(String),
}

/// Contract for the authentication backend.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// The currently signed-in session, if any.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Transport` when the backend is unreachable.
    async fn current_session(&self) -> Result<Option<AuthSession>, AuthError>;

    /// Register a new account. Depending on backend settings the account
    /// may require email confirmation before the first sign-in succeeds,
    /// in which case no session is returned.
    ///
    /// # Errors
    ///
    /// `AuthError::EmailTaken` for duplicate registrations.
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: &SignupMetadata,
    ) -> Result<Option<AuthSession>, AuthError>;

    /// Exchange credentials for a session.
    ///
    /// # Errors
    ///
    /// `AuthError::EmailNotConfirmed` keeps its own variant so the caller
    /// can show a distinct message from plain bad credentials.
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError>;

    /// Drop the current session. Signing out while signed out is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Transport` when the backend is unreachable.
    async fn sign_out(&self) -> Result<(), AuthError>;
}

struct Account {
    password: String,
    confirmed: bool,
    user_id: UserId,
    metadata: SignupMetadata,
}

/// In-memory auth backend for tests.
#[derive(Default)]
pub struct InMemoryAuth {
    accounts: Mutex<HashMap<String, Account>>,
    session: Mutex<Option<AuthSession>>,
    require_confirmation: bool,
}

impl InMemoryAuth {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// New accounts start unconfirmed and must be confirmed before the
    /// first sign-in, mirroring hosted defaults.
    #[must_use]
    pub fn with_confirmation_required() -> Self {
        Self {
            require_confirmation: true,
            ..Self::default()
        }
    }

    /// Mark an account's email as confirmed, as the emailed link would.
    pub fn confirm(&self, email: &str) {
        if let Ok(mut guard) = self.accounts.lock()
            && let Some(account) = guard.get_mut(email)
        {
            account.confirmed = true;
        }
    }

    /// Signup metadata recorded for an account, for assertions.
    #[must_use]
    pub fn metadata_of(&self, email: &str) -> Option<SignupMetadata> {
        self.accounts
            .lock()
            .ok()?
            .get(email)
            .map(|a| a.metadata.clone())
    }

    fn lock<'a, T>(&self, mutex: &'a Mutex<T>) -> Result<std::sync::MutexGuard<'a, T>, AuthError> {
        mutex.lock().map_err(|e| AuthError::Transport(e.to_string()))
    }
}

#[async_trait]
impl AuthProvider for InMemoryAuth {
    async fn current_session(&self) -> Result<Option<AuthSession>, AuthError> {
        Ok(self.lock(&self.session)?.clone())
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: &SignupMetadata,
    ) -> Result<Option<AuthSession>, AuthError> {
        let mut accounts = self.lock(&self.accounts)?;
        if accounts.contains_key(email) {
            return Err(AuthError::EmailTaken);
        }
        let user_id = UserId::new(Uuid::new_v4());
        accounts.insert(
            email.to_string(),
            Account {
                password: password.to_string(),
                confirmed: !self.require_confirmation,
                user_id,
                metadata: metadata.clone(),
            },
        );
        if self.require_confirmation {
            return Ok(None);
        }
        let session = AuthSession {
            user_id,
            email: email.to_string(),
        };
        *self.lock(&self.session)? = Some(session.clone());
        Ok(Some(session))
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let accounts = self.lock(&self.accounts)?;
        let account = accounts.get(email).ok_or(AuthError::InvalidCredentials)?;
        if account.password != password {
            return Err(AuthError::InvalidCredentials);
        }
        if !account.confirmed {
            return Err(AuthError::EmailNotConfirmed);
        }
        let session = AuthSession {
            user_id: account.user_id,
            email: email.to_string(),
        };
        drop(accounts);
        *self.lock(&self.session)? = Some(session.clone());
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        *self.lock(&self.session)? = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sign_up_then_sign_in() {
        let auth = InMemoryAuth::new();
        let meta = SignupMetadata {
            full_name: "Dana Mercer".into(),
            date_of_birth: Some("04/12/1991".into()),
        };
        let session = auth
            .sign_up("dana@example.com", "hunter2!", &meta)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(session.email, "dana@example.com");

        auth.sign_out().await.unwrap();
        assert_eq!(auth.current_session().await.unwrap(), None);

        let again = auth.sign_in("dana@example.com", "hunter2!").await.unwrap();
        assert_eq!(again.user_id, session.user_id);
    }

    #[tokio::test]
    async fn unconfirmed_account_is_told_apart_from_bad_password() {
        let auth = InMemoryAuth::with_confirmation_required();
        let pending = auth
            .sign_up("new@example.com", "secret#1", &SignupMetadata::default())
            .await
            .unwrap();
        assert!(pending.is_none());

        let err = auth.sign_in("new@example.com", "secret#1").await.unwrap_err();
        assert!(matches!(err, AuthError::EmailNotConfirmed));

        auth.confirm("new@example.com");
        assert!(auth.sign_in("new@example.com", "secret#1").await.is_ok());

        let err = auth.sign_in("new@example.com", "wrong").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn duplicate_email_rejected() {
        let auth = InMemoryAuth::new();
        auth.sign_up("a@b.com", "p@ss1234", &SignupMetadata::default())
            .await
            .unwrap();
        let err = auth
            .sign_up("a@b.com", "other#987", &SignupMetadata::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::EmailTaken));
    }
}
