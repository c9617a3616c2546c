//! Identity resolution and account lifecycle.
//!
//! The display name on the home screen must render even when the profile
//! backend is down, so every lookup in the fallback chain fails silently:
//! remote profile `first_name`, then the first token of `full_name`, then
//! the device cache, then the empty string.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use storage::auth::{AuthProvider, AuthSession, SignupMetadata};
use storage::repository::{
    CACHED_IDENTITY_KEY, DeviceCache, PENDING_PROFILE_KEY, ProfileRepository,
};
use training_core::model::{Profile, SignupForm, UserId};

use crate::error::IdentityError;

/// The identity the home screen renders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedIdentity {
    pub first_name: String,
    pub email: String,
}

/// Shape of the cached-identity blob on device.
#[derive(Debug, Serialize, Deserialize, Default)]
struct CachedIdentity {
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    email: String,
}

/// Profile edits made before login, applied on the next sign-in.
#[derive(Debug, Serialize, Deserialize, Default)]
struct PendingProfile {
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    date_of_birth: Option<String>,
}

#[derive(Clone)]
pub struct IdentityService {
    auth: Arc<dyn AuthProvider>,
    profiles: Arc<dyn ProfileRepository>,
    cache: Arc<dyn DeviceCache>,
}

impl IdentityService {
    #[must_use]
    pub fn new(
        auth: Arc<dyn AuthProvider>,
        profiles: Arc<dyn ProfileRepository>,
        cache: Arc<dyn DeviceCache>,
    ) -> Self {
        Self {
            auth,
            profiles,
            cache,
        }
    }

    /// The signed-in user, if any.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::Auth` when the backend is unreachable.
    pub async fn current_user(&self) -> Result<Option<AuthSession>, IdentityError> {
        Ok(self.auth.current_session().await?)
    }

    /// Resolve the identity to greet the user with. Never fails; each
    /// source that errors or comes back blank falls through to the next.
    pub async fn resolve(&self) -> ResolvedIdentity {
        let session = match self.auth.current_session().await {
            Ok(Some(session)) => Some(session),
            Ok(None) | Err(_) => None,
        };

        if let Some(session) = &session {
            let profile = match self.profiles.fetch_profile(session.user_id).await {
                Ok(profile) => profile,
                Err(_) => None,
            };
            if let Some(profile) = profile
                && let Some(first_name) = profile.display_first_name()
            {
                let resolved = ResolvedIdentity {
                    first_name: first_name.to_string(),
                    email: session.email.clone(),
                };
                self.remember(&resolved).await;
                return resolved;
            }
        }

        // Fall back to whatever the device remembers from a previous run.
        let cached = match self.cache.get(CACHED_IDENTITY_KEY).await {
            Ok(Some(value)) => serde_json::from_value::<CachedIdentity>(value).unwrap_or_default(),
            Ok(None) | Err(_) => CachedIdentity::default(),
        };
        ResolvedIdentity {
            first_name: cached.first_name,
            email: session.map(|s| s.email).unwrap_or(cached.email),
        }
    }

    async fn remember(&self, identity: &ResolvedIdentity) {
        let blob = serde_json::json!({
            "first_name": identity.first_name,
            "email": identity.email,
        });
        // Cache writes are best effort.
        let _ = self.cache.set(CACHED_IDENTITY_KEY, &blob).await;
    }

    /// Register an account from a signup form. The caller runs
    /// `SignupForm::validate` first; this method assumes a valid form.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::Auth` for backend failures, duplicate
    /// emails included.
    pub async fn sign_up(&self, form: &SignupForm) -> Result<Option<AuthSession>, IdentityError> {
        let metadata = SignupMetadata {
            full_name: form.name.trim().to_string(),
            date_of_birth: Some(form.date_of_birth.clone())
                .filter(|dob| !dob.trim().is_empty()),
        };
        let session = self
            .auth
            .sign_up(form.email.trim(), &form.password, &metadata)
            .await?;

        if let Some(session) = &session {
            let profile = Profile {
                user_id: session.user_id,
                first_name: first_token(&metadata.full_name),
                full_name: metadata.full_name.clone(),
                email: session.email.clone(),
                date_of_birth: metadata.date_of_birth.clone(),
            };
            // Profile row is best effort at signup; it gets rebuilt on the
            // next resolve if this write is lost.
            let _ = self.profiles.upsert_profile(&profile).await;
        }
        Ok(session)
    }

    /// Sign in and apply any profile edits queued while signed out.
    ///
    /// # Errors
    ///
    /// Propagates `AuthError`, keeping unconfirmed-email distinct from bad
    /// credentials.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, IdentityError> {
        let session = self.auth.sign_in(email.trim(), password).await?;
        self.apply_pending_profile(session.user_id).await;
        Ok(session)
    }

    /// Sign out and drop the cached identity.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::Auth` when the backend rejects the call.
    pub async fn sign_out(&self) -> Result<(), IdentityError> {
        self.auth.sign_out().await?;
        let _ = self.cache.remove(CACHED_IDENTITY_KEY).await;
        Ok(())
    }

    /// Queue profile edits on device when nobody is signed in; they apply
    /// on the next successful sign-in.
    pub async fn stash_profile_edits(&self, first_name: Option<&str>, date_of_birth: Option<&str>) {
        let pending = PendingProfile {
            first_name: first_name.map(str::to_string),
            date_of_birth: date_of_birth.map(str::to_string),
        };
        if let Ok(value) = serde_json::to_value(&pending) {
            let _ = self.cache.set(PENDING_PROFILE_KEY, &value).await;
        }
    }

    async fn apply_pending_profile(&self, user: UserId) {
        let Ok(Some(value)) = self.cache.get(PENDING_PROFILE_KEY).await else {
            return;
        };
        let pending: PendingProfile = match serde_json::from_value(value) {
            Ok(pending) => pending,
            Err(_) => {
                let _ = self.cache.remove(PENDING_PROFILE_KEY).await;
                return;
            }
        };

        let Ok(existing) = self.profiles.fetch_profile(user).await else {
            return;
        };
        let mut profile = existing.unwrap_or_else(|| Profile::empty(user));
        if let Some(first_name) = pending.first_name {
            profile.first_name = first_name;
        }
        if let Some(dob) = pending.date_of_birth {
            profile.date_of_birth = Some(dob);
        }
        if self.profiles.upsert_profile(&profile).await.is_ok() {
            let _ = self.cache.remove(PENDING_PROFILE_KEY).await;
        }
    }

    /// Raw cached identity blob, for diagnostics.
    pub async fn cached_identity(&self) -> Option<Value> {
        self.cache.get(CACHED_IDENTITY_KEY).await.ok().flatten()
    }
}

fn first_token(full_name: &str) -> String {
    full_name
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_string()
}
