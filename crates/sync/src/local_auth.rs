//! File-backed identity provider for local and test use.
//!
//! Credentials live in a single JSON document rewritten atomically on every
//! change. The active uid is persisted so a session survives restarts, the
//! way the original dashboard kept users signed in.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use studyhall_core::profile::{Registration, UserProfile};

use crate::crypto;
use crate::session::{AuthError, Identity, IdentityProvider};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredUser {
    email: String,
    password_hash: String,
    salt: String,
    profile: UserProfile,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ProviderState {
    #[serde(default)]
    active_uid: Option<String>,
    #[serde(default)]
    users: BTreeMap<String, StoredUser>,
}

pub struct LocalIdentityProvider {
    path: Option<PathBuf>,
    state: Mutex<ProviderState>,
}

impl LocalIdentityProvider {
    /// Open (or create) the user store at `path`.
    pub fn open(path: PathBuf) -> Result<Self> {
        let state = if path.exists() {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("read user store {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("parse user store {}", path.display()))?
        } else {
            ProviderState::default()
        };
        Ok(Self {
            path: Some(path),
            state: Mutex::new(state),
        })
    }

    /// Ephemeral provider for tests.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            state: Mutex::new(ProviderState::default()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ProviderState> {
        self.state.lock().expect("user store mutex poisoned")
    }

    fn persist(&self, state: &ProviderState) -> Result<(), AuthError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let write = || -> std::io::Result<()> {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let tmp = path.with_extension("json.tmp");
            std::fs::write(&tmp, serde_json::to_string_pretty(state)?)?;
            std::fs::rename(&tmp, path)
        };
        write().map_err(|e| AuthError::Provider {
            reason: format!("persist user store: {e}"),
        })
    }

    fn register_user(
        &self,
        uid: String,
        registration: &Registration,
    ) -> Result<Identity, AuthError> {
        registration.validate()?;
        let email = normalize_email(&registration.email);

        let mut state = self.lock();
        if state.users.values().any(|u| u.email == email) {
            return Err(AuthError::EmailTaken { email });
        }
        if state.users.contains_key(&uid) {
            return Err(AuthError::Provider {
                reason: format!("uid already registered: {uid}"),
            });
        }

        let (password_hash, salt) = crypto::hash_password(&registration.password)?;
        let profile = registration.clone().into_profile(Utc::now());
        let identity = Identity {
            uid: uid.clone(),
            display_name: profile.name.clone(),
            registered: true,
        };
        state.users.insert(
            uid.clone(),
            StoredUser {
                email,
                password_hash,
                salt,
                profile,
            },
        );
        state.active_uid = Some(uid);
        self.persist(&state)?;
        Ok(identity)
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn identity_of(uid: &str, user: &StoredUser) -> Identity {
    Identity {
        uid: uid.to_string(),
        display_name: user.profile.name.clone(),
        registered: true,
    }
}

impl IdentityProvider for LocalIdentityProvider {
    async fn resolve(&self) -> Result<Identity, AuthError> {
        let state = self.lock();
        if let Some(uid) = &state.active_uid {
            if let Some(user) = state.users.get(uid) {
                return Ok(identity_of(uid, user));
            }
        }
        // No persisted session: mint an ephemeral anonymous identity.
        let identity = Identity {
            uid: Uuid::new_v4().to_string(),
            display_name: "guest".to_string(),
            registered: false,
        };
        debug!(uid = %identity.uid, "minted anonymous identity");
        Ok(identity)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let email = normalize_email(email);
        let mut state = self.lock();

        let uid = state
            .users
            .iter()
            .find(|(_, u)| u.email == email)
            .map(|(uid, _)| uid.clone())
            .ok_or(AuthError::InvalidCredentials)?;
        let user = state.users.get_mut(&uid).expect("uid found above");
        if !crypto::verify_password(password, &user.password_hash, &user.salt) {
            return Err(AuthError::InvalidCredentials);
        }

        user.profile.touch_login(Utc::now());
        let identity = identity_of(&uid, user);
        state.active_uid = Some(uid);
        self.persist(&state)?;
        Ok(identity)
    }

    async fn register(&self, registration: &Registration) -> Result<Identity, AuthError> {
        self.register_user(Uuid::new_v4().to_string(), registration)
    }

    async fn upgrade(
        &self,
        uid: &str,
        registration: &Registration,
    ) -> Result<Identity, AuthError> {
        self.register_user(uid.to_string(), registration)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let mut state = self.lock();
        state.active_uid = None;
        self.persist(&state)
    }

    async fn profile(&self, uid: &str) -> Result<Option<UserProfile>, AuthError> {
        Ok(self.lock().users.get(uid).map(|u| u.profile.clone()))
    }
}
