use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;
use tokio::sync::watch;
use tracing::info;

use studyhall_core::ValidationError;
use studyhall_core::profile::{Registration, UserProfile};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("email already registered: {email}")]
    EmailTaken { email: String },
    #[error("validation failed: {0}")]
    Invalid(#[from] ValidationError),
    #[error("identity provider error: {reason}")]
    Provider { reason: String },
}

/// The resolved actor, used to scope collection paths and to attribute
/// room contributions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub uid: String,
    pub display_name: String,
    pub registered: bool,
}

/// Session lifecycle: `Resolving -> Anonymous | Authenticated`, back to
/// `Resolving` on sign-out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Resolving,
    Anonymous(Identity),
    Authenticated(Identity),
}

impl SessionState {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Self::Resolving => None,
            Self::Anonymous(identity) | Self::Authenticated(identity) => Some(identity),
        }
    }

    fn for_identity(identity: Identity) -> Self {
        if identity.registered {
            Self::Authenticated(identity)
        } else {
            Self::Anonymous(identity)
        }
    }
}

/// External identity seam. Implementations issue and verify identities;
/// everything else in the engine only reads the resolved [`Identity`].
pub trait IdentityProvider: Send + Sync {
    /// Restore a persisted session or mint a fresh anonymous identity.
    async fn resolve(&self) -> Result<Identity, AuthError>;
    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError>;
    async fn register(&self, registration: &Registration) -> Result<Identity, AuthError>;
    /// Register while keeping an anonymous uid, so records created before
    /// registration stay owned by the same actor.
    async fn upgrade(&self, uid: &str, registration: &Registration)
    -> Result<Identity, AuthError>;
    async fn sign_out(&self) -> Result<(), AuthError>;
    async fn profile(&self, uid: &str) -> Result<Option<UserProfile>, AuthError>;
}

/// Process-wide session state. Exactly one exists per running process; panel
/// controllers read it (directly or through [`SessionContext::watch`]) and
/// only mutate it through the explicit intents below.
pub struct SessionContext<P: IdentityProvider> {
    provider: P,
    state: watch::Sender<SessionState>,
    resolved: AtomicBool,
}

impl<P: IdentityProvider> SessionContext<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            state: watch::Sender::new(SessionState::Resolving),
            resolved: AtomicBool::new(false),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Resolve the identity. Runs the provider at most once per process
    /// lifetime; later calls return the current state unchanged.
    pub async fn init(&self) -> Result<SessionState, AuthError> {
        if self.resolved.swap(true, Ordering::SeqCst) {
            return Ok(self.current());
        }
        let identity = self.provider.resolve().await?;
        info!(uid = %identity.uid, registered = identity.registered, "session resolved");
        let next = SessionState::for_identity(identity);
        self.state.send_replace(next.clone());
        Ok(next)
    }

    pub fn current(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.current().identity().cloned()
    }

    /// Subscribe to state changes (login, logout, anonymous upgrade).
    pub fn watch(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let identity = self.provider.sign_in(email, password).await?;
        self.state
            .send_replace(SessionState::Authenticated(identity.clone()));
        Ok(identity)
    }

    pub async fn register(&self, registration: &Registration) -> Result<Identity, AuthError> {
        let identity = self.provider.register(registration).await?;
        self.state
            .send_replace(SessionState::Authenticated(identity.clone()));
        Ok(identity)
    }

    /// Upgrade the current anonymous identity to a registered one, keeping
    /// its uid.
    pub async fn upgrade(&self, registration: &Registration) -> Result<Identity, AuthError> {
        let anon = match self.current() {
            SessionState::Anonymous(identity) => identity,
            _ => {
                return Err(AuthError::Provider {
                    reason: "no anonymous identity to upgrade".to_string(),
                });
            }
        };
        let identity = self.provider.upgrade(&anon.uid, registration).await?;
        self.state
            .send_replace(SessionState::Authenticated(identity.clone()));
        Ok(identity)
    }

    /// Sign out and re-resolve, landing in an anonymous session.
    pub async fn sign_out(&self) -> Result<SessionState, AuthError> {
        self.provider.sign_out().await?;
        self.state.send_replace(SessionState::Resolving);
        let identity = self.provider.resolve().await?;
        let next = SessionState::for_identity(identity);
        self.state.send_replace(next.clone());
        Ok(next)
    }
}
