use thiserror::Error;

/// Failures surfaced by gateway operations and subscription error channels.
///
/// Cloneable so the same error can be delivered to a subscriber and retained
/// by a panel for display.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum GatewayError {
    #[error("unauthorized: {path}")]
    Unauthorized { path: String },
    #[error("record not found: {id} under {path}")]
    NotFound { path: String, id: String },
    #[error("backend unavailable: {reason}")]
    Unavailable { reason: String },
}

impl GatewayError {
    pub(crate) fn unauthorized(path: impl ToString) -> Self {
        Self::Unauthorized {
            path: path.to_string(),
        }
    }

    pub(crate) fn not_found(path: impl ToString, id: impl Into<String>) -> Self {
        Self::NotFound {
            path: path.to_string(),
            id: id.into(),
        }
    }
}
