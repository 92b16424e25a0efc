//! # Handler Capabilities
//!
//! The gateway dispatches each routable event to one of two handlers:
//! installation-lifecycle hooks go to an [`InstallationHandler`], everything
//! else goes to a [`GeneralEventHandler`] under retry.
//!
//! Handlers report failures as [`HandlerError`]; [`HandlerError::is_transient`]
//! decides whether the retry loop tries again.

use crate::event::{Event, InstallationHook, InstallationRef};
use crate::tenant::TenantError;
use async_trait::async_trait;

/// Handles installation-lifecycle hooks. Invoked at most once per request.
#[async_trait]
pub trait InstallationHandler: Send + Sync {
    async fn on_installation(
        &self,
        hook: &InstallationHook,
        event: &Event,
    ) -> Result<(), HandlerError>;
}

/// Handles repository activity for a known installation.
///
/// May be invoked several times for one request; implementations must
/// tolerate repeated delivery of the same event.
#[async_trait]
pub trait GeneralEventHandler: Send + Sync {
    async fn on_event(
        &self,
        installation: &InstallationRef,
        event: &Event,
    ) -> Result<(), HandlerError>;
}

/// Errors returned by handlers.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("tenant service error: {0}")]
    Tenant(#[from] TenantError),

    #[error("failed to forward to {target}: {message}")]
    Forward {
        target: String,
        status: Option<u16>,
        message: String,
    },

    #[error("{message}")]
    Failed { message: String, transient: bool },
}

impl HandlerError {
    /// A failure worth retrying
    pub fn transient(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
            transient: true,
        }
    }

    /// A failure retrying cannot fix
    pub fn permanent(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
            transient: false,
        }
    }

    /// Check if error is transient and should be retried
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Tenant(e) => e.is_transient(),
            // No status means the request never completed
            Self::Forward { status, .. } => match status {
                None => true,
                Some(code) => *code >= 500 || *code == 429,
            },
            Self::Failed { transient, .. } => *transient,
        }
    }
}

#[cfg(test)]
#[path = "handlers_tests.rs"]
mod tests;
