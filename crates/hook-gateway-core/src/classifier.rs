//! # Event Classification
//!
//! Decides which processing path a parsed [`Event`] takes. Every event maps
//! to exactly one [`Route`]; unroutable events are reported with a reason so
//! the gateway can reject them before any handler runs.

use crate::event::{Event, InstallationHook, InstallationRef, Webhook};
use std::fmt;

/// Processing path for an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route<'a> {
    /// Installation-lifecycle hook with a non-zero installation ID
    Installation(&'a InstallationHook),

    /// Repository activity bound to a non-zero installation
    General(&'a InstallationRef),

    /// The event cannot be attributed to any installation
    Unroutable(UnroutableReason),
}

/// Why an event could not be routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnroutableReason {
    /// Installation-lifecycle hook whose installation ID is zero
    MissingInstallationId,

    /// Activity hook without an installation reference, or with a zero ID
    NoInstallation,
}

impl fmt::Display for UnroutableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingInstallationId => write!(f, "missing installation ID"),
            Self::NoInstallation => write!(f, "No installation in webhook"),
        }
    }
}

/// Classify an event into its processing route.
pub fn classify(event: &Event) -> Route<'_> {
    match &event.webhook {
        Webhook::Installation(hook) => {
            if hook.installation.id.is_zero() {
                Route::Unroutable(UnroutableReason::MissingInstallationId)
            } else {
                Route::Installation(hook)
            }
        }
        Webhook::Activity(hook) => match &hook.installation {
            Some(installation) if !installation.id.is_zero() => Route::General(installation),
            _ => Route::Unroutable(UnroutableReason::NoInstallation),
        },
    }
}

#[cfg(test)]
#[path = "classifier_tests.rs"]
mod tests;
