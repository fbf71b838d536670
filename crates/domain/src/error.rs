//! Domain error types.
//!
//! `DomainError` is what services return to callers. `StoreError` is what
//! the outbound ports return; services translate it at the boundary.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Kind of entity a `NotFound` refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Form,
    Group,
    Reminder,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Resource::Form => "form",
            Resource::Group => "group",
            Resource::Reminder => "reminder",
        };
        f.write_str(s)
    }
}

/// Why a closed form is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClosureCause {
    /// The creator switched responses off.
    Switch,
    /// The response window has not started yet.
    NotYetOpen,
    /// The response window is over.
    Ended,
}

/// Reason an admission attempt was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "reason", content = "cause")]
pub enum DenyReason {
    FormClosed(ClosureCause),
    ResponseLimitReached,
    AlreadyResponded,
    NotEligible,
}

impl DenyReason {
    /// Stable machine code, used for metrics labels and API error codes.
    pub fn code(&self) -> &'static str {
        match self {
            DenyReason::FormClosed(_) => "form_closed",
            DenyReason::ResponseLimitReached => "response_limit_reached",
            DenyReason::AlreadyResponded => "already_responded",
            DenyReason::NotEligible => "not_eligible",
        }
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenyReason::FormClosed(ClosureCause::Switch) => write!(f, "Form is closed"),
            DenyReason::FormClosed(ClosureCause::NotYetOpen) => {
                write!(f, "Form is not accepting responses yet")
            }
            DenyReason::FormClosed(ClosureCause::Ended) => {
                write!(f, "Form is no longer accepting responses")
            }
            DenyReason::ResponseLimitReached => write!(f, "Response limit reached"),
            DenyReason::AlreadyResponded => write!(f, "You have already responded to this form"),
            DenyReason::NotEligible => write!(f, "You are not eligible to respond to this form"),
        }
    }
}

/// Errors surfaced by domain services.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{0} not found")]
    NotFound(Resource),

    #[error("Not authorized: {0}")]
    NotAuthorized(String),

    /// Expected, user-facing refusal. `message` is the form's closed message
    /// for `FormClosed` denials and the reason text otherwise.
    #[error("{message}")]
    Eligibility { reason: DenyReason, message: String },

    /// A tracker write resolved to nothing on the locked snapshot. The
    /// admission engine recovers from it locally; only
    /// `AdmissionEngine::flag_tracker` returns it.
    #[error("Tracking desync for {email} in group {group_id}")]
    TrackingDesync { group_id: uuid::Uuid, email: String },

    /// The store accepted a write but did not confirm it. Retryable.
    #[error("Write was not acknowledged by the store")]
    PersistenceAcknowledgement,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Store error: {0}")]
    Store(String),
}

impl DomainError {
    pub fn denied(reason: DenyReason) -> Self {
        DomainError::Eligibility {
            reason,
            message: reason.to_string(),
        }
    }

    /// Whether the caller may retry the same request unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DomainError::PersistenceAcknowledgement)
    }
}

impl From<validator::ValidationErrors> for DomainError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let messages: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(m) => format!("{}: {}", field, m),
                    None => format!("{}: {}", field, e.code),
                })
            })
            .collect();
        DomainError::Validation(messages.join(", "))
    }
}

/// Errors returned by storage ports.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document not found")]
    NotFound,

    #[error("write not acknowledged")]
    Unacknowledged,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("backend error: {0}")]
    Backend(String),
}

impl From<StoreError> for DomainError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => DomainError::NotFound(Resource::Form),
            StoreError::Unacknowledged => DomainError::PersistenceAcknowledgement,
            StoreError::Conflict(msg) | StoreError::Backend(msg) => DomainError::Store(msg),
        }
    }
}
