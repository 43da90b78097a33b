//! Workflow outcomes and states.
//!
//! Every insertion call ends in exactly one `Outcome`; infrastructure errors are
//! folded into the matching variant instead of escaping as `Err`.

use super::entities::{ContentItem, ProposalToken};
use super::validation::ImageRejection;
use std::fmt;

/// Result of `request_insertion`, `confirm_insertion` or `cancel_insertion`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Committed and the agency was notified.
    Success(ContentItem),
    InvalidImage(ImageRejection),
    /// The point of interest is full. Carries its limit.
    CapacityExceeded { limit: u32 },
    /// Validated and within capacity; waiting for confirm or cancel.
    AwaitingConfirmation(ProposalToken),
    /// Committed, but the agency could not be notified. The item is durable.
    ConnectivityError { item: ContentItem, detail: String },
    /// Storage failed. Nothing was written.
    PersistenceError(String),
    Cancelled,
    /// Unknown, expired or already-used proposal token.
    InvalidProposalReference,
    PointOfInterestNotFound(String),
}

/// Error taxonomy shared with callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCategory {
    Validation,
    Quota,
    Persistence,
    Connectivity,
    UserCancellation,
    ProtocolMisuse,
}

impl Outcome {
    /// `None` for `Success` and `AwaitingConfirmation`.
    pub fn category(&self) -> Option<FailureCategory> {
        match self {
            Self::Success(_) | Self::AwaitingConfirmation(_) => None,
            Self::InvalidImage(_) | Self::PointOfInterestNotFound(_) => {
                Some(FailureCategory::Validation)
            }
            Self::CapacityExceeded { .. } => Some(FailureCategory::Quota),
            Self::PersistenceError(_) => Some(FailureCategory::Persistence),
            Self::ConnectivityError { .. } => Some(FailureCategory::Connectivity),
            Self::Cancelled => Some(FailureCategory::UserCancellation),
            Self::InvalidProposalReference => Some(FailureCategory::ProtocolMisuse),
        }
    }

    /// Everything except `AwaitingConfirmation` ends the workflow.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::AwaitingConfirmation(_))
    }

    /// Fixable by the caller re-submitting corrected input.
    pub fn is_client_correctable(&self) -> bool {
        matches!(
            self.category(),
            Some(FailureCategory::Validation | FailureCategory::Quota)
        )
    }

    /// The persisted item, if the commit went through.
    pub fn committed_item(&self) -> Option<&ContentItem> {
        match self {
            Self::Success(item) | Self::ConnectivityError { item, .. } => Some(item),
            _ => None,
        }
    }

    pub fn token(&self) -> Option<ProposalToken> {
        match self {
            Self::AwaitingConfirmation(t) => Some(*t),
            _ => None,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success(item) => write!(
                f,
                "content #{} added to point '{}'",
                item.id, item.point_of_interest_id
            ),
            Self::InvalidImage(reason) => write!(f, "invalid image: {}", reason),
            Self::CapacityExceeded { limit } => {
                write!(f, "point of interest already holds its maximum of {}", limit)
            }
            Self::AwaitingConfirmation(token) => {
                write!(f, "awaiting confirmation (proposal {})", token)
            }
            Self::ConnectivityError { item, detail } => write!(
                f,
                "content #{} saved, but the agency was not notified: {}",
                item.id, detail
            ),
            Self::PersistenceError(detail) => write!(f, "could not save content: {}", detail),
            Self::Cancelled => f.write_str("insertion cancelled"),
            Self::InvalidProposalReference => {
                f.write_str("proposal is unknown, expired or already used")
            }
            Self::PointOfInterestNotFound(id) => write!(f, "point of interest '{}' not found", id),
        }
    }
}

/// Orchestrator state machine positions. Logged on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    Initiated,
    Validating,
    CapacityCheck,
    AwaitingConfirmation,
    Committing,
    Notifying,
    Cancelled,
    Terminal,
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Initiated => "INITIATED",
            Self::Validating => "VALIDATING",
            Self::CapacityCheck => "CAPACITY_CHECK",
            Self::AwaitingConfirmation => "AWAITING_CONFIRMATION",
            Self::Committing => "COMMITTING",
            Self::Notifying => "NOTIFYING",
            Self::Cancelled => "CANCELLED",
            Self::Terminal => "TERMINAL",
        };
        f.write_str(s)
    }
}
