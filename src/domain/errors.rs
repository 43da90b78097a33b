//! Domain errors. Used by ports and use cases.
//!
//! Adapters map infrastructure errors into these.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Repository error: {0}")]
    Repo(String),

    #[error("Point of interest not found: {0}")]
    PointNotFound(String),

    /// Agency notification failed. Only ever raised after a durable commit.
    #[error("Notification failed: {0}")]
    Notify(String),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Input error: {0}")]
    Input(String),
}
