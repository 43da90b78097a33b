//! Core domain layer. No external I/O dependencies.
//!
//! Entities and business rules live here. Dependencies flow inward.

pub mod entities;
pub mod errors;
pub mod image;
pub mod outcome;
pub mod policy;
pub mod validation;

pub use entities::{ContentDraft, ContentItem, PointOfInterest, ProposalToken};
pub use errors::DomainError;
pub use image::{ImageDescriptor, ImagePayload, MimeType};
pub use outcome::{FailureCategory, Outcome, WorkflowState};
pub use policy::CapacityPolicy;
pub use validation::{ImageRejection, ImageRules, ImageValidator};
