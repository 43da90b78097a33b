//! Application use cases. Orchestrate domain logic via ports.

pub mod content_query;
pub mod insertion_service;

pub use content_query::{CapacityStatus, ContentQueryService};
pub use insertion_service::InsertionService;
