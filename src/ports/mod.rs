//! Port traits. API boundaries for the hexagon.
//!
//! - Inbound: Called by UI/adapter into the application
//! - Outbound: Called by application into infrastructure

pub mod inbound;
pub mod notification;
pub mod outbound;

pub use inbound::{InputPort, InsertionPort};
pub use notification::NotificationGateway;
pub use outbound::{ContentRepository, PoiDirectory, SaveOutcome};
