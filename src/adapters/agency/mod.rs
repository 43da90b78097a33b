//! Agency adapters. Implement NotificationGateway.
//!
//! HTTP adapter for the real agency endpoint and a mock for development and tests.

pub mod http_adapter;
pub mod mock_adapter;

pub use http_adapter::AgencyHttpAdapter;
pub use mock_adapter::{MockNotifier, NotifyBehavior};
