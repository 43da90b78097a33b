//! Infrastructure adapters. Implement outbound ports.
//!
//! SQLite and in-memory stores, agency notifier, terminal UI. Map errors to DomainError.

pub mod agency;
pub mod persistence;
pub mod ui;
