//! Persistence adapters. Point-of-interest directory and content store.

pub mod catalog_seed;
pub mod memory_repo;
pub mod sqlite_repo;

pub use memory_repo::InMemoryRepo;
pub use sqlite_repo::SqliteRepo;
