//! Database repositories
//!
//! Each repository is a trait with a SQL implementation (SQLite or MySQL via
//! sqlx) and an in-memory implementation.

pub mod document;
pub mod memory;
pub mod user;

pub use document::{DocumentRepository, SqlxDocumentRepository};
pub use memory::{MemoryDocumentRepository, MemoryUserRepository};
pub use user::{SqlxUserRepository, UserRepository};
