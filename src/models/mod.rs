//! Data models
//!
//! This module contains the data structures shared by the persistence,
//! service and API layers:
//! - Database entities (User, Document)
//! - The in-memory Session record
//! - Internal data transfer objects

mod document;
mod session;
mod user;

pub use document::{CreateDocumentInput, Document};
pub use session::Session;
pub use user::User;
