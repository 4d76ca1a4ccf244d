//! Services layer - Business logic
//!
//! Services implement the rules on top of the repositories:
//! - registration and authentication (`auth`)
//! - document lifecycle (`docs`)
//! - process-local sessions (`session`)

pub mod auth;
pub mod docs;
pub mod password;
pub mod session;
pub mod validation;

pub use auth::{AuthError, AuthService};
pub use docs::{DocsError, DocsService};
pub use password::{hash_password, verify_password};
pub use session::SessionStore;
pub use validation::{validate_login, validate_password};
