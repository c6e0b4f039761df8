pub mod auth;

// Re-export for convenience
pub use auth::{require_admin, require_user};
