pub mod auth;
pub mod cors;

pub use auth::{AuthMiddleware, Capability, CurrentUserId};
pub use cors::create_cors;
