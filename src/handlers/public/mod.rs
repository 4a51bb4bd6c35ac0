// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Service banner, health check and token acquisition.
//
// Security Level: None (completely public access)
// Middleware: None (no authentication or authorization)

pub mod auth;
pub mod status;

pub use auth::*;
pub use status::*;
