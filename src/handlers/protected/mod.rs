// handlers/protected/mod.rs - Protected handlers (JWT authentication required)
//
// Every handler here receives the caller's identity as `Extension<AuthUser>`,
// inserted by `middleware::auth::jwt_auth_middleware`, and passes it down to
// the services as the owner all reads and writes are scoped to.
//
// Security Level: JWT Authentication Required
// Route Prefix: /api/projects, /api/tasks, /api/users

pub mod projects; // Project CRUD scoped to the caller
pub mod tasks;    // Task CRUD scoped through the parent project
pub mod users;    // The caller's own profile

pub use projects::*;
pub use tasks::*;
pub use users::*;
