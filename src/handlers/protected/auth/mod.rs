// handlers/protected/auth/mod.rs - Session and account endpoints for the signed-in user

pub mod activity; // GET /api/auth/activity
pub mod nonce;    // GET /api/auth/nonce/:action
pub mod password; // PUT /api/auth/password
pub mod session;  // GET /api/auth/whoami, DELETE /api/auth/session

pub use activity::activity_get;
pub use nonce::nonce_get;
pub use password::password_put;
pub use session::{session_delete, whoami_get};
