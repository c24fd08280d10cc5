// handlers/protected/users/mod.rs - User profile and account handlers

pub mod blocks; // POST /api/users/block, POST /api/users/unblock, GET /api/users/me/blocked
pub mod profile; // POST/PATCH /api/users, GET /api/users/:id, DELETE /api/users/me
pub mod settings; // tokens, tutorial flag, push token

pub use blocks::*;
pub use profile::*;
pub use settings::*;
