// handlers/protected/dates/mod.rs - Date proposal and lifecycle handlers

pub mod date_get; // GET /api/dates/:dateId, GET /api/dates/me/upcoming, GET /api/date/:userFrom/:userTo/:date
pub mod date_patch; // PATCH /api/dates/:dateId, /cancel, /feedback
pub mod date_post; // POST /api/date, POST /api/dates/resolve-conflict

pub use date_get::*;
pub use date_patch::*;
pub use date_post::*;
