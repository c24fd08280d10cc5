// handlers/protected/attractions/mod.rs - Attraction rating handlers

pub mod attraction_get; // GET /api/attraction/:userFrom/:userTo/:date, GET /api/attractions/:userFrom/:userTo
pub mod attraction_post; // POST /api/attraction

pub use attraction_get::*;
pub use attraction_post::*;
