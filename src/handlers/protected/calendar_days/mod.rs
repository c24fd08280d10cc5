// handlers/protected/calendar_days/mod.rs - Calendar day and story video handlers

pub mod day_get; // GET /api/calendarDays/user, /active-dates, /by-user/:userId/:date
pub mod day_post; // POST /api/calendarDays
pub mod video; // PUT/DELETE /api/calendarDays/:date/video, POST /api/calendarDays/:date/refresh-status

pub use day_get::*;
pub use day_post::*;
pub use video::*;
