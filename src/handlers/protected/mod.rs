// handlers/protected/mod.rs - Protected handlers (JWT authentication required)
//
// Every handler here runs behind jwt_auth_middleware and reads the caller
// from the AuthUser request extension.

pub mod attractions; // /api/attraction, /api/attractions/*
pub mod calendar_days; // /api/calendarDays/*
pub mod dates; // /api/date, /api/dates/*
pub mod notifications; // /api/notifications/*
pub mod stories; // /api/stories/:date
pub mod transactions; // /api/transactions/*
pub mod users; // /api/users/*
pub mod videos; // /api/videos/*
