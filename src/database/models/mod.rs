pub mod attraction;
pub mod calendar_day;
pub mod date;
pub mod notification;
pub mod transaction;
pub mod user;

pub use attraction::Attraction;
pub use calendar_day::{CalendarDay, Story};
pub use date::{DateDetails, DateEntry, DateFeedback, LocationMetadata, UpcomingDate};
pub use notification::Notification;
pub use transaction::Transaction;
pub use user::{PublicUser, User};
