pub mod error;
pub mod models;
pub mod queries;
pub mod services;
pub mod store;
pub mod weekday;

pub use error::*;
pub use models::*;
pub use services::*;
pub use store::{ReservationLookup, WorkingHourStore};
pub use weekday::DayOfWeek;
