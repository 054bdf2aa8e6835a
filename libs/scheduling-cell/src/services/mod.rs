pub mod availability;
pub mod conflict;
pub mod slots;

pub use availability::AvailabilityResolver;
pub use conflict::{check_doctor_availability, intervals_overlap, is_busy, ReservationIndex};
pub use slots::{generate_slots, merge_windows, Slots};
