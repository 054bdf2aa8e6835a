pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::models::{AvailabilityOverride, Reservation, WorkingHourTemplate};
use crate::weekday::DayOfWeek;

pub use memory::InMemoryScheduleStore;

/// Source of doctors' recurring working hours and day-level overrides.
#[async_trait]
pub trait WorkingHourStore: Send + Sync {
    /// Active templates of every doctor of the tenant on `day`.
    async fn active_templates(&self, tenant_id: Uuid, day: DayOfWeek) -> Result<Vec<WorkingHourTemplate>>;

    async fn doctor_templates(&self, doctor_id: Uuid, day: DayOfWeek) -> Result<Vec<WorkingHourTemplate>>;

    /// Overrides of the given doctors dated within `[from, to]`.
    async fn overrides(
        &self,
        doctor_ids: &[Uuid],
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<AvailabilityOverride>>;
}

/// Source of appointments that may occupy doctors' time.
#[async_trait]
pub trait ReservationLookup: Send + Sync {
    /// Reservations of the given doctors overlapping `[window_start, window_end)`, any status.
    async fn reservations(
        &self,
        doctor_ids: &[Uuid],
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<Reservation>>;
}
