use std::fmt;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{SchedulingError, SchedulingResult};
use crate::weekday::DayOfWeek;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkingHourTemplate {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub doctor_id: Uuid,
    pub day_of_week: DayOfWeek,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub slot_duration_minutes: u32,
    pub is_active: bool,
}

impl WorkingHourTemplate {
    pub fn is_well_formed(&self) -> bool {
        self.start_time < self.end_time && self.slot_duration_minutes > 0
    }

    /// Whether a consultation starting at `time` falls inside this template.
    pub fn covers(&self, time: NaiveTime) -> bool {
        self.start_time <= time && time < self.end_time
    }

    /// Concrete UTC window of this template on `date`.
    pub fn window_on(&self, date: NaiveDate, offset: FixedOffset) -> SchedulingResult<ScheduleWindow> {
        Ok(ScheduleWindow {
            start: local_to_utc(date, self.start_time, offset)?,
            end: local_to_utc(date, self.end_time, offset)?,
            slot_minutes: self.slot_duration_minutes,
        })
    }
}

/// A working window anchored on a calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub slot_minutes: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
    NoShow,
}

impl AppointmentStatus {
    /// Statuses that hold the doctor's time.
    pub fn is_occupying(self) -> bool {
        matches!(
            self,
            AppointmentStatus::Pending | AppointmentStatus::Confirmed | AppointmentStatus::InProgress
        )
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Pending => write!(f, "pending"),
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::InProgress => write!(f, "in_progress"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
            AppointmentStatus::NoShow => write!(f, "no_show"),
        }
    }
}

/// Appointment interval as seen by the scheduler, half-open `[start_at, end_at)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Reservation {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub status: AppointmentStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AvailabilityOverride {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub override_date: NaiveDate,
    pub is_available: bool,
    pub reason: Option<String>,
}

impl AvailabilityOverride {
    pub fn blocks(&self, doctor_id: Uuid, date: NaiveDate) -> bool {
        !self.is_available && self.doctor_id == doctor_id && self.override_date == date
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeSlot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub available: bool,
}

impl TimeSlot {
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}

/// Clinic-local wall time on `date` as a UTC instant.
///
/// Fails when the shift by `offset` leaves the representable calendar.
pub fn local_to_utc(
    date: NaiveDate,
    time: NaiveTime,
    offset: FixedOffset,
) -> SchedulingResult<DateTime<Utc>> {
    date.and_time(time)
        .checked_sub_signed(Duration::seconds(i64::from(offset.local_minus_utc())))
        .map(|local| local.and_utc())
        .ok_or_else(|| {
            SchedulingError::validation(format!(
                "{} {} at UTC offset {} is outside the supported calendar",
                date, time, offset
            ))
        })
}
