//! Raw query shapes as callers submit them, validated before any lookup runs.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{SchedulingError, SchedulingResult};
use crate::models::TimeSlot;
use crate::services::AvailabilityResolver;
use crate::weekday::DayOfWeek;

pub fn parse_time_of_day(raw: &str) -> SchedulingResult<NaiveTime> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M").map_err(|_| {
        SchedulingError::validation(format!("Time of day must be HH:mm, got '{}'", raw))
    })
}

pub fn parse_date(raw: &str) -> SchedulingResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        SchedulingError::validation(format!("Date must be YYYY-MM-DD, got '{}'", raw))
    })
}

fn parse_duration(minutes: Option<i32>) -> SchedulingResult<Option<u32>> {
    match minutes {
        None => Ok(None),
        Some(minutes) if minutes > 0 => Ok(Some(minutes as u32)),
        Some(minutes) => Err(SchedulingError::validation(format!(
            "Slot duration must be positive, got {}",
            minutes
        ))),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityCheckQuery {
    pub doctor_id: Uuid,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl AvailabilityCheckQuery {
    pub async fn run(self, resolver: &AvailabilityResolver) -> SchedulingResult<bool> {
        resolver.check_availability(self.doctor_id, self.start, self.end).await
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSlotsQuery {
    pub doctor_id: Uuid,
    pub date: String,
    pub duration_minutes: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidTimeSlotsQuery {
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub duration_minutes: Option<u32>,
}

impl TimeSlotsQuery {
    pub fn validate(&self) -> SchedulingResult<ValidTimeSlotsQuery> {
        Ok(ValidTimeSlotsQuery {
            doctor_id: self.doctor_id,
            date: parse_date(&self.date)?,
            duration_minutes: parse_duration(self.duration_minutes)?,
        })
    }

    pub async fn run(self, resolver: &AvailabilityResolver) -> SchedulingResult<Vec<TimeSlot>> {
        let query = self.validate()?;
        resolver
            .list_time_slots(query.doctor_id, query.date, query.duration_minutes)
            .await
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailableDoctorsQuery {
    pub tenant_id: Uuid,
    pub day_of_week: i32,
    pub time_of_day: String,
    pub date: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidAvailableDoctorsQuery {
    pub tenant_id: Uuid,
    pub day_of_week: DayOfWeek,
    pub time_of_day: NaiveTime,
    pub date: Option<NaiveDate>,
}

impl AvailableDoctorsQuery {
    pub fn validate(&self) -> SchedulingResult<ValidAvailableDoctorsQuery> {
        Ok(ValidAvailableDoctorsQuery {
            tenant_id: self.tenant_id,
            day_of_week: DayOfWeek::new(self.day_of_week)?,
            time_of_day: parse_time_of_day(&self.time_of_day)?,
            date: self.date.as_deref().map(parse_date).transpose()?,
        })
    }

    pub async fn run(self, resolver: &AvailabilityResolver) -> SchedulingResult<Vec<Uuid>> {
        let query = self.validate()?;
        resolver
            .list_available_doctors(
                query.tenant_id,
                query.day_of_week.number(),
                query.time_of_day,
                query.date,
            )
            .await
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailableDatesQuery {
    pub tenant_id: Uuid,
    pub from_date: String,
    pub to_date: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidAvailableDatesQuery {
    pub tenant_id: Uuid,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
}

impl AvailableDatesQuery {
    pub fn validate(&self) -> SchedulingResult<ValidAvailableDatesQuery> {
        let from_date = parse_date(&self.from_date)?;
        let to_date = parse_date(&self.to_date)?;
        if from_date > to_date {
            return Err(SchedulingError::validation(format!(
                "from_date {} is after to_date {}",
                from_date, to_date
            )));
        }

        Ok(ValidAvailableDatesQuery {
            tenant_id: self.tenant_id,
            from_date,
            to_date,
        })
    }

    pub async fn run(self, resolver: &AvailabilityResolver) -> SchedulingResult<Vec<NaiveDate>> {
        let query = self.validate()?;
        resolver
            .list_available_dates(query.tenant_id, query.from_date, query.to_date)
            .await
    }
}
