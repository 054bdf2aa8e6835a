use std::fmt;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::SchedulingError;

/// Day of week in the schedule numbering: Monday = 1 … Sunday = 7.
///
/// Every conversion between calendar dates, `chrono::Weekday` and the stored
/// integer goes through this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct DayOfWeek(u8);

impl DayOfWeek {
    pub const MONDAY: DayOfWeek = DayOfWeek(1);
    pub const TUESDAY: DayOfWeek = DayOfWeek(2);
    pub const WEDNESDAY: DayOfWeek = DayOfWeek(3);
    pub const THURSDAY: DayOfWeek = DayOfWeek(4);
    pub const FRIDAY: DayOfWeek = DayOfWeek(5);
    pub const SATURDAY: DayOfWeek = DayOfWeek(6);
    pub const SUNDAY: DayOfWeek = DayOfWeek(7);

    pub fn new(day: i32) -> Result<Self, SchedulingError> {
        match u8::try_from(day) {
            Ok(day @ 1..=7) => Ok(DayOfWeek(day)),
            _ => Err(SchedulingError::validation(format!(
                "Day of week must be between 1 (Monday) and 7 (Sunday), got {}",
                day
            ))),
        }
    }

    pub fn from_weekday(weekday: Weekday) -> Self {
        DayOfWeek(weekday.number_from_monday() as u8)
    }

    pub fn of(date: NaiveDate) -> Self {
        Self::from_weekday(date.weekday())
    }

    pub fn number(self) -> i32 {
        i32::from(self.0)
    }

    pub fn weekday(self) -> Weekday {
        match self.0 {
            1 => Weekday::Mon,
            2 => Weekday::Tue,
            3 => Weekday::Wed,
            4 => Weekday::Thu,
            5 => Weekday::Fri,
            6 => Weekday::Sat,
            _ => Weekday::Sun,
        }
    }
}

impl TryFrom<i32> for DayOfWeek {
    type Error = SchedulingError;

    fn try_from(day: i32) -> Result<Self, Self::Error> {
        DayOfWeek::new(day)
    }
}

impl From<DayOfWeek> for i32 {
    fn from(day: DayOfWeek) -> Self {
        day.number()
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.weekday())
    }
}
