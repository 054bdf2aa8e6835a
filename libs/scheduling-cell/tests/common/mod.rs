#![allow(dead_code)]

use std::sync::{Arc, Once};

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use uuid::Uuid;

use scheduling_cell::store::InMemoryScheduleStore;
use scheduling_cell::{
    AppointmentStatus, AvailabilityOverride, AvailabilityResolver, DayOfWeek, Reservation,
    WorkingHourTemplate,
};
use shared_config::SchedulingConfig;

static TRACING: Once = Once::new();

pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}

/// Monday 3 June 2024.
pub fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()
}

pub fn tuesday() -> NaiveDate {
    monday() + Duration::days(1)
}

pub fn time(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
}

pub fn at(date: NaiveDate, hour: u32, minute: u32) -> DateTime<Utc> {
    date.and_time(time(hour, minute)).and_utc()
}

pub struct TestClinic {
    pub tenant_id: Uuid,
    pub store: Arc<InMemoryScheduleStore>,
    pub config: SchedulingConfig,
}

impl Default for TestClinic {
    fn default() -> Self {
        init_tracing();
        Self {
            tenant_id: Uuid::new_v4(),
            store: Arc::new(InMemoryScheduleStore::new()),
            config: SchedulingConfig::default(),
        }
    }
}

impl TestClinic {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolver(&self) -> AvailabilityResolver {
        AvailabilityResolver::new(self.store.clone(), self.store.clone(), self.config.clone())
    }

    /// Adds an active template for a new doctor and returns the doctor id.
    pub async fn doctor_working(
        &self,
        day: DayOfWeek,
        start: (u32, u32),
        end: (u32, u32),
        slot_minutes: u32,
    ) -> Uuid {
        let doctor_id = Uuid::new_v4();
        self.add_template(doctor_id, day, start, end, slot_minutes).await;
        doctor_id
    }

    pub async fn add_template(
        &self,
        doctor_id: Uuid,
        day: DayOfWeek,
        start: (u32, u32),
        end: (u32, u32),
        slot_minutes: u32,
    ) -> WorkingHourTemplate {
        let template = WorkingHourTemplate {
            id: Uuid::new_v4(),
            tenant_id: self.tenant_id,
            doctor_id,
            day_of_week: day,
            start_time: time(start.0, start.1),
            end_time: time(end.0, end.1),
            slot_duration_minutes: slot_minutes,
            is_active: true,
        };
        self.store.add_template(template.clone()).await;
        template
    }

    pub async fn reserve(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        start: (u32, u32),
        end: (u32, u32),
        status: AppointmentStatus,
    ) -> Reservation {
        let reservation = Reservation {
            id: Uuid::new_v4(),
            doctor_id,
            start_at: at(date, start.0, start.1),
            end_at: at(date, end.0, end.1),
            status,
        };
        self.store.add_reservation(reservation.clone()).await;
        reservation
    }

    pub async fn day_off(&self, doctor_id: Uuid, date: NaiveDate) {
        self.store
            .add_override(AvailabilityOverride {
                id: Uuid::new_v4(),
                doctor_id,
                override_date: date,
                is_available: false,
                reason: Some("Annual leave".to_string()),
            })
            .await;
    }
}
