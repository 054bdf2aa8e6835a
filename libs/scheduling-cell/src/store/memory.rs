use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::models::{AvailabilityOverride, Reservation, WorkingHourTemplate};
use crate::services::conflict::intervals_overlap;
use crate::store::{ReservationLookup, WorkingHourStore};
use crate::weekday::DayOfWeek;

/// Process-local store backing both collaborator traits.
#[derive(Debug, Default)]
pub struct InMemoryScheduleStore {
    templates: RwLock<Vec<WorkingHourTemplate>>,
    overrides: RwLock<Vec<AvailabilityOverride>>,
    reservations: RwLock<Vec<Reservation>>,
}

impl InMemoryScheduleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_template(&self, template: WorkingHourTemplate) {
        self.templates.write().await.push(template);
    }

    pub async fn add_override(&self, entry: AvailabilityOverride) {
        self.overrides.write().await.push(entry);
    }

    pub async fn add_reservation(&self, reservation: Reservation) {
        self.reservations.write().await.push(reservation);
    }

    /// Removes a reservation, returning whether it existed.
    pub async fn remove_reservation(&self, reservation_id: Uuid) -> bool {
        let mut reservations = self.reservations.write().await;
        let before = reservations.len();
        reservations.retain(|reservation| reservation.id != reservation_id);
        reservations.len() != before
    }
}

#[async_trait]
impl WorkingHourStore for InMemoryScheduleStore {
    async fn active_templates(&self, tenant_id: Uuid, day: DayOfWeek) -> Result<Vec<WorkingHourTemplate>> {
        let templates = self.templates.read().await;
        let matching: Vec<_> = templates
            .iter()
            .filter(|t| t.tenant_id == tenant_id && t.day_of_week == day && t.is_active)
            .cloned()
            .collect();

        debug!("Found {} active templates for tenant {} on {}", matching.len(), tenant_id, day);
        Ok(matching)
    }

    async fn doctor_templates(&self, doctor_id: Uuid, day: DayOfWeek) -> Result<Vec<WorkingHourTemplate>> {
        let templates = self.templates.read().await;
        Ok(templates
            .iter()
            .filter(|t| t.doctor_id == doctor_id && t.day_of_week == day && t.is_active)
            .cloned()
            .collect())
    }

    async fn overrides(
        &self,
        doctor_ids: &[Uuid],
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<AvailabilityOverride>> {
        let overrides = self.overrides.read().await;
        Ok(overrides
            .iter()
            .filter(|o| doctor_ids.contains(&o.doctor_id) && o.override_date >= from && o.override_date <= to)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ReservationLookup for InMemoryScheduleStore {
    async fn reservations(
        &self,
        doctor_ids: &[Uuid],
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<Reservation>> {
        let reservations = self.reservations.read().await;
        Ok(reservations
            .iter()
            .filter(|r| {
                doctor_ids.contains(&r.doctor_id)
                    && intervals_overlap(r.start_at, r.end_at, window_start, window_end)
            })
            .cloned()
            .collect())
    }
}
