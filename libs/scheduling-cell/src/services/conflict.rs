use std::collections::HashMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::Reservation;

/// Strict overlap of two half-open intervals. Intervals that only touch do not overlap.
pub fn intervals_overlap(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> bool {
    a_start < b_end && a_end > b_start
}

pub fn conflicts_with(reservation: &Reservation, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
    reservation.status.is_occupying()
        && intervals_overlap(reservation.start_at, reservation.end_at, start, end)
}

pub fn is_busy(
    doctor_id: Uuid,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    reservations: &[Reservation],
) -> bool {
    reservations
        .iter()
        .any(|reservation| reservation.doctor_id == doctor_id && conflicts_with(reservation, start, end))
}

pub fn check_doctor_availability(
    doctor_id: Uuid,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    reservations: &[Reservation],
) -> bool {
    !is_busy(doctor_id, start, end, reservations)
}

/// Occupying reservations grouped by doctor, each list sorted by start.
///
/// Built once from a batched fetch so slot checks run without further lookups.
#[derive(Debug, Default, Clone)]
pub struct ReservationIndex {
    by_doctor: HashMap<Uuid, Vec<Reservation>>,
}

impl ReservationIndex {
    pub fn new(reservations: impl IntoIterator<Item = Reservation>) -> Self {
        let mut by_doctor: HashMap<Uuid, Vec<Reservation>> = HashMap::new();

        for reservation in reservations {
            if reservation.status.is_occupying() && reservation.start_at < reservation.end_at {
                by_doctor.entry(reservation.doctor_id).or_default().push(reservation);
            }
        }

        for reservations in by_doctor.values_mut() {
            reservations.sort_by_key(|reservation| reservation.start_at);
        }

        Self { by_doctor }
    }

    pub fn is_busy(&self, doctor_id: Uuid, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        let Some(reservations) = self.by_doctor.get(&doctor_id) else {
            return false;
        };

        // Only reservations starting before `end` can overlap.
        let candidates = reservations.partition_point(|reservation| reservation.start_at < end);
        reservations[..candidates]
            .iter()
            .any(|reservation| reservation.end_at > start)
    }

    pub fn occupied_count(&self, doctor_id: Uuid) -> usize {
        self.by_doctor.get(&doctor_id).map_or(0, Vec::len)
    }
}
