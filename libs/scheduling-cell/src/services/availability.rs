use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, Utc};
use futures::future::try_join_all;
use futures::{stream, StreamExt, TryStreamExt};
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use shared_config::SchedulingConfig;

use crate::error::{SchedulingError, SchedulingResult};
use crate::models::{
    local_to_utc, AvailabilityOverride, ScheduleWindow, TimeSlot, WorkingHourTemplate,
};
use crate::services::conflict::{check_doctor_availability, ReservationIndex};
use crate::services::slots::{generate_slots, merge_windows};
use crate::store::{ReservationLookup, WorkingHourStore};
use crate::weekday::DayOfWeek;

const WORKING_HOUR_STORE: &str = "working hour store";
const RESERVATION_LOOKUP: &str = "reservation lookup";

/// Answers availability queries over working-hour templates and reservations.
///
/// Every operation validates its input before touching a collaborator, reads a
/// snapshot through batched lookups and resolves conflicts in memory.
pub struct AvailabilityResolver {
    templates: Arc<dyn WorkingHourStore>,
    reservations: Arc<dyn ReservationLookup>,
    config: SchedulingConfig,
    offset: FixedOffset,
}

impl AvailabilityResolver {
    pub fn new(
        templates: Arc<dyn WorkingHourStore>,
        reservations: Arc<dyn ReservationLookup>,
        config: SchedulingConfig,
    ) -> Self {
        let offset = config.utc_offset().unwrap_or_else(|| {
            warn!(
                "UTC offset of {} minutes is out of range, treating template times as UTC",
                config.utc_offset_minutes
            );
            Utc.fix()
        });

        Self {
            templates,
            reservations,
            config,
            offset,
        }
    }

    /// Whether the doctor has no occupying reservation overlapping `[start, end)`.
    #[instrument(skip(self))]
    pub async fn check_availability(
        &self,
        doctor_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> SchedulingResult<bool> {
        if start >= end {
            return Err(SchedulingError::validation("Start time must be before end time"));
        }

        let reservations = self
            .call(RESERVATION_LOOKUP, self.reservations.reservations(&[doctor_id], start, end))
            .await?;

        let available = check_doctor_availability(doctor_id, start, end, &reservations);
        debug!("Doctor {} available from {} to {}: {}", doctor_id, start, end, available);
        Ok(available)
    }

    /// Full day view of a doctor's slots, free and taken, in chronological order.
    ///
    /// Without a requested duration each working window uses its template's slot length.
    #[instrument(skip(self))]
    pub async fn list_time_slots(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        duration_minutes: Option<u32>,
    ) -> SchedulingResult<Vec<TimeSlot>> {
        if duration_minutes == Some(0) {
            return Err(SchedulingError::validation("Slot duration must be positive"));
        }

        let day = DayOfWeek::of(date);
        let templates = self
            .call(WORKING_HOUR_STORE, self.templates.doctor_templates(doctor_id, day))
            .await?;

        let windows = self.day_windows(
            templates.iter().filter(|t| t.doctor_id == doctor_id && t.day_of_week == day),
            date,
        )?;
        let Some((window_start, window_end)) = span(&windows) else {
            debug!("Doctor {} has no working hours on {}", doctor_id, date);
            return Ok(vec![]);
        };

        let doctor_ids = [doctor_id];
        let (reservations, overrides) = tokio::try_join!(
            self.call(
                RESERVATION_LOOKUP,
                self.reservations.reservations(&doctor_ids, window_start, window_end),
            ),
            self.call(WORKING_HOUR_STORE, self.templates.overrides(&doctor_ids, date, date)),
        )?;

        let day_off = overrides.iter().any(|o| o.blocks(doctor_id, date));
        if day_off {
            debug!("Doctor {} is marked unavailable on {}", doctor_id, date);
        }

        let index = ReservationIndex::new(reservations);
        let slots = day_slots(doctor_id, &windows, duration_minutes, &index, day_off);

        debug!(
            "Generated {} slots for doctor {} on {} ({} free)",
            slots.len(),
            doctor_id,
            date,
            slots.iter().filter(|slot| slot.available).count()
        );
        Ok(slots)
    }

    /// Doctors of the tenant working at `time_of_day` on `day_of_week`.
    ///
    /// With a `date`, doctors holding a reservation or a day off over the tenant's
    /// slot window starting at that time are removed.
    #[instrument(skip(self))]
    pub async fn list_available_doctors(
        &self,
        tenant_id: Uuid,
        day_of_week: i32,
        time_of_day: NaiveTime,
        date: Option<NaiveDate>,
    ) -> SchedulingResult<Vec<Uuid>> {
        let day = DayOfWeek::new(day_of_week)?;
        if let Some(date) = date {
            if DayOfWeek::of(date) != day {
                return Err(SchedulingError::validation(format!(
                    "Date {} is a {}, not a {}",
                    date,
                    DayOfWeek::of(date),
                    day
                )));
            }
        }

        let templates = self
            .call(WORKING_HOUR_STORE, self.templates.active_templates(tenant_id, day))
            .await?;

        let candidates: BTreeSet<Uuid> = templates
            .iter()
            .filter(|t| t.tenant_id == tenant_id && t.day_of_week == day && t.is_active)
            .filter(|t| t.is_well_formed() && t.covers(time_of_day))
            .map(|t| t.doctor_id)
            .collect();

        let Some(date) = date else {
            debug!("{} doctors nominally work {} at {}", candidates.len(), day, time_of_day);
            return Ok(candidates.into_iter().collect());
        };

        if candidates.is_empty() {
            return Ok(vec![]);
        }

        let start = local_to_utc(date, time_of_day, self.offset)?;
        let end = start
            .checked_add_signed(Duration::minutes(i64::from(self.config.slot_window_for(tenant_id))))
            .ok_or_else(|| {
                SchedulingError::validation(format!(
                    "Slot window starting {} is outside the supported calendar",
                    start
                ))
            })?;
        let doctor_ids: Vec<Uuid> = candidates.into_iter().collect();

        let (reservations, overrides) = tokio::try_join!(
            self.call(RESERVATION_LOOKUP, self.reservations.reservations(&doctor_ids, start, end)),
            self.call(WORKING_HOUR_STORE, self.templates.overrides(&doctor_ids, date, date)),
        )?;

        let index = ReservationIndex::new(reservations);
        let available: Vec<Uuid> = doctor_ids
            .into_iter()
            .filter(|doctor_id| !overrides.iter().any(|o| o.blocks(*doctor_id, date)))
            .filter(|doctor_id| !index.is_busy(*doctor_id, start, end))
            .collect();

        info!(
            "{} doctors available for tenant {} on {} at {}",
            available.len(),
            tenant_id,
            date,
            time_of_day
        );
        Ok(available)
    }

    /// Dates in `[from, to]` on which at least one doctor of the tenant has a free slot.
    #[instrument(skip(self))]
    pub async fn list_available_dates(
        &self,
        tenant_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> SchedulingResult<Vec<NaiveDate>> {
        let dates = self.date_range(from, to)?;

        let weekdays: BTreeSet<DayOfWeek> = dates.iter().map(|date| DayOfWeek::of(*date)).collect();
        let fetched = try_join_all(weekdays.into_iter().map(move |day| async move {
            let templates = self
                .call(WORKING_HOUR_STORE, self.templates.active_templates(tenant_id, day))
                .await?;
            Ok::<_, SchedulingError>((day, templates))
        }))
        .await?;

        let templates_by_day: HashMap<DayOfWeek, Vec<WorkingHourTemplate>> = fetched
            .into_iter()
            .map(|(day, templates)| {
                let templates = templates
                    .into_iter()
                    .filter(|t| t.tenant_id == tenant_id && t.day_of_week == day && t.is_active)
                    .collect();
                (day, templates)
            })
            .collect();

        let doctor_ids: Vec<Uuid> = templates_by_day
            .values()
            .flatten()
            .map(|t| t.doctor_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if doctor_ids.is_empty() {
            debug!("Tenant {} has no active working hours", tenant_id);
            return Ok(vec![]);
        }

        let overrides = self
            .call(WORKING_HOUR_STORE, self.templates.overrides(&doctor_ids, from, to))
            .await?;

        let templates_by_day = &templates_by_day;
        let overrides = &overrides;
        let available: Vec<Option<NaiveDate>> = stream::iter(dates)
            .map(move |date| async move {
                let templates = templates_by_day
                    .get(&DayOfWeek::of(date))
                    .map(Vec::as_slice)
                    .unwrap_or(&[]);
                let has_free_slot = self.date_has_free_slot(date, templates, overrides).await?;
                Ok::<_, SchedulingError>(has_free_slot.then_some(date))
            })
            .buffered(self.config.max_concurrency.max(1))
            .try_collect()
            .await?;

        let available: Vec<NaiveDate> = available.into_iter().flatten().collect();
        info!(
            "{} of {} dates available for tenant {} between {} and {}",
            available.len(),
            (to - from).num_days() + 1,
            tenant_id,
            from,
            to
        );
        Ok(available)
    }

    /// First free slot of the doctor on or after `from`, searching `max_days` dates.
    ///
    /// Templates are read once per weekday in the range, reservations and
    /// overrides once for the whole range.
    #[instrument(skip(self))]
    pub async fn next_available_slot(
        &self,
        doctor_id: Uuid,
        from: NaiveDate,
        max_days: u32,
        duration_minutes: Option<u32>,
    ) -> SchedulingResult<Option<TimeSlot>> {
        if duration_minutes == Some(0) {
            return Err(SchedulingError::validation("Slot duration must be positive"));
        }
        if max_days == 0 {
            return Err(SchedulingError::validation("Search must cover at least one day"));
        }
        let last = from
            .checked_add_signed(Duration::days(i64::from(max_days) - 1))
            .ok_or_else(|| SchedulingError::validation("Search range exceeds the calendar"))?;
        let dates = self.date_range(from, last)?;

        let weekdays: BTreeSet<DayOfWeek> = dates.iter().map(|date| DayOfWeek::of(*date)).collect();
        let templates_by_day: HashMap<DayOfWeek, Vec<WorkingHourTemplate>> =
            try_join_all(weekdays.into_iter().map(move |day| async move {
                let templates = self
                    .call(WORKING_HOUR_STORE, self.templates.doctor_templates(doctor_id, day))
                    .await?;
                Ok::<_, SchedulingError>((day, templates))
            }))
            .await?
            .into_iter()
            .collect();

        let mut working_days: Vec<(NaiveDate, Vec<ScheduleWindow>)> = Vec::new();
        for date in dates {
            let day = DayOfWeek::of(date);
            let templates = templates_by_day.get(&day).map(Vec::as_slice).unwrap_or(&[]);
            let windows = self.day_windows(
                templates.iter().filter(|t| t.doctor_id == doctor_id && t.day_of_week == day),
                date,
            )?;
            if !windows.is_empty() {
                working_days.push((date, windows));
            }
        }

        let all_windows: Vec<ScheduleWindow> = working_days
            .iter()
            .flat_map(|(_, windows)| windows.iter().copied())
            .collect();
        let Some((window_start, window_end)) = span(&all_windows) else {
            debug!("Doctor {} has no working hours within {} days of {}", doctor_id, max_days, from);
            return Ok(None);
        };

        let doctor_ids = [doctor_id];
        let (reservations, overrides) = tokio::try_join!(
            self.call(
                RESERVATION_LOOKUP,
                self.reservations.reservations(&doctor_ids, window_start, window_end),
            ),
            self.call(WORKING_HOUR_STORE, self.templates.overrides(&doctor_ids, from, last)),
        )?;

        let index = ReservationIndex::new(reservations);
        for (date, windows) in &working_days {
            if overrides.iter().any(|o| o.blocks(doctor_id, *date)) {
                continue;
            }
            let free = day_slots(doctor_id, windows, duration_minutes, &index, false)
                .into_iter()
                .find(|slot| slot.available);
            if let Some(slot) = free {
                debug!("Next free slot for doctor {} starts {}", doctor_id, slot.start);
                return Ok(Some(slot));
            }
        }

        debug!("No free slot for doctor {} within {} days of {}", doctor_id, max_days, from);
        Ok(None)
    }

    async fn date_has_free_slot(
        &self,
        date: NaiveDate,
        templates: &[WorkingHourTemplate],
        overrides: &[AvailabilityOverride],
    ) -> SchedulingResult<bool> {
        let mut by_doctor: BTreeMap<Uuid, Vec<&WorkingHourTemplate>> = BTreeMap::new();
        for template in templates {
            if overrides.iter().any(|o| o.blocks(template.doctor_id, date)) {
                continue;
            }
            by_doctor.entry(template.doctor_id).or_default().push(template);
        }

        let mut doctor_windows: Vec<(Uuid, Vec<ScheduleWindow>)> = Vec::with_capacity(by_doctor.len());
        for (doctor_id, templates) in by_doctor {
            let windows = self.day_windows(templates, date)?;
            if !windows.is_empty() {
                doctor_windows.push((doctor_id, windows));
            }
        }

        let all_windows: Vec<ScheduleWindow> = doctor_windows
            .iter()
            .flat_map(|(_, windows)| windows.iter().copied())
            .collect();
        let Some((window_start, window_end)) = span(&all_windows) else {
            return Ok(false);
        };

        let doctor_ids: Vec<Uuid> = doctor_windows.iter().map(|(doctor_id, _)| *doctor_id).collect();
        let reservations = self
            .call(
                RESERVATION_LOOKUP,
                self.reservations.reservations(&doctor_ids, window_start, window_end),
            )
            .await?;
        let index = ReservationIndex::new(reservations);

        for (doctor_id, windows) in &doctor_windows {
            for window in windows {
                let mut slots = generate_slots(window.start, window.end, window.slot_minutes);
                if slots.any(|(start, end)| !index.is_busy(*doctor_id, start, end)) {
                    debug!("Doctor {} has a free slot on {}", doctor_id, date);
                    return Ok(true);
                }
            }
        }

        Ok(false)
    }

    fn date_range(&self, from: NaiveDate, to: NaiveDate) -> SchedulingResult<Vec<NaiveDate>> {
        if from > to {
            return Err(SchedulingError::validation(format!(
                "Range start {} is after range end {}",
                from, to
            )));
        }

        let days = (to - from).num_days() + 1;
        if days > i64::from(self.config.max_range_days) {
            return Err(SchedulingError::validation(format!(
                "Range of {} days exceeds the limit of {} days",
                days, self.config.max_range_days
            )));
        }

        Ok(from.iter_days().take(days as usize).collect())
    }

    fn day_windows<'a>(
        &self,
        templates: impl IntoIterator<Item = &'a WorkingHourTemplate>,
        date: NaiveDate,
    ) -> SchedulingResult<Vec<ScheduleWindow>> {
        let windows = templates
            .into_iter()
            .filter(|template| template.is_active)
            .filter(|template| {
                if !template.is_well_formed() {
                    warn!(
                        "Skipping malformed working hour template {} of doctor {}",
                        template.id, template.doctor_id
                    );
                }
                template.is_well_formed()
            })
            .map(|template| template.window_on(date, self.offset))
            .collect::<SchedulingResult<Vec<_>>>()?;

        Ok(merge_windows(windows))
    }

    async fn call<T>(
        &self,
        collaborator: &'static str,
        request: impl Future<Output = anyhow::Result<T>>,
    ) -> SchedulingResult<T> {
        match timeout(self.config.collaborator_timeout(), request).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(source)) => {
                warn!("{} request failed: {}", collaborator, source);
                Err(SchedulingError::Dependency {
                    collaborator,
                    source,
                })
            }
            Err(_) => {
                warn!(
                    "{} request timed out after {} ms",
                    collaborator, self.config.collaborator_timeout_ms
                );
                Err(SchedulingError::DependencyTimeout {
                    collaborator,
                    timeout_ms: self.config.collaborator_timeout_ms,
                })
            }
        }
    }
}

/// Slots of one doctor's day in window order, each marked against the reservation index.
fn day_slots(
    doctor_id: Uuid,
    windows: &[ScheduleWindow],
    duration_minutes: Option<u32>,
    index: &ReservationIndex,
    day_off: bool,
) -> Vec<TimeSlot> {
    windows
        .iter()
        .flat_map(|window| {
            let step = duration_minutes.unwrap_or(window.slot_minutes);
            generate_slots(window.start, window.end, step)
        })
        .map(|(start, end)| TimeSlot {
            start,
            end,
            available: !day_off && !index.is_busy(doctor_id, start, end),
        })
        .collect()
}

fn span(windows: &[ScheduleWindow]) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let start = windows.iter().map(|window| window.start).min()?;
    let end = windows.iter().map(|window| window.end).max()?;
    Some((start, end))
}
