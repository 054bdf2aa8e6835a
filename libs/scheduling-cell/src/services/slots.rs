use chrono::{DateTime, Duration, Utc};

use crate::models::ScheduleWindow;

/// Fixed-length slots of one working window.
///
/// A slot is only produced when it ends on or before the window end, so a
/// window of length `L` yields `floor(L / d)` contiguous slots and never a
/// truncated trailing one. Iteration also stops where the next slot end would
/// leave the representable time range. The iterator is cheap to clone and restart.
#[derive(Debug, Clone)]
pub struct Slots {
    next_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
    step: Duration,
}

impl Iterator for Slots {
    type Item = (DateTime<Utc>, DateTime<Utc>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.step <= Duration::zero() {
            return None;
        }

        let start = self.next_start;
        let end = start.checked_add_signed(self.step)?;
        if end > self.window_end {
            return None;
        }

        self.next_start = end;
        Some((start, end))
    }
}

pub fn generate_slots(
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
    duration_minutes: u32,
) -> Slots {
    Slots {
        next_start: window_start,
        window_end,
        step: Duration::minutes(i64::from(duration_minutes)),
    }
}

/// Union of overlapping windows, ordered by start.
///
/// Windows that only touch stay separate so each keeps its own slot length.
/// Windows that share time merge into one window using the shortest slot
/// length among them.
pub fn merge_windows(mut windows: Vec<ScheduleWindow>) -> Vec<ScheduleWindow> {
    windows.retain(|window| window.start < window.end);
    windows.sort_by_key(|window| (window.start, window.end));

    let mut merged: Vec<ScheduleWindow> = Vec::with_capacity(windows.len());
    for window in windows {
        match merged.last_mut() {
            Some(current) if window.start < current.end => {
                current.end = current.end.max(window.end);
                current.slot_minutes = current.slot_minutes.min(window.slot_minutes);
            }
            _ => merged.push(window),
        }
    }

    merged
}
