use std::collections::HashMap;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

pub const DEFAULT_SLOT_MINUTES: u32 = 30;
pub const DEFAULT_COLLABORATOR_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_MAX_CONCURRENCY: usize = 8;
pub const DEFAULT_MAX_RANGE_DAYS: u32 = 366;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulingConfig {
    /// Window used by doctor availability checks when the caller gives no duration.
    pub default_slot_minutes: u32,
    /// Per-tenant replacement for `default_slot_minutes`.
    pub tenant_slot_minutes: HashMap<Uuid, u32>,
    /// Offset of clinic-local template times from UTC.
    pub utc_offset_minutes: i32,
    pub collaborator_timeout_ms: u64,
    /// Number of calendar dates evaluated concurrently by range scans.
    pub max_concurrency: usize,
    pub max_range_days: u32,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            default_slot_minutes: DEFAULT_SLOT_MINUTES,
            tenant_slot_minutes: HashMap::new(),
            utc_offset_minutes: 0,
            collaborator_timeout_ms: DEFAULT_COLLABORATOR_TIMEOUT_MS,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            max_range_days: DEFAULT_MAX_RANGE_DAYS,
        }
    }
}

impl SchedulingConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let tenant_slot_minutes = match env::var("SCHEDULING_TENANT_SLOT_MINUTES") {
            Ok(raw) => parse_tenant_slot_minutes(&raw),
            Err(_) => HashMap::new(),
        };

        let config = Self {
            default_slot_minutes: env_or("SCHEDULING_DEFAULT_SLOT_MINUTES", defaults.default_slot_minutes),
            tenant_slot_minutes,
            utc_offset_minutes: env_or("SCHEDULING_UTC_OFFSET_MINUTES", defaults.utc_offset_minutes),
            collaborator_timeout_ms: env_or("SCHEDULING_COLLABORATOR_TIMEOUT_MS", defaults.collaborator_timeout_ms),
            max_concurrency: env_or("SCHEDULING_MAX_CONCURRENCY", defaults.max_concurrency),
            max_range_days: env_or("SCHEDULING_MAX_RANGE_DAYS", defaults.max_range_days),
        };

        if !config.is_valid() {
            warn!("Scheduling configuration has out-of-range values, falling back to defaults");
            return defaults;
        }

        config
    }

    pub fn is_valid(&self) -> bool {
        self.default_slot_minutes > 0
            && self.tenant_slot_minutes.values().all(|minutes| *minutes > 0)
            && self.max_concurrency > 0
            && self.max_range_days > 0
            && self.utc_offset().is_some()
    }

    /// Slot window applied to a tenant's doctor availability checks.
    pub fn slot_window_for(&self, tenant_id: Uuid) -> u32 {
        self.tenant_slot_minutes
            .get(&tenant_id)
            .copied()
            .unwrap_or(self.default_slot_minutes)
    }

    pub fn collaborator_timeout(&self) -> Duration {
        Duration::from_millis(self.collaborator_timeout_ms)
    }

    pub fn utc_offset(&self) -> Option<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_minutes.checked_mul(60)?)
    }
}

fn env_or<T: FromStr + std::fmt::Display>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has invalid value '{}', using default {}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}

/// Parses `<tenant uuid>=<minutes>` pairs separated by commas. Malformed pairs are skipped.
pub fn parse_tenant_slot_minutes(raw: &str) -> HashMap<Uuid, u32> {
    let mut overrides = HashMap::new();

    for pair in raw.split(',').map(str::trim).filter(|pair| !pair.is_empty()) {
        let parsed = pair.split_once('=').and_then(|(tenant, minutes)| {
            let tenant = Uuid::parse_str(tenant.trim()).ok()?;
            let minutes = minutes.trim().parse::<u32>().ok().filter(|m| *m > 0)?;
            Some((tenant, minutes))
        });

        match parsed {
            Some((tenant, minutes)) => {
                overrides.insert(tenant, minutes);
            }
            None => warn!("Ignoring malformed tenant slot override '{}'", pair),
        }
    }

    overrides
}
