//! Generation configuration, per spec §6. Every enforcement flag defaults to
//! `true`; numeric caps default to the values spec §3/§4.5/§6 list for each
//! employee group.
//!
//! Grounded on `original_source/src/backend/services/scheduler/config.py`,
//! which holds the same defaults as a plain dataclass; here they live behind
//! `serde`/`toml` so a host application can load overrides from a config file
//! the way the rest of this workspace already does (`shared::config` in the
//! sibling services).

use serde::{Deserialize, Serialize};

use crate::models::{EmployeeGroup, ShiftType};

/// Per-group cap table. A flat, named-field struct rather than a
/// `HashMap<EmployeeGroup, _>` so overrides round-trip cleanly through TOML,
/// which only supports string-keyed tables.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupCaps<T> {
    pub full_time: T,
    pub part_time: T,
    pub mini_job: T,
    pub team_lead: T,
}

impl<T: Copy> GroupCaps<T> {
    pub fn get(&self, group: EmployeeGroup) -> T {
        match group {
            EmployeeGroup::FullTime => self.full_time,
            EmployeeGroup::PartTime => self.part_time,
            EmployeeGroup::MiniJob => self.mini_job,
            EmployeeGroup::TeamLead => self.team_lead,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ShiftTypeCaps {
    pub early: u32,
    pub middle: u32,
    pub late: u32,
    pub night: u32,
    pub custom: u32,
}

impl ShiftTypeCaps {
    pub fn get(&self, shift_type: ShiftType) -> u32 {
        match shift_type {
            ShiftType::Early => self.early,
            ShiftType::Middle => self.middle,
            ShiftType::Late => self.late,
            ShiftType::Night => self.night,
            ShiftType::Custom => self.custom,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub enforce_min_coverage: bool,
    pub enforce_contracted_hours: bool,
    pub enforce_keyholder: bool,
    pub enforce_rest_periods: bool,
    pub enforce_max_shifts: bool,
    pub enforce_max_hours: bool,
    pub enforce_consecutive_days: bool,
    pub enforce_weekend_distribution: bool,
    pub enforce_early_late_rules: bool,
    pub enforce_break_rules: bool,
    pub enforce_availability: bool,

    pub min_rest_hours: f64,
    pub max_consecutive_days: u32,

    pub max_hours_per_group: GroupCaps<f64>,
    pub max_shifts_per_group: GroupCaps<u32>,
    pub max_daily_hours_per_group: GroupCaps<f64>,
    pub max_shifts_per_type: ShiftTypeCaps,

    pub interval_duration_minutes: u32,
    pub create_empty_schedules: bool,

    /// Weekdays (0=Monday..6=Sunday) the store is closed on, absent explicit
    /// per-date overrides. Resolves Open Question 2 (spec §9): Sunday closure
    /// is a configurable default, not a hard-coded constant.
    pub closed_weekdays: std::collections::HashSet<u8>,

    pub fairness_weight: f64,
    pub preference_weight: f64,
    pub seniority_weight: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            enforce_min_coverage: true,
            enforce_contracted_hours: true,
            enforce_keyholder: true,
            enforce_rest_periods: true,
            enforce_max_shifts: true,
            enforce_max_hours: true,
            enforce_consecutive_days: true,
            enforce_weekend_distribution: true,
            enforce_early_late_rules: true,
            enforce_break_rules: true,
            enforce_availability: true,

            min_rest_hours: 11.0,
            max_consecutive_days: 5,

            max_hours_per_group: GroupCaps {
                full_time: 40.0,
                team_lead: 40.0,
                part_time: 30.0,
                mini_job: 15.0,
            },
            max_shifts_per_group: GroupCaps {
                full_time: 5,
                team_lead: 5,
                part_time: 4,
                mini_job: 3,
            },
            max_daily_hours_per_group: GroupCaps {
                full_time: 8.0,
                team_lead: 8.0,
                part_time: 8.0,
                mini_job: 6.0,
            },
            max_shifts_per_type: ShiftTypeCaps {
                early: 5,
                middle: 5,
                late: 4,
                night: 3,
                custom: u32::MAX,
            },

            interval_duration_minutes: 60,
            create_empty_schedules: false,

            closed_weekdays: std::collections::HashSet::from([6]),

            fairness_weight: 1.0,
            preference_weight: 1.0,
            seniority_weight: 0.5,
        }
    }
}

impl<T: Default> Default for GroupCaps<T> {
    fn default() -> Self {
        Self {
            full_time: T::default(),
            part_time: T::default(),
            mini_job: T::default(),
            team_lead: T::default(),
        }
    }
}

impl Default for ShiftTypeCaps {
    fn default() -> Self {
        Self {
            early: 0,
            middle: 0,
            late: 0,
            night: 0,
            custom: 0,
        }
    }
}

impl EngineConfig {
    pub fn max_hours_for(&self, group: EmployeeGroup) -> f64 {
        self.max_hours_per_group.get(group)
    }

    pub fn max_shifts_for(&self, group: EmployeeGroup) -> u32 {
        self.max_shifts_per_group.get(group)
    }

    pub fn max_daily_hours_for(&self, group: EmployeeGroup) -> f64 {
        self.max_daily_hours_per_group.get(group)
    }

    pub fn max_shifts_for_type(&self, shift_type: ShiftType) -> u32 {
        self.max_shifts_per_type.get(shift_type)
    }

    pub fn is_store_open(&self, day_index: u8) -> bool {
        !self.closed_weekdays.contains(&day_index)
    }

    /// Parses a partial TOML document and overlays it onto [`EngineConfig::default`].
    /// Fields absent from `toml_str` keep their default value, since `EngineConfig`
    /// derives `Deserialize` with `#[serde(default)]` on every field.
    pub fn load_with_overrides(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_group_caps() {
        let config = EngineConfig::default();
        assert_eq!(config.max_hours_for(EmployeeGroup::MiniJob), 15.0);
        assert_eq!(config.max_shifts_for(EmployeeGroup::PartTime), 4);
        assert_eq!(config.max_daily_hours_for(EmployeeGroup::MiniJob), 6.0);
        assert!(!config.is_store_open(6));
        assert!(config.is_store_open(0));
    }

    #[test]
    fn overrides_merge_onto_defaults() {
        let config = EngineConfig::load_with_overrides("min_rest_hours = 9.0\n").unwrap();
        assert_eq!(config.min_rest_hours, 9.0);
        assert_eq!(config.max_consecutive_days, 5); // untouched default survives
    }
}
