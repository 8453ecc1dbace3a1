//! Scores and assigns employees to shift instances for one date, round-robin
//! over shift categories, with a per-run fairness history (spec §4.6).
//!
//! Grounded on `original_source/src/backend/services/scheduler/distribution.py`,
//! which keeps exactly this shape: a running per-employee tally by category,
//! a weighted score, and a prioritized round-robin over shift types.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::availability::AvailabilityChecker;
use crate::config::EngineConfig;
use crate::constraints::ConstraintChecker;
use crate::coverage::CoverageResolver;
use crate::diagnostics::{Issue, IssueKind};
use crate::models::{AvailabilityKind, Employee, IssueSeverity, ShiftTemplate, ShiftType};
use crate::resources::Resources;
use crate::schedule_state::ScheduleState;
use crate::time_math::{self, ParseError};
use crate::weekday::day_index;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShiftCategory {
    Standard,
    EarlyMorning,
    LateNight,
    Weekend,
    Holiday,
    Split,
}

impl ShiftCategory {
    fn base_score(self) -> f64 {
        match self {
            ShiftCategory::Standard => 1.0,
            ShiftCategory::EarlyMorning => 3.0,
            ShiftCategory::LateNight => 4.0,
            ShiftCategory::Weekend => 5.0,
            ShiftCategory::Holiday => 5.5,
            ShiftCategory::Split => 2.0,
        }
    }
}

/// Classifies `shift` on `date` into exactly one category, using the
/// precedence WEEKEND > HOLIDAY > EARLY_MORNING > LATE_NIGHT > STANDARD.
/// SPLIT shifts are not derivable from the current data model (no
/// break-segmented templates) and are reserved for a future template shape.
pub fn categorize(shift: &ShiftTemplate, date: NaiveDate, holidays: &HashSet<NaiveDate>) -> Result<ShiftCategory, ParseError> {
    let is_weekend = crate::weekday::is_weekend(date);
    let is_holiday = holidays.contains(&date);
    let start_minutes = time_math::time_to_minutes(&shift.start_time)?;
    let end_minutes = time_math::time_to_minutes(&shift.end_time)?;
    let eight_am = time_math::time_to_minutes("08:00")?;
    let eight_pm = time_math::time_to_minutes("20:00")?;
    let crosses_midnight = end_minutes <= start_minutes;
    let is_early = start_minutes < eight_am;
    let is_late = crosses_midnight || end_minutes > eight_pm;

    Ok(if is_weekend {
        ShiftCategory::Weekend
    } else if is_holiday {
        ShiftCategory::Holiday
    } else if is_early {
        ShiftCategory::EarlyMorning
    } else if is_late {
        ShiftCategory::LateNight
    } else {
        ShiftCategory::Standard
    })
}

/// Read-only fairness snapshot returned by [`DistributionManager::metrics`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributionMetrics {
    pub total_shifts: u32,
    pub total_hours: f64,
    pub by_category_pct: HashMap<ShiftCategory, f64>,
}

#[derive(Debug, Clone, Default)]
struct EmployeeHistory {
    by_category: HashMap<ShiftCategory, u32>,
    total_shifts: u32,
    total_hours: f64,
}

impl EmployeeHistory {
    fn ratio(&self, category: ShiftCategory) -> f64 {
        if self.total_shifts == 0 {
            return 0.0;
        }
        *self.by_category.get(&category).unwrap_or(&0) as f64 / self.total_shifts as f64
    }
}

pub struct DistributionManager {
    fairness_weight: f64,
    preference_weight: f64,
    seniority_weight: f64,
    holidays: HashSet<NaiveDate>,
    history: HashMap<i64, EmployeeHistory>,
}

impl DistributionManager {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            fairness_weight: config.fairness_weight,
            preference_weight: config.preference_weight,
            seniority_weight: config.seniority_weight,
            holidays: HashSet::new(),
            history: HashMap::new(),
        }
    }

    pub fn with_holidays(mut self, holidays: HashSet<NaiveDate>) -> Self {
        self.holidays = holidays;
        self
    }

    pub fn score(&self, employee: &Employee, shift: &ShiftTemplate, date: NaiveDate) -> Result<f64, ParseError> {
        let category = categorize(shift, date, &self.holidays)?;
        let history = self.history.get(&employee.id).cloned().unwrap_or_default();

        let history_adj = {
            let ratio = history.ratio(category);
            if ratio < 0.2 {
                -1.0
            } else if ratio > 0.4 {
                1.0
            } else {
                0.0
            }
        };

        let preference_adj = employee
            .preferences
            .as_ref()
            .map(|prefs| {
                let day = day_index(date);
                let avoided = prefs.avoided_days.contains(&day) || prefs.avoided_shift_ids.contains(&shift.id);
                let preferred = prefs.preferred_days.contains(&day) || prefs.preferred_shift_ids.contains(&shift.id);
                if avoided {
                    2.0
                } else if preferred {
                    -2.0
                } else {
                    0.0
                }
            })
            .unwrap_or(0.0);

        let seniority_adj = 0.0;

        Ok(category.base_score()
            + self.fairness_weight * history_adj
            + self.preference_weight * preference_adj
            + self.seniority_weight * seniority_adj)
    }

    fn record(&mut self, employee_id: i64, category: ShiftCategory, hours: f64) {
        let entry = self.history.entry(employee_id).or_default();
        *entry.by_category.entry(category).or_insert(0) += 1;
        entry.total_shifts += 1;
        entry.total_hours += hours;
    }

    /// Per-employee fairness snapshot: percentage of this run's shifts that
    /// fell into each category, plus totals. Read-only, purely additive —
    /// callers inspecting distribution after generation, not consulted by
    /// the assignment pipeline itself.
    pub fn metrics(&self) -> HashMap<i64, DistributionMetrics> {
        self.history
            .iter()
            .map(|(&employee_id, history)| {
                let by_category_pct = history
                    .by_category
                    .iter()
                    .map(|(&category, &count)| {
                        let pct = if history.total_shifts == 0 {
                            0.0
                        } else {
                            100.0 * count as f64 / history.total_shifts as f64
                        };
                        (category, pct)
                    })
                    .collect();
                (
                    employee_id,
                    DistributionMetrics {
                        total_shifts: history.total_shifts,
                        total_hours: history.total_hours,
                        by_category_pct,
                    },
                )
            })
            .collect()
    }

    /// Resets per-run fairness history. Exercised by tests that want a clean
    /// slate between scenarios within the same `DistributionManager`,
    /// mirroring the original's `distribution.clear_caches`.
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Runs the full per-date assignment pipeline (spec §4.6 steps 1-5):
    /// materialize active instances, prioritize MIDDLE first, run a
    /// keyholder pre-pass, then round-robin the remaining demand.
    #[allow(clippy::too_many_arguments)]
    pub fn assign_day(
        &mut self,
        date: NaiveDate,
        resources: &Resources,
        config: &EngineConfig,
        schedule: &mut ScheduleState,
    ) -> Result<Vec<Issue>, ParseError> {
        let mut issues = Vec::new();
        let day = day_index(date);

        let mut shifts_by_type: BTreeMap<ShiftType, Vec<&ShiftTemplate>> = BTreeMap::new();
        for shift in resources.all_shifts() {
            if shift.is_active_on(day) {
                shifts_by_type.entry(shift.shift_type()?).or_default().push(shift);
            }
        }

        let priority_order = prioritized_types(&shifts_by_type);
        let coverage_resolver = CoverageResolver::new(resources);
        let availability_checker = AvailabilityChecker::new(resources);
        let constraint_checker = ConstraintChecker::new(config);

        // Keyholder pre-pass.
        for shifts in shifts_by_type.values() {
            for shift in shifts.iter().copied() {
                let demand = coverage_resolver.required_staffing(date, &shift.start_time, config.interval_duration_minutes)?;
                if !(demand.requires_keyholder || shift.requires_keyholder) {
                    continue;
                }

                let mut keyholders: Vec<(&Employee, f64)> = Vec::new();
                for employee in resources.get_keyholders() {
                    if schedule.has_assignment(employee.id, date) {
                        continue;
                    }
                    if config.enforce_availability {
                        let (available, _) = availability_checker.is_available(employee, date, shift)?;
                        if !available {
                            continue;
                        }
                    }
                    if constraint_checker.exceeds_constraints(employee, date, shift, schedule)? {
                        continue;
                    }
                    let score = self.score(employee, shift, date)?;
                    keyholders.push((employee, score));
                }
                keyholders.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap().then(a.0.id.cmp(&b.0.id)));

                if let Some((employee, _)) = keyholders.into_iter().next() {
                    let (_, kind) = availability_checker.is_available(employee, date, shift)?;
                    let hours = shift.duration_hours()?;
                    let category = categorize(shift, date, &self.holidays)?;
                    schedule.record_shift(employee.id, date, (*shift).clone(), kind);
                    self.record(employee.id, category, hours);
                }
            }
        }

        // Main pass: a literal round-robin over the prioritized types. Each
        // round pops one instance per type's queue (not a full drain of one
        // type before the next), so history updated by an earlier type in a
        // round is visible to scoring later in the same round, matching
        // spec §4.6 steps 4-5.
        let mut queues: Vec<(ShiftType, VecDeque<&ShiftTemplate>)> = priority_order
            .iter()
            .map(|&t| {
                (
                    t,
                    shifts_by_type.get(&t).cloned().unwrap_or_default().into_iter().collect(),
                )
            })
            .collect();

        loop {
            let mut progressed = false;
            for (_, queue) in queues.iter_mut() {
                let Some(shift) = queue.pop_front() else {
                    continue;
                };
                progressed = true;

                let demand = coverage_resolver.required_staffing(date, &shift.start_time, config.interval_duration_minutes)?;
                let already_assigned = count_assigned_to_shift(schedule, resources, date, shift.id);
                let remaining = demand.min_employees.saturating_sub(already_assigned);
                if remaining == 0 {
                    continue;
                }

                let mut candidates: Vec<(&Employee, f64)> = Vec::new();
                for employee in resources.get_active_employees() {
                    if schedule.has_assignment(employee.id, date) {
                        continue;
                    }
                    if let Some(types) = demand.employee_types_or_any() {
                        if !types.contains(&employee.group) {
                            continue;
                        }
                    }
                    if let Some(groups) = demand.allowed_groups_or_any() {
                        if !groups.contains(&employee.group) {
                            continue;
                        }
                    }
                    if config.enforce_availability {
                        let (available, _) = availability_checker.is_available(employee, date, shift)?;
                        if !available {
                            continue;
                        }
                    }
                    if constraint_checker.exceeds_constraints(employee, date, shift, schedule)? {
                        continue;
                    }
                    let score = self.score(employee, shift, date)?;
                    candidates.push((employee, score));
                }
                candidates.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap().then(a.0.id.cmp(&b.0.id)));

                let mut filled = 0u32;
                for (employee, _) in candidates {
                    if filled >= remaining {
                        break;
                    }
                    let (_, kind) = availability_checker.is_available(employee, date, shift)?;
                    let hours = shift.duration_hours()?;
                    let category = categorize(shift, date, &self.holidays)?;
                    schedule.record_shift(employee.id, date, (*shift).clone(), kind);
                    self.record(employee.id, category, hours);
                    filled += 1;
                }

                if filled < remaining {
                    issues.push(
                        Issue::new(
                            IssueKind::Understaffing,
                            IssueSeverity::Warning,
                            format!(
                                "shift {} on {} filled {}/{} required",
                                shift.id,
                                date,
                                already_assigned + filled,
                                demand.min_employees
                            ),
                        )
                        .with_details(serde_json::json!({ "shift_id": shift.id, "date": date.to_string() })),
                    );
                }
            }
            if !progressed {
                break;
            }
        }

        Ok(issues)
    }
}

fn count_assigned_to_shift(schedule: &ScheduleState, resources: &Resources, date: NaiveDate, shift_id: i64) -> u32 {
    resources
        .get_active_employees()
        .iter()
        .filter(|e| schedule.shift_template_on(e.id, date).is_some_and(|s| s.id == shift_id))
        .count() as u32
}

/// MIDDLE first, then LATE, then EARLY, then anything else encountered (in
/// `ShiftType`'s declared order, via the `BTreeMap`'s key order, so the
/// "remaining types" tail is deterministic run to run), per spec §4.6 step 2
/// ("retail data shows EARLY over-allocation").
fn prioritized_types(shifts_by_type: &BTreeMap<ShiftType, Vec<&ShiftTemplate>>) -> Vec<ShiftType> {
    let mut order = vec![ShiftType::Middle, ShiftType::Late, ShiftType::Early];
    for &shift_type in shifts_by_type.keys() {
        if !order.contains(&shift_type) {
            order.push(shift_type);
        }
    }
    order.retain(|t| shifts_by_type.contains_key(t));
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Employee, EmployeeGroup};
    use std::collections::HashSet;

    fn employee(id: i64) -> Employee {
        Employee {
            id,
            group: EmployeeGroup::FullTime,
            contracted_hours: 40.0,
            is_active: true,
            is_keyholder: false,
            preferences: None,
        }
    }

    fn shift(start: &str, end: &str) -> ShiftTemplate {
        ShiftTemplate {
            id: 1,
            start_time: start.into(),
            end_time: end.into(),
            requires_break: false,
            active_days: HashSet::from([0]),
            requires_keyholder: false,
        }
    }

    #[test]
    fn categorize_prioritizes_weekend_over_early() {
        let saturday = NaiveDate::from_ymd_opt(2024, 11, 9).unwrap();
        let category = categorize(&shift("06:00", "14:00"), saturday, &HashSet::new()).unwrap();
        assert_eq!(category, ShiftCategory::Weekend);
    }

    #[test]
    fn categorize_detects_early_and_late() {
        let monday = NaiveDate::from_ymd_opt(2024, 11, 4).unwrap();
        assert_eq!(categorize(&shift("06:00", "14:00"), monday, &HashSet::new()).unwrap(), ShiftCategory::EarlyMorning);
        assert_eq!(categorize(&shift("13:00", "21:00"), monday, &HashSet::new()).unwrap(), ShiftCategory::LateNight);
        assert_eq!(categorize(&shift("10:00", "18:00"), monday, &HashSet::new()).unwrap(), ShiftCategory::Standard);
    }

    #[test]
    fn history_adjustment_discourages_overrepresented_category() {
        let config = EngineConfig::default();
        let mut manager = DistributionManager::new(&config);
        let monday = NaiveDate::from_ymd_opt(2024, 11, 4).unwrap();
        let standard_shift = shift("10:00", "18:00");

        for _ in 0..5 {
            manager.record(1, ShiftCategory::Standard, 8.0);
        }

        let score = manager.score(&employee(1), &standard_shift, monday).unwrap();
        assert!(score > ShiftCategory::Standard.base_score());
    }

    #[test]
    fn preference_adjustment_rewards_preferred_day() {
        let config = EngineConfig::default();
        let manager = DistributionManager::new(&config);
        let monday = NaiveDate::from_ymd_opt(2024, 11, 4).unwrap();
        let mut emp = employee(1);
        emp.preferences = Some(crate::models::EmployeePreferences {
            preferred_days: HashSet::from([0]),
            ..Default::default()
        });

        let score = manager.score(&emp, &shift("10:00", "18:00"), monday).unwrap();
        assert!(score < ShiftCategory::Standard.base_score());
    }
}
