//! Answers whether an employee may work a given shift instance, per spec §4.4.

use chrono::{Duration, NaiveDate};

use crate::models::{AvailabilityKind, Employee, ShiftTemplate};
use crate::resources::Resources;
use crate::time_math::{self, ParseError};
use crate::weekday::day_index;

pub struct AvailabilityChecker<'a> {
    resources: &'a Resources,
}

impl<'a> AvailabilityChecker<'a> {
    pub fn new(resources: &'a Resources) -> Self {
        Self { resources }
    }

    /// Checks every hour the shift spans. An overnight shift (end <= start)
    /// spans into the following calendar day; each hour is evaluated against
    /// its own weekday's availability rows.
    pub fn is_available(
        &self,
        employee: &Employee,
        date: NaiveDate,
        shift: &ShiftTemplate,
    ) -> Result<(bool, AvailabilityKind), ParseError> {
        if self
            .resources
            .get_employee_absences(employee.id, date, date)
            .iter()
            .any(|a| a.covers(date))
        {
            return Ok((false, AvailabilityKind::Unavailable));
        }

        let start_minutes = time_math::time_to_minutes(&shift.start_time)?;
        let end_minutes = time_math::time_to_minutes(&shift.end_time)?;
        let start_hour = (start_minutes / 60) as u8;
        let end_hour_raw = end_minutes / 60 + if end_minutes % 60 != 0 { 1 } else { 0 };

        let spans = if end_minutes <= start_minutes {
            vec![(date, start_hour, 24u8), (date + Duration::days(1), 0u8, end_hour_raw.min(24) as u8)]
        } else {
            vec![(date, start_hour, end_hour_raw.min(24) as u8)]
        };

        let mut best: Option<AvailabilityKind> = None;

        for (day, from_hour, to_hour) in spans {
            let day_of_week = day_index(day);
            let rows = self.resources.get_employee_availability(employee.id, day_of_week);

            for hour in from_hour..to_hour {
                let row = rows.iter().find(|r| r.hour == hour);
                match row {
                    None => return Ok((false, AvailabilityKind::Unavailable)),
                    Some(row) if row.availability_type == AvailabilityKind::Unavailable || !row.is_available => {
                        return Ok((false, AvailabilityKind::Unavailable));
                    }
                    Some(row) => {
                        best = Some(match best {
                            Some(current) => current.most_permissive(row.availability_type),
                            None => row.availability_type,
                        });
                    }
                }
            }
        }

        Ok((true, best.unwrap_or(AvailabilityKind::Available)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Employee, EmployeeAvailability, EmployeeGroup, ShiftTemplate};
    use crate::resources::{ResourceSnapshot, Resources};
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

    fn available_hours(employee_id: i64, day: u8, hours: std::ops::Range<u8>, kind: AvailabilityKind) -> Vec<EmployeeAvailability> {
        hours
            .map(|hour| EmployeeAvailability {
                employee_id,
                day_of_week: day,
                hour,
                is_available: true,
                availability_type: kind,
            })
            .collect()
    }

    #[test]
    fn available_across_every_covered_hour() {
        let snapshot = ResourceSnapshot {
            shifts: vec![shift("08:00", "16:00")],
            availabilities: available_hours(1, 0, 8..16, AvailabilityKind::Fixed),
            ..Default::default()
        };
        let resources = Resources::load(snapshot).unwrap();
        let checker = AvailabilityChecker::new(&resources);
        let monday = NaiveDate::from_ymd_opt(2024, 11, 4).unwrap();

        let (ok, kind) = checker.is_available(&employee(1), monday, &shift("08:00", "16:00")).unwrap();
        assert!(ok);
        assert_eq!(kind, AvailabilityKind::Fixed);
    }

    #[test]
    fn missing_hour_is_unavailable() {
        let snapshot = ResourceSnapshot {
            shifts: vec![shift("08:00", "16:00")],
            availabilities: available_hours(1, 0, 8..15, AvailabilityKind::Available),
            ..Default::default()
        };
        let resources = Resources::load(snapshot).unwrap();
        let checker = AvailabilityChecker::new(&resources);
        let monday = NaiveDate::from_ymd_opt(2024, 11, 4).unwrap();

        let (ok, kind) = checker.is_available(&employee(1), monday, &shift("08:00", "16:00")).unwrap();
        assert!(!ok);
        assert_eq!(kind, AvailabilityKind::Unavailable);
    }

    #[test]
    fn absence_wins_over_availability_rows() {
        use crate::models::Absence;

        let monday = NaiveDate::from_ymd_opt(2024, 11, 4).unwrap();
        let snapshot = ResourceSnapshot {
            shifts: vec![shift("08:00", "16:00")],
            availabilities: available_hours(1, 0, 8..16, AvailabilityKind::Fixed),
            absences: vec![Absence {
                employee_id: 1,
                start_date: monday,
                end_date: monday,
                reason: "sick".into(),
                approved: true,
            }],
            ..Default::default()
        };
        let resources = Resources::load(snapshot).unwrap();
        let checker = AvailabilityChecker::new(&resources);

        let (ok, kind) = checker.is_available(&employee(1), monday, &shift("08:00", "16:00")).unwrap();
        assert!(!ok);
        assert_eq!(kind, AvailabilityKind::Unavailable);
    }

    #[test]
    fn overnight_shift_checks_both_calendar_days() {
        let monday = NaiveDate::from_ymd_opt(2024, 11, 4).unwrap();
        let mut availabilities = available_hours(1, 0, 22..24, AvailabilityKind::Preferred);
        availabilities.extend(available_hours(1, 1, 0..6, AvailabilityKind::Preferred));

        let snapshot = ResourceSnapshot {
            shifts: vec![shift("22:00", "06:00")],
            availabilities,
            ..Default::default()
        };
        let resources = Resources::load(snapshot).unwrap();
        let checker = AvailabilityChecker::new(&resources);

        let (ok, kind) = checker.is_available(&employee(1), monday, &shift("22:00", "06:00")).unwrap();
        assert!(ok);
        assert_eq!(kind, AvailabilityKind::Preferred);
    }
}
