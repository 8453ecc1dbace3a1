//! The data model, per spec §3. Identity is an integer id throughout; there
//! are no cyclic references — history and constraint checks carry employee
//! ids, never employee objects (spec §9).

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmployeeGroup {
    FullTime,
    PartTime,
    MiniJob,
    TeamLead,
}

impl EmployeeGroup {
    /// The source domain's shorthand (VZ/TZ/GFB/TL), used in logging and in
    /// messages surfaced to schedulers who already think in these terms.
    pub fn abbreviation(self) -> &'static str {
        match self {
            EmployeeGroup::FullTime => "VZ",
            EmployeeGroup::PartTime => "TZ",
            EmployeeGroup::MiniJob => "GFB",
            EmployeeGroup::TeamLead => "TL",
        }
    }

    /// Priority rank used to sort `get_active_employees`: TL=1, VZ=2, TZ=3, GFB=4.
    pub fn priority_rank(self) -> u8 {
        match self {
            EmployeeGroup::TeamLead => 1,
            EmployeeGroup::FullTime => 2,
            EmployeeGroup::PartTime => 3,
            EmployeeGroup::MiniJob => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShiftType {
    Early,
    Middle,
    Late,
    Night,
    Custom,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AvailabilityKind {
    Fixed,
    Preferred,
    Available,
    Unavailable,
}

impl AvailabilityKind {
    /// FIXED > PREFERRED > AVAILABLE, used when folding multiple matching
    /// availability rows down to the single "best" kind for a shift.
    fn precedence(self) -> u8 {
        match self {
            AvailabilityKind::Fixed => 3,
            AvailabilityKind::Preferred => 2,
            AvailabilityKind::Available => 1,
            AvailabilityKind::Unavailable => 0,
        }
    }

    pub fn most_permissive(self, other: AvailabilityKind) -> AvailabilityKind {
        if self.precedence() >= other.precedence() {
            self
        } else {
            other
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssignmentStatus {
    Draft,
    Pending,
    Assigned,
    Confirmed,
    Cancelled,
    Empty,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    Info,
    Warning,
    Critical,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct EmployeePreferences {
    #[serde(default)]
    pub preferred_days: HashSet<u8>,
    #[serde(default)]
    pub avoided_days: HashSet<u8>,
    #[serde(default)]
    pub preferred_shift_ids: HashSet<i64>,
    #[serde(default)]
    pub avoided_shift_ids: HashSet<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Employee {
    pub id: i64,
    pub group: EmployeeGroup,
    pub contracted_hours: f64,
    pub is_active: bool,
    pub is_keyholder: bool,
    #[serde(default)]
    pub preferences: Option<EmployeePreferences>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ShiftTemplate {
    pub id: i64,
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub requires_break: bool,
    /// Weekday indices (0=Monday..6=Sunday) this template is materialized on.
    pub active_days: HashSet<u8>,
    #[serde(default)]
    pub requires_keyholder: bool,
}

impl ShiftTemplate {
    pub fn duration_hours(&self) -> Result<f64, crate::time_math::ParseError> {
        crate::time_math::duration(&self.start_time, &self.end_time)
    }

    pub fn shift_type(&self) -> Result<ShiftType, crate::time_math::ParseError> {
        let start = crate::time_math::time_to_minutes(&self.start_time)?;
        let end = crate::time_math::time_to_minutes(&self.end_time)?;
        let crosses_midnight = end <= start;

        Ok(if start < crate::time_math::time_to_minutes("08:00")? {
            ShiftType::Early
        } else if crosses_midnight || end > crate::time_math::time_to_minutes("20:00")? {
            ShiftType::Late
        } else {
            ShiftType::Middle
        })
    }

    pub fn is_active_on(&self, day_index: u8) -> bool {
        self.active_days.contains(&day_index)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CoverageRule {
    pub id: i64,
    /// 0=Monday .. 6=Sunday.
    pub day_index: u8,
    pub start_time: String,
    pub end_time: String,
    pub min_employees: u32,
    #[serde(default)]
    pub max_employees: Option<u32>,
    #[serde(default)]
    pub employee_types: HashSet<EmployeeGroup>,
    #[serde(default)]
    pub allowed_employee_groups: HashSet<EmployeeGroup>,
    #[serde(default)]
    pub requires_keyholder: bool,
    #[serde(default)]
    pub keyholder_before_minutes: Option<u32>,
    #[serde(default)]
    pub keyholder_after_minutes: Option<u32>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct EmployeeAvailability {
    pub employee_id: i64,
    /// 0=Monday .. 6=Sunday.
    pub day_of_week: u8,
    /// 0..23.
    pub hour: u8,
    pub is_available: bool,
    pub availability_type: AvailabilityKind,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Absence {
    pub employee_id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
    pub approved: bool,
}

impl Absence {
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    pub fn intersects(&self, start: NaiveDate, end: NaiveDate) -> bool {
        !(self.end_date < start || self.start_date > end)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Assignment {
    pub employee_id: i64,
    #[serde(default)]
    pub shift_id: Option<i64>,
    pub date: NaiveDate,
    pub status: AssignmentStatus,
    pub version: u32,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub break_start: Option<String>,
    #[serde(default)]
    pub break_end: Option<String>,
    #[serde(default)]
    pub availability_type: Option<AvailabilityKind>,
}

impl Assignment {
    pub fn is_empty_entry(&self) -> bool {
        self.shift_id.is_none()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScheduleStatus {
    Draft,
    Published,
    Archived,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Schedule {
    pub id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: ScheduleStatus,
    pub version: u32,
    pub entries: Vec<Assignment>,
}
