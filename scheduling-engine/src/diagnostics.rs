//! Warning/issue vocabulary shared by the distribution manager, generator,
//! and validator (spec §4.8, §7). An `Issue` is always data, never a Rust
//! error: category-1 (fatal) failures are the only ones that leave the
//! engine as an [`crate::error::EngineError`].

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub use crate::models::IssueSeverity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueKind {
    Understaffing,
    MissingKeyholder,
    MissingEmployeeType,
    ContractedHoursShortfall,
    RestPeriod,
    MaxHours,
    MaxShifts,
    ConsecutiveDays,
    EarlyLateSequence,
    BreakRule,
    WeekendDistribution,
    NoCoverageForDate,
    NoAvailableEmployees,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Issue {
    pub kind: IssueKind,
    pub message: String,
    pub severity: IssueSeverity,
    #[serde(default)]
    pub details: serde_json::Value,
}

impl Issue {
    pub fn new(kind: IssueKind, severity: IssueSeverity, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            severity,
            details: serde_json::Value::Null,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }
}

/// Summary returned by the validator's interval coverage check (spec §4.8).
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CoverageSummary {
    pub intervals_checked: u32,
    pub intervals_meeting_min: u32,
    pub intervals_needing_keyholder: u32,
    pub intervals_with_keyholder_met: u32,
}
