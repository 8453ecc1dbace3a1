//! Engine-level error taxonomy, per spec §7: fatal errors abort generation,
//! everything else is data (an [`crate::validator::Issue`] or a warning), not
//! an exception.

use thiserror::Error;

use crate::time_math::ParseError;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no shift templates in resource snapshot")]
    NoShiftTemplates,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to load resources: {0}")]
    Load(#[from] LoadError),

    #[error("malformed time value: {0}")]
    Parse(#[from] ParseError),

    #[error("schedule generation failed: {source}")]
    ScheduleGeneration {
        #[source]
        source: Box<EngineError>,
    },
}

impl EngineError {
    pub fn wrap_generation(source: EngineError) -> Self {
        EngineError::ScheduleGeneration {
            source: Box::new(source),
        }
    }
}
