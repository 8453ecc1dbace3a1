use std::fs;
use std::path::Path;

use chrono_tz::Tz;
use scheduling_engine::EngineConfig;
use serde::Deserialize;

use crate::domain::circuit_breaker::CircuitBreakerConfig;
use crate::infrastructure::health_check::HealthCheckSettings;

fn default_timezone() -> Tz {
    Tz::UTC
}

/// Top-level service configuration: the engine's own generation settings,
/// plus the ambient concerns the engine has no opinion on (what "today" means
/// for past-date rejection, resilience tuning for the upstream resource
/// service).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SchedulingConfig {
    pub engine: EngineConfig,
    #[serde(with = "tz_serde")]
    pub timezone: Tz,
    pub circuit_breaker: CircuitBreakerConfig,
    pub health_check: HealthCheckSettings,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            timezone: default_timezone(),
            circuit_breaker: CircuitBreakerConfig::default(),
            health_check: HealthCheckSettings::default(),
        }
    }
}

impl SchedulingConfig {
    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Loads config from a TOML file, overlaying it onto documented defaults.
    /// A missing file is not an error: the service simply runs with defaults,
    /// matching the engine's own `load_with_overrides` ergonomics.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, toml::de::Error> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents),
            Err(_) => Ok(Self::default()),
        }
    }
}

mod tz_serde {
    use chrono_tz::Tz;
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Tz, D::Error>
    where
        D: Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}
