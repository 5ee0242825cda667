//! Refresh mode of a client instance.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::WeatherError;

/// How a client keeps its cache current. Fixed when the instance is created.
///
/// Deserializes through [`FromStr`], so config files accept the same
/// spellings as the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum Mode {
    /// Fetch only when a caller misses the cache.
    #[default]
    OnDemand,
    /// Additionally refresh every cached city on a background timer.
    Polling,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::OnDemand => "on_demand",
            Mode::Polling => "polling",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = WeatherError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "on_demand" | "on-demand" | "ondemand" => Ok(Mode::OnDemand),
            "polling" => Ok(Mode::Polling),
            other => Err(WeatherError::Configuration(format!(
                "unknown mode '{other}' (expected 'on_demand' or 'polling')"
            ))),
        }
    }
}

impl TryFrom<String> for Mode {
    type Error = WeatherError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}
