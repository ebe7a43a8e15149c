//! Run settings
//!
//! Shared by every scenario; loaded from JSON or built from defaults.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScenarioError};

/// Simulation tick rate presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SimRate {
    Low,
    #[default]
    Medium,
    High,
}

impl SimRate {
    pub fn as_str(&self) -> &'static str {
        match self {
            SimRate::Low => "Low",
            SimRate::Medium => "Medium",
            SimRate::High => "High",
        }
    }

    /// Ticks per simulated second
    pub fn hz(&self) -> u32 {
        match self {
            SimRate::Low => 10,
            SimRate::Medium => 20,
            SimRate::High => 60,
        }
    }

    /// Fixed timestep in seconds
    pub fn dt(&self) -> f32 {
        1.0 / self.hz() as f32
    }
}

impl fmt::Display for SimRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} Hz)", self.as_str(), self.hz())
    }
}

impl FromStr for SimRate {
    type Err = ScenarioError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "low" => Ok(SimRate::Low),
            "medium" | "med" => Ok(SimRate::Medium),
            "high" => Ok(SimRate::High),
            _ => Err(ScenarioError::UnknownSimRate(s.to_string())),
        }
    }
}

/// Settings for one scenario run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Tick rate
    pub sim_rate: SimRate,
    /// Hard ceiling on simulated seconds; `None` uses the scenario's own
    pub timeout: Option<f32>,
    /// Build and sample test criteria
    pub criteria_enable: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sim_rate: SimRate::Medium,
            timeout: None,
            criteria_enable: true,
        }
    }
}

impl Settings {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Timeout to apply, falling back to the scenario default
    pub fn effective_timeout(&self, scenario_default: f32) -> f32 {
        self.timeout.unwrap_or(scenario_default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sim_rate_parse() {
        assert_eq!("LOW".parse::<SimRate>().unwrap(), SimRate::Low);
        assert_eq!("med".parse::<SimRate>().unwrap(), SimRate::Medium);
        assert!(matches!(
            "fast".parse::<SimRate>(),
            Err(ScenarioError::UnknownSimRate(name)) if name == "fast"
        ));
        assert_eq!(SimRate::High.to_string(), "High (60 Hz)");
    }

    #[test]
    fn test_default_rate_matches_sim_dt() {
        assert_eq!(SimRate::default().dt(), crate::consts::SIM_DT);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let settings = Settings::from_json(r#"{ "timeout": 12.5 }"#).unwrap();
        assert_eq!(settings.timeout, Some(12.5));
        assert_eq!(settings.sim_rate, SimRate::Medium);
        assert!(settings.criteria_enable);
        assert_eq!(settings.effective_timeout(200.0), 12.5);
        assert_eq!(Settings::default().effective_timeout(200.0), 200.0);
    }

    #[test]
    fn test_bad_json_is_config_error() {
        let err = Settings::from_json("{ nope").unwrap_err();
        assert!(matches!(err, ScenarioError::Config(_)));
    }
}
