use crate::error::{IrrSchedError, Result};
use crate::models::CropPolicy;
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    pub simulation: SimulationConfig,
    pub paths: PathsConfig,
    /// Crop code -> policy. Field units growing any other crop are skipped.
    pub crops: HashMap<String, CropPolicy>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SimulationConfig {
    /// First simulated day.
    pub start: NaiveDate,
    /// Last simulated day, inclusive.
    pub end: NaiveDate,
    /// Data-driven trigger policies only activate from this year forward;
    /// earlier years are model spin-up.
    pub calibration_start_year: i32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PathsConfig {
    /// Directory of management files to patch.
    pub mgt_dir: PathBuf,
    /// Directory of soil parameter files; required for threshold policies.
    #[serde(default)]
    pub sol_dir: Option<PathBuf>,
    /// The simulation output table consumed as the hydrology oracle.
    pub hru_output: PathBuf,
}

impl Config {
    pub fn load(config_override: Option<PathBuf>) -> Result<Self> {
        let config_path = config_override.unwrap_or_else(|| PathBuf::from("config/config.yaml"));

        if !config_path.exists() {
            return Err(IrrSchedError::Config(format!(
                "Config file not found at {:?}",
                config_path
            )));
        }

        let config_str = std::fs::read_to_string(&config_path)
            .map_err(|e| IrrSchedError::Config(format!("Failed to read config: {}", e)))?;

        let config_str = Self::substitute_env_vars(&config_str);

        let config: Config = serde_yaml::from_str(&config_str)
            .map_err(|e| IrrSchedError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.simulation.end < self.simulation.start {
            return Err(IrrSchedError::Config(format!(
                "simulation end {} precedes start {}",
                self.simulation.end, self.simulation.start
            )));
        }
        if self.crops.is_empty() {
            return Err(IrrSchedError::Config(
                "no crops configured; nothing would be scheduled".to_string(),
            ));
        }
        for (crop, policy) in &self.crops {
            policy.validate(crop)?;
            if policy.variant.uses_soil_data() && self.paths.sol_dir.is_none() {
                return Err(IrrSchedError::Config(format!(
                    "crop {} uses a threshold policy but paths.sol-dir is not set",
                    crop
                )));
            }
        }
        Ok(())
    }

    fn substitute_env_vars(content: &str) -> String {
        let mut result = content.to_string();

        // Find all ${VAR_NAME} patterns and substitute
        let re = regex_lite::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").unwrap();

        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let placeholder = &cap[0];
            if let Ok(value) = std::env::var(var_name) {
                result = result.replace(placeholder, &value);
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PolicyVariant;

    const YAML: &str = r#"
simulation:
  start: 2007-01-01
  end: 2016-12-31
  calibration-start-year: 2011
paths:
  mgt-dir: mgt_files
  sol-dir: sol_files
  hru-output: output.hru
crops:
  CORN:
    variant: threshold-interval
    season-start: { month: 5, day: 7 }
    season-end: { month: 10, day: 25 }
    depth-mm: 50
    interval-days: 14
    rooting-depth-mm: 600
  SOYB:
    variant: fixed-date
    season-start: { month: 5, day: 17 }
    season-end: { month: 10, day: 15 }
    groundwater-depth-mm: 18.25
    surface-depth-mm: 6.75
"#;

    #[test]
    fn parses_full_config() {
        let config: Config = serde_yaml::from_str(YAML).unwrap();
        config.validate().unwrap();
        assert_eq!(config.simulation.calibration_start_year, 2011);
        let corn = &config.crops["CORN"];
        assert_eq!(corn.variant, PolicyVariant::ThresholdInterval);
        assert_eq!(corn.interval_days, 14);
        assert_eq!(corn.split.groundwater, 0.73);
        assert_eq!(corn.water_stress_threshold, 35.32);
        assert_eq!(config.crops["SOYB"].variant, PolicyVariant::FixedDate);
    }

    #[test]
    fn threshold_crop_without_sol_dir_is_rejected() {
        let yaml = YAML.replace("  sol-dir: sol_files\n", "");
        let config: Config = serde_yaml::from_str(&yaml).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn reversed_simulation_range_is_rejected() {
        let yaml = YAML.replace("end: 2016-12-31", "end: 2006-12-31");
        let config: Config = serde_yaml::from_str(&yaml).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn env_vars_are_substituted() {
        std::env::set_var("IRRSCHED_TEST_DIR", "from_env");
        let substituted = Config::substitute_env_vars("mgt-dir: ${IRRSCHED_TEST_DIR}");
        assert_eq!(substituted, "mgt-dir: from_env");
    }
}
