use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use snafu::{ensure, ResultExt, Snafu};

use crate::gnc::{
    AscentConfig, BurnConfig, CruiseConfig, LandingConfig, ScienceConfig, TakeoffConfig, MIN_GLIDE_ALTITUDE,
};
use crate::vehicle::StagingConfig;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ConfigError {
    #[snafu(display("failed to read flight plan {}: {source}", path.display()))]
    Read { path: PathBuf, source: std::io::Error },
    #[snafu(display("flight plan YAML error: {source}"))]
    Parse { source: serde_yaml::Error },
    #[snafu(display("invalid flight plan: {reason}"))]
    Invalid { reason: String },
}

/// Tuning for every phase a vessel may fly, loaded from YAML.
///
/// Every section and field is optional; missing ones take the defaults.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FlightPlan {
    pub staging: StagingConfig,
    pub ascent: AscentConfig,
    pub landing: LandingConfig,
    pub cruise: CruiseConfig,
    pub takeoff: TakeoffConfig,
    pub burn: BurnConfig,
    pub science: ScienceConfig,
    /// Upper bound on ticks per phase; unbounded when absent.
    pub max_ticks: Option<u64>,
}

impl FlightPlan {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let plan: Self = serde_yaml::from_str(yaml).context(ParseSnafu)?;
        plan.validate()?;
        Ok(plan)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let yaml = fs::read_to_string(path).context(ReadSnafu { path })?;
        Self::from_yaml_str(&yaml)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self).context(ParseSnafu)
    }

    /// Reject settings no controller can fly with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let a = &self.ascent;
        ensure!(
            a.gravity_turn_end_altitude > a.gravity_turn_start_altitude,
            InvalidSnafu { reason: "ascent: gravity turn must end above where it starts" }
        );
        ensure!(
            a.target_apoapsis_altitude > 0.0,
            InvalidSnafu { reason: "ascent: target apoapsis must be positive" }
        );

        ensure!(
            self.cruise.min_height < self.cruise.target_height,
            InvalidSnafu { reason: "cruise: min_height must be below target_height" }
        );
        ensure!(
            self.takeoff.min_height < self.takeoff.target_height,
            InvalidSnafu { reason: "takeoff: min_height must be below target_height" }
        );

        let l = &self.landing;
        ensure!(
            l.land_horizontal_velocity > 0.0 && l.max_horizontal_velocity > 0.0,
            InvalidSnafu { reason: "landing: speed ceilings must be positive" }
        );
        ensure!(
            l.max_height >= MIN_GLIDE_ALTITUDE,
            InvalidSnafu {
                reason: format!("landing: max_height must be at least {MIN_GLIDE_ALTITUDE} m, got {}", l.max_height)
            }
        );
        ensure!(
            l.max_horizontal_acceleration > 0.0 && l.glide_ratio > 0.0,
            InvalidSnafu { reason: "landing: acceleration limit and glide ratio must be positive" }
        );

        ensure!(
            self.burn.coarse_threshold > 0.0,
            InvalidSnafu { reason: "burn: coarse threshold must be positive" }
        );

        let intervals = [
            ("ascent", a.interval),
            ("landing", l.interval),
            ("cruise", self.cruise.interval),
            ("takeoff", self.takeoff.interval),
            ("science", self.science.interval),
            ("burn wait", self.burn.wait_interval),
            ("burn", self.burn.burn_interval),
        ];
        for (phase, interval) in intervals {
            ensure!(
                interval > 0.0 && interval.is_finite(),
                InvalidSnafu { reason: format!("{phase}: tick interval must be positive, got {interval}") }
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vehicle::MissingStagePolicy;

    #[test]
    fn empty_document_is_the_default_plan() {
        let plan = FlightPlan::from_yaml_str("{}").unwrap();
        assert_eq!(plan, FlightPlan::default());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let yaml = "
ascent:
  target_apoapsis_altitude: 80000
  boost_until_out_of_fuel: true
staging:
  missing_stage: stage_once
max_ticks: 5000
";
        let plan = FlightPlan::from_yaml_str(yaml).unwrap();
        assert_eq!(plan.ascent.target_apoapsis_altitude, 80_000.0);
        assert!(plan.ascent.boost_until_out_of_fuel);
        assert_eq!(plan.ascent.gravity_turn_end_altitude, 60_000.0);
        assert_eq!(plan.staging.missing_stage, MissingStagePolicy::StageOnce);
        assert_eq!(plan.max_ticks, Some(5_000));
        assert_eq!(plan.landing, LandingConfig::default());
    }

    #[test]
    fn equipment_map_can_be_extended() {
        let yaml = "
cruise:
  equipment:
    report: Cockpit
    antenna: commDish
";
        let plan = FlightPlan::from_yaml_str(yaml).unwrap();
        assert_eq!(plan.cruise.equipment.get("antenna").map(String::as_str), Some("commDish"));
        assert_eq!(plan.cruise.equipment.len(), 2);
    }

    #[test]
    fn inverted_gravity_turn_is_rejected() {
        let yaml = "
ascent:
  gravity_turn_start_altitude: 50000
  gravity_turn_end_altitude: 40000
";
        let err = FlightPlan::from_yaml_str(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }), "{err}");
    }

    #[test]
    fn landing_ceiling_below_glide_floor_is_rejected() {
        let yaml = "
landing:
  max_height: 0
";
        let err = FlightPlan::from_yaml_str(yaml).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }), "{err}");
        assert!(err.to_string().contains("max_height"));
    }

    #[test]
    fn zero_interval_is_rejected() {
        let plan = FlightPlan { science: ScienceConfig { interval: 0.0, ..ScienceConfig::default() }, ..FlightPlan::default() };
        let err = plan.validate().unwrap_err();
        assert!(err.to_string().contains("science"));
    }

    #[test]
    fn malformed_yaml_is_a_parse_error() {
        let err = FlightPlan::from_yaml_str("ascent: [1, 2").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = FlightPlan::from_path("/nonexistent/flight-plan.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn default_plan_survives_yaml() {
        let plan = FlightPlan::default();
        let back = FlightPlan::from_yaml_str(&plan.to_yaml().unwrap()).unwrap();
        assert_eq!(back, plan);
    }
}
