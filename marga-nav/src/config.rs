//! Configuration loading for MargaNav

use crate::error::{NavError, Result};
use marga_map::PlannerConfig;
use serde::Deserialize;
use std::path::Path;

/// Config file looked up in the working directory when `--config` is absent
pub const DEFAULT_CONFIG_FILE: &str = "marga.toml";

/// Main configuration structure
#[derive(Clone, Debug, Default, Deserialize)]
pub struct MargaConfig {
    #[serde(default)]
    pub planner: PlannerSection,
    #[serde(default)]
    pub mission: MissionSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

/// Search engine settings
#[derive(Clone, Debug, Deserialize)]
pub struct PlannerSection {
    /// Node expansions before a search is abandoned (default: 1000000)
    #[serde(default = "default_max_expansions")]
    pub max_expansions: usize,

    /// Expansions between cancellation polls (default: 256)
    #[serde(default = "default_cancel_check_interval")]
    pub cancel_check_interval: usize,

    /// Soft-penalty band beyond blocked cells, world units (default: 0.0, off)
    #[serde(default)]
    pub halo_distance: f32,

    /// Penalty multiplier inside the halo (default: 2.0)
    #[serde(default = "default_halo_weight")]
    pub halo_weight: f32,

    /// Attach simplified waypoints to path results (default: true)
    #[serde(default = "default_simplify")]
    pub simplify: bool,
}

/// Simulated mission settings
#[derive(Clone, Debug, Deserialize)]
pub struct MissionSection {
    /// Scan radius of the drone, world units (default: 5.0)
    #[serde(default = "default_sensor_range")]
    pub sensor_range: f32,

    /// Moves before a mission is aborted (default: 10000)
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,

    /// Radius for world-export mines that carry none (default: 3.0)
    #[serde(default = "default_mine_radius")]
    pub default_mine_radius: f32,

    /// Parallel passes flown by `sweep` (default: 3)
    #[serde(default = "default_sweep_lanes")]
    pub sweep_lanes: usize,

    /// Cells between sweep lanes (default: 2)
    #[serde(default = "default_sweep_lane_spacing")]
    pub sweep_lane_spacing: u32,
}

/// Log output settings
#[derive(Clone, Debug, Deserialize)]
pub struct LoggingSection {
    /// tracing-subscriber filter directive, overridden by RUST_LOG
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for PlannerSection {
    fn default() -> Self {
        Self {
            max_expansions: default_max_expansions(),
            cancel_check_interval: default_cancel_check_interval(),
            halo_distance: 0.0,
            halo_weight: default_halo_weight(),
            simplify: default_simplify(),
        }
    }
}

impl Default for MissionSection {
    fn default() -> Self {
        Self {
            sensor_range: default_sensor_range(),
            max_steps: default_max_steps(),
            default_mine_radius: default_mine_radius(),
            sweep_lanes: default_sweep_lanes(),
            sweep_lane_spacing: default_sweep_lane_spacing(),
        }
    }
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

// Default value functions
fn default_max_expansions() -> usize {
    1_000_000
}
fn default_cancel_check_interval() -> usize {
    256
}
fn default_halo_weight() -> f32 {
    2.0
}
fn default_simplify() -> bool {
    true
}
fn default_sensor_range() -> f32 {
    5.0
}
fn default_max_steps() -> usize {
    10_000
}
fn default_mine_radius() -> f32 {
    3.0
}
fn default_sweep_lanes() -> usize {
    3
}
fn default_sweep_lane_spacing() -> u32 {
    2
}
fn default_log_filter() -> String {
    "marga_nav=info,marga_map=info".to_string()
}

impl MargaConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| NavError::Config(format!("Failed to read config file: {}", e)))?;
        let config: MargaConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if given, else from `marga.toml` in the working
    /// directory if it exists, else defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.exists() {
                    Self::load(fallback)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Reject values that would make the planner or mission misbehave
    pub fn validate(&self) -> Result<()> {
        if self.planner.max_expansions == 0 {
            return Err(NavError::Config("planner.max_expansions must be > 0".into()));
        }
        if !self.planner.halo_distance.is_finite() || self.planner.halo_distance < 0.0 {
            return Err(NavError::Config("planner.halo_distance must be >= 0".into()));
        }
        if !self.planner.halo_weight.is_finite() || self.planner.halo_weight < 0.0 {
            return Err(NavError::Config("planner.halo_weight must be >= 0".into()));
        }
        if !self.mission.sensor_range.is_finite() || self.mission.sensor_range < 0.0 {
            return Err(NavError::Config("mission.sensor_range must be >= 0".into()));
        }
        if !self.mission.default_mine_radius.is_finite() || self.mission.default_mine_radius < 0.0
        {
            return Err(NavError::Config(
                "mission.default_mine_radius must be >= 0".into(),
            ));
        }
        if self.mission.sweep_lanes == 0 || self.mission.sweep_lane_spacing == 0 {
            return Err(NavError::Config(
                "mission.sweep_lanes and mission.sweep_lane_spacing must be > 0".into(),
            ));
        }
        Ok(())
    }

    /// Search engine configuration derived from `[planner]`
    pub fn planner_config(&self) -> PlannerConfig {
        PlannerConfig {
            max_expansions: self.planner.max_expansions,
            cancel_check_interval: self.planner.cancel_check_interval,
            halo_weight: self.planner.halo_weight,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = MargaConfig::default();
        assert_eq!(config.planner.max_expansions, 1_000_000);
        assert_eq!(config.planner.halo_distance, 0.0);
        assert!(config.planner.simplify);
        assert_eq!(config.mission.sensor_range, 5.0);
        assert_eq!(config.mission.default_mine_radius, 3.0);
        assert_eq!(config.mission.sweep_lanes, 3);
        assert_eq!(config.mission.sweep_lane_spacing, 2);
        assert_eq!(config.logging.filter, "marga_nav=info,marga_map=info");
    }

    #[test]
    fn test_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[planner]\nhalo_distance = 1.5\n\n[mission]\nmax_steps = 50").unwrap();

        let config = MargaConfig::load(file.path()).unwrap();
        assert_eq!(config.planner.halo_distance, 1.5);
        assert_eq!(config.planner.halo_weight, 2.0);
        assert_eq!(config.mission.max_steps, 50);
        assert_eq!(config.mission.sensor_range, 5.0);
        assert_eq!(config.planner_config().max_expansions, 1_000_000);
    }

    #[test]
    fn test_invalid_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[planner]\nmax_expansions = 0").unwrap();
        assert!(matches!(
            MargaConfig::load(file.path()),
            Err(NavError::Config(_))
        ));

        let mut no_lanes = tempfile::NamedTempFile::new().unwrap();
        writeln!(no_lanes, "[mission]\nsweep_lanes = 0").unwrap();
        assert!(matches!(
            MargaConfig::load(no_lanes.path()),
            Err(NavError::Config(_))
        ));

        let mut bad_toml = tempfile::NamedTempFile::new().unwrap();
        writeln!(bad_toml, "[planner\nmax_expansions = 3").unwrap();
        assert!(matches!(
            MargaConfig::load(bad_toml.path()),
            Err(NavError::Config(_))
        ));
    }

    #[test]
    fn test_shipped_config_matches_defaults() {
        let shipped: MargaConfig =
            toml::from_str(include_str!("../../marga.toml")).unwrap();
        shipped.validate().unwrap();

        let defaults = MargaConfig::default();
        assert_eq!(shipped.planner.max_expansions, defaults.planner.max_expansions);
        assert_eq!(shipped.planner.halo_distance, defaults.planner.halo_distance);
        assert_eq!(shipped.mission.max_steps, defaults.mission.max_steps);
        assert_eq!(shipped.mission.sweep_lanes, defaults.mission.sweep_lanes);
        assert_eq!(
            shipped.mission.sweep_lane_spacing,
            defaults.mission.sweep_lane_spacing
        );
        assert_eq!(shipped.logging.filter, defaults.logging.filter);
    }

    #[test]
    fn test_missing_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(MargaConfig::load_or_default(Some(&missing)).is_err());
    }
}
