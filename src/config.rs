use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::astro::Site;
use crate::model::OrderingStrategy;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub site: Site,
    pub apcc: ApccConfig,
    pub appm: AppmConfig,
    #[serde(default)]
    pub dec_arc: DecArcSettings,
    #[serde(default)]
    pub all_sky: AllSkySettings,
    /// Seconds to let the mount settle after a park slew completes.
    #[serde(default = "default_settle_time")]
    pub settle_time_s: u64,
}

fn default_settle_time() -> u64 {
    5
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApccConfig {
    pub exe_path: PathBuf,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_apcc_port")]
    pub port: u16,
    /// How long to wait for the APCC API after launching it, in seconds.
    #[serde(default = "default_apcc_startup_timeout")]
    pub startup_timeout_s: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppmConfig {
    pub exe_path: PathBuf,
    #[serde(default)]
    pub settings_path: Option<PathBuf>,
    #[serde(default)]
    pub map_path: Option<PathBuf>,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_appm_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_apcc_port() -> u16 {
    60001
}

fn default_appm_port() -> u16 {
    60011
}

fn default_apcc_startup_timeout() -> u64 {
    30
}

/// Settings for dec-arc model runs. Defaults mirror a stock APPM
/// dec-arc setup: two arcs a degree apart, four-degree RA spacing.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DecArcSettings {
    pub arc_quantity: u32,
    pub dec_spacing: i32,
    pub ra_spacing: i32,
    pub lead_in_hours: f64,
    pub tail_hours: f64,
    pub ordering_strategy: OrderingStrategy,
    pub polar_ordering_strategy: OrderingStrategy,
    /// Degrees from the pole inside which the polar ordering strategy
    /// is used instead.
    pub polar_proximity_limit_deg: i32,
}

impl Default for DecArcSettings {
    fn default() -> Self {
        Self {
            arc_quantity: 2,
            dec_spacing: 1,
            ra_spacing: 4,
            lead_in_hours: 0.0,
            tail_hours: 0.0,
            ordering_strategy: OrderingStrategy::Declination,
            polar_ordering_strategy: OrderingStrategy::DeclinationEqualRa,
            polar_proximity_limit_deg: 35,
        }
    }
}

/// Settings for all-sky model runs, mapped onto the APPM measurement
/// configuration as-is.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AllSkySettings {
    pub create_east_points: bool,
    pub create_west_points: bool,
    pub use_meridian_limits: bool,
    pub use_horizon_limits: bool,
    pub dec_spacing: i32,
    pub dec_offset: i32,
    pub use_min_declination: bool,
    pub use_max_declination: bool,
    pub min_declination: i32,
    pub max_declination: i32,
    pub ra_spacing: i32,
    pub ra_offset: i32,
    pub use_min_hour_angle_east: bool,
    pub use_max_hour_angle_west: bool,
    pub min_hour_angle_east: f64,
    pub max_hour_angle_west: f64,
    pub ordering_strategy: OrderingStrategy,
    pub set_slew_rate: bool,
    pub slew_rate: i32,
    pub slew_settle_time: i32,
    pub zenith_safety_distance: f64,
    pub zenith_sync_distance: f64,
    pub use_min_altitude: bool,
    pub min_altitude: i32,
}

impl Default for AllSkySettings {
    fn default() -> Self {
        Self {
            create_east_points: true,
            create_west_points: true,
            use_meridian_limits: true,
            use_horizon_limits: true,
            dec_spacing: 10,
            dec_offset: 0,
            use_min_declination: true,
            use_max_declination: true,
            min_declination: -85,
            max_declination: 85,
            ra_spacing: 10,
            ra_offset: 0,
            use_min_hour_angle_east: true,
            use_max_hour_angle_west: true,
            min_hour_angle_east: -6.0,
            max_hour_angle_west: 6.0,
            ordering_strategy: OrderingStrategy::Declination,
            set_slew_rate: true,
            slew_rate: 900,
            slew_settle_time: 2,
            zenith_safety_distance: 0.0,
            zenith_sync_distance: 3.0,
            use_min_altitude: true,
            min_altitude: 30,
        }
    }
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
site:
  latitude_deg: 40.0
  longitude_deg: -105.0
apcc:
  exe_path: /opt/apcc/AstroPhysicsCommandCenter.exe
appm:
  exe_path: /opt/apcc/ApPointMapper.exe
"#;

    #[test]
    fn minimal_config_fills_defaults() {
        let config: Config = serde_yaml::from_str(MINIMAL).unwrap();
        assert_eq!(config.apcc.host, "127.0.0.1");
        assert_eq!(config.apcc.port, 60001);
        assert_eq!(config.apcc.startup_timeout_s, 30);
        assert_eq!(config.appm.port, 60011);
        assert!(config.appm.settings_path.is_none());
        assert_eq!(config.dec_arc.arc_quantity, 2);
        assert_eq!(config.dec_arc.ra_spacing, 4);
        assert_eq!(config.dec_arc.polar_proximity_limit_deg, 35);
        assert_eq!(config.all_sky.slew_rate, 900);
        assert_eq!(config.all_sky.min_altitude, 30);
        assert_eq!(config.settle_time_s, 5);
    }

    #[test]
    fn overrides_are_honored() {
        let yaml = format!(
            "{MINIMAL}dec_arc:\n  arc_quantity: 5\n  ordering_strategy: hour_angle\n"
        );
        let config: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(config.dec_arc.arc_quantity, 5);
        assert_eq!(config.dec_arc.ordering_strategy, OrderingStrategy::HourAngle);
        // Unrelated fields keep their defaults.
        assert_eq!(config.dec_arc.dec_spacing, 1);
    }
}
