//! Wire types for the APPM HTTP API. Field names and defaults follow
//! the vendor's JSON schema, hence the PascalCase on the wire.

#![allow(dead_code)]

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PointCountResult {
    pub success: bool,
    pub result: String,
    pub point_count: i32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MappingPointsResult {
    pub success: bool,
    pub result: String,
    pub point_count: i32,
    #[serde(default)]
    pub mapping_points: Vec<MappingPoint>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MappingPoint {
    pub pier_side_east: bool,
    pub counterweight_up: bool,
    pub hour_angle: f64,
    pub declination: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MappingRunStatusResult {
    pub success: bool,
    pub result: String,
    pub status: MappingRunStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct MappingRunStatus {
    pub mapping_run_state: String,
    pub measurement: String,
    pub good_solves: i32,
    pub bad_solves: i32,
    pub current_state: String,
    pub action_after_run_completed: String,
    pub slew_rate: i32,
    pub temperature_c: f64,
    pub pressure_mb: f64,
    pub humidity_percent: f64,
    pub scope_connected: bool,
    pub camera_connected: bool,
    pub appm_camera_type: String,
    pub ascom_camera_driver: String,
    pub dome_connected: bool,
    pub ascom_dome_driver: String,
    pub recal_near_zenith_at_start: bool,
    pub precess_j2000to_j_now: bool,
    pub verify_pointing_model: bool,
    pub skip_plate_solves: bool,
    pub pause_after_each_slew: bool,
    pub require_high_accuracy_slews: bool,
    pub measurement_points_count: i32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MeasurementConfigurationResult {
    pub success: bool,
    pub result: String,
    pub point_count: i32,
    pub configuration: MeasurementConfiguration,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct MeasurementConfigurationRequest {
    pub configuration: MeasurementConfiguration,
}

/// The flat measurement setup record APPM round-trips through its
/// configuration endpoint. Fields this tool does not touch must survive
/// a get/set cycle unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MeasurementConfiguration {
    pub create_west_points: bool,
    pub create_east_points: bool,
    pub set_slew_rate: bool,
    pub slew_rate: i32,
    pub slew_settle_time: i32,
    pub use_meridian_limits: bool,
    pub use_horizon_limits: bool,
    pub zenith_safety_distance: f64,
    pub zenith_sync_distance: f64,
    pub point_ordering_strategy: i32,
    pub declination_spacing: i32,
    pub declination_offset: i32,
    pub use_min_declination: bool,
    pub use_max_declination: bool,
    pub min_declination: i32,
    pub max_declination: i32,
    pub right_ascension_spacing: i32,
    pub right_ascension_offset: i32,
    pub use_min_hour_angle_east: bool,
    pub use_max_hour_angle_west: bool,
    pub min_hour_angle_east: f64,
    pub max_hour_angle_west: f64,
    pub use_min_altitude: bool,
    pub min_altitude: i32,
}

impl Default for MeasurementConfiguration {
    fn default() -> Self {
        Self {
            create_west_points: true,
            create_east_points: true,
            set_slew_rate: true,
            slew_rate: 600,
            slew_settle_time: 2,
            use_meridian_limits: true,
            use_horizon_limits: true,
            zenith_safety_distance: 0.0,
            zenith_sync_distance: 3.0,
            point_ordering_strategy: 0,
            declination_spacing: 5,
            declination_offset: 0,
            use_min_declination: true,
            use_max_declination: true,
            min_declination: -85,
            max_declination: 85,
            right_ascension_spacing: 5,
            right_ascension_offset: 0,
            use_min_hour_angle_east: true,
            use_max_hour_angle_west: true,
            min_hour_angle_east: -12.0,
            max_hour_angle_west: 12.0,
            use_min_altitude: true,
            min_altitude: 25,
        }
    }
}
