//! Fixed ASCII tokens of the Astro-Physics mount protocol, plus the
//! park-position command table.

use serde::Deserialize;
use strum_macros::Display;

use crate::astro::format_dec_command;

/// Stop all axis motion.
pub const HALT_MOTION: &str = ":Q";
/// Disable tracking.
pub const TRACKING_OFF: &str = ":RT9";
/// Power down the motors.
pub const MOTORS_OFF: &str = ":KA";
/// Zero the RA rate offset.
pub const CLEAR_DELTA_RATE: &str = ":RD0.00000";
/// Zero the meridian delay.
pub const CLEAR_MERIDIAN_DELAY: &str = ":SM0:00";
/// Slew to the previously set target.
pub const SLEW_TO_TARGET: &str = ":MS";
/// Remaining slew distance; an empty reply means the slew has settled.
pub const SLEW_DISTANCE: &str = ":D";

/// The five standard Astro-Physics park orientations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ParkPosition {
    Park1,
    Park2,
    Park3,
    Park4,
    Park5,
}

/// Set-target commands for one park orientation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxisCommands {
    pub dec: String,
    pub ha: String,
}

/// Builds the dec and hour-angle set-target commands for a park
/// position. Parks 1, 3, 4 and 5 depend on the observer's latitude.
pub fn park_commands(position: ParkPosition, latitude_deg: f64) -> AxisCommands {
    let north = latitude_deg >= 0.0;
    match position {
        ParkPosition::Park1 => AxisCommands {
            dec: format_dec_command(if north { 90.0 - latitude_deg } else { -90.0 - latitude_deg }),
            ha: ":Sh11:59:59.80".to_string(),
        },
        ParkPosition::Park2 => AxisCommands {
            dec: ":Sd+00*00:00.0".to_string(),
            ha: ":Sh-06:00:00.00".to_string(),
        },
        ParkPosition::Park3 => AxisCommands {
            dec: format!(":Sd{}89*59:59.0", if north { '+' } else { '-' }),
            ha: ":Sh-06:00:00.00".to_string(),
        },
        ParkPosition::Park4 => AxisCommands {
            dec: format_dec_command(if north { -90.0 + latitude_deg } else { 90.0 + latitude_deg }),
            ha: ":Sh+00:00:00.20".to_string(),
        },
        ParkPosition::Park5 => AxisCommands {
            dec: format_dec_command(if north { 90.0 - latitude_deg } else { -90.0 - latitude_deg }),
            ha: ":Sh-11:59:59.80".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn park2_is_latitude_independent() {
        let a = park_commands(ParkPosition::Park2, 40.0);
        let b = park_commands(ParkPosition::Park2, -33.0);
        assert_eq!(a, b);
        assert_eq!(a.dec, ":Sd+00*00:00.0");
        assert_eq!(a.ha, ":Sh-06:00:00.00");
    }

    #[test]
    fn park1_points_at_the_horizon_pole_side() {
        let north = park_commands(ParkPosition::Park1, 40.0);
        assert_eq!(north.dec, ":Sd+50*00:00.0");
        assert_eq!(north.ha, ":Sh11:59:59.80");

        let south = park_commands(ParkPosition::Park1, -33.5);
        assert_eq!(south.dec, ":Sd-56*30:00.0");
    }

    #[test]
    fn park3_flips_sign_with_hemisphere() {
        assert_eq!(park_commands(ParkPosition::Park3, 40.0).dec, ":Sd+89*59:59.0");
        assert_eq!(park_commands(ParkPosition::Park3, -40.0).dec, ":Sd-89*59:59.0");
    }

    #[test]
    fn park4_counter_pole() {
        let north = park_commands(ParkPosition::Park4, 40.0);
        assert_eq!(north.dec, ":Sd-50*00:00.0");
        assert_eq!(north.ha, ":Sh+00:00:00.20");
    }

    #[test]
    fn park5_mirrors_park1_hour_angle() {
        let p = park_commands(ParkPosition::Park5, 40.0);
        assert_eq!(p.dec, ":Sd+50*00:00.0");
        assert_eq!(p.ha, ":Sh-11:59:59.80");
    }
}
