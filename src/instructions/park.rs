use serde::Deserialize;
use std::time::Duration;

use crate::apcc::commands::{
    self, ParkPosition, CLEAR_DELTA_RATE, CLEAR_MERIDIAN_DELAY, HALT_MOTION, MOTORS_OFF,
    SLEW_DISTANCE, SLEW_TO_TARGET, TRACKING_OFF,
};
use crate::apcc::ApccClient;
use crate::config::Config;
use crate::instructions::{ExecutionContext, InstructionError};

const SLEW_POLL_INTERVAL: Duration = Duration::from_millis(3500);

/// Slews the mount to one of the Astro-Physics park orientations and
/// powers down the motors.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Park {
    pub position: ParkPosition,
}

impl Park {
    pub fn validate(&self, _config: &Config) -> Vec<String> {
        Vec::new()
    }

    pub async fn execute(&self, ctx: &ExecutionContext) -> Result<(), InstructionError> {
        let client = ApccClient::new(&ctx.config.apcc.host, ctx.config.apcc.port);

        log::info!("Parking at position {}", self.position);
        client.send_command(HALT_MOTION).await?;
        client.send_command(CLEAR_DELTA_RATE).await?;
        client.send_command(TRACKING_OFF).await?;
        client.send_command(CLEAR_MERIDIAN_DELAY).await?;

        let park = commands::park_commands(self.position, ctx.config.site.latitude_deg);
        log::debug!("Slewing to {}: HA: {}, Dec: {}", self.position, park.ha, park.dec);
        client.send_command(&park.dec).await?;
        client.send_command(&park.ha).await?;
        client.send_command(SLEW_TO_TARGET).await?;

        loop {
            if ctx.cancel.sleep(SLEW_POLL_INTERVAL).await {
                // Leave the mount stopped rather than mid-slew.
                client.send_command(HALT_MOTION).await?;
                return Err(InstructionError::Cancelled);
            }
            let reply = client.send_command(SLEW_DISTANCE).await?;
            if reply.response_string.trim_end_matches('#').is_empty() {
                break;
            }
        }

        client.send_command(TRACKING_OFF).await?;
        client.send_command(HALT_MOTION).await?;
        client.send_command(HALT_MOTION).await?;
        client.send_command(MOTORS_OFF).await?;

        log::info!("Settling for {} seconds", ctx.config.settle_time_s);
        ctx.cancel
            .sleep(Duration::from_secs(ctx.config.settle_time_s))
            .await;

        Ok(())
    }
}
