use serde::Deserialize;
use std::time::Duration;

use crate::appm::types::{MeasurementConfiguration, MeasurementConfigurationRequest};
use crate::appm::{AppmClient, StatusWorker};
use crate::config::{AllSkySettings, Config};
use crate::instructions::dec_arc_model::launch_appm;
use crate::instructions::{check_exe_path, ExecutionContext, InstructionError};
use crate::process::LaunchedProcess;

/// Runs APPM unattended to build an all-sky pointing model from the
/// configured grid.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct CreateAllSkyModel {
    #[serde(default)]
    pub manual_mode: bool,
    #[serde(default)]
    pub do_not_exit: bool,
}

impl CreateAllSkyModel {
    pub fn validate(&self, config: &Config) -> Vec<String> {
        let mut issues = Vec::new();

        check_exe_path(&config.appm.exe_path, "the APPM executable", &mut issues);
        if let Some(settings) = &config.appm.settings_path {
            if !settings.exists() {
                issues.push("Invalid location for APPM settings file".to_string());
            }
        }
        if let Some(map) = &config.appm.map_path {
            if !map.exists() {
                issues.push("Invalid location for APPM map file".to_string());
            }
        }

        issues
    }

    pub async fn execute(&self, ctx: &ExecutionContext) -> Result<(), InstructionError> {
        let config = &ctx.config;
        let client = AppmClient::new(&config.appm.host, config.appm.port);
        let proc = launch_appm(&config.appm, self.do_not_exit)?;

        if !client.wait_for_api_ready(&ctx.cancel).await {
            return self.abort(&client).await;
        }

        let mut worker = StatusWorker::spawn(client.clone());
        let result = self.run(&client, &worker, proc, ctx).await;
        worker.stop().await;

        match result {
            Err(InstructionError::Cancelled) => self.abort(&client).await,
            other => other,
        }
    }

    async fn run(
        &self,
        client: &AppmClient,
        worker: &StatusWorker,
        proc: LaunchedProcess,
        ctx: &ExecutionContext,
    ) -> Result<(), InstructionError> {
        let configuration = measurement_configuration(&ctx.config.all_sky);
        let response = client
            .set_configuration(&MeasurementConfigurationRequest { configuration })
            .await?;
        if !response.success {
            return Err(InstructionError::Failed(
                "Could not set APPM configuration".to_string(),
            ));
        }

        let total_points = response.point_count;
        if total_points == 0 {
            log::warn!(
                "The point count for this mapping run is 0. The mapping run will not start. This is not an error, but it's perhaps not what you intended."
            );
            if !self.do_not_exit {
                client.close().await?;
            }
            return Ok(());
        }

        if self.manual_mode {
            log::info!("Manual mode: waiting for the APPM process to exit");
            if !proc.wait(&ctx.cancel).await? {
                return Err(InstructionError::Cancelled);
            }
            return Ok(());
        }

        let state = client.status().await?.status.mapping_run_state;
        if state == "Idle" {
            client.start().await?;
            if client
                .wait_for_mapping_state("Running", &ctx.cancel)
                .await?
                .is_none()
            {
                return Err(InstructionError::Cancelled);
            }

            loop {
                let progress = worker.progress();
                if progress.run_state != "Running" {
                    break;
                }
                log::info!(
                    "Mapping points progress: {} / {}",
                    progress.current_point,
                    total_points
                );
                if ctx.cancel.sleep(Duration::from_secs(2)).await {
                    return Err(InstructionError::Cancelled);
                }
            }

            log::info!(
                "APPM mapping run has finished. MappingRunState={}",
                worker.progress().run_state
            );
        } else {
            log::info!("Mapping run is not idle (state: {state}); leaving it alone");
        }

        if !self.do_not_exit {
            client.close().await?;
        }

        Ok(())
    }

    async fn abort(&self, client: &AppmClient) -> Result<(), InstructionError> {
        log::info!("Cancellation requested");
        if let Err(e) = client.stop().await {
            log::debug!("Stop request during cancellation failed: {e}");
        }
        if !self.do_not_exit {
            if let Err(e) = client.close().await {
                log::debug!("Close request during cancellation failed: {e}");
            }
        }
        Err(InstructionError::Cancelled)
    }
}

fn measurement_configuration(s: &AllSkySettings) -> MeasurementConfiguration {
    MeasurementConfiguration {
        create_west_points: s.create_west_points,
        create_east_points: s.create_east_points,
        set_slew_rate: s.set_slew_rate,
        slew_rate: s.slew_rate,
        slew_settle_time: s.slew_settle_time,
        use_meridian_limits: s.use_meridian_limits,
        use_horizon_limits: s.use_horizon_limits,
        zenith_safety_distance: s.zenith_safety_distance,
        zenith_sync_distance: s.zenith_sync_distance,
        point_ordering_strategy: s.ordering_strategy.vendor_code(),
        declination_spacing: s.dec_spacing,
        declination_offset: s.dec_offset,
        use_min_declination: s.use_min_declination,
        use_max_declination: s.use_max_declination,
        min_declination: s.min_declination,
        max_declination: s.max_declination,
        right_ascension_spacing: s.ra_spacing,
        right_ascension_offset: s.ra_offset,
        use_min_hour_angle_east: s.use_min_hour_angle_east,
        use_max_hour_angle_west: s.use_max_hour_angle_west,
        min_hour_angle_east: s.min_hour_angle_east,
        max_hour_angle_west: s.max_hour_angle_west,
        use_min_altitude: s.use_min_altitude,
        min_altitude: s.min_altitude,
    }
}
