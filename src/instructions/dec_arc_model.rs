use chrono::Utc;
use serde::Deserialize;
use std::time::Duration;

use crate::appm::types::MeasurementConfigurationRequest;
use crate::appm::{AppmClient, StatusWorker};
use crate::astro::Target;
use crate::config::{AppmConfig, Config};
use crate::instructions::{check_exe_path, ExecutionContext, InstructionError};
use crate::model::dec_arc::{self, DecArcParameters};
use crate::process::{self, LaunchedProcess};

/// Runs APPM unattended to build a pointing model along declination
/// arcs bracketing the target's path for the rest of the night.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CreateDecArcModel {
    pub target: Target,
    /// Map the full -12..+12h arc instead of the lead-in..sunrise window.
    #[serde(default)]
    pub full_arc: bool,
    /// Configure APPM but let the user drive the run; waits for the
    /// program to exit.
    #[serde(default)]
    pub manual_mode: bool,
    /// Leave APPM open when the run finishes.
    #[serde(default)]
    pub do_not_exit: bool,
}

impl CreateDecArcModel {
    pub fn validate(&self, config: &Config) -> Vec<String> {
        let mut issues = Vec::new();

        check_exe_path(&config.appm.exe_path, "the APPM executable", &mut issues);
        if let Some(settings) = &config.appm.settings_path {
            if !settings.exists() {
                issues.push("Invalid location for APPM settings file".to_string());
            }
        }
        if config.dec_arc.arc_quantity < 1 {
            issues.push("Dec arc quantity must be at least 1".to_string());
        }
        if config.dec_arc.dec_spacing < 1 {
            issues.push("Dec arc spacing must be at least 1".to_string());
        }
        if config.dec_arc.ra_spacing < 1 {
            issues.push("RA spacing must be at least 1".to_string());
        }
        if self.target.dec_deg.abs() > 85.0 {
            issues.push(format!(
                "Target declination {:.2} is too close to the pole for a dec arc model",
                self.target.dec_deg
            ));
        }

        issues
    }

    pub async fn execute(&self, ctx: &ExecutionContext) -> Result<(), InstructionError> {
        let config = &ctx.config;

        if self.target.dec_deg.abs() > 85.0 {
            log::info!(
                "The target's declination of {:.2} is too close to the pole to create a meaningful model. Skipping model creation.",
                self.target.dec_deg
            );
            return Ok(());
        }

        let params =
            dec_arc::calculate(&self.target, &config.site, &config.dec_arc, self.full_arc, Utc::now());
        log::info!(
            "RA: HourAngleStart={:.2}, HourAngleEnd={:.2}, Hours={:.2}",
            params.east_ha_limit,
            params.west_ha_limit,
            params.west_ha_limit - params.east_ha_limit
        );
        log::info!(
            "Dec: T={}, N={}, S={}, Spread={}, Spacing={}, Offset={}",
            params.target_dec,
            params.north_dec_limit,
            params.south_dec_limit,
            params.north_dec_limit - params.south_dec_limit,
            params.dec_spacing,
            params.dec_offset
        );

        let client = AppmClient::new(&config.appm.host, config.appm.port);
        let proc = launch_appm(&config.appm, self.do_not_exit)?;

        if !client.wait_for_api_ready(&ctx.cancel).await {
            return self.abort(&client).await;
        }

        let mut worker = StatusWorker::spawn(client.clone());
        let result = self.run(&client, &worker, &params, proc, ctx).await;
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
        params: &DecArcParameters,
        proc: LaunchedProcess,
        ctx: &ExecutionContext,
    ) -> Result<(), InstructionError> {
        let fetched = client.get_configuration().await?;
        let mut configuration = fetched.configuration;

        configuration.use_max_declination = true;
        configuration.use_min_declination = true;
        configuration.use_max_hour_angle_west = true;
        configuration.use_min_hour_angle_east = true;
        configuration.create_east_points = true;
        configuration.create_west_points = true;
        configuration.use_meridian_limits = true;
        configuration.use_horizon_limits = true;
        configuration.use_min_altitude = true;
        configuration.right_ascension_offset = 0;
        configuration.declination_spacing = params.dec_spacing;
        configuration.max_declination = params.north_dec_limit;
        configuration.min_declination = params.south_dec_limit;
        configuration.declination_offset = params.dec_offset;
        configuration.right_ascension_spacing = params.ra_spacing;
        configuration.min_hour_angle_east = params.east_ha_limit;
        configuration.max_hour_angle_west = params.west_ha_limit;
        configuration.point_ordering_strategy = params.ordering_strategy.vendor_code();

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

            let mut completed = 0;
            loop {
                let progress = worker.progress();
                if progress.current_point >= total_points {
                    break;
                }
                if completed < progress.current_point {
                    log::info!(
                        "Mapping points progress: {} / {}",
                        progress.current_point,
                        total_points
                    );
                    completed = progress.current_point;
                }
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

    /// Best-effort teardown on cancellation: stop the run and close
    /// APPM unless asked to keep it open.
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

/// Launches APPM for an API-driven run, passing the configured settings
/// and map files and the don't-exit flag through to the program.
pub(crate) fn launch_appm(
    config: &AppmConfig,
    do_not_exit: bool,
) -> std::io::Result<LaunchedProcess> {
    let mut args = Vec::new();

    if do_not_exit {
        args.push("-dontexit".to_string());
    }
    if let Some(settings) = &config.settings_path {
        if settings.exists() {
            args.push(format!("-s{}", settings.display()));
        }
    }
    if let Some(map) = &config.map_path {
        if map.exists() {
            args.push(format!("-m{}", map.display()));
        }
    }

    process::launch_or_reuse(&config.exe_path, &args)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(tail: &str) -> Config {
        let yaml = format!(
            "site:\n  latitude_deg: 40.0\n  longitude_deg: -105.0\n\
             apcc:\n  exe_path: /nonexistent/AstroPhysicsCommandCenter.exe\n\
             appm:\n  exe_path: /nonexistent/ApPointMapper.exe\n{tail}"
        );
        serde_yaml::from_str(&yaml).unwrap()
    }

    fn instruction(dec_deg: f64) -> CreateDecArcModel {
        CreateDecArcModel {
            target: Target { ra_hours: 5.5, dec_deg },
            full_arc: false,
            manual_mode: false,
            do_not_exit: false,
        }
    }

    #[test]
    fn validate_flags_a_missing_executable() {
        let issues = instruction(10.0).validate(&config(""));
        assert!(issues.iter().any(|i| i.contains("APPM executable")), "{issues:?}");
    }

    #[test]
    fn validate_flags_degenerate_arc_settings() {
        let tail = "dec_arc:\n  arc_quantity: 0\n  dec_spacing: 0\n  ra_spacing: 0\n";
        let issues = instruction(10.0).validate(&config(tail));
        assert!(issues.iter().any(|i| i.contains("quantity must be at least 1")), "{issues:?}");
        assert!(issues.iter().any(|i| i.contains("Dec arc spacing")), "{issues:?}");
        assert!(issues.iter().any(|i| i.contains("RA spacing")), "{issues:?}");
    }

    #[test]
    fn validate_flags_targets_too_close_to_the_pole() {
        let issues = instruction(88.0).validate(&config(""));
        assert!(issues.iter().any(|i| i.contains("too close to the pole")), "{issues:?}");
        assert!(instruction(84.9).validate(&config("")).iter().all(|i| !i.contains("pole")));
    }
}
