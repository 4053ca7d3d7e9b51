use std::time::Duration;

use crate::apcc::ApccClient;
use crate::config::Config;
use crate::instructions::{check_exe_path, ExecutionContext, InstructionError};
use crate::process;

pub fn validate(config: &Config) -> Vec<String> {
    let mut issues = Vec::new();
    check_exe_path(&config.apcc.exe_path, "the APCC executable", &mut issues);
    issues
}

/// Launches APCC (or reuses a running instance) and waits for its HTTP
/// API to come up, bounded by the configured startup timeout.
pub async fn execute(ctx: &ExecutionContext) -> Result<(), InstructionError> {
    let config = &ctx.config.apcc;

    process::launch_or_reuse(&config.exe_path, &[])?;

    let client = ApccClient::new(&config.host, config.port);
    let timeout = Duration::from_secs(config.startup_timeout_s);
    match tokio::time::timeout(timeout, client.wait_for_api_ready(&ctx.cancel)).await {
        Ok(true) => {
            log::info!("APCC API is answering");
            Ok(())
        }
        Ok(false) => Err(InstructionError::Cancelled),
        Err(_) => Err(InstructionError::Failed(format!(
            "APCC did not answer on its API within {} seconds",
            config.startup_timeout_s
        ))),
    }
}
