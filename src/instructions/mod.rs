pub mod all_sky_model;
pub mod dec_arc_model;
pub mod park;
pub mod start_apcc;

use serde::Deserialize;
use thiserror::Error;

use crate::apcc::ApccError;
use crate::appm::AppmError;
use crate::cancel::CancelToken;
use crate::config::Config;

pub use all_sky_model::CreateAllSkyModel;
pub use dec_arc_model::CreateDecArcModel;
pub use park::Park;

/// Everything an instruction needs to run: the tool configuration and
/// the sequence-wide cancellation token. Each instruction builds its
/// own HTTP clients and process handles from it.
pub struct ExecutionContext {
    pub config: Config,
    pub cancel: CancelToken,
}

#[derive(Debug, Error)]
pub enum InstructionError {
    #[error("instruction was cancelled")]
    Cancelled,
    #[error(transparent)]
    Appm(#[from] AppmError),
    #[error(transparent)]
    Apcc(#[from] ApccError),
    #[error("process error: {0}")]
    Process(#[from] std::io::Error),
    #[error("{0}")]
    Failed(String),
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum AppmInstruction {
    CreateDecArcModel(CreateDecArcModel),
    CreateAllSkyModel(CreateAllSkyModel),
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ApccInstruction {
    Start,
    Park(Park),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    Appm(AppmInstruction),
    Apcc(ApccInstruction),
}

impl Instruction {
    pub fn name(&self) -> &'static str {
        match self {
            Instruction::Appm(AppmInstruction::CreateDecArcModel(_)) => "appm.create_dec_arc_model",
            Instruction::Appm(AppmInstruction::CreateAllSkyModel(_)) => "appm.create_all_sky_model",
            Instruction::Apcc(ApccInstruction::Start) => "apcc.start",
            Instruction::Apcc(ApccInstruction::Park(_)) => "apcc.park",
        }
    }

    /// Pre-flight checks, returned as human-readable issues. An empty
    /// list means the instruction can run.
    pub fn validate(&self, config: &Config) -> Vec<String> {
        match self {
            Instruction::Appm(AppmInstruction::CreateDecArcModel(i)) => i.validate(config),
            Instruction::Appm(AppmInstruction::CreateAllSkyModel(i)) => i.validate(config),
            Instruction::Apcc(ApccInstruction::Start) => start_apcc::validate(config),
            Instruction::Apcc(ApccInstruction::Park(i)) => i.validate(config),
        }
    }

    pub async fn execute(&self, ctx: &ExecutionContext) -> Result<(), InstructionError> {
        match self {
            Instruction::Appm(AppmInstruction::CreateDecArcModel(i)) => i.execute(ctx).await,
            Instruction::Appm(AppmInstruction::CreateAllSkyModel(i)) => i.execute(ctx).await,
            Instruction::Apcc(ApccInstruction::Start) => start_apcc::execute(ctx).await,
            Instruction::Apcc(ApccInstruction::Park(i)) => i.execute(ctx).await,
        }
    }
}

pub(crate) fn check_exe_path(path: &std::path::Path, what: &str, issues: &mut Vec<String>) {
    if path.as_os_str().is_empty() || !path.exists() {
        issues.push(format!("Invalid location for {what}"));
    }
}
