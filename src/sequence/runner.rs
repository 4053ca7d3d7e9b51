use chrono::Utc;
use thiserror::Error;

use crate::instructions::{ExecutionContext, InstructionError};
use crate::sequence::{OnFail, Sequence};

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("step {step} ({name}) failed: {source}")]
    StepFailed {
        step: usize,
        name: &'static str,
        source: InstructionError,
    },
    #[error("sequence was cancelled")]
    Cancelled,
}

/// Executes a sequence step by step: sleep until each step is due, run
/// its instruction, stop on failure unless the step opted out.
pub struct Runner {
    pub sequence: Sequence,
    pub ctx: ExecutionContext,
}

impl Runner {
    pub async fn run(self) -> Result<(), RunnerError> {
        let start = Utc::now();
        log::info!("Starting sequence at {start}");

        for (i, step) in self.sequence.steps.iter().enumerate() {
            if let Some(time) = &step.time {
                let due = time.resolve(start);
                let now = Utc::now();
                if due > now {
                    let wait = (due - now).to_std().unwrap_or_default();
                    log::info!("Step {i}: waiting until {due} ({})", humantime::format_duration(wait));
                    if self.ctx.cancel.sleep(wait).await {
                        return Err(RunnerError::Cancelled);
                    }
                }
            }

            if self.ctx.cancel.is_cancelled() {
                return Err(RunnerError::Cancelled);
            }

            let name = step.instruction.name();
            log::info!("Step {i}: running {name}");
            match step.instruction.execute(&self.ctx).await {
                Ok(()) => log::info!("Step {i}: {name} completed"),
                Err(InstructionError::Cancelled) => return Err(RunnerError::Cancelled),
                Err(e) if step.on_fail == OnFail::Continue => {
                    log::error!("Step {i}: {name} failed ({e}), continuing");
                }
                Err(e) => {
                    return Err(RunnerError::StepFailed { step: i, name, source: e });
                }
            }
        }

        log::info!("Sequence completed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel;
    use crate::config::Config;
    use crate::sequence::Sequence;

    fn config() -> Config {
        serde_yaml::from_str(
            "site:\n  latitude_deg: 40.0\n  longitude_deg: -105.0\n\
             apcc:\n  exe_path: /nonexistent/AstroPhysicsCommandCenter.exe\n\
             appm:\n  exe_path: /nonexistent/ApPointMapper.exe\n",
        )
        .unwrap()
    }

    fn runner(yaml: &str) -> Runner {
        let (_src, cancel) = cancel::channel();
        Runner {
            sequence: Sequence::from_str(yaml).unwrap(),
            ctx: ExecutionContext { config: config(), cancel },
        }
    }

    // The dec-arc step fails to launch the nonexistent executable; the
    // polar-target step skips model creation and succeeds.
    const FAILING_STEP: &str = "appm:\n      action: create_dec_arc_model\n      target:\n        ra_hours: 5.5\n        dec_deg: 10.0\n";
    const SKIPPING_STEP: &str = "appm:\n      action: create_dec_arc_model\n      target:\n        ra_hours: 5.5\n        dec_deg: 88.0\n";

    #[tokio::test]
    async fn a_failing_step_aborts_the_sequence() {
        let yaml = format!("steps:\n  - {FAILING_STEP}  - {SKIPPING_STEP}");
        match runner(&yaml).run().await {
            Err(RunnerError::StepFailed { step: 0, .. }) => {}
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn on_fail_continue_runs_the_rest_of_the_sequence() {
        let yaml = format!("steps:\n  - on_fail: continue\n    {FAILING_STEP}  - {SKIPPING_STEP}");
        match runner(&yaml).run().await {
            Ok(()) => {}
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
