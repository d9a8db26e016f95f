//! Execution of steps as child processes

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, error, info};

use crate::deploy::step::Step;
use crate::errors::VerifyError;

/// Runs steps, as a trait for testability
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run `step` to completion. A non-zero exit is an error.
    async fn run(&self, step: &Step) -> Result<(), VerifyError>;
}

/// Run `steps` in order, stopping at the first failure
pub async fn run_steps<R: ProcessRunner + ?Sized>(
    runner: &R,
    steps: &[Step],
) -> Result<(), VerifyError> {
    let total = steps.len();
    for (index, step) in steps.iter().enumerate() {
        info!("[{}/{}] {}", index + 1, total, step.label);
        runner.run(step).await?;
    }
    Ok(())
}

/// Spawns each step with `workdir` as its current directory
#[derive(Debug, Clone)]
pub struct CommandRunner {
    workdir: PathBuf,
}

impl CommandRunner {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Relative programs with a directory part live inside the working directory
    fn program_path(&self, program: &str) -> PathBuf {
        let path = Path::new(program);
        if path.is_relative() && path.components().count() > 1 {
            self.workdir.join(path)
        } else {
            path.to_path_buf()
        }
    }
}

#[async_trait]
impl ProcessRunner for CommandRunner {
    async fn run(&self, step: &Step) -> Result<(), VerifyError> {
        let args = step.resolve_args(&self.workdir)?;
        debug!("Running: {}", step);

        let status = Command::new(self.program_path(&step.program))
            .args(&args)
            .current_dir(&self.workdir)
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|source| VerifyError::ProcessSpawn {
                step: step.label.clone(),
                source,
            })?;

        if !status.success() {
            error!("Step '{}' exited with {}", step.label, status);
            return Err(VerifyError::ProcessFailure {
                step: step.label.clone(),
                code: status.code(),
            });
        }
        Ok(())
    }
}
