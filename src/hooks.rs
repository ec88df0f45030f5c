//! Execution of the hook scripts of a template.
//!
//! A phase runs every `universal` script first, then the scripts of the
//! bucket matching the running OS. The first command that fails to start or
//! exits with a non-zero status stops the phase.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use log::{debug, info};

use crate::error::{Error, Result};
use crate::scripts::{Bucket, Phase, RenderedCommand, ScriptTable, Scripts};

/// Runs a single rendered command.
pub trait CommandRunner {
    /// Runs `command` inside `working_dir` and waits for it to finish.
    ///
    /// # Errors
    /// * `Error::IoError` if the command cannot be started
    /// * `Error::ScriptFailed` if it exits with a non-zero status
    fn run(&self, command: &RenderedCommand, working_dir: &Path) -> Result<()>;
}

/// Spawns commands as child processes of owl. The child's output goes to
/// owl's stdout and stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemCommandRunner;

impl CommandRunner for SystemCommandRunner {
    fn run(&self, command: &RenderedCommand, working_dir: &Path) -> Result<()> {
        debug!("Running '{}' in {}", command, working_dir.display());

        let status = Command::new(&command.program)
            .args(&command.args)
            .current_dir(working_dir)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(Error::IoError)?;

        if !status.success() {
            return Err(Error::ScriptFailed {
                script: command.program.clone(),
                message: format!("'{}' failed with status: {}", command, status),
            });
        }

        Ok(())
    }
}

/// Progress of a [`ScriptExecutor`] through a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorState {
    Idle,
    RunningUniversal,
    RunningOsBucket,
    Done,
    Failed,
}

/// Runs the phases of a [`ScriptTable`] inside the project root.
pub struct ScriptExecutor<'a> {
    runner: &'a dyn CommandRunner,
    working_dir: PathBuf,
    os_bucket: Option<Bucket>,
    state: ExecutorState,
}

impl<'a> ScriptExecutor<'a> {
    pub fn new<P: Into<PathBuf>>(runner: &'a dyn CommandRunner, working_dir: P) -> Self {
        Self {
            runner,
            working_dir: working_dir.into(),
            os_bucket: Bucket::current(),
            state: ExecutorState::Idle,
        }
    }

    /// Overrides the OS bucket detected from the build target.
    pub fn with_os_bucket(mut self, os_bucket: Option<Bucket>) -> Self {
        self.os_bucket = os_bucket;
        self
    }

    pub fn set_working_dir<P: Into<PathBuf>>(&mut self, working_dir: P) {
        self.working_dir = working_dir.into();
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn state(&self) -> ExecutorState {
        self.state
    }

    /// Runs every script of `phase`.
    ///
    /// # Errors
    /// * `Error::ScriptFailed` naming the script whose command failed. The
    ///   remaining commands of the phase are skipped.
    pub fn run(&mut self, table: &ScriptTable, phase: Phase) -> Result<()> {
        info!("Running {} scripts", phase);
        let scripts = table.phase(phase);

        self.state = ExecutorState::RunningUniversal;
        self.run_scripts(scripts.bucket(Bucket::Universal))?;

        self.state = ExecutorState::RunningOsBucket;
        if let Some(bucket) = self.os_bucket.filter(|b| *b != Bucket::Universal) {
            self.run_scripts(scripts.bucket(bucket))?;
        }

        self.state = ExecutorState::Done;
        Ok(())
    }

    fn run_scripts(&mut self, scripts: &Scripts) -> Result<()> {
        for (script, commands) in scripts {
            for command in commands {
                if let Err(e) = self.runner.run(command, &self.working_dir) {
                    self.state = ExecutorState::Failed;
                    let message = match e {
                        Error::ScriptFailed { message, .. } => message,
                        other => other.to_string(),
                    };
                    return Err(Error::ScriptFailed { script: script.clone(), message });
                }
            }
        }
        Ok(())
    }
}
