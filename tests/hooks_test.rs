use owl::error::{Error, Result};
use owl::hooks::{CommandRunner, ExecutorState, ScriptExecutor, SystemCommandRunner};
use owl::scripts::{Bucket, Phase, RenderedCommand, ScriptTable};
use std::cell::RefCell;
use std::path::{Path, PathBuf};

/// Records every command and fails the ones whose program is `fail`.
#[derive(Default)]
struct RecordingRunner {
    calls: RefCell<Vec<(String, PathBuf)>>,
}

impl CommandRunner for RecordingRunner {
    fn run(&self, command: &RenderedCommand, working_dir: &Path) -> Result<()> {
        self.calls.borrow_mut().push((command.to_string(), working_dir.to_path_buf()));
        if command.program == "fail" {
            return Err(Error::ScriptFailed {
                script: command.program.clone(),
                message: "exit status: 1".to_string(),
            });
        }
        Ok(())
    }
}

fn cmd(line: &str) -> RenderedCommand {
    RenderedCommand::parse(line).unwrap()
}

fn table() -> ScriptTable {
    let mut table = ScriptTable::default();
    let on_create = table.phase_mut(Phase::OnCreate);
    on_create.universal.insert("first".to_string(), vec![cmd("echo one"), cmd("echo two")]);
    on_create.universal.insert("second".to_string(), vec![cmd("echo three")]);
    on_create.linux.insert("linux".to_string(), vec![cmd("echo linux")]);
    on_create.macos.insert("macos".to_string(), vec![cmd("echo macos")]);
    on_create.windows.insert("windows".to_string(), vec![cmd("echo windows")]);
    table.on_mount.universal.insert("mount".to_string(), vec![cmd("echo mounted")]);
    table
}

fn commands(runner: &RecordingRunner) -> Vec<String> {
    runner.calls.borrow().iter().map(|(c, _)| c.clone()).collect()
}

#[test]
fn test_universal_then_os_bucket() {
    let runner = RecordingRunner::default();
    let mut executor = ScriptExecutor::new(&runner, "/work/app").with_os_bucket(Some(Bucket::Macos));
    assert_eq!(executor.state(), ExecutorState::Idle);

    executor.run(&table(), Phase::OnCreate).unwrap();

    assert_eq!(commands(&runner), ["echo one", "echo two", "echo three", "echo macos"]);
    assert_eq!(executor.state(), ExecutorState::Done);
    assert!(runner.calls.borrow().iter().all(|(_, dir)| dir == Path::new("/work/app")));
}

#[test]
fn test_unknown_os_runs_only_universal() {
    let runner = RecordingRunner::default();
    let mut executor = ScriptExecutor::new(&runner, "/work/app").with_os_bucket(None);

    executor.run(&table(), Phase::OnCreate).unwrap();
    assert_eq!(commands(&runner), ["echo one", "echo two", "echo three"]);
}

#[test]
fn test_phases_are_independent() {
    let runner = RecordingRunner::default();
    let mut executor = ScriptExecutor::new(&runner, "/work/app").with_os_bucket(Some(Bucket::Linux));

    executor.run(&table(), Phase::OnMount).unwrap();
    assert_eq!(commands(&runner), ["echo mounted"]);
}

#[test]
fn test_first_failure_stops_phase() {
    let mut scripts = table();
    scripts.on_create.universal.insert("first".to_string(), vec![cmd("fail now"), cmd("echo never")]);

    let runner = RecordingRunner::default();
    let mut executor = ScriptExecutor::new(&runner, "/work/app").with_os_bucket(Some(Bucket::Linux));

    match executor.run(&scripts, Phase::OnCreate) {
        Err(err @ Error::ScriptFailed { .. }) => {
            assert_eq!(err.to_string(), "Error executing first script: exit status: 1");
        }
        other => panic!("Expected ScriptFailed, got {:?}", other),
    }
    assert_eq!(commands(&runner), ["fail now"]);
    assert_eq!(executor.state(), ExecutorState::Failed);
}

#[test]
fn test_os_bucket_failure() {
    let mut scripts = table();
    scripts.on_create.linux.insert("linux".to_string(), vec![cmd("fail linux")]);

    let runner = RecordingRunner::default();
    let mut executor = ScriptExecutor::new(&runner, "/work/app").with_os_bucket(Some(Bucket::Linux));

    assert!(executor.run(&scripts, Phase::OnCreate).is_err());
    assert_eq!(commands(&runner), ["echo one", "echo two", "echo three", "fail linux"]);
    assert_eq!(executor.state(), ExecutorState::Failed);
}

#[cfg(unix)]
#[test]
fn test_system_runner_uses_working_dir() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let runner = SystemCommandRunner;

    runner.run(&cmd("touch created.txt"), temp_dir.path()).unwrap();
    assert!(temp_dir.path().join("created.txt").exists());
}

#[cfg(unix)]
#[test]
fn test_system_runner_reports_failures() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let runner = SystemCommandRunner;

    let result = runner.run(&cmd("false"), temp_dir.path());
    assert!(matches!(result, Err(Error::ScriptFailed { .. })));

    let result = runner.run(&cmd("owl-command-that-does-not-exist"), temp_dir.path());
    assert!(matches!(result, Err(Error::IoError(_))));
}
