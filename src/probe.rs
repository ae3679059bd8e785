use std::{io, process::Command};

use thiserror::Error;
use tracing::debug;

/// Nagios plugin that queries an APC UPS over SNMP.
pub const DEFAULT_CHECK_COMMAND: &str = "/usr/lib64/nagios/plugins/check_snmp_apcups";

pub const DEFAULT_COMMUNITY: &str = "public";

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("failed to run probe `{program}`")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
}

/// Executes a program and hands back whatever it printed.
pub trait Runner {
    fn run(&self, program: &str, args: &[String]) -> Result<String, ProbeError>;
}

impl<F> Runner for F
where
    F: Fn(&str, &[String]) -> Result<String, ProbeError>,
{
    fn run(&self, program: &str, args: &[String]) -> Result<String, ProbeError> {
        self(program, args)
    }
}

/// Runs the probe as a child process and blocks until it exits.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

impl Runner for ProcessRunner {
    fn run(&self, program: &str, args: &[String]) -> Result<String, ProbeError> {
        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|source| ProbeError::Spawn {
                program: program.to_string(),
                source,
            })?;

        // The plugin exits non-zero for warning/critical states, the text is still usable.
        if !output.status.success() {
            debug!(%program, status = %output.status, "probe exited unsuccessfully");
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// The check command plus the runner used to execute it.
#[derive(Debug, Clone)]
pub struct Probe<R> {
    command: String,
    runner: R,
}

impl Probe<ProcessRunner> {
    pub fn system() -> Self {
        Probe::new(ProcessRunner)
    }
}

impl<R: Runner> Probe<R> {
    pub fn new(runner: R) -> Self {
        Probe::with_command(DEFAULT_CHECK_COMMAND, runner)
    }

    pub fn with_command(command: impl Into<String>, runner: R) -> Self {
        Probe {
            command: command.into(),
            runner,
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn args(community: &str, host: &str) -> Vec<String> {
        vec![
            "-C".to_string(),
            community.to_string(),
            "-H".to_string(),
            host.to_string(),
        ]
    }

    pub fn query(&self, community: &str, host: &str) -> Result<String, ProbeError> {
        let args = Self::args(community, host);
        debug!(command = %self.command, ?args, "querying ups");
        self.runner.run(&self.command, &args)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    #[test]
    fn query_bakes_community_and_host_into_args() {
        let seen: RefCell<Vec<(String, Vec<String>)>> = RefCell::new(Vec::new());
        let runner = |program: &str, args: &[String]| -> Result<String, ProbeError> {
            seen.borrow_mut().push((program.to_string(), args.to_vec()));
            Ok("BATTERY:()".to_string())
        };

        let probe = Probe::new(runner);
        let out = probe.query("private", "10.0.0.1").unwrap();

        assert_eq!(out, "BATTERY:()");
        let seen = seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, DEFAULT_CHECK_COMMAND);
        assert_eq!(seen[0].1, vec!["-C", "private", "-H", "10.0.0.1"]);
    }

    #[test]
    fn custom_command_is_used() {
        let runner = |program: &str, _: &[String]| -> Result<String, ProbeError> {
            Ok(program.to_string())
        };
        let probe = Probe::with_command("/opt/check_ups", runner);
        assert_eq!(probe.command(), "/opt/check_ups");
        assert_eq!(probe.query("public", "ups").unwrap(), "/opt/check_ups");
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let probe = Probe::with_command("/nonexistent/ups-status-probe", ProcessRunner);
        let err = probe.query("public", "localhost").unwrap_err();
        assert!(matches!(err, ProbeError::Spawn { .. }));
        assert!(err.to_string().contains("/nonexistent/ups-status-probe"));
    }

    #[cfg(unix)]
    #[test]
    fn process_runner_captures_stdout_regardless_of_status() {
        let out = ProcessRunner
            .run("sh", &["-c".to_string(), "echo 'OUTPUT:(1, 2, Load 3%)'; exit 2".to_string()])
            .unwrap();
        assert_eq!(out.trim(), "OUTPUT:(1, 2, Load 3%)");
    }
}
