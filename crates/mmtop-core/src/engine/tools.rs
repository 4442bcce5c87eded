use super::error::EngineError;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, info};

/// A single external program call: what to run, what to feed it and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    /// Human-readable tool name used in errors (e.g. "gmx trjconv").
    pub tool: String,
    pub program: PathBuf,
    pub args: Vec<String>,
    /// Text written to the child's stdin, which is closed afterwards.
    pub stdin: Option<String>,
    /// What the tool was asked to do, for error reporting.
    pub operation: String,
}

impl ToolInvocation {
    pub fn new(
        tool: impl Into<String>,
        program: impl Into<PathBuf>,
        operation: impl Into<String>,
    ) -> Self {
        Self {
            tool: tool.into(),
            program: program.into(),
            args: Vec::new(),
            stdin: None,
            operation: operation.into(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(path.to_string_lossy().into_owned())
    }

    pub fn stdin(mut self, text: impl Into<String>) -> Self {
        self.stdin = Some(text.into());
        self
    }

    /// The program and its arguments joined by spaces, as echoed to the tool log.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.to_string_lossy().into_owned())
            .chain(self.args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Exit status and combined stdout/stderr of a finished tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    /// `None` when the process was terminated by a signal.
    pub status: Option<i32>,
    pub log: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    /// Converts a nonzero or missing exit status into [`EngineError::ExternalTool`].
    pub fn ensure_success(&self, invocation: &ToolInvocation) -> Result<(), EngineError> {
        if self.success() {
            Ok(())
        } else {
            Err(EngineError::ExternalTool {
                tool: invocation.tool.clone(),
                operation: invocation.operation.clone(),
                status: self.status,
            })
        }
    }
}

/// Runs external programs on behalf of the pipeline.
///
/// Implementations block until the program exits. A program that could not be started is
/// an error; a program that ran is reported through its [`ToolOutput`] whatever its status.
pub trait ToolRunner {
    fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput, EngineError>;
}

/// Runs an invocation and fails unless it exits successfully.
pub fn run_checked(
    runner: &impl ToolRunner,
    invocation: &ToolInvocation,
) -> Result<ToolOutput, EngineError> {
    info!(tool = %invocation.tool, "{}", invocation.operation);
    let output = runner.run(invocation)?;
    output.ensure_success(invocation)?;
    Ok(output)
}

/// [`ToolRunner`] backed by `std::process`, appending every captured log to a file.
#[derive(Debug, Clone, Default)]
pub struct SystemToolRunner {
    log_path: Option<PathBuf>,
}

impl SystemToolRunner {
    pub fn new(log_path: impl Into<PathBuf>) -> Self {
        Self {
            log_path: Some(log_path.into()),
        }
    }

    pub fn without_log() -> Self {
        Self::default()
    }

    fn append_log(&self, text: &str) -> io::Result<()> {
        if let Some(path) = &self.log_path {
            let mut file = OpenOptions::new().create(true).append(true).open(path)?;
            file.write_all(text.as_bytes())?;
        }
        Ok(())
    }
}

impl ToolRunner for SystemToolRunner {
    fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput, EngineError> {
        debug!(command = %invocation.command_line(), "Spawning external tool");

        let mut child = Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(if invocation.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| EngineError::ToolLaunch {
                tool: invocation.tool.clone(),
                source,
            })?;

        // Closing the pipe at the end of the arm signals end of input.
        let written = match (&invocation.stdin, child.stdin.take()) {
            (Some(text), Some(mut stdin)) => stdin.write_all(text.as_bytes()),
            _ => Ok(()),
        };
        // The tool may exit without reading its input; its exit status decides the outcome.
        if let Err(err) = written {
            if err.kind() != io::ErrorKind::BrokenPipe {
                let _ = child.kill();
                let _ = child.wait();
                return Err(err.into());
            }
        }

        let output = child.wait_with_output()?;

        let mut log = format!("$ {}\n", invocation.command_line());
        log.push_str(&String::from_utf8_lossy(&output.stdout));
        log.push_str(&String::from_utf8_lossy(&output.stderr));
        self.append_log(&log)?;

        debug!(status = ?output.status.code(), "External tool finished");
        Ok(ToolOutput {
            status: output.status.code(),
            log,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invocation_builder_collects_arguments() {
        let invocation = ToolInvocation::new("gmx trjconv", "gmx", "extracting")
            .arg("trjconv")
            .arg("-f")
            .path_arg(Path::new("md.xtc"))
            .stdin("1\n");

        assert_eq!(invocation.args, vec!["trjconv", "-f", "md.xtc"]);
        assert_eq!(invocation.stdin.as_deref(), Some("1\n"));
        assert_eq!(invocation.command_line(), "gmx trjconv -f md.xtc");
    }

    #[test]
    fn ensure_success_maps_status_to_external_tool_error() {
        let invocation = ToolInvocation::new("tleap", "tleap", "building topologies");
        let ok = ToolOutput {
            status: Some(0),
            log: String::new(),
        };
        assert!(ok.ensure_success(&invocation).is_ok());

        let failed = ToolOutput {
            status: Some(2),
            log: String::new(),
        };
        match failed.ensure_success(&invocation) {
            Err(EngineError::ExternalTool {
                tool,
                operation,
                status,
            }) => {
                assert_eq!(tool, "tleap");
                assert_eq!(operation, "building topologies");
                assert_eq!(status, Some(2));
            }
            other => panic!("Expected ExternalTool error, got {:?}", other),
        }
    }

    #[test]
    fn missing_program_is_a_launch_error() {
        let runner = SystemToolRunner::without_log();
        let invocation = ToolInvocation::new(
            "ghost",
            "/nonexistent/mmtop-ghost-program",
            "doing nothing",
        );
        assert!(matches!(
            runner.run(&invocation),
            Err(EngineError::ToolLaunch { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn system_runner_pipes_stdin_and_appends_log() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("make_top.log");
        let runner = SystemToolRunner::new(&log_path);

        let invocation = ToolInvocation::new("sh", "sh", "echoing input")
            .arg("-c")
            .arg("cat; echo oops >&2; exit 3")
            .stdin("GMXMMPBSA_REC\n");
        let output = runner.run(&invocation).unwrap();

        assert_eq!(output.status, Some(3));
        assert!(output.log.contains("GMXMMPBSA_REC"));
        assert!(output.log.contains("oops"));
        assert!(run_checked(&runner, &invocation).is_err());

        let logged = std::fs::read_to_string(&log_path).unwrap();
        assert_eq!(logged.matches("GMXMMPBSA_REC").count(), 2);
        assert!(logged.starts_with("$ sh -c"));
    }

    #[cfg(unix)]
    #[test]
    fn system_runner_reports_success_without_stdin() {
        let runner = SystemToolRunner::without_log();
        let invocation = ToolInvocation::new("true", "true", "succeeding");
        let output = run_checked(&runner, &invocation).unwrap();
        assert!(output.success());
    }

    #[cfg(unix)]
    #[test]
    fn tool_exiting_before_reading_stdin_is_reaped_with_its_status() {
        let runner = SystemToolRunner::without_log();
        let input = "0\n".repeat(512 * 1024);
        let invocation = ToolInvocation::new("sh", "sh", "ignoring input")
            .arg("-c")
            .arg("exit 4")
            .stdin(input);

        let output = runner.run(&invocation).unwrap();

        assert_eq!(output.status, Some(4));
        assert!(!output.success());
    }
}
