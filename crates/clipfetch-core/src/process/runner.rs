use std::fmt;
use std::io;
use std::process::Command;

use crate::retry::{Classified, ErrorKind};

use super::classify::classify_output;

/// Program, arguments and environment overrides for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (k, v) in &self.env {
            write!(f, "{}={} ", k, v)?;
        }
        write!(f, "{}", self.program)?;
        for a in &self.args {
            write!(f, " {}", a)?;
        }
        Ok(())
    }
}

/// Captured result of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code; `None` if the process was killed by a signal.
    pub code: Option<i32>,
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    /// Stdout and stderr joined, trimmed; what an operator would have seen on the terminal.
    pub fn combined(&self) -> String {
        let out = self.stdout.trim();
        let err = self.stderr.trim();
        match (out.is_empty(), err.is_empty()) {
            (true, true) => String::new(),
            (false, true) => out.to_string(),
            (true, false) => err.to_string(),
            (false, false) => format!("{}\n{}", out, err),
        }
    }
}

/// Runs external commands to completion. Blocking.
pub trait ProcessRunner: Send + Sync {
    fn run(&self, cmd: &CommandSpec) -> io::Result<ProcessOutput>;
}

/// Runner backed by `std::process::Command`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, cmd: &CommandSpec) -> io::Result<ProcessOutput> {
        let output = Command::new(&cmd.program)
            .args(&cmd.args)
            .envs(cmd.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .output()?;
        Ok(ProcessOutput {
            code: output.status.code(),
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// A command that could not be started or exited non-zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessFailure {
    pub kind: ErrorKind,
    /// Raw diagnostic text from the tool (or the launch error).
    pub diagnostic: String,
}

impl fmt::Display for ProcessFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.diagnostic)
    }
}

impl std::error::Error for ProcessFailure {}

impl Classified for ProcessFailure {
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

/// Runs `cmd` and turns launch errors and non-zero exits into a classified [`ProcessFailure`].
pub fn run_checked(runner: &dyn ProcessRunner, cmd: &CommandSpec) -> Result<ProcessOutput, ProcessFailure> {
    let out = runner.run(cmd).map_err(|e| ProcessFailure {
        kind: ErrorKind::Permanent,
        diagnostic: format!("failed to start {}: {}", cmd.program, e),
    })?;
    if out.success {
        return Ok(out);
    }
    let kind = classify_output(&out);
    let mut diagnostic = out.combined();
    if diagnostic.is_empty() {
        diagnostic = match out.code {
            Some(code) => format!("{} exited with status {}", cmd.program, code),
            None => format!("{} terminated by signal", cmd.program),
        };
    }
    Err(ProcessFailure { kind, diagnostic })
}
