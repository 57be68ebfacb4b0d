//! Scripted stand-in for the external tools (resolver, encoder, ssh).
//!
//! Every invocation is recorded. By default the resolver prints a media URL
//! and the encoder writes its output file; tests override either step with
//! a closure that sees the command and the per-tool call number (1-based).

use clipfetch_core::process::{CommandSpec, ProcessOutput, ProcessRunner};
use std::io;
use std::path::Path;
use std::sync::Mutex;

pub const RESOLVER: &str = "youtube-dl";
pub const ENCODER: &str = "ffmpeg";
pub const SSH: &str = "ssh";

type Step = Box<dyn Fn(&CommandSpec, usize) -> ProcessOutput + Send + Sync>;

pub struct FakeTools {
    calls: Mutex<Vec<CommandSpec>>,
    resolve: Step,
    encode: Step,
}

pub fn ok(stdout: &str) -> ProcessOutput {
    ProcessOutput {
        code: Some(0),
        success: true,
        stdout: stdout.to_string(),
        stderr: String::new(),
    }
}

pub fn fail(stderr: &str) -> ProcessOutput {
    ProcessOutput {
        code: Some(1),
        success: false,
        stdout: String::new(),
        stderr: stderr.to_string(),
    }
}

pub const TOO_MANY_REQUESTS: &str = "ERROR: Unable to download webpage: HTTP Error 429: Too Many Requests";

/// Default encoder: create the output file (last argument).
pub fn write_output(cmd: &CommandSpec, _n: usize) -> ProcessOutput {
    let out = cmd.args.last().expect("encoder output path");
    std::fs::write(Path::new(out), b"mp4").expect("write fake clip");
    ok("")
}

impl FakeTools {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            resolve: Box::new(|cmd: &CommandSpec, _n: usize| ok(&format!("https://media.example/{}.mp4\n", cmd.args.last().unwrap()))),
            encode: Box::new(write_output),
        }
    }

    pub fn with_resolve(mut self, f: impl Fn(&CommandSpec, usize) -> ProcessOutput + Send + Sync + 'static) -> Self {
        self.resolve = Box::new(f);
        self
    }

    pub fn with_encode(mut self, f: impl Fn(&CommandSpec, usize) -> ProcessOutput + Send + Sync + 'static) -> Self {
        self.encode = Box::new(f);
        self
    }

    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, program: &str) -> Vec<CommandSpec> {
        self.calls().into_iter().filter(|c| c.program == program).collect()
    }

    /// Proxy passed to a resolver invocation (`--proxy <uri>`).
    pub fn proxy_of(cmd: &CommandSpec) -> String {
        let idx = cmd.args.iter().position(|a| a == "--proxy").expect("--proxy flag");
        cmd.args[idx + 1].clone()
    }
}

impl ProcessRunner for FakeTools {
    fn run(&self, cmd: &CommandSpec) -> io::Result<ProcessOutput> {
        let n = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(cmd.clone());
            calls.iter().filter(|c| c.program == cmd.program).count()
        };
        match cmd.program.as_str() {
            RESOLVER => Ok((self.resolve)(cmd, n)),
            ENCODER => Ok((self.encode)(cmd, n)),
            SSH => Ok(ok("")),
            other => Err(io::Error::new(io::ErrorKind::NotFound, format!("{}: not found", other))),
        }
    }
}
