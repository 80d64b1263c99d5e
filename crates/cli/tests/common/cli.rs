//! CLI command execution helpers with automatic timing
//!
//! Wraps the `ht` binary built for this test run.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

/// CLI command builder with timing
pub struct HtCommand {
    binary_path: PathBuf,
    working_dir: PathBuf,
    args: Vec<String>,
    env: HashMap<String, String>,
    stdin_data: Option<String>,
}

impl HtCommand {
    /// Create a new command in the given working directory
    pub fn new(working_dir: impl AsRef<Path>) -> Self {
        let mut env = HashMap::new();
        // Keep log lines out of the way of assertions
        env.insert("RUST_LOG".to_string(), "warn".to_string());
        Self {
            binary_path: PathBuf::from(env!("CARGO_BIN_EXE_ht")),
            working_dir: working_dir.as_ref().to_path_buf(),
            args: Vec::new(),
            env,
            stdin_data: None,
        }
    }

    pub fn args(&mut self, args: &[&str]) -> &mut Self {
        self.args.extend(args.iter().map(|s| s.to_string()));
        self
    }

    /// Provide stdin data
    pub fn stdin(&mut self, data: &str) -> &mut Self {
        self.stdin_data = Some(data.to_string());
        self
    }

    /// Execute command and return result with timing
    pub fn execute(&self) -> Result<CommandResult> {
        let start = Instant::now();

        let mut command = Command::new(&self.binary_path);
        command
            .args(&self.args)
            .current_dir(&self.working_dir)
            .envs(&self.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = command.spawn().context("Failed to spawn ht")?;
        if let Some(mut stdin) = child.stdin.take() {
            if let Some(data) = &self.stdin_data {
                stdin.write_all(data.as_bytes())?;
            }
            // Dropping stdin closes it so the shell sees end of input
        }
        let output = child.wait_with_output().context("Failed to wait for ht")?;

        Ok(CommandResult {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code().unwrap_or(-1),
            duration: start.elapsed(),
        })
    }

    /// Execute and assert success
    pub fn assert_success(&self) -> Result<CommandResult> {
        let result = self.execute()?;
        if !result.success() {
            anyhow::bail!(
                "Command failed (exit code: {}):\nArgs: {:?}\nStdout: {}\nStderr: {}",
                result.exit_code,
                self.args,
                result.stdout,
                result.stderr
            );
        }
        Ok(result)
    }

    /// Execute and expect failure
    pub fn assert_failure(&self) -> Result<CommandResult> {
        let result = self.execute()?;
        if result.success() {
            anyhow::bail!(
                "Command should have failed but succeeded:\nArgs: {:?}\nStdout: {}",
                self.args,
                result.stdout
            );
        }
        Ok(result)
    }
}

/// Command execution result with timing
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub duration: Duration,
}

impl CommandResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    pub fn contains_stdout(&self, text: &str) -> bool {
        self.stdout.contains(text)
    }

    pub fn contains_stderr(&self, text: &str) -> bool {
        self.stderr.contains(text)
    }

    /// The hint printed on the last tree line naming `name`
    pub fn hint_for(&self, name: &str) -> Option<String> {
        self.stdout
            .lines()
            .rev()
            .filter(|line| !line.starts_with("open "))
            .find(|line| line.trim_end().ends_with(name))
            .and_then(|line| {
                line.trim_start_matches(|c: char| c == '>' || c.is_whitespace())
                    .split_whitespace()
                    .next()
            })
            .map(str::to_string)
    }
}

/// Macro for convenient command construction
///
/// Usage:
/// ```ignore
/// ht!(dir, "tree", "--depth", "1").assert_success()?;
/// ht!(dir, "shell", "--no-watch").stdin("t a\nq\n").assert_success()?;
/// ```
#[macro_export]
macro_rules! ht {
    ($dir:expr, $($arg:expr),*) => {{
        let mut cmd = $crate::common::cli::HtCommand::new($dir);
        cmd.args(&[$($arg),*]);
        cmd
    }};
}
