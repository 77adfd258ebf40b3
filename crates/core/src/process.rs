//! Launching external commands.
//!
//! Every invocation runs without a console window, with stdin closed and with
//! the working directory fixed to the system directory. A non-zero exit code
//! is not an error here: callers decide what the returned text means. Only a
//! process that cannot be started or awaited is an error.

use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};

use async_trait::async_trait;
use log::debug;
use tokio::process::Command;

use crate::config::NO_OUTPUT_PLACEHOLDER;
use crate::encoding::ConsoleEncoding;
use crate::error::{Error, Result};

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Combined, decoded output of a finished process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessResult {
    /// Trimmed stdout and stderr, never empty.
    pub output: String,
    pub exit_code: i32,
}

impl ProcessResult {
    /// Builds a result from raw decoded streams.
    ///
    /// The streams are joined with a line break and trimmed; whitespace-only
    /// output becomes [`NO_OUTPUT_PLACEHOLDER`].
    pub fn from_streams(stdout: &str, stderr: &str, exit_code: i32) -> Self {
        let combined = format!("{stdout}\r\n{stderr}");
        let trimmed = combined.trim();

        let output = if trimmed.is_empty() {
            NO_OUTPUT_PLACEHOLDER.to_string()
        } else {
            trimmed.to_string()
        };

        Self { output, exit_code }
    }

    /// Non-empty output lines, with trailing whitespace removed.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        split_lines(&self.output)
    }
}

/// Splits on `\r\n`, `\r` or `\n`, trimming line ends and dropping blank lines.
pub fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split(['\r', '\n'])
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
}

/// Starts external commands on behalf of the actions.
#[async_trait]
pub trait ProcessInvoker: Send + Sync {
    /// Runs the command to completion and returns its combined output.
    ///
    /// # Errors
    ///
    /// Returns an invocation fault if the process cannot be started or awaited.
    async fn invoke_capture(&self, command: &str, args: &str) -> Result<ProcessResult>;

    /// Runs the command to completion, discarding its output.
    ///
    /// # Errors
    ///
    /// Returns an invocation fault if the process cannot be started or awaited.
    async fn invoke_fire_and_forget(&self, command: &str, args: &str) -> Result<i32>;

    /// Starts the command and returns without waiting for it.
    ///
    /// # Errors
    ///
    /// Returns an invocation fault if the process cannot be started.
    async fn spawn_detached(&self, command: &str, args: &str) -> Result<()>;
}

/// Launches real OS processes.
#[derive(Debug, Clone)]
pub struct SystemInvoker {
    working_directory: PathBuf,
    encoding: ConsoleEncoding,
}

impl SystemInvoker {
    pub fn new(working_directory: PathBuf) -> Self {
        Self {
            working_directory,
            encoding: ConsoleEncoding::preferred(),
        }
    }

    fn build_command(&self, command: &str, args: &str) -> Command {
        debug!(
            "Launching `{} {}` in `{}`",
            command,
            args,
            self.working_directory.display()
        );

        let mut process = Command::new(command);
        append_arguments(&mut process, args);
        process
            .current_dir(&self.working_directory)
            .stdin(Stdio::null());

        #[cfg(windows)]
        process.creation_flags(CREATE_NO_WINDOW);

        process
    }
}

#[cfg(windows)]
fn append_arguments(process: &mut Command, args: &str) {
    if !args.is_empty() {
        process.raw_arg(args);
    }
}

#[cfg(not(windows))]
fn append_arguments(process: &mut Command, args: &str) {
    process.args(args.split_whitespace());
}

fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}

#[async_trait]
impl ProcessInvoker for SystemInvoker {
    async fn invoke_capture(&self, command: &str, args: &str) -> Result<ProcessResult> {
        let child = self
            .build_command(command, args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::launch(command, e))?;

        // Reads both pipes concurrently, so a chatty stderr cannot stall stdout.
        let output = child
            .wait_with_output()
            .await
            .map_err(|e| Error::wait(command, e))?;

        let stdout = self.encoding.decode(&output.stdout);
        let stderr = self.encoding.decode(&output.stderr);
        let result = ProcessResult::from_streams(&stdout, &stderr, exit_code(output.status));
        debug!("`{}` exited with code {}", command, result.exit_code);

        Ok(result)
    }

    async fn invoke_fire_and_forget(&self, command: &str, args: &str) -> Result<i32> {
        let mut child = self
            .build_command(command, args)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| Error::launch(command, e))?;

        let status = child.wait().await.map_err(|e| Error::wait(command, e))?;
        debug!("`{}` exited with code {}", command, exit_code(status));

        Ok(exit_code(status))
    }

    async fn spawn_detached(&self, command: &str, args: &str) -> Result<()> {
        let child = self
            .build_command(command, args)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| Error::launch(command, e))?;

        debug!("Detached `{}` as pid {:?}", command, child.id());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_streams_joins_and_trims() {
        let result = ProcessResult::from_streams("  hello\r\n", "warning\n", 0);
        assert_eq!(result.output, "hello\r\n\r\nwarning");
        assert_eq!(result.exit_code, 0);
    }

    #[test]
    fn test_from_streams_empty_is_placeholder() {
        let result = ProcessResult::from_streams("", "", 1);
        assert_eq!(result.output, NO_OUTPUT_PLACEHOLDER);
        assert_eq!(result.exit_code, 1);
    }

    #[test]
    fn test_from_streams_whitespace_is_placeholder() {
        let result = ProcessResult::from_streams(" \r\n\t", "\n \n", 0);
        assert_eq!(result.output, NO_OUTPUT_PLACEHOLDER);
    }

    #[test]
    fn test_split_lines_handles_every_line_ending() {
        let lines: Vec<&str> = split_lines("one\r\ntwo\rthree\n\n  \nfour   ").collect();
        assert_eq!(lines, vec!["one", "two", "three", "four"]);
    }

    #[test]
    fn test_lines_skip_blank_output_lines() {
        let result = ProcessResult::from_streams("Windows IP Configuration\r\n\r\n", "", 0);
        let lines: Vec<&str> = result.lines().collect();
        assert_eq!(lines, vec!["Windows IP Configuration"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_invoke_capture_without_output_returns_placeholder() {
        let invoker = SystemInvoker::new(std::env::temp_dir());
        let result = invoker.invoke_capture("true", "").await.unwrap();
        assert_eq!(result.output, NO_OUTPUT_PLACEHOLDER);
        assert_eq!(result.exit_code, 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_invoke_capture_collects_stdout() {
        let invoker = SystemInvoker::new(std::env::temp_dir());
        let result = invoker.invoke_capture("echo", "flushed  cache").await.unwrap();
        assert_eq!(result.output, "flushed cache");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_is_not_an_error() {
        let invoker = SystemInvoker::new(std::env::temp_dir());
        let result = invoker.invoke_capture("false", "").await.unwrap();
        assert_eq!(result.exit_code, 1);

        let code = invoker.invoke_fire_and_forget("false", "").await.unwrap();
        assert_eq!(code, 1);
    }

    #[tokio::test]
    async fn test_missing_program_is_invocation_fault() {
        let invoker = SystemInvoker::new(std::env::temp_dir());

        let error = invoker
            .invoke_capture("nhx-kit-no-such-program", "/all")
            .await
            .unwrap_err();
        assert!(error.is_invocation_fault());

        let error = invoker
            .invoke_fire_and_forget("nhx-kit-no-such-program", "")
            .await
            .unwrap_err();
        assert!(error.is_invocation_fault());

        let error = invoker
            .spawn_detached("nhx-kit-no-such-program", "")
            .await
            .unwrap_err();
        assert!(error.is_invocation_fault());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_missing_working_directory_is_invocation_fault() {
        let invoker = SystemInvoker::new(PathBuf::from("/nhx-kit/no/such/System32"));
        let error = invoker.invoke_capture("true", "").await.unwrap_err();
        assert!(matches!(error, Error::Launch { .. }));
    }
}
