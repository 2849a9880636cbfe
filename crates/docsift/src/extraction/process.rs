//! External process execution.
//!
//! Conversions that shell out go through [`CommandRunner`], so the PDF path
//! can run against the real poppler tools or against a scripted runner in
//! tests.

use crate::{DocsiftError, Result};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::{Duration, timeout};

/// Captured result of one process run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit status was zero.
    pub success: bool,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl CommandOutput {
    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).trim().to_string()
    }

    /// A run counts as failed on a non-zero exit or on any stderr output.
    pub fn reported_errors(&self) -> bool {
        !self.success || !self.stderr_text().is_empty()
    }
}

/// Runs an external program with `stdin` piped in and both output streams
/// captured.
///
/// Implementations return `Err` only when the program could not be run at
/// all; a program that runs and fails is reported through [`CommandOutput`].
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, program: &str, args: &[String], stdin: &[u8]) -> Result<CommandOutput>;
}

/// [`CommandRunner`] backed by `tokio::process`.
#[derive(Debug, Clone)]
pub struct SystemCommandRunner {
    timeout: Duration,
}

impl SystemCommandRunner {
    pub fn new(timeout_secs: u64) -> Self {
        Self::with_timeout(Duration::from_secs(timeout_secs))
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for SystemCommandRunner {
    fn default() -> Self {
        Self::new(120)
    }
}

#[async_trait]
impl CommandRunner for SystemCommandRunner {
    async fn run(&self, program: &str, args: &[String], stdin: &[u8]) -> Result<CommandOutput> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => {
                    DocsiftError::MissingDependency(format!("'{}' not found in PATH: {}", program, e))
                }
                _ => DocsiftError::external_tool(program, format!("failed to start: {}", e)),
            })?;

        let writer = child.stdin.take().map(|mut pipe| {
            let input = stdin.to_vec();
            let program = program.to_string();
            tokio::spawn(async move {
                // The process may exit without draining its input.
                if let Err(e) = pipe.write_all(&input).await {
                    tracing::debug!("Writing stdin of '{}' stopped early: {}", program, e);
                }
            })
        });

        let output = match timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                if let Some(writer) = writer {
                    writer.abort();
                }
                return Err(DocsiftError::external_tool(program, format!("failed to wait: {}", e)));
            }
            Err(_) => {
                // Dropping the wait future kills the child.
                if let Some(writer) = writer {
                    writer.abort();
                }
                return Err(DocsiftError::external_tool(
                    program,
                    format!("timed out after {:?}", self.timeout),
                ));
            }
        };

        if let Some(writer) = writer {
            let _ = writer.await;
        }

        tracing::debug!(
            "'{}' exited with {} ({} bytes stdout, {} bytes stderr)",
            program,
            output.status,
            output.stdout.len(),
            output.stderr.len()
        );

        Ok(CommandOutput {
            success: output.status.success(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reported_errors() {
        let clean = CommandOutput {
            success: true,
            stdout: b"ok".to_vec(),
            stderr: b"  \n".to_vec(),
        };
        assert!(!clean.reported_errors());

        let noisy = CommandOutput {
            stderr: b"Syntax Error: broken xref".to_vec(),
            ..clean.clone()
        };
        assert!(noisy.reported_errors());
        assert_eq!(noisy.stderr_text(), "Syntax Error: broken xref");

        let failed = CommandOutput {
            success: false,
            ..clean
        };
        assert!(failed.reported_errors());
    }

    #[tokio::test]
    async fn test_missing_program_is_missing_dependency() {
        let runner = SystemCommandRunner::default();
        let result = runner.run("docsift-no-such-program", &[], b"").await;
        assert!(matches!(result, Err(DocsiftError::MissingDependency(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_stdin_is_piped_through() {
        let runner = SystemCommandRunner::default();
        let output = runner.run("cat", &[], b"hello from stdin").await.unwrap();
        assert!(output.success);
        assert_eq!(output.stdout, b"hello from stdin");
        assert!(!output.reported_errors());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failure_is_reported_in_output() {
        let runner = SystemCommandRunner::default();
        let args = vec!["-c".to_string(), "echo broken >&2; exit 3".to_string()];
        let output = runner.run("sh", &args, b"").await.unwrap();
        assert!(!output.success);
        assert_eq!(output.stderr_text(), "broken");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_kills_process() {
        let runner = SystemCommandRunner::with_timeout(Duration::from_millis(200));
        let args = vec!["5".to_string()];
        let result = runner.run("sleep", &args, b"").await;
        assert!(matches!(result, Err(DocsiftError::ExternalTool { .. })));
    }
}
