//! # LLDM Traits
//!
//! The text-completion seam behind the LLM dungeon master, plus a backend
//! that shells out to any command reading a prompt on stdin.

use crate::{WayfarerError, WayfarerResult};
use std::future::Future;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Anything that turns a prompt into text.
pub trait LldmBackend {
    /// Completes a prompt. `max_tokens` is a hint the backend may ignore.
    fn complete(
        &self,
        prompt: &str,
        max_tokens: Option<u32>,
    ) -> impl Future<Output = WayfarerResult<String>>;

    /// Returns the backend name for debugging.
    fn backend_name(&self) -> &'static str;
}

/// Runs an external program, writing the prompt to its stdin and reading the
/// completion from its stdout.
#[derive(Debug, Clone)]
pub struct CommandBackend {
    program: String,
    args: Vec<String>,
}

impl CommandBackend {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl LldmBackend for CommandBackend {
    async fn complete(&self, prompt: &str, max_tokens: Option<u32>) -> WayfarerResult<String> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(max_tokens) = max_tokens {
            command.env("WAYFARER_MAX_TOKENS", max_tokens.to_string());
        }

        let mut child = command.spawn().map_err(|err| {
            WayfarerError::LldmError(format!("failed to start '{}': {err}", self.program))
        })?;
        let stdin = child.stdin.take();
        let feed = async move {
            let Some(mut stdin) = stdin else {
                return Ok(());
            };
            match stdin.write_all(prompt.as_bytes()).await {
                // the child may answer without reading all of its input
                Err(err) if err.kind() == std::io::ErrorKind::BrokenPipe => Ok(()),
                Err(err) => Err(err),
                Ok(()) => stdin.shutdown().await,
            }
        };

        // stdout is drained while the prompt is written so neither pipe fills
        let (fed, output) = tokio::join!(feed, child.wait_with_output());
        let output = output?;
        fed?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(WayfarerError::LldmError(format!(
                "'{}' exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn backend_name(&self) -> &'static str {
        "Command"
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::Duration;

    fn shell(script: &str) -> CommandBackend {
        CommandBackend::new("sh", vec!["-c".to_string(), script.to_string()])
    }

    #[tokio::test]
    async fn test_prompt_is_piped_through() {
        let text = shell("cat").complete("hello there", None).await.unwrap();
        assert_eq!(text, "hello there");
    }

    #[tokio::test]
    async fn test_chatty_child_does_not_stall() {
        // writes far more than a pipe buffer before it reads any input
        let backend = shell("head -c 300000 /dev/zero | tr '\\0' x; cat > /dev/null");
        let prompt = "y".repeat(300_000);

        let text = tokio::time::timeout(Duration::from_secs(10), backend.complete(&prompt, None))
            .await
            .expect("completion stalled")
            .unwrap();
        assert_eq!(text.len(), 300_000);
    }

    #[tokio::test]
    async fn test_failing_command_is_an_lldm_error() {
        let result = shell("echo nope >&2; exit 3").complete("ignored", None).await;
        match result {
            Err(WayfarerError::LldmError(message)) => assert!(message.contains("nope")),
            other => panic!("expected LldmError, got {:?}", other),
        }
    }
}
