//! Content auditors.
//!
//! The real image-content auditor is a third-party service; the CLI reaches it
//! through an external command so any vendor client can be plugged in.

use super::{AuditError, AuditVerdict, ContentAuditor};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Runs `program [args..] <task label>` with the JPEG on stdin and expects
/// `{"flagged": bool, "reason": "..."}` on stdout.
pub struct CommandAuditor {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandAuditor {
    /// `command_line` is split on whitespace: the first word is the program.
    pub fn from_command_line(command_line: &str, timeout: Duration) -> Option<Self> {
        let mut words = command_line.split_whitespace().map(str::to_string);
        let program = words.next()?;
        Some(Self {
            program,
            args: words.collect(),
            timeout,
        })
    }

    async fn run(&self, jpeg: &[u8], task_label: &str) -> Result<AuditVerdict, AuditError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(task_label)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| AuditError::Unreachable(format!("{}: {}", self.program, e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(jpeg)
                .await
                .map_err(|e| AuditError::Unreachable(e.to_string()))?;
            // Closing stdin signals end of image.
            drop(stdin);
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| AuditError::Unreachable(e.to_string()))?;

        if !output.status.success() {
            return Err(AuditError::Unreachable(format!(
                "{} exited with {}",
                self.program, output.status
            )));
        }

        serde_json::from_slice::<AuditVerdict>(&output.stdout)
            .map_err(|e| AuditError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl ContentAuditor for CommandAuditor {
    async fn audit(&self, jpeg: &[u8], task_label: &str) -> Result<AuditVerdict, AuditError> {
        match tokio::time::timeout(self.timeout, self.run(jpeg, task_label)).await {
            Ok(res) => res,
            Err(_) => Err(AuditError::Timeout),
        }
    }
}

/// Used when no auditor is configured: every photo passes.
#[derive(Debug, Default)]
pub struct NoopAuditor;

#[async_trait]
impl ContentAuditor for NoopAuditor {
    async fn audit(&self, _jpeg: &[u8], _task_label: &str) -> Result<AuditVerdict, AuditError> {
        Ok(AuditVerdict {
            flagged: false,
            reason: "no auditor configured".to_string(),
        })
    }
}
