use std::process::{Command, Stdio};
use std::time::Duration;

use crate::cancel::CancelToken;
use crate::error::TaskError;
use crate::task::{ScanResult, Task, TaskId};

/// How often the running defragmenter is checked for exit or abort.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Consolidates the system volume with the host defragmenter.
///
/// There is no byte estimate for this: Analyze reports zero with a note,
/// Execute reports zero plus a completion note.
pub struct Defrag {
    volume: String,
    program: String,
    args: Vec<String>,
}

impl Defrag {
    pub fn new(volume: impl Into<String>) -> Self {
        let volume = volume.into();
        let args = vec![volume.clone(), "/U".to_string(), "/V".to_string()];
        Self {
            volume,
            program: "defrag".to_string(),
            args,
        }
    }

    /// Run a different program in place of the defragmenter.
    pub fn with_command(mut self, program: impl Into<String>, args: Vec<String>) -> Self {
        self.program = program.into();
        self.args = args;
        self
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            const CREATE_NO_WINDOW: u32 = 0x0800_0000;
            cmd.creation_flags(CREATE_NO_WINDOW);
        }
        cmd
    }

    fn command_error(&self, reason: impl Into<String>) -> TaskError {
        TaskError::Command {
            program: self.program.clone(),
            reason: reason.into(),
        }
    }
}

impl Task for Defrag {
    fn id(&self) -> TaskId {
        TaskId::Defrag
    }

    fn discover(&self, _cancel: &CancelToken) -> Result<ScanResult, TaskError> {
        Ok(ScanResult::default().with_note(format!(
            "no byte estimate for defragmentation; run without --analyze to defragment {}",
            self.volume
        )))
    }

    fn reclaim(&self, cancel: &CancelToken) -> Result<ScanResult, TaskError> {
        if cancel.is_cancelled() {
            return Err(TaskError::Cancelled);
        }

        tracing::info!(volume = %self.volume, "starting defragmentation, this may take a while");
        let mut child = self
            .command()
            .spawn()
            .map_err(|e| self.command_error(e.to_string()))?;

        loop {
            if cancel.is_cancelled() {
                tracing::warn!(volume = %self.volume, "aborting defragmentation");
                if let Err(e) = child.kill() {
                    tracing::debug!("defragmenter already gone: {e}");
                }
                if let Err(e) = child.wait() {
                    tracing::debug!("cannot reap defragmenter: {e}");
                }
                let mut result = ScanResult::default()
                    .with_note(format!("defragmentation of {} aborted", self.volume));
                result.interrupted = true;
                return Ok(result);
            }

            match child.try_wait() {
                Ok(Some(status)) if status.success() => {
                    return Ok(ScanResult::default()
                        .with_note(format!("defragmentation of {} completed", self.volume)));
                }
                Ok(Some(status)) => {
                    return Err(self.command_error(format!(
                        "exited with {status} (try running as Administrator)"
                    )));
                }
                Ok(None) => std::thread::sleep(POLL_INTERVAL),
                Err(e) => return Err(self.command_error(e.to_string())),
            }
        }
    }
}
