// Mon Oct 19 2026 - Alex

use std::io::Write;
use std::process::{Command, Stdio};
use std::thread;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Empty command line")]
    EmptyCommand,
    #[error("Failed to spawn {0}: {1}")]
    Spawn(String, std::io::Error),
    #[error("IO error talking to {0}: {1}")]
    Pipe(String, std::io::Error),
    #[error("{0} exited with {1}")]
    Failed(String, std::process::ExitStatus),
}

pub struct ProcessUtils;

impl ProcessUtils {
    /// Feeds `input` to the command's stdin, waits for it and returns stdout split into lines.
    ///
    /// No timeout: a hung tool hangs the caller.
    pub fn run_batch(command: &[String], input: &str) -> Result<Vec<String>, ProcessError> {
        let (program, args) = command.split_first().ok_or(ProcessError::EmptyCommand)?;

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| ProcessError::Spawn(program.clone(), e))?;

        // Fed from its own thread; the child can fill stdout before draining stdin.
        let writer = child.stdin.take().map(|mut stdin| {
            let input = input.to_string();
            let program = program.clone();
            thread::spawn(move || {
                // The child may exit before reading everything; its status tells us more than EPIPE.
                if let Err(e) = stdin.write_all(input.as_bytes()) {
                    log::debug!("writing to {} failed: {}", program, e);
                }
            })
        });

        let output = child
            .wait_with_output()
            .map_err(|e| ProcessError::Pipe(program.clone(), e))?;

        if let Some(handle) = writer {
            let _ = handle.join();
        }

        if !output.status.success() {
            return Err(ProcessError::Failed(program.clone(), output.status));
        }

        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(|line| line.to_string())
            .collect())
    }
}
