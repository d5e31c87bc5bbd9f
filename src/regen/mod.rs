//! Bounded invocation of the external regenerator.
//!
//! The regenerator is an opaque collaborator: `dashd` runs
//! `<regenerator> dashboard generate`, waits up to a deadline, and cares
//! only about how the run ended. Output is captured and discarded so a
//! chatty regenerator cannot interleave with server logs.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;

/// Subcommand the regenerator binary is invoked with.
const REGENERATE_ARGS: [&str; 2] = ["dashboard", "generate"];

/// How a bounded regenerator run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegenOutcome {
    /// The process ran to completion. `code` is `None` when it was killed
    /// by a signal.
    Completed { code: Option<i32> },
    /// The deadline expired and the process was killed without completing.
    TimedOut,
}

/// Errors launching or awaiting the regenerator process.
#[derive(Error, Debug)]
pub enum RegenError {
    #[error("failed to launch regenerator {program}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed waiting for regenerator: {source}")]
    Wait {
        #[source]
        source: std::io::Error,
    },
}

/// A collaborator that can rebuild the watched data files.
///
/// The gate depends on this seam rather than on a concrete process so the
/// coordination logic can be exercised with scripted outcomes.
#[async_trait]
pub trait Regenerate: Send + Sync {
    /// Run one regeneration attempt, bounded by the implementation's own
    /// deadline.
    async fn regenerate(&self) -> Result<RegenOutcome, RegenError>;
}

/// Production [`Regenerate`] implementation: spawns the regenerator binary
/// with the dashboard directory as its working directory.
pub struct CommandRegenerator {
    program: PathBuf,
    workdir: PathBuf,
    timeout: Duration,
}

impl CommandRegenerator {
    pub fn new(
        program: impl Into<PathBuf>,
        workdir: impl Into<PathBuf>,
        timeout: Duration,
    ) -> Self {
        Self {
            program: program.into(),
            workdir: workdir.into(),
            timeout,
        }
    }
}

#[async_trait]
impl Regenerate for CommandRegenerator {
    async fn regenerate(&self) -> Result<RegenOutcome, RegenError> {
        let child = Command::new(&self.program)
            .args(REGENERATE_ARGS)
            .current_dir(&self.workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // A timed-out run must not linger after its wait future is dropped
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| RegenError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => Ok(RegenOutcome::Completed {
                code: output.status.code(),
            }),
            Ok(Err(source)) => Err(RegenError::Wait { source }),
            // Dropping the wait future killed the child
            Err(_) => Ok(RegenOutcome::TimedOut),
        }
    }
}
