//! Shared test double for the regenerator seam.

// Not every test binary uses every helper
#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use dashd::regen::{RegenError, RegenOutcome, Regenerate};
use tokio::sync::Notify;

/// What a scripted run should report.
#[derive(Clone, Copy)]
pub enum Script {
    Succeed,
    Exit(i32),
    Timeout,
    LaunchFail,
}

/// Scripted regenerator: counts invocations, returns a fixed outcome, and
/// can hold each run open until released.
pub struct ScriptedRegen {
    script: Script,
    runs: Arc<AtomicUsize>,
    hold: Option<Arc<Notify>>,
}

impl ScriptedRegen {
    pub fn new(script: Script) -> (Self, Arc<AtomicUsize>) {
        let runs = Arc::new(AtomicUsize::new(0));
        (
            Self {
                script,
                runs: runs.clone(),
                hold: None,
            },
            runs,
        )
    }

    /// Like [`new`](Self::new), but every run blocks until the returned
    /// handle is notified.
    pub fn held(script: Script) -> (Self, Arc<AtomicUsize>, Arc<Notify>) {
        let (mut regen, runs) = Self::new(script);
        let release = Arc::new(Notify::new());
        regen.hold = Some(release.clone());
        (regen, runs, release)
    }
}

#[async_trait]
impl Regenerate for ScriptedRegen {
    async fn regenerate(&self) -> Result<RegenOutcome, RegenError> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        if let Some(hold) = &self.hold {
            hold.notified().await;
        }
        match self.script {
            Script::Succeed => Ok(RegenOutcome::Completed { code: Some(0) }),
            Script::Exit(code) => Ok(RegenOutcome::Completed { code: Some(code) }),
            Script::Timeout => Ok(RegenOutcome::TimedOut),
            Script::LaunchFail => Err(RegenError::Spawn {
                program: "regenerator".into(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
            }),
        }
    }
}
