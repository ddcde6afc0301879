// src/exec/backend.rs

//! Pluggable step executor abstraction.
//!
//! The pipeline controller talks to a `StepExecutor` instead of calling the
//! runner and supervisor directly. This makes it easy to swap in a fake
//! executor in tests (failure injection, recorded invocations) while keeping
//! the production path in [`runner`](super::runner) and
//! [`supervisor`](super::supervisor).

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::time::Duration;

use super::spec::CommandSpec;
use super::{await_exit, launch, ExecError};

/// Default SIGTERM → SIGKILL grace period.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(2);

/// How one step's process ended. Consumed immediately by the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepResult {
    /// Exit code, `None` when the process was ended by a signal.
    pub exit_code: Option<i32>,
    pub elapsed: Duration,
    /// Files written through stdout/stderr bindings that exist afterwards.
    pub produced_files: Vec<PathBuf>,
}

impl StepResult {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Trait abstracting how one pipeline step's command is executed.
///
/// Production code uses [`RealExecutor`]; tests can provide their own
/// implementation that doesn't spawn real processes.
pub trait StepExecutor: Send {
    /// Run `spec` to completion or until `deadline` elapses.
    fn execute<'a>(
        &'a mut self,
        spec: &'a CommandSpec,
        deadline: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<StepResult, ExecError>> + Send + 'a>>;
}

/// Real executor: launch + supervise.
#[derive(Debug, Clone)]
pub struct RealExecutor {
    grace: Duration,
}

impl RealExecutor {
    pub fn new(grace: Duration) -> Self {
        Self { grace }
    }
}

impl Default for RealExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_GRACE_PERIOD)
    }
}

impl StepExecutor for RealExecutor {
    fn execute<'a>(
        &'a mut self,
        spec: &'a CommandSpec,
        deadline: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<StepResult, ExecError>> + Send + 'a>> {
        let grace = self.grace;

        Box::pin(async move {
            let handle = launch(spec)?;
            let completed = await_exit(handle, deadline, grace).await?;

            let produced_files = spec
                .output_paths()
                .into_iter()
                .filter(|p| p.is_file())
                .collect();

            Ok(StepResult {
                exit_code: completed.status.code(),
                elapsed: completed.elapsed,
                produced_files,
            })
        })
    }
}
