// src/exec/mod.rs

//! Process execution layer.
//!
//! This module is responsible for actually running the external tools, using
//! `tokio::process::Command`, and reporting back how each one ended.
//!
//! - [`spec`] holds the immutable [`CommandSpec`] (program, argv, stream
//!   bindings, env overrides) and its command-line rendering.
//! - [`runner`] launches a spec as a child process without blocking.
//! - [`supervisor`] waits for the child against a deadline and kills it when
//!   the deadline elapses.
//! - [`backend`] provides the `StepExecutor` trait and a concrete
//!   `RealExecutor` that the pipeline uses in production, and which tests can
//!   replace with a fake implementation.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub mod backend;
pub mod runner;
pub mod spec;
pub mod supervisor;

pub use backend::{RealExecutor, StepExecutor, StepResult};
pub use runner::{launch, ProcessHandle};
pub use spec::{shell_quote, CommandSpec, StreamBinding};
pub use supervisor::{await_exit, Completed};

/// Failures of a single external invocation.
#[derive(Error, Debug)]
pub enum ExecError {
    #[error("failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot open {} for '{program}': {source}", path.display())]
    Stream {
        program: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("waiting for '{program}' failed: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{program}' exceeded its {after:?} deadline")]
    Timeout { program: String, after: Duration },
}

impl ExecError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ExecError::Timeout { .. })
    }
}
