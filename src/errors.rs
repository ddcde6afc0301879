// src/errors.rs

//! Crate-wide error types.
//!
//! - [`PipelineError`] is the classified outcome of a failed run. The caller
//!   maps each kind to its own user-visible message via [`PipelineError::code`]
//!   and [`PipelineError::user_message`].
//! - [`ScalepipeError`] wraps everything the CLI can hit (config, IO, TOML)
//!   on top of pipeline failures.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::pipeline::Stage;

#[derive(Error, Debug)]
pub enum PipelineError {
    /// Missing or non-numeric parameters; detected before anything runs.
    #[error("invalid parameters: {0}")]
    Validation(String),

    /// The extractor exited cleanly but wrote no contour.
    #[error("no contour extracted into {}", contour.display())]
    EmptyResult { contour: PathBuf },

    #[error("step {step} timed out after {after:?}")]
    Timeout { step: Stage, after: Duration },

    #[error("step {step} failed: {reason}")]
    Runtime { step: Stage, reason: String },
}

impl PipelineError {
    /// Short error code for the request layer.
    pub fn code(&self) -> &'static str {
        match self {
            PipelineError::Validation(_) | PipelineError::EmptyResult { .. } => "badparams",
            PipelineError::Timeout { .. } => "timeout",
            PipelineError::Runtime { .. } => "runtime",
        }
    }

    /// Message meant for the person who submitted the image.
    pub fn user_message(&self) -> String {
        match self {
            PipelineError::Validation(msg) => format!("The parameters must be numeric ({msg})."),
            PipelineError::EmptyResult { .. } => {
                "The parameters given produce no contours, please change them.".to_string()
            }
            PipelineError::Timeout { .. } => {
                "The algorithm took too long; try a smaller image or simpler parameters."
                    .to_string()
            }
            PipelineError::Runtime { .. } => "The algorithm execution failed.".to_string(),
        }
    }

    /// True when the caller can fix the failure by changing its input.
    pub fn is_parameter_error(&self) -> bool {
        self.code() == "badparams"
    }
}

#[derive(Error, Debug)]
pub enum ScalepipeError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, ScalepipeError>;
