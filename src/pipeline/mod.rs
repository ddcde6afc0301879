// src/pipeline/mod.rs

//! The pipeline engine.
//!
//! A run is a linear state machine over a fixed sequence of typed stages:
//!
//! `Init → MeasureInput → Convert → ExtractContour → ValidateContour →
//! TransformBackground → BuildEstimationCommand → RunEstimation →
//! RenderFigure → Done`
//!
//! with an absorbing `Failed` state reachable from any of them. Each stage
//! either runs one external tool through a [`StepExecutor`], checks a
//! postcondition, or builds a command; the first failure ends the run.
//!
//! - [`files`] names the fixed files of a working directory.
//! - [`commands`] builds each stage's command spec.
//! - [`command_log`] records what was built and run.
//! - [`controller`] drives the stages.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::ToolsConfig;
use crate::errors::PipelineError;
use crate::exec::{RealExecutor, StepExecutor};
use crate::types::{Dimensions, Parameters};

pub mod command_log;
pub mod commands;
pub mod controller;
pub mod files;

pub use command_log::CommandLog;
pub use commands::{extraction_args, CommandBuilder};
pub use controller::PipelineController;
pub use files::WorkFiles;

/// One state of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Init,
    MeasureInput,
    Convert,
    ExtractContour,
    ValidateContour,
    TransformBackground,
    BuildEstimationCommand,
    RunEstimation,
    RenderFigure,
    Done,
}

impl Stage {
    /// Every stage in execution order.
    pub const SEQUENCE: [Stage; 10] = [
        Stage::Init,
        Stage::MeasureInput,
        Stage::Convert,
        Stage::ExtractContour,
        Stage::ValidateContour,
        Stage::TransformBackground,
        Stage::BuildEstimationCommand,
        Stage::RunEstimation,
        Stage::RenderFigure,
        Stage::Done,
    ];

    /// The stage that follows this one on success, `None` after `Done`.
    pub fn next(self) -> Option<Stage> {
        let idx = Self::SEQUENCE.iter().position(|&s| s == self)?;
        Self::SEQUENCE.get(idx + 1).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Init => "init",
            Stage::MeasureInput => "measure-input",
            Stage::Convert => "convert",
            Stage::ExtractContour => "extract-contour",
            Stage::ValidateContour => "validate-contour",
            Stage::TransformBackground => "transform-background",
            Stage::BuildEstimationCommand => "build-estimation-command",
            Stage::RunEstimation => "run-estimation",
            Stage::RenderFigure => "render-figure",
            Stage::Done => "done",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classified failure, as kept in [`PipelineState::Failed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Validation,
    EmptyResult,
    Timeout,
    Runtime,
}

impl From<&PipelineError> for FailureKind {
    fn from(err: &PipelineError) -> Self {
        match err {
            PipelineError::Validation(_) => FailureKind::Validation,
            PipelineError::EmptyResult { .. } => FailureKind::EmptyResult,
            PipelineError::Timeout { .. } => FailureKind::Timeout,
            PipelineError::Runtime { .. } => FailureKind::Runtime,
        }
    }
}

/// Where the controller currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Running(Stage),
    Done,
    Failed { stage: Stage, kind: FailureKind },
}

/// Summary of one executed tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepRecord {
    pub stage: Stage,
    pub command: String,
    pub exit_code: Option<i32>,
    pub elapsed: Duration,
    pub produced_files: Vec<PathBuf>,
}

/// What a successful run hands back to its caller.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub files: WorkFiles,
    pub input_dimensions: Dimensions,
    pub steps: Vec<StepRecord>,
    pub commands: Vec<String>,
}

impl RunReport {
    pub fn total_elapsed(&self) -> Duration {
        self.steps.iter().map(|s| s.elapsed).sum()
    }
}

/// Run the whole pipeline once in `work_dir` with the real process executor.
pub async fn run_pipeline(
    work_dir: impl Into<PathBuf>,
    params: &Parameters,
    tools: &ToolsConfig,
) -> Result<RunReport, PipelineError> {
    run_pipeline_with(RealExecutor::default(), work_dir, params, tools).await
}

/// Same as [`run_pipeline`] but with a caller-supplied executor.
pub async fn run_pipeline_with<E: StepExecutor>(
    executor: E,
    work_dir: impl Into<PathBuf>,
    params: &Parameters,
    tools: &ToolsConfig,
) -> Result<RunReport, PipelineError> {
    let mut controller = PipelineController::new(executor, tools.clone(), work_dir, *params);
    controller.run().await
}
