// src/pipeline/controller.rs

//! Pipeline controller: drives the stages in order and classifies failures.

use std::fs;
use std::path::PathBuf;

use tracing::{debug, error, info};

use crate::config::ToolsConfig;
use crate::errors::PipelineError;
use crate::exec::{CommandSpec, ExecError, StepExecutor};
use crate::raster::read_dimensions;
use crate::types::{Dimensions, Parameters};

use super::command_log::CommandLog;
use super::commands::CommandBuilder;
use super::files::WorkFiles;
use super::{FailureKind, PipelineState, RunReport, Stage, StepRecord};

/// Owns one run: its parameters, working directory, command log and state.
///
/// The controller never retries and never skips: the first failing stage
/// moves it to `Failed` and ends the run.
pub struct PipelineController<E: StepExecutor> {
    executor: E,
    tools: ToolsConfig,
    files: WorkFiles,
    params: Parameters,
    state: PipelineState,
    visited: Vec<Stage>,
    log: CommandLog,
    steps: Vec<StepRecord>,
    input_dimensions: Option<Dimensions>,
    estimation: Option<CommandSpec>,
}

impl<E: StepExecutor> PipelineController<E> {
    pub fn new(
        executor: E,
        tools: ToolsConfig,
        work_dir: impl Into<PathBuf>,
        params: Parameters,
    ) -> Self {
        Self {
            executor,
            tools,
            files: WorkFiles::new(work_dir),
            params,
            state: PipelineState::Running(Stage::Init),
            visited: vec![Stage::Init],
            log: CommandLog::new(),
            steps: Vec::new(),
            input_dimensions: None,
            estimation: None,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Stages entered so far, in order, starting with `Init`.
    pub fn visited(&self) -> &[Stage] {
        &self.visited
    }

    pub fn command_log(&self) -> &CommandLog {
        &self.log
    }

    pub fn files(&self) -> &WorkFiles {
        &self.files
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Run every stage from the current one to `Done`.
    pub async fn run(&mut self) -> Result<RunReport, PipelineError> {
        let PipelineState::Running(mut stage) = self.state else {
            return Err(PipelineError::Runtime {
                step: Stage::Init,
                reason: "pipeline already finished".to_string(),
            });
        };

        info!(
            work_dir = %self.files.root().display(),
            mode = ?self.params.mode(),
            threshold = self.params.threshold(),
            min_contour_size = self.params.min_contour_size(),
            timeout_ms = self.params.timeout().as_millis() as u64,
            "pipeline run starting"
        );

        while let Some(next) = stage.next() {
            stage = next;
            self.state = PipelineState::Running(stage);
            self.visited.push(stage);
            debug!(%stage, "entering stage");

            if let Err(err) = self.execute(stage).await {
                self.state = PipelineState::Failed {
                    stage,
                    kind: FailureKind::from(&err),
                };
                error!(%stage, code = err.code(), error = %err, "pipeline run failed");
                return Err(err);
            }
        }

        self.state = PipelineState::Done;
        let input_dimensions = self.input_dimensions.ok_or_else(|| PipelineError::Runtime {
            step: Stage::Done,
            reason: "input dimensions were never measured".to_string(),
        })?;
        let report = RunReport {
            files: self.files.clone(),
            input_dimensions,
            steps: self.steps.clone(),
            commands: self.log.entries().to_vec(),
        };
        info!(
            work_dir = %self.files.root().display(),
            steps = report.steps.len(),
            elapsed_ms = report.total_elapsed().as_millis() as u64,
            "pipeline run finished"
        );
        Ok(report)
    }

    async fn execute(&mut self, stage: Stage) -> Result<(), PipelineError> {
        match stage {
            Stage::Init => Ok(()),
            Stage::MeasureInput => {
                let input = self.files.input();
                let dims = read_dimensions(&input).map_err(|e| runtime(stage, format!("{e:#}")))?;
                debug!(%dims, "measured input");
                self.input_dimensions = Some(dims);
                Ok(())
            }
            Stage::Convert => {
                let spec = self.builder().convert();
                self.run_logged(stage, spec).await?;
                self.require_output(stage, self.files.converted())
            }
            Stage::ExtractContour => {
                let spec = self.builder().extract(&self.params);
                self.run_logged(stage, spec).await
            }
            Stage::ValidateContour => {
                let contour = self.files.contour();
                let size = fs::metadata(&contour)
                    .map_err(|e| runtime(stage, format!("{}: {e}", contour.display())))?
                    .len();
                if size == 0 {
                    return Err(PipelineError::EmptyResult { contour });
                }
                debug!(bytes = size, "contour extracted");
                Ok(())
            }
            Stage::TransformBackground => {
                let spec = self.builder().background();
                self.run_logged(stage, spec).await?;
                self.require_output(stage, self.files.background())
            }
            Stage::BuildEstimationCommand => {
                let background = self.files.background();
                let backdrop =
                    read_dimensions(&background).map_err(|e| runtime(stage, format!("{e:#}")))?;
                let spec = self.builder().estimation(backdrop);
                self.log.record(&spec);
                self.estimation = Some(spec);
                Ok(())
            }
            Stage::RunEstimation => {
                let spec = self
                    .estimation
                    .take()
                    .ok_or_else(|| runtime(stage, "estimation command was not built"))?;
                self.run_step(stage, &spec).await?;
                self.require_output(stage, self.files.figure())
            }
            Stage::RenderFigure => {
                let spec = self.builder().render();
                self.run_logged(stage, spec).await?;
                self.require_output(stage, self.files.rendered())
            }
            Stage::Done => {
                let path = self.files.command_log();
                self.log
                    .write_to(&path)
                    .map_err(|e| runtime(stage, format!("writing {}: {e}", path.display())))
            }
        }
    }

    fn builder(&self) -> CommandBuilder<'_> {
        CommandBuilder::new(&self.tools, &self.files)
    }

    /// Record `spec` in the command log, then execute exactly that spec.
    async fn run_logged(&mut self, stage: Stage, spec: CommandSpec) -> Result<(), PipelineError> {
        self.log.record(&spec);
        self.run_step(stage, &spec).await
    }

    async fn run_step(&mut self, stage: Stage, spec: &CommandSpec) -> Result<(), PipelineError> {
        let result = self
            .executor
            .execute(spec, self.params.timeout())
            .await
            .map_err(|e| classify(stage, e))?;

        if !result.success() {
            let reason = match result.exit_code {
                Some(code) => format!("{} exited with status {code}", spec.program_name()),
                None => format!("{} was terminated by a signal", spec.program_name()),
            };
            return Err(runtime(stage, reason));
        }

        self.steps.push(StepRecord {
            stage,
            command: spec.command_line(),
            exit_code: result.exit_code,
            elapsed: result.elapsed,
            produced_files: result.produced_files,
        });
        Ok(())
    }

    fn require_output(&self, stage: Stage, path: PathBuf) -> Result<(), PipelineError> {
        if path.is_file() {
            Ok(())
        } else {
            Err(runtime(
                stage,
                format!("expected output {} was not produced", path.display()),
            ))
        }
    }
}

fn runtime(stage: Stage, reason: impl Into<String>) -> PipelineError {
    PipelineError::Runtime {
        step: stage,
        reason: reason.into(),
    }
}

/// Timeouts stay timeouts; every other execution failure is a runtime error.
fn classify(stage: Stage, err: ExecError) -> PipelineError {
    match err {
        ExecError::Timeout { after, .. } => PipelineError::Timeout { step: stage, after },
        other => runtime(stage, other.to_string()),
    }
}
