// src/pipeline/commands.rs

//! Pure construction of every step's [`CommandSpec`].
//!
//! Nothing here touches the filesystem or spawns anything; the controller
//! decides when a spec is built, logged and executed.

use crate::config::{Tool, ToolsConfig};
use crate::exec::{CommandSpec, StreamBinding};
use crate::types::{Dimensions, Parameters, ThresholdMode};

use super::files::{self, WorkFiles};

/// Builds command specs for one working directory.
#[derive(Debug, Clone, Copy)]
pub struct CommandBuilder<'a> {
    tools: &'a ToolsConfig,
    files: &'a WorkFiles,
}

impl<'a> CommandBuilder<'a> {
    pub fn new(tools: &'a ToolsConfig, files: &'a WorkFiles) -> Self {
        Self { tools, files }
    }

    /// Program, working directory and library override for `tool`.
    fn base(&self, tool: Tool) -> CommandSpec {
        let spec = CommandSpec::new(self.tools.program_path(tool)).current_dir(self.files.root());
        match self.tools.library_override(tool) {
            Some((key, value)) => spec.env(key, value),
            None => spec,
        }
    }

    /// `convert input_0.png tmp.pgm`
    pub fn convert(&self) -> CommandSpec {
        self.base(Tool::Convert).args([files::INPUT, files::CONVERTED])
    }

    /// Contour extraction: PGM on stdin, contours on stdout, diagnostics
    /// into a fresh info file.
    pub fn extract(&self, params: &Parameters) -> CommandSpec {
        self.base(Tool::Extract)
            .args(extraction_args(params))
            .stdin(StreamBinding::ReadFrom(files::CONVERTED.into()))
            .stdout(StreamBinding::WriteTo(files::CONTOUR.into()))
            .stderr(StreamBinding::WriteTo(files::INFO.into()))
    }

    /// `transform input_0.png input_0BG.png`
    pub fn background(&self) -> CommandSpec {
        self.base(Tool::Background).args([files::INPUT, files::BACKGROUND])
    }

    /// Noise-level estimation over every extracted contour, drawn on top of
    /// the backdrop of size `backdrop`.
    pub fn estimation(&self, backdrop: Dimensions) -> CommandSpec {
        let background = self.files.background();
        let background = std::path::absolute(&background).unwrap_or(background);

        self.base(Tool::Estimate)
            .args([
                "-enteteXFIG",
                "-drawXFIGNoiseLevel",
                "-setFileNameFigure",
                files::FIGURE,
                "-drawContourSRC",
                "4",
                "1",
                "-afficheImage",
            ])
            .arg(background.to_string_lossy())
            .arg(backdrop.width.to_string())
            .arg(backdrop.height.to_string())
            .args([
                "-setPosImage",
                "1",
                "1",
                "-printNoiseLevel",
                "-processAllContours",
            ])
            .stdin(StreamBinding::ReadFrom(files::CONTOUR.into()))
            .stdout(StreamBinding::WriteTo(files::NOISE_LEVELS.into()))
            .stderr(StreamBinding::AppendTo(files::INFO.into()))
    }

    /// `render noiseLevel.fig resu.png`
    pub fn render(&self) -> CommandSpec {
        self.base(Tool::Render)
            .args([files::FIGURE, files::RENDERED])
            .stderr(StreamBinding::AppendTo(files::INFO.into()))
    }
}

/// Extractor arguments for the selected threshold mode.
///
/// - auto: `-min_size <m>`
/// - manual: `-threshold <t> -min_size <m>`
pub fn extraction_args(params: &Parameters) -> Vec<String> {
    let mut args = Vec::with_capacity(4);
    if params.mode() == ThresholdMode::Manual {
        args.push("-threshold".to_string());
        args.push(format_number(params.threshold()));
    }
    args.push("-min_size".to_string());
    args.push(format_number(params.min_contour_size()));
    args
}

/// Shortest decimal form that parses back to the same `f64`.
pub fn format_number(value: f64) -> String {
    format!("{value}")
}
