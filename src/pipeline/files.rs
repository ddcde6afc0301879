// src/pipeline/files.rs

//! Fixed file names inside a run's working directory.

use std::path::{Path, PathBuf};

/// Uploaded source raster (caller precondition).
pub const INPUT: &str = "input_0.png";
/// PGM fed to the contour extractor.
pub const CONVERTED: &str = "tmp.pgm";
/// Extracted contours, one per line.
pub const CONTOUR: &str = "inputContour.txt";
/// Diagnostics from extraction, estimation and rendering.
pub const INFO: &str = "info.txt";
/// Lightened copy of the input used as figure backdrop.
pub const BACKGROUND: &str = "input_0BG.png";
/// Vector figure written by the estimator.
pub const FIGURE: &str = "noiseLevel.fig";
/// Rendered result shown to the caller.
pub const RENDERED: &str = "resu.png";
/// Per-contour noise levels (estimator stdout).
pub const NOISE_LEVELS: &str = "noiseLevels.txt";
/// Command log.
pub const COMMANDS: &str = "commands.txt";

/// Paths of the fixed files for one working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkFiles {
    root: PathBuf,
}

impl WorkFiles {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    pub fn input(&self) -> PathBuf {
        self.path(INPUT)
    }

    pub fn converted(&self) -> PathBuf {
        self.path(CONVERTED)
    }

    pub fn contour(&self) -> PathBuf {
        self.path(CONTOUR)
    }

    pub fn info(&self) -> PathBuf {
        self.path(INFO)
    }

    pub fn background(&self) -> PathBuf {
        self.path(BACKGROUND)
    }

    pub fn figure(&self) -> PathBuf {
        self.path(FIGURE)
    }

    pub fn rendered(&self) -> PathBuf {
        self.path(RENDERED)
    }

    pub fn noise_levels(&self) -> PathBuf {
        self.path(NOISE_LEVELS)
    }

    pub fn command_log(&self) -> PathBuf {
        self.path(COMMANDS)
    }
}
