#![allow(dead_code)]

use std::path::PathBuf;
use std::time::Duration;

use scalepipe::config::{ConfigFile, RawConfigFile, Tool, ToolConfig};
use scalepipe::types::{Parameters, ThresholdMode};

/// Builder for `Parameters` with test-friendly defaults.
pub struct ParametersBuilder {
    threshold: f64,
    min_contour_size: f64,
    mode: ThresholdMode,
    timeout: Duration,
}

impl ParametersBuilder {
    pub fn new() -> Self {
        Self {
            threshold: 128.0,
            min_contour_size: 5.0,
            mode: ThresholdMode::Manual,
            timeout: Duration::from_secs(10),
        }
    }

    pub fn auto(mut self) -> Self {
        self.mode = ThresholdMode::Auto;
        self
    }

    pub fn threshold(mut self, t: f64) -> Self {
        self.threshold = t;
        self.mode = ThresholdMode::Manual;
        self
    }

    pub fn min_size(mut self, m: f64) -> Self {
        self.min_contour_size = m;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Parameters {
        Parameters::new(self.threshold, self.min_contour_size, self.mode, self.timeout)
            .expect("Failed to build valid parameters from builder")
    }
}

impl Default for ParametersBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn bin_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.tools.bin_dir = Some(dir.into());
        self
    }

    pub fn tool(mut self, tool: Tool, program: &str, library_path: bool) -> Self {
        *self.config.tools.tool_mut(tool) = ToolConfig::new(program, library_path);
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.run.timeout_secs = secs;
        self
    }

    pub fn grace_period_ms(mut self, ms: u64) -> Self {
        self.config.run.grace_period_ms = ms;
        self
    }

    pub fn archive_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.archive.root = root.into();
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}
