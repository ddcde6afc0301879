// src/config/model.rs

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [run]
/// timeout_secs = 30
///
/// [tools]
/// bin_dir = "bin"
///
/// [tools.extract]
/// program = "pgm2freeman"
/// library_path = true
///
/// [archive]
/// root = "archive"
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    #[serde(default)]
    pub run: RunSection,

    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub archive: ArchiveSection,
}

/// Validated configuration. Only obtainable through `TryFrom<RawConfigFile>`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub run: RunSection,
    pub tools: ToolsConfig,
    pub archive: ArchiveSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        run: RunSection,
        tools: ToolsConfig,
        archive: ArchiveSection,
    ) -> Self {
        Self {
            run,
            tools,
            archive,
        }
    }
}

/// `[run]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct RunSection {
    /// Per-step deadline in seconds. Reset at the start of every step.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Time between SIGTERM and SIGKILL when a step overruns.
    #[serde(default = "default_grace_period_ms")]
    pub grace_period_ms: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_grace_period_ms() -> u64 {
    2000
}

impl RunSection {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms)
    }
}

impl Default for RunSection {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            grace_period_ms: default_grace_period_ms(),
        }
    }
}

/// The external tools the pipeline chains, one per role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    /// Source raster → PGM for the extractor.
    Convert,
    /// PGM on stdin → contour description on stdout.
    Extract,
    /// Source raster → lightened backdrop.
    Background,
    /// Contours on stdin → noise levels and a vector figure.
    Estimate,
    /// Vector figure → raster.
    Render,
}

impl Tool {
    pub const ALL: [Tool; 5] = [
        Tool::Convert,
        Tool::Extract,
        Tool::Background,
        Tool::Estimate,
        Tool::Render,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Tool::Convert => "convert",
            Tool::Extract => "extract",
            Tool::Background => "background",
            Tool::Estimate => "estimate",
            Tool::Render => "render",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `[tools]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolsConfig {
    /// Directory holding the built tools and their shared library.
    ///
    /// Relative program names are resolved here. If `None`, bare program
    /// names are looked up on `PATH`.
    #[serde(default)]
    pub bin_dir: Option<PathBuf>,

    /// Environment variable used for the shared-library override.
    #[serde(default = "default_library_path_var")]
    pub library_path_var: String,

    #[serde(default = "default_convert")]
    pub convert: ToolConfig,

    #[serde(default = "default_extract")]
    pub extract: ToolConfig,

    #[serde(default = "default_background")]
    pub background: ToolConfig,

    #[serde(default = "default_estimate")]
    pub estimate: ToolConfig,

    #[serde(default = "default_render")]
    pub render: ToolConfig,
}

/// `[tools.<role>]` section.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ToolConfig {
    pub program: String,

    /// Point the library search variable at `bin_dir` for this tool.
    #[serde(default)]
    pub library_path: bool,
}

impl ToolConfig {
    pub fn new(program: impl Into<String>, library_path: bool) -> Self {
        Self {
            program: program.into(),
            library_path,
        }
    }
}

fn default_library_path_var() -> String {
    "LD_LIBRARY_PATH".to_string()
}

fn default_convert() -> ToolConfig {
    ToolConfig::new("convert.sh", false)
}

fn default_extract() -> ToolConfig {
    ToolConfig::new("pgm2freeman", true)
}

fn default_background() -> ToolConfig {
    ToolConfig::new("transformBG.sh", false)
}

fn default_estimate() -> ToolConfig {
    ToolConfig::new("applyMS.sh", true)
}

fn default_render() -> ToolConfig {
    ToolConfig::new("convertFig.sh", false)
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            bin_dir: None,
            library_path_var: default_library_path_var(),
            convert: default_convert(),
            extract: default_extract(),
            background: default_background(),
            estimate: default_estimate(),
            render: default_render(),
        }
    }
}

impl ToolsConfig {
    pub fn tool(&self, tool: Tool) -> &ToolConfig {
        match tool {
            Tool::Convert => &self.convert,
            Tool::Extract => &self.extract,
            Tool::Background => &self.background,
            Tool::Estimate => &self.estimate,
            Tool::Render => &self.render,
        }
    }

    pub fn tool_mut(&mut self, tool: Tool) -> &mut ToolConfig {
        match tool {
            Tool::Convert => &mut self.convert,
            Tool::Extract => &mut self.extract,
            Tool::Background => &mut self.background,
            Tool::Estimate => &mut self.estimate,
            Tool::Render => &mut self.render,
        }
    }

    /// Path to spawn for `tool`.
    ///
    /// - absolute program paths are used as-is;
    /// - with a `bin_dir`, relative programs live under it (made absolute, since
    ///   children run inside the working directory);
    /// - otherwise the bare name is left for `PATH` lookup.
    pub fn program_path(&self, tool: Tool) -> PathBuf {
        let program = Path::new(&self.tool(tool).program);
        if program.is_absolute() {
            return program.to_path_buf();
        }
        match &self.bin_dir {
            Some(dir) => {
                let joined = dir.join(program);
                std::path::absolute(&joined).unwrap_or(joined)
            }
            None => program.to_path_buf(),
        }
    }

    /// The per-invocation library search override for `tool`, if it wants one.
    pub fn library_override(&self, tool: Tool) -> Option<(String, OsString)> {
        if !self.tool(tool).library_path {
            return None;
        }
        let dir = self.bin_dir.as_ref()?;
        let dir = std::path::absolute(dir).unwrap_or_else(|_| dir.clone());
        Some((self.library_path_var.clone(), dir.into_os_string()))
    }
}

/// `[archive]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ArchiveSection {
    /// Archive successful runs. Sample inputs are usually run with this off.
    #[serde(default = "default_archive_enabled")]
    pub enabled: bool,

    /// Directory holding one sub-directory per archived run.
    #[serde(default = "default_archive_root")]
    pub root: PathBuf,
}

fn default_archive_enabled() -> bool {
    true
}

fn default_archive_root() -> PathBuf {
    PathBuf::from("archive")
}

impl Default for ArchiveSection {
    fn default() -> Self {
        Self {
            enabled: default_archive_enabled(),
            root: default_archive_root(),
        }
    }
}
