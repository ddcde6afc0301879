// src/archive/bundle.rs

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

use crate::pipeline::files;
use crate::pipeline::RunReport;
use crate::types::Parameters;

/// A scalar metadata value stored next to the archived files.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetaValue {
    Bool(bool),
    Int(i64),
    Float(f64),
}

impl From<bool> for MetaValue {
    fn from(v: bool) -> Self {
        MetaValue::Bool(v)
    }
}

impl From<f64> for MetaValue {
    fn from(v: f64) -> Self {
        MetaValue::Float(v)
    }
}

impl From<u32> for MetaValue {
    fn from(v: u32) -> Self {
        MetaValue::Int(i64::from(v))
    }
}

/// One file to archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleFile {
    pub source: PathBuf,
    pub description: String,
}

/// Named files plus metadata, persisted as one unit after a successful run.
#[derive(Debug, Clone, Default)]
pub struct ArchiveBundle {
    key: String,
    files: BTreeMap<String, BundleFile>,
    metadata: BTreeMap<String, MetaValue>,
}

impl ArchiveBundle {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }

    /// The fixed bundle of a finished run: six files and the parameters that
    /// produced them.
    pub fn for_run(key: impl Into<String>, report: &RunReport, params: &Parameters) -> Self {
        let wf = &report.files;
        let mut bundle = Self::new(key)
            .with_file("original.png", wf.input(), "uploaded")
            .with_file(files::RENDERED, wf.rendered(), "output")
            .with_file(files::NOISE_LEVELS, wf.noise_levels(), "noise levels")
            .with_file(files::CONTOUR, wf.contour(), "polygon input")
            .with_file(files::INFO, wf.info(), "computation info")
            .with_file(files::COMMANDS, wf.command_log(), "commands");

        bundle.add_info("threshold_auto", params.mode().is_auto());
        bundle.add_info("threshold_value", params.threshold());
        bundle.add_info("min_contour_size", params.min_contour_size());
        bundle.add_info("input_width", report.input_dimensions.width);
        bundle.add_info("input_height", report.input_dimensions.height);
        bundle
    }

    #[must_use]
    pub fn with_file(
        mut self,
        name: impl Into<String>,
        source: impl Into<PathBuf>,
        description: impl Into<String>,
    ) -> Self {
        self.add_file(name, source, description);
        self
    }

    pub fn add_file(
        &mut self,
        name: impl Into<String>,
        source: impl Into<PathBuf>,
        description: impl Into<String>,
    ) {
        self.files.insert(
            name.into(),
            BundleFile {
                source: source.into(),
                description: description.into(),
            },
        );
    }

    pub fn add_info(&mut self, key: impl Into<String>, value: impl Into<MetaValue>) {
        self.metadata.insert(key.into(), value.into());
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn files(&self) -> &BTreeMap<String, BundleFile> {
        &self.files
    }

    pub fn metadata(&self) -> &BTreeMap<String, MetaValue> {
        &self.metadata
    }
}
