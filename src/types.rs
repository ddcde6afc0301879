use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::errors::PipelineError;

/// How the contour extractor picks its binarization threshold.
///
/// - `Auto`: the extractor selects the threshold itself; only the minimum
///   contour size is passed.
/// - `Manual`: the caller-supplied threshold is passed explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdMode {
    Auto,
    Manual,
}

impl ThresholdMode {
    pub fn from_flag(auto: bool) -> Self {
        if auto {
            ThresholdMode::Auto
        } else {
            ThresholdMode::Manual
        }
    }

    pub fn is_auto(self) -> bool {
        matches!(self, ThresholdMode::Auto)
    }
}

impl Default for ThresholdMode {
    fn default() -> Self {
        ThresholdMode::Manual
    }
}

impl FromStr for ThresholdMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" | "true" => Ok(ThresholdMode::Auto),
            "manual" | "false" => Ok(ThresholdMode::Manual),
            other => Err(format!(
                "invalid threshold mode: {other} (expected \"auto\" or \"manual\")"
            )),
        }
    }
}

/// Parameters as received from the request layer, before validation.
#[derive(Debug, Clone, Default)]
pub struct RawParameters {
    pub threshold: Option<String>,
    pub min_contour_size: Option<String>,
    pub auto_threshold: bool,
}

/// Validated, immutable parameters for one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Parameters {
    threshold: f64,
    min_contour_size: f64,
    mode: ThresholdMode,
    timeout: Duration,
}

impl Parameters {
    pub fn new(
        threshold: f64,
        min_contour_size: f64,
        mode: ThresholdMode,
        timeout: Duration,
    ) -> Result<Self, PipelineError> {
        ensure_finite("threshold", threshold)?;
        ensure_finite("min_contour_size", min_contour_size)?;
        if timeout.is_zero() {
            return Err(PipelineError::Validation(
                "timeout must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            threshold,
            min_contour_size,
            mode,
            timeout,
        })
    }

    /// Validate raw request values.
    ///
    /// Both numbers are required even in auto mode, matching what the request
    /// form always submits.
    pub fn parse(raw: &RawParameters, timeout: Duration) -> Result<Self, PipelineError> {
        let threshold = parse_number("threshold", raw.threshold.as_deref())?;
        let min_contour_size = parse_number("min_contour_size", raw.min_contour_size.as_deref())?;
        Self::new(
            threshold,
            min_contour_size,
            ThresholdMode::from_flag(raw.auto_threshold),
            timeout,
        )
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn min_contour_size(&self) -> f64 {
        self.min_contour_size
    }

    pub fn mode(&self) -> ThresholdMode {
        self.mode
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

fn parse_number(name: &str, value: Option<&str>) -> Result<f64, PipelineError> {
    let value = value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| PipelineError::Validation(format!("{name} is missing")))?;
    let parsed: f64 = value
        .parse()
        .map_err(|_| PipelineError::Validation(format!("{name} is not a number: {value:?}")))?;
    ensure_finite(name, parsed)?;
    Ok(parsed)
}

fn ensure_finite(name: &str, value: f64) -> Result<(), PipelineError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(PipelineError::Validation(format!(
            "{name} must be a finite number (got {value})"
        )))
    }
}

/// Pixel dimensions of a raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}
