// src/raster.rs

//! The only image decoding the pipeline does: reading pixel dimensions.

use std::path::Path;

use anyhow::{Context, Result};

use crate::types::Dimensions;

/// Read the width and height of the raster at `path` from its header.
pub fn read_dimensions(path: &Path) -> Result<Dimensions> {
    let (width, height) = image::image_dimensions(path)
        .with_context(|| format!("reading dimensions of {}", path.display()))?;
    Ok(Dimensions { width, height })
}
