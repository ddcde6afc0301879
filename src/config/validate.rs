// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile, Tool};
use crate::errors::{Result, ScalepipeError};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = ScalepipeError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.run, raw.tools, raw.archive))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_run_section(cfg)?;
    validate_tools(cfg)?;
    validate_archive(cfg)?;
    Ok(())
}

fn validate_run_section(cfg: &RawConfigFile) -> Result<()> {
    if cfg.run.timeout_secs == 0 {
        return Err(ScalepipeError::ConfigError(
            "[run].timeout_secs must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_tools(cfg: &RawConfigFile) -> Result<()> {
    for tool in Tool::ALL {
        if cfg.tools.tool(tool).program.trim().is_empty() {
            return Err(ScalepipeError::ConfigError(format!(
                "[tools.{tool}].program must not be empty"
            )));
        }
    }

    let wants_library_path = Tool::ALL
        .iter()
        .any(|&tool| cfg.tools.tool(tool).library_path);
    if wants_library_path && cfg.tools.library_path_var.trim().is_empty() {
        return Err(ScalepipeError::ConfigError(
            "[tools].library_path_var must not be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_archive(cfg: &RawConfigFile) -> Result<()> {
    if cfg.archive.enabled && cfg.archive.root.as_os_str().is_empty() {
        return Err(ScalepipeError::ConfigError(
            "[archive].root must be set when archiving is enabled".to_string(),
        ));
    }
    Ok(())
}
