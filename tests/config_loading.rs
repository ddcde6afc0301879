// tests/config_loading.rs

mod common;

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use common::*;
use scalepipe::config::{load_and_validate, load_or_default, ConfigFile, Tool, ToolConfig};
use scalepipe::errors::ScalepipeError;

#[test]
fn full_config_file_loads() -> TestResult {
    let tmp = tempfile::tempdir()?;
    let path = tmp.path().join("Scalepipe.toml");
    fs::write(
        &path,
        r#"
[run]
timeout_secs = 12
grace_period_ms = 250

[tools]
bin_dir = "/opt/scales/bin"
library_path_var = "DYLD_LIBRARY_PATH"

[tools.render]
program = "fig2png"

[tools.extract]
program = "/usr/bin/pgm2freeman"
library_path = false

[archive]
enabled = false
root = "/srv/archive"
"#,
    )?;

    let cfg = load_and_validate(&path)?;

    assert_eq!(cfg.run.timeout(), Duration::from_secs(12));
    assert_eq!(cfg.run.grace_period(), Duration::from_millis(250));
    assert_eq!(cfg.tools.library_path_var, "DYLD_LIBRARY_PATH");
    assert_eq!(
        cfg.tools.program_path(Tool::Render),
        PathBuf::from("/opt/scales/bin/fig2png")
    );
    assert_eq!(
        cfg.tools.program_path(Tool::Extract),
        PathBuf::from("/usr/bin/pgm2freeman")
    );
    assert!(cfg.tools.library_override(Tool::Extract).is_none());
    let (var, value) = cfg.tools.library_override(Tool::Estimate).unwrap();
    assert_eq!(var, "DYLD_LIBRARY_PATH");
    assert_eq!(value, "/opt/scales/bin");
    // Untouched sections keep their defaults.
    assert_eq!(*cfg.tools.tool(Tool::Convert), ToolConfig::new("convert.sh", false));
    assert!(!cfg.archive.enabled);
    assert_eq!(cfg.archive.root, PathBuf::from("/srv/archive"));
    Ok(())
}

#[test]
fn empty_file_means_defaults() -> TestResult {
    let tmp = tempfile::tempdir()?;
    let path = tmp.path().join("empty.toml");
    fs::write(&path, "")?;

    let cfg = load_and_validate(&path)?;

    assert_eq!(cfg.run.timeout_secs, 30);
    assert_eq!(cfg.run.grace_period_ms, 2000);
    assert!(cfg.tools.bin_dir.is_none());
    assert_eq!(cfg.tools.tool(Tool::Extract).program, "pgm2freeman");
    assert!(cfg.tools.tool(Tool::Extract).library_path);
    assert!(cfg.tools.tool(Tool::Estimate).library_path);
    assert!(cfg.archive.enabled);
    assert_eq!(cfg.archive.root, PathBuf::from("archive"));
    Ok(())
}

#[test]
fn zero_timeout_is_rejected() {
    let err = ConfigFile::try_from(ConfigFileBuilder::new().timeout_secs(0).raw()).unwrap_err();
    assert!(matches!(err, ScalepipeError::ConfigError(ref m) if m.contains("timeout_secs")));
}

#[test]
fn empty_program_is_rejected() {
    let raw = ConfigFileBuilder::new().tool(Tool::Background, "  ", false).raw();
    let err = ConfigFile::try_from(raw).unwrap_err();
    match err {
        ScalepipeError::ConfigError(msg) => {
            assert_eq!(msg, "[tools.background].program must not be empty")
        }
        other => panic!("expected config error, got {other:?}"),
    }
}

#[test]
fn library_variable_required_when_a_tool_wants_it() {
    let mut raw = ConfigFileBuilder::new().raw();
    raw.tools.library_path_var = String::new();
    assert!(ConfigFile::try_from(raw.clone()).is_err());

    for tool in Tool::ALL {
        raw.tools.tool_mut(tool).library_path = false;
    }
    assert!(ConfigFile::try_from(raw).is_ok());
}

#[test]
fn enabled_archive_needs_a_root() {
    let err = ConfigFile::try_from(ConfigFileBuilder::new().archive_root("").raw()).unwrap_err();
    assert!(matches!(err, ScalepipeError::ConfigError(ref m) if m.contains("[archive].root")));
}

#[test]
fn malformed_toml_is_a_toml_error() -> TestResult {
    let tmp = tempfile::tempdir()?;
    let path = tmp.path().join("bad.toml");
    fs::write(&path, "[run\ntimeout_secs = ")?;

    let err = load_and_validate(&path).unwrap_err();
    assert!(matches!(err, ScalepipeError::TomlError(_)), "{err:?}");
    Ok(())
}

#[test]
fn explicit_missing_file_is_an_error() {
    let err = load_or_default(Some(std::path::Path::new("/definitely/not/here.toml"))).unwrap_err();
    assert!(matches!(err, ScalepipeError::ConfigError(ref m) if m.contains("does not exist")));
}

#[test]
fn builder_produces_valid_config() {
    let cfg = ConfigFileBuilder::new()
        .bin_dir("/opt/bin")
        .grace_period_ms(10)
        .tool(Tool::Convert, "magick-wrapper", false)
        .build();

    assert_eq!(cfg.run.grace_period(), Duration::from_millis(10));
    assert_eq!(
        cfg.tools.program_path(Tool::Convert),
        PathBuf::from("/opt/bin/magick-wrapper")
    );
}
