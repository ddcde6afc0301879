#![allow(dead_code)]

use std::error::Error;
use std::path::PathBuf;

use tempfile::TempDir;

#[allow(unused_imports)]
pub use scalepipe_test_utils::builders::{ConfigFileBuilder, ParametersBuilder};
#[allow(unused_imports)]
pub use scalepipe_test_utils::fake_executor::{FakeBehaviour, FakeExecutor};
#[allow(unused_imports)]
pub use scalepipe_test_utils::{fixtures, init_tracing, serial_guard, with_timeout};

pub type TestResult = Result<(), Box<dyn Error>>;

/// A fresh working directory with a 100×100 `input_0.png`.
pub fn work_dir_with_input() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("creating temp dir");
    let path = dir.path().to_path_buf();
    fixtures::write_input(&path, 100, 100);
    (dir, path)
}
