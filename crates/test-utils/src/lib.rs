//! Shared helpers for the `scalepipe` integration tests.

pub mod builders;
pub mod fake_executor;
pub mod fixtures;

use std::future::Future;
use std::sync::{Mutex, MutexGuard, Once};
use std::time::Duration;

use scalepipe::logging::{build_filter, LOG_ENV_VAR};
use tracing_subscriber::fmt;

static INIT: Once = Once::new();
static SERIAL: Mutex<()> = Mutex::new(());

/// Upper bound for any single test future.
pub const TEST_DEADLINE: Duration = Duration::from_secs(20);

/// Install a test-writer subscriber once per test binary.
///
/// Reads the same `SCALEPIPE_LOG` variable as the binary, so
/// `SCALEPIPE_LOG=scalepipe::exec=debug cargo test -- --nocapture` shows
/// every launched command and its forwarded output.
pub fn init_tracing() {
    INIT.call_once(|| {
        let env = std::env::var(LOG_ENV_VAR).ok();
        let _ = fmt()
            .with_env_filter(build_filter(None, env.as_deref()))
            .with_test_writer()
            .with_target(true)
            .try_init();
    });
}

/// Serialise tests that write executable scripts and then spawn processes.
///
/// Writing a script while another thread forks can leave the file open in
/// the forked child and make `exec` fail with ETXTBSY.
pub fn serial_guard() -> MutexGuard<'static, ()> {
    SERIAL.lock().unwrap_or_else(|e| e.into_inner())
}

/// Fail the test instead of hanging when a pipeline never finishes.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    tokio::time::timeout(TEST_DEADLINE, f)
        .await
        .unwrap_or_else(|_| panic!("test did not finish within {TEST_DEADLINE:?}"))
}
