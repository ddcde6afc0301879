// src/exec/supervisor.rs

//! Timeout supervisor.
//!
//! Races the child's exit against a per-step deadline. On timeout the
//! child's process group gets SIGTERM, then SIGKILL once the grace period is
//! over; the child is always reaped before returning, so nothing outlives
//! the deadline by more than `grace`. A child that exits on its own takes
//! the rest of its process group down with it.

use std::process::ExitStatus;
use std::time::Duration;

use tokio::process::Child;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::runner::ProcessHandle;
use super::ExecError;

/// How long to wait for stream forwarders after the child has exited.
const IO_DRAIN_TIMEOUT: Duration = Duration::from_millis(500);

/// A child that exited on its own before its deadline.
#[derive(Debug, Clone, Copy)]
pub struct Completed {
    pub status: ExitStatus,
    pub elapsed: Duration,
}

/// Block until the process exits or `deadline` elapses.
pub async fn await_exit(
    handle: ProcessHandle,
    deadline: Duration,
    grace: Duration,
) -> Result<Completed, ExecError> {
    let ProcessHandle {
        mut child,
        pid,
        program,
        started,
        forwarders,
    } = handle;

    let waited = timeout(deadline, child.wait()).await;
    match waited {
        Ok(Ok(status)) => {
            // Anything the tool left running in its group goes with it.
            #[cfg(unix)]
            if let Some(pid) = pid {
                signal_group(pid, libc::SIGKILL);
            }
            for mut forwarder in forwarders {
                if timeout(IO_DRAIN_TIMEOUT, &mut forwarder).await.is_err() {
                    debug!(program = %program, "output still open after exit; aborting forwarder");
                    forwarder.abort();
                }
            }
            let elapsed = started.elapsed();
            info!(
                program = %program,
                exit_code = ?status.code(),
                success = status.success(),
                elapsed_ms = elapsed.as_millis() as u64,
                "process exited"
            );
            Ok(Completed { status, elapsed })
        }
        Ok(Err(source)) => Err(ExecError::Wait { program, source }),
        Err(_) => {
            warn!(
                program = %program,
                pid = ?pid,
                deadline_ms = deadline.as_millis() as u64,
                "deadline elapsed; terminating process"
            );
            terminate(&mut child, pid, grace, &program).await;
            for forwarder in forwarders {
                forwarder.abort();
            }
            Err(ExecError::Timeout {
                program,
                after: deadline,
            })
        }
    }
}

/// Graceful signal first, forced kill after `grace`. Always reaps the child.
async fn terminate(child: &mut Child, pid: Option<u32>, grace: Duration, program: &str) {
    #[cfg(unix)]
    {
        if let Some(pid) = pid {
            signal_group(pid, libc::SIGTERM);
            match timeout(grace, child.wait()).await {
                Ok(Ok(status)) => {
                    // The leader is gone; make sure nothing it forked lingers.
                    signal_group(pid, libc::SIGKILL);
                    info!(
                        program = %program,
                        pid,
                        exit_code = ?status.code(),
                        "process stopped after SIGTERM"
                    );
                    return;
                }
                Ok(Err(e)) => {
                    warn!(program = %program, pid, error = %e, "waiting after SIGTERM failed");
                }
                Err(_) => {
                    warn!(program = %program, pid, "process ignored SIGTERM; sending SIGKILL");
                }
            }
            signal_group(pid, libc::SIGKILL);
        }
    }

    #[cfg(not(unix))]
    let _ = (pid, grace);

    if let Err(e) = child.kill().await {
        warn!(program = %program, error = %e, "failed to kill child process");
    }
}

#[cfg(unix)]
fn signal_group(pid: u32, signal: libc::c_int) {
    let Ok(pgid) = libc::pid_t::try_from(pid) else {
        return;
    };
    // SAFETY: kill(2) with a negative pid only signals the process group the
    // runner created for this child.
    let rc = unsafe { libc::kill(-pgid, signal) };
    if rc != 0 {
        debug!(pid, signal, "process group already gone");
    }
}
