// src/exec/runner.rs

//! Process runner: turns a [`CommandSpec`] into a live child process.
//!
//! `launch` never blocks on the child and never enforces a time bound; that
//! is the supervisor's job.

use std::fs::{File, OpenOptions};
use std::path::Path;
use std::process::Stdio;
use std::time::Instant;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::spec::{CommandSpec, StreamBinding};
use super::ExecError;

/// One in-flight child process.
///
/// Owned by whoever awaits it; dropping the handle kills the child.
#[derive(Debug)]
pub struct ProcessHandle {
    pub(crate) child: Child,
    pub(crate) pid: Option<u32>,
    pub(crate) program: String,
    pub(crate) started: Instant,
    pub(crate) forwarders: Vec<JoinHandle<()>>,
}

impl ProcessHandle {
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

/// Spawn the child described by `spec`, wiring its streams.
pub fn launch(spec: &CommandSpec) -> Result<ProcessHandle, ExecError> {
    let program = spec.program_name();

    let mut cmd = Command::new(spec.program());
    cmd.args(spec.get_args()).kill_on_drop(true);

    if let Some(dir) = spec.get_current_dir() {
        cmd.current_dir(dir);
    }
    for (key, value) in spec.get_env() {
        cmd.env(key, value);
    }

    // Own process group, so a timeout can take down anything the tool forks.
    #[cfg(unix)]
    cmd.process_group(0);

    cmd.stdin(open_binding(spec, spec.get_stdin(), &program)?)
        .stdout(open_binding(spec, spec.get_stdout(), &program)?)
        .stderr(open_binding(spec, spec.get_stderr(), &program)?);

    let mut child = cmd.spawn().map_err(|source| ExecError::Spawn {
        program: program.clone(),
        source,
    })?;

    let pid = child.id();
    info!(
        program = %program,
        pid = ?pid,
        cmd = %spec.command_line(),
        "launched process"
    );

    let mut forwarders = Vec::new();
    if let Some(stdout) = child.stdout.take() {
        forwarders.push(forward_lines(stdout, program.clone(), "stdout"));
    }
    if let Some(stderr) = child.stderr.take() {
        forwarders.push(forward_lines(stderr, program.clone(), "stderr"));
    }

    Ok(ProcessHandle {
        child,
        pid,
        program,
        started: Instant::now(),
        forwarders,
    })
}

fn open_binding(
    spec: &CommandSpec,
    binding: &StreamBinding,
    program: &str,
) -> Result<Stdio, ExecError> {
    let stream_err = |path: &Path, source| ExecError::Stream {
        program: program.to_string(),
        path: path.to_path_buf(),
        source,
    };

    let stdio = match binding {
        StreamBinding::Null => Stdio::null(),
        StreamBinding::Log => Stdio::piped(),
        StreamBinding::ReadFrom(p) => {
            let path = spec.resolve(p);
            let file = File::open(&path).map_err(|e| stream_err(&path, e))?;
            Stdio::from(file)
        }
        StreamBinding::WriteTo(p) => {
            let path = spec.resolve(p);
            let file = File::create(&path).map_err(|e| stream_err(&path, e))?;
            Stdio::from(file)
        }
        StreamBinding::AppendTo(p) => {
            let path = spec.resolve(p);
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .map_err(|e| stream_err(&path, e))?;
            Stdio::from(file)
        }
    };
    Ok(stdio)
}

/// Drain a piped stream to EOF, logging each line at debug.
///
/// Lines are read as bytes and decoded lossily, so non-UTF-8 output never
/// ends the drain early.
fn forward_lines<R>(stream: R, program: String, which: &'static str) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(stream);
        let mut buf = Vec::new();

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf);
                    let line = line.trim_end_matches(['\r', '\n']);
                    debug!(program = %program, stream = which, "{}", line);
                }
                Err(e) => {
                    debug!(program = %program, stream = which, error = %e, "output stream closed");
                    break;
                }
            }
        }
    })
}
