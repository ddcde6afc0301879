// src/exec/spec.rs

//! Immutable description of one external invocation.
//!
//! A [`CommandSpec`] is both what gets executed and what gets logged:
//! [`CommandSpec::command_line`] renders the exact argument list that the
//! runner passes to the OS, so the two can never drift apart.
//!
//! Arguments are discrete tokens. Nothing here (or in the runner) goes
//! through a shell.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

/// Where one of the child's standard streams is connected.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StreamBinding {
    /// `/dev/null`.
    #[default]
    Null,
    /// Pipe the stream and forward each line to `tracing` at debug level.
    Log,
    /// Read from a file (stdin only).
    ReadFrom(PathBuf),
    /// Write to a file, truncating it first.
    WriteTo(PathBuf),
    /// Append to a file, creating it if needed.
    AppendTo(PathBuf),
}

impl StreamBinding {
    /// File written by this binding, if any.
    pub fn output_path(&self) -> Option<&Path> {
        match self {
            StreamBinding::WriteTo(p) | StreamBinding::AppendTo(p) => Some(p),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    program: PathBuf,
    args: Vec<String>,
    stdin: StreamBinding,
    stdout: StreamBinding,
    stderr: StreamBinding,
    env: BTreeMap<String, OsString>,
    cwd: Option<PathBuf>,
}

impl CommandSpec {
    /// Start a spec for `program` with no arguments.
    ///
    /// Streams default to `Null` for stdin and `Log` for stdout/stderr.
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            stdin: StreamBinding::Null,
            stdout: StreamBinding::Log,
            stderr: StreamBinding::Log,
            env: BTreeMap::new(),
            cwd: None,
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn stdin(mut self, binding: StreamBinding) -> Self {
        self.stdin = binding;
        self
    }

    #[must_use]
    pub fn stdout(mut self, binding: StreamBinding) -> Self {
        self.stdout = binding;
        self
    }

    #[must_use]
    pub fn stderr(mut self, binding: StreamBinding) -> Self {
        self.stderr = binding;
        self
    }

    /// Set an environment override for this invocation only.
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<OsString>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Run the child in `dir`. Relative stream paths are resolved against it.
    #[must_use]
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Program name as shown in logs (its file name).
    pub fn program_name(&self) -> String {
        self.program
            .file_name()
            .unwrap_or(self.program.as_os_str())
            .to_string_lossy()
            .into_owned()
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    pub fn get_stdin(&self) -> &StreamBinding {
        &self.stdin
    }

    pub fn get_stdout(&self) -> &StreamBinding {
        &self.stdout
    }

    pub fn get_stderr(&self) -> &StreamBinding {
        &self.stderr
    }

    pub fn get_env(&self) -> &BTreeMap<String, OsString> {
        &self.env
    }

    pub fn get_current_dir(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    /// Resolve a binding path against the working directory.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        match &self.cwd {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Files this command writes through its stream bindings, resolved.
    pub fn output_paths(&self) -> Vec<PathBuf> {
        [&self.stdout, &self.stderr]
            .into_iter()
            .filter_map(StreamBinding::output_path)
            .map(|p| self.resolve(p))
            .collect()
    }

    /// Render the invocation as a POSIX-style command line.
    ///
    /// Tokens that need it are single-quoted; redirections are appended in
    /// stdin, stdout, stderr order. Environment overrides are not rendered.
    pub fn command_line(&self) -> String {
        let mut parts = Vec::with_capacity(self.args.len() + 4);
        parts.push(shell_quote(&self.program_name()));
        parts.extend(self.args.iter().map(|a| shell_quote(a)));

        if let StreamBinding::ReadFrom(p) = &self.stdin {
            parts.push(format!("< {}", shell_quote(&p.to_string_lossy())));
        }
        match &self.stdout {
            StreamBinding::WriteTo(p) => {
                parts.push(format!("> {}", shell_quote(&p.to_string_lossy())))
            }
            StreamBinding::AppendTo(p) => {
                parts.push(format!(">> {}", shell_quote(&p.to_string_lossy())))
            }
            _ => {}
        }
        match &self.stderr {
            StreamBinding::WriteTo(p) => {
                parts.push(format!("2> {}", shell_quote(&p.to_string_lossy())))
            }
            StreamBinding::AppendTo(p) => {
                parts.push(format!("2>> {}", shell_quote(&p.to_string_lossy())))
            }
            _ => {}
        }

        parts.join(" ")
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command_line())
    }
}

/// Quote a token for display so that a POSIX shell would split it back into
/// the same single argument.
pub fn shell_quote(token: &str) -> String {
    let safe = !token.is_empty()
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_-./=:,+@%".contains(c));
    if safe {
        token.to_string()
    } else {
        format!("'{}'", token.replace('\'', r"'\''"))
    }
}
