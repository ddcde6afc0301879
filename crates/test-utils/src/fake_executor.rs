use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::future::Future;
use std::io::Write;
use std::path::Path;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use scalepipe::exec::{CommandSpec, ExecError, StepExecutor, StepResult, StreamBinding};
use scalepipe::pipeline::files;

use crate::fixtures::png_bytes;

/// A 2×2 binary PGM.
const TINY_PGM: &[u8] = b"P5\n2 2\n255\n\x00\xff\xff\x00";

/// What a faked tool does when "run".
#[derive(Debug, Clone)]
pub enum FakeBehaviour {
    /// Exit 0 after writing `stdout` to the stdout binding and creating
    /// `creates` (paths relative to the working directory).
    Succeed {
        stdout: Vec<u8>,
        creates: Vec<(String, Vec<u8>)>,
    },
    /// Exit with the given non-zero status.
    Exit(i32),
    /// Behave as if the deadline elapsed.
    Timeout,
    /// Behave as if the program could not be started.
    SpawnFailure,
}

impl FakeBehaviour {
    pub fn stdout(text: &str) -> Self {
        FakeBehaviour::Succeed {
            stdout: text.as_bytes().to_vec(),
            creates: Vec::new(),
        }
    }

    pub fn creates(name: &str, content: Vec<u8>) -> Self {
        FakeBehaviour::Succeed {
            stdout: Vec::new(),
            creates: vec![(name.to_string(), content)],
        }
    }
}

/// A fake executor that:
/// - records every spec it was asked to run
/// - emulates each program (keyed by program file name) without spawning.
///
/// Programs with no configured behaviour succeed and produce nothing.
#[derive(Clone, Default)]
pub struct FakeExecutor {
    behaviours: HashMap<String, FakeBehaviour>,
    executed: Arc<Mutex<Vec<CommandSpec>>>,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Behaviours matching the default tool names, producing every file a
    /// successful run needs.
    pub fn happy_path() -> Self {
        Self::new()
            .on("convert.sh", FakeBehaviour::creates(files::CONVERTED, TINY_PGM.to_vec()))
            .on("pgm2freeman", FakeBehaviour::stdout("0 0 00112233\n"))
            .on(
                "transformBG.sh",
                FakeBehaviour::creates(files::BACKGROUND, png_bytes(100, 100)),
            )
            .on(
                "applyMS.sh",
                FakeBehaviour::Succeed {
                    stdout: b"1 0.5\n".to_vec(),
                    creates: vec![(files::FIGURE.to_string(), b"#FIG 3.2\n".to_vec())],
                },
            )
            .on(
                "convertFig.sh",
                FakeBehaviour::creates(files::RENDERED, png_bytes(100, 100)),
            )
    }

    pub fn on(mut self, program: &str, behaviour: FakeBehaviour) -> Self {
        self.behaviours.insert(program.to_string(), behaviour);
        self
    }

    /// Shared view of the executed specs; stays valid after the executor is
    /// moved into a controller.
    pub fn executed_handle(&self) -> Arc<Mutex<Vec<CommandSpec>>> {
        Arc::clone(&self.executed)
    }

    pub fn executed(&self) -> Vec<CommandSpec> {
        self.executed.lock().unwrap().clone()
    }

    pub fn executed_programs(&self) -> Vec<String> {
        self.executed().iter().map(|s| s.program_name()).collect()
    }
}

fn write_binding(spec: &CommandSpec, binding: &StreamBinding, bytes: &[u8]) -> std::io::Result<()> {
    match binding {
        StreamBinding::WriteTo(p) => fs::write(spec.resolve(p), bytes),
        StreamBinding::AppendTo(p) => {
            let mut f = OpenOptions::new()
                .create(true)
                .append(true)
                .open(spec.resolve(p))?;
            f.write_all(bytes)
        }
        _ => Ok(()),
    }
}

fn emulate(
    spec: &CommandSpec,
    behaviour: &FakeBehaviour,
    deadline: Duration,
) -> Result<StepResult, ExecError> {
    let program = spec.program_name();
    let io_err = |source| ExecError::Wait {
        program: program.clone(),
        source,
    };

    if let StreamBinding::ReadFrom(p) = spec.get_stdin() {
        let path = spec.resolve(p);
        if !path.is_file() {
            return Err(ExecError::Stream {
                program: program.clone(),
                path,
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
            });
        }
    }

    match behaviour {
        FakeBehaviour::Succeed { stdout, creates } => {
            write_binding(spec, spec.get_stdout(), stdout).map_err(io_err)?;
            write_binding(spec, spec.get_stderr(), b"").map_err(io_err)?;
            for (name, content) in creates {
                fs::write(spec.resolve(Path::new(name)), content).map_err(io_err)?;
            }
            Ok(StepResult {
                exit_code: Some(0),
                elapsed: Duration::from_millis(1),
                produced_files: spec.output_paths().into_iter().filter(|p| p.is_file()).collect(),
            })
        }
        FakeBehaviour::Exit(code) => Ok(StepResult {
            exit_code: Some(*code),
            elapsed: Duration::from_millis(1),
            produced_files: Vec::new(),
        }),
        FakeBehaviour::Timeout => Err(ExecError::Timeout {
            program,
            after: deadline,
        }),
        FakeBehaviour::SpawnFailure => Err(ExecError::Spawn {
            program,
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "program not found"),
        }),
    }
}

impl StepExecutor for FakeExecutor {
    fn execute<'a>(
        &'a mut self,
        spec: &'a CommandSpec,
        deadline: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<StepResult, ExecError>> + Send + 'a>> {
        Box::pin(async move {
            {
                let mut guard = self.executed.lock().unwrap();
                guard.push(spec.clone());
            }

            let behaviour = self
                .behaviours
                .get(&spec.program_name())
                .cloned()
                .unwrap_or(FakeBehaviour::Succeed {
                    stdout: Vec::new(),
                    creates: Vec::new(),
                });
            emulate(spec, &behaviour, deadline)
        })
    }
}
