// src/pipeline/command_log.rs

use std::fs;
use std::io;
use std::path::Path;

use crate::exec::CommandSpec;

/// Append-only record of the command lines a run built or executed, in order.
///
/// Entries are rendered from the same [`CommandSpec`] that is handed to the
/// executor, so a logged line is exactly what ran.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandLog {
    entries: Vec<String>,
}

impl CommandLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, spec: &CommandSpec) {
        self.entries.push(spec.command_line());
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// One line per entry, newline-terminated.
    pub fn to_text(&self) -> String {
        let mut text = String::new();
        for entry in &self.entries {
            text.push_str(entry);
            text.push('\n');
        }
        text
    }

    pub fn write_to(&self, path: &Path) -> io::Result<()> {
        fs::write(path, self.to_text())
    }
}
