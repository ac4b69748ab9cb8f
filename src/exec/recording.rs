//! In-memory runner for tests

use super::{CommandOutput, CommandRunner, CommandSpec};
use crate::error::{SetupError, SetupResult};

/// Records every command and answers from canned responses
///
/// A response matches when the command line starts with its prefix
/// (program and leading arguments). Unmatched commands succeed with empty
/// output.
#[derive(Debug, Default)]
pub struct RecordingRunner {
    pub commands: Vec<CommandSpec>,
    responses: Vec<(Vec<String>, CommandOutput)>,
    missing: Vec<String>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer commands starting with `prefix` with `output`
    pub fn respond(mut self, prefix: &[&str], output: CommandOutput) -> Self {
        self.responses
            .push((prefix.iter().map(|s| s.to_string()).collect(), output));
        self
    }

    /// Pretend `program` is not installed
    pub fn without_program(mut self, program: &str) -> Self {
        self.missing.push(program.to_string());
        self
    }

    /// Recorded command lines, as displayed
    pub fn lines(&self) -> Vec<String> {
        self.commands.iter().map(|c| c.to_string()).collect()
    }

    /// Recorded commands whose line starts with `prefix`
    pub fn matching(&self, prefix: &[&str]) -> Vec<&CommandSpec> {
        self.commands
            .iter()
            .filter(|c| starts_with(c, prefix))
            .collect()
    }
}

fn starts_with<S: AsRef<str>>(spec: &CommandSpec, prefix: &[S]) -> bool {
    let mut words = std::iter::once(spec.program()).chain(spec.get_args().iter().map(String::as_str));
    prefix.iter().all(|p| words.next() == Some(p.as_ref()))
}

impl CommandRunner for RecordingRunner {
    fn run(&mut self, spec: &CommandSpec) -> SetupResult<CommandOutput> {
        self.commands.push(spec.clone());

        if self.missing.iter().any(|p| p == spec.program()) {
            return Err(SetupError::Io(format!(
                "Failed to start `{}`: No such file or directory",
                spec.program()
            )));
        }

        let output = self
            .responses
            .iter()
            .find(|(prefix, _)| starts_with(spec, prefix.as_slice()))
            .map(|(_, output)| output.clone())
            .unwrap_or_else(|| CommandOutput::ok(""));
        Ok(output)
    }
}
