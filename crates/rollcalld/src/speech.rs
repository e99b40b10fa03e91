//! Subprocess speech backend for alert announcements.

use crate::announcer::{AlertError, AlertSink};
use std::process::Command;

/// Runs an external speech command once per phrase (e.g. `espeak`),
/// with the phrase appended as the final argument. The subprocess wait
/// happens on the announcer thread.
pub struct CommandSpeech {
    program: String,
    args: Vec<String>,
}

impl CommandSpeech {
    /// Parse a command line of the form `program arg1 arg2`. Returns
    /// `None` for an empty command line.
    pub fn new(command_line: &str) -> Option<Self> {
        let mut parts = command_line.split_whitespace();
        let program = parts.next()?.to_string();
        Some(Self {
            program,
            args: parts.map(String::from).collect(),
        })
    }
}

impl AlertSink for CommandSpeech {
    fn speak(&mut self, phrase: &str) -> Result<(), AlertError> {
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(phrase)
            .status()?;
        if status.success() {
            Ok(())
        } else {
            Err(AlertError::Exit(status))
        }
    }
}
