//! Line input for interactive chat using rustyline
//!
//! Provides editing and persistent history for `blogctl llm chat`.

use rustyline::error::ReadlineError;
use rustyline::history::History;
use rustyline::DefaultEditor;
use std::path::PathBuf;

use crate::errors::{ClientError, Result};

/// History file name inside the state directory
pub const HISTORY_FILE: &str = "chat_history";

const DEFAULT_PROMPT: &str = "you> ";

/// Words that leave the chat loop
const EXIT_COMMANDS: &[&str] = &["/exit", "/quit"];

/// Readline wrapper with optional on-disk history
pub struct InputHandler {
    editor: DefaultEditor,
    history_path: Option<PathBuf>,
    prompt: String,
}

impl InputHandler {
    pub fn new() -> Result<Self> {
        Ok(InputHandler {
            editor: new_editor()?,
            history_path: None,
            prompt: DEFAULT_PROMPT.to_string(),
        })
    }

    /// Create input handler with persistent history
    pub fn with_history(history_file: PathBuf) -> Result<Self> {
        let mut editor = new_editor()?;

        if history_file.exists() {
            let _ = editor.load_history(&history_file);
        }

        Ok(InputHandler {
            editor,
            history_path: Some(history_file),
            prompt: DEFAULT_PROMPT.to_string(),
        })
    }

    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.prompt = prompt.into();
    }

    /// Read one trimmed line
    ///
    /// `Ok(None)` on Ctrl-D or Ctrl-C, which both end the session.
    pub fn read_line(&mut self) -> Result<Option<String>> {
        match self.editor.readline(&self.prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if !trimmed.is_empty() {
                    let _ = self.editor.add_history_entry(trimmed);
                }
                Ok(Some(trimmed.to_string()))
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(None),
            Err(err) => Err(ClientError::Generic(format!("Readline error: {}", err))),
        }
    }

    pub fn save_history(&mut self) -> Result<()> {
        if let Some(ref path) = self.history_path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            self.editor
                .save_history(path)
                .map_err(|e| ClientError::Generic(format!("Failed to save history: {}", e)))?;
        }
        Ok(())
    }

    pub fn history_len(&self) -> usize {
        self.editor.history().len()
    }
}

/// Whether a line asks to leave the chat
pub fn is_exit_command(line: &str) -> bool {
    EXIT_COMMANDS.contains(&line.trim())
}

fn new_editor() -> Result<DefaultEditor> {
    DefaultEditor::new().map_err(|e| ClientError::Generic(format!("Failed to open terminal: {}", e)))
}
