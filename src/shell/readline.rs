use crate::utils::config::Config;
pub use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{Config as RLConfig, Editor};

pub struct ReadlineManager {
    editor: Editor<(), DefaultHistory>,
}

impl ReadlineManager {
    pub fn new(config: &Config) -> Result<Self, ReadlineError> {
        let rl_config = RLConfig::builder()
            .auto_add_history(true)
            .history_ignore_space(true)
            .edit_mode(config.edit_mode())
            .build();

        let editor = Editor::with_config(rl_config)?;
        Ok(Self { editor })
    }

    pub fn readline(&mut self, prompt: &str) -> Result<String, ReadlineError> {
        self.editor.readline(prompt)
    }
}
