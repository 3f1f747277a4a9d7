use log::{debug, error, warn};
use std::error::Error;
use std::io::{self, Write};

use crate::shell::executor::error::{report, EXIT_FAILURE};
use crate::shell::executor::{ExecError, Executor};
use crate::shell::parser::Parser;
use crate::shell::readline::{ReadlineError, ReadlineManager};
use crate::utils::config::Config;
use crate::utils::path::current_dir;
use crate::utils::theme::Theme;

pub struct Shell {
    theme: Theme,
    readline: ReadlineManager,
    executor: Executor,
    last_status: i32,
}

impl Shell {
    pub fn new(config: &Config, theme: Theme) -> Result<Self, ReadlineError> {
        Ok(Self {
            theme,
            readline: ReadlineManager::new(config)?,
            executor: Executor::forking(),
            last_status: 0,
        })
    }

    /// Runs the read-execute loop and returns the session's exit status.
    pub fn run(&mut self) -> Result<i32, Box<dyn Error>> {
        debug!("minish ready");

        loop {
            io::stdout().flush()?;
            let prompt = self.theme.prompt(&current_dir(), self.last_status);

            match self.readline.readline(&prompt) {
                Ok(line) => {
                    if let Err(e) = self.handle_input(&line) {
                        error!("session aborted: {}", e);
                        report(&e);
                        return Ok(EXIT_FAILURE);
                    }
                }
                Err(ReadlineError::Eof) => {
                    debug!("EOF, leaving minish");
                    break;
                }
                Err(ReadlineError::Interrupted) => {
                    debug!("line discarded");
                }
                Err(err) => {
                    warn!("readline error: {}", err);
                    return Err(err.into());
                }
            }
        }
        Ok(0)
    }

    /// Parses and runs one line. Only a failed process primitive is an `Err`.
    fn handle_input(&mut self, line: &str) -> Result<(), ExecError> {
        let tree = match Parser::new(line).and_then(|mut parser| parser.parse_command()) {
            Ok(Some(tree)) => tree,
            Ok(None) => return Ok(()),
            Err(e) => {
                debug!("syntax error in {:?}: {}", line, e);
                report(format_args!("syntax error: {}", e));
                self.last_status = EXIT_FAILURE;
                return Ok(());
            }
        };

        self.last_status = self.executor.execute(&tree, 0, None)?;
        debug!("line finished with status {}", self.last_status);
        Ok(())
    }
}
