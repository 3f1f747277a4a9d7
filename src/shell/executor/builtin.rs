use std::io::{self, Write};
use std::path::Path;
use std::process;

use log::debug;

use super::context::ProcessContext;
use super::error::{describe_io, report, EXIT_FAILURE};
use super::redirect::OpenedRedirects;
use crate::shell::parser::ast::SimpleCommand;

/// Commands that run inside the shell process because they change state
/// later commands must observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Cd,
    Exit,
    Assign,
}

impl Builtin {
    pub fn lookup(command: &SimpleCommand) -> Option<Self> {
        match command.verb.as_str() {
            "cd" => Some(Builtin::Cd),
            "exit" | "quit" => Some(Builtin::Exit),
            verb if verb.contains('=') && command.params().is_empty() => Some(Builtin::Assign),
            _ => None,
        }
    }

    /// Runs the builtin with the leaf's redirections attached for its
    /// duration. Targets are created or truncated even when the builtin
    /// itself writes nothing.
    pub fn run(self, command: &SimpleCommand) -> i32 {
        let redirects = match OpenedRedirects::open(command) {
            Ok(redirects) => redirects,
            Err(e) => {
                report(&e);
                return EXIT_FAILURE;
            }
        };
        let _stdio = match redirects.attach_scoped() {
            Ok(guard) => guard,
            Err(e) => {
                report(format_args!("{}: {}", command.verb, e.desc()));
                return EXIT_FAILURE;
            }
        };

        match self {
            Builtin::Cd => builtin_cd(command.params()),
            Builtin::Exit => builtin_exit(command.params()),
            Builtin::Assign => builtin_assign(&command.verb),
        }
    }
}

fn builtin_cd(params: &[String]) -> i32 {
    let path = match params {
        [path] => path,
        [] => {
            report("cd: too few arguments");
            return EXIT_FAILURE;
        }
        _ => {
            report("cd: too many arguments");
            return EXIT_FAILURE;
        }
    };

    let expanded = shellexpand::tilde(path);
    match ProcessContext::change_dir(Path::new(expanded.as_ref())) {
        Ok(()) => {
            debug!("cd -> {}", expanded);
            0
        }
        Err(e) => {
            report(format_args!("cd: {}: {}", path, describe_io(&e)));
            EXIT_FAILURE
        }
    }
}

fn builtin_exit(params: &[String]) -> i32 {
    if !params.is_empty() {
        report("exit: too many arguments");
        return EXIT_FAILURE;
    }
    debug!("exit requested by pid {}", process::id());
    let _ = io::stdout().flush();
    process::exit(0);
}

/// `NAME=VALUE`. A missing value assigns the empty string.
fn builtin_assign(word: &str) -> i32 {
    let Some((name, value)) = word.split_once('=') else {
        report(format_args!("{}: not an assignment", word));
        return EXIT_FAILURE;
    };
    if name.is_empty() || name.contains('\0') || value.contains('\0') {
        report(format_args!("{}: invalid assignment", word));
        return EXIT_FAILURE;
    }
    debug!("set {}={:?}", name, value);
    ProcessContext::set_var(name, value);
    0
}
