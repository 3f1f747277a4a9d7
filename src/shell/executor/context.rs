use std::env;
use std::io;
use std::path::Path;
#[cfg(test)]
use std::{collections::HashMap, ffi::OsString, path::PathBuf};

/// Process-wide state the builtins mutate: the working directory and the
/// environment. Children inherit both at fork time.
pub struct ProcessContext;

impl ProcessContext {
    pub fn change_dir(path: &Path) -> io::Result<()> {
        env::set_current_dir(path)
    }

    pub fn set_var(name: &str, value: &str) {
        env::set_var(name, value);
    }
}

/// A copy of cwd + environment that can be put back later.
#[cfg(test)]
#[derive(Debug, Clone)]
pub struct Snapshot {
    cwd: Option<PathBuf>,
    vars: Vec<(OsString, OsString)>,
}

#[cfg(test)]
impl Snapshot {
    pub fn capture() -> Self {
        Self {
            cwd: env::current_dir().ok(),
            vars: env::vars_os().collect(),
        }
    }

    /// Puts cwd and environment back, touching only variables that changed.
    pub fn restore(&self) {
        let saved: HashMap<&OsString, &OsString> = self.vars.iter().map(|(k, v)| (k, v)).collect();
        for (key, value) in env::vars_os() {
            match saved.get(&key) {
                None => env::remove_var(&key),
                Some(&old) if *old != value => env::set_var(&key, old),
                Some(_) => {}
            }
        }
        for (key, value) in &self.vars {
            if env::var_os(key).is_none() {
                env::set_var(key, value);
            }
        }
        if let Some(cwd) = &self.cwd {
            let _ = env::set_current_dir(cwd);
        }
    }
}
