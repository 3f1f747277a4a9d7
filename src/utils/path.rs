use std::env;

use log::error;

/// The working directory for the prompt, or an empty string if it is gone.
pub fn current_dir() -> String {
    match env::current_dir() {
        Ok(dir) => dir.to_string_lossy().into_owned(),
        Err(e) => {
            error!("prompt: current_dir error: {}", e);
            String::new()
        }
    }
}
