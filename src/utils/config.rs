use dotenv::dotenv;
use rustyline::EditMode;
use std::env;
use std::path::PathBuf;

pub struct Config {
    /// Log target name; matches the crate name so `filter(Some(name))` applies.
    pub name: String,
    pub logger_level: String,
    pub logger_dir: PathBuf,
    pub editor_mode: String,
    pub theme: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            name: String::from(env!("CARGO_PKG_NAME")),
            logger_level: String::from("info"),
            logger_dir: Self::config_dir().join("logs"),
            editor_mode: String::from("emacs"),
            theme: String::from("default"),
        }
    }
}

impl Config {
    fn config_dir() -> PathBuf {
        match env::var("HOME") {
            Ok(home) => PathBuf::from(home).join(".config/minish"),
            Err(_) => PathBuf::from("tmp"),
        }
    }

    /// Defaults, then the dotenv file, then the process environment.
    pub fn new() -> Self {
        if cfg!(debug_assertions) {
            dotenv::from_filename(".env.development").ok();
        } else {
            dotenv().ok();
        }

        let mut config = Config::default();

        if let Ok(level) = env::var("MINISH_LOG_LEVEL") {
            config.logger_level = level;
        }

        if let Ok(dir) = env::var("MINISH_LOG_DIR") {
            config.logger_dir = PathBuf::from(dir);
        }

        if let Ok(editor) = env::var("MINISH_EDITOR") {
            config.editor_mode = editor;
        }

        if let Ok(theme) = env::var("MINISH_THEME") {
            config.theme = theme;
        }

        config
    }

    pub fn edit_mode(&self) -> EditMode {
        match self.editor_mode.to_lowercase().as_str() {
            "vi" => EditMode::Vi,
            _ => EditMode::Emacs,
        }
    }
}
