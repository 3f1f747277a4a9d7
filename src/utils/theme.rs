use colored::Colorize;

pub struct Theme {
    pub prompt_style: Box<dyn Fn(&str) -> String>,
    pub success_symbol: String,
    pub error_symbol: String,
}

impl Default for Theme {
    fn default() -> Self {
        Theme {
            prompt_style: Box::new(|s| s.bright_cyan().to_string()),
            success_symbol: "$".bright_green().to_string(),
            error_symbol: "$".red().to_string(),
        }
    }
}

impl Theme {
    pub fn plain() -> Self {
        Theme {
            prompt_style: Box::new(|s| s.to_string()),
            success_symbol: String::from("$"),
            error_symbol: String::from("$"),
        }
    }

    pub fn load_theme(theme_name: &str) -> Theme {
        match theme_name {
            "plain" => Theme::plain(),
            _ => Theme::default(),
        }
    }

    /// `minish:<cwd>$ `, with the `$` marking whether the last line failed.
    pub fn prompt(&self, cwd: &str, last_status: i32) -> String {
        let symbol = if last_status == 0 {
            &self.success_symbol
        } else {
            &self.error_symbol
        };
        format!("{}{} ", (self.prompt_style)(&format!("minish:{}", cwd)), symbol)
    }
}
