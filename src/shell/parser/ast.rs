use std::fmt;

/// A parsed command line. Built once by the parser and only read afterwards.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandNode {
    Leaf(SimpleCommand),
    Internal {
        op: Operator,
        left: Box<CommandNode>,
        right: Box<CommandNode>,
    },
}

impl CommandNode {
    pub fn internal(op: Operator, left: CommandNode, right: CommandNode) -> Self {
        CommandNode::Internal {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Short label used in log records.
    pub fn label(&self) -> String {
        match self {
            CommandNode::Leaf(cmd) => format!("leaf `{}`", cmd.verb),
            CommandNode::Internal { op, .. } => format!("op `{}`", op),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `a ; b`
    Sequential,
    /// `a & b`
    Parallel,
    /// `a && b`
    AndThen,
    /// `a || b`
    OrElse,
    /// `a | b`
    Pipe,
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Operator::Sequential => ";",
            Operator::Parallel => "&",
            Operator::AndThen => "&&",
            Operator::OrElse => "||",
            Operator::Pipe => "|",
        };
        f.write_str(symbol)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub path: String,
    pub append: bool,
}

impl Redirect {
    pub fn truncate(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            append: false,
        }
    }

    pub fn append(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            append: true,
        }
    }
}

/// One program invocation. `argv[0]` is the verb itself.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SimpleCommand {
    pub verb: String,
    pub argv: Vec<String>,
    pub input: Option<String>,
    pub output: Option<Redirect>,
    pub error: Option<Redirect>,
}

impl SimpleCommand {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let argv: Vec<String> = words.into_iter().map(Into::into).collect();
        Self {
            verb: argv.first().cloned().unwrap_or_default(),
            argv,
            ..Self::default()
        }
    }

    /// Arguments after the verb.
    pub fn params(&self) -> &[String] {
        self.argv.get(1..).unwrap_or(&[])
    }

    /// Output and error point at the same file and must share one descriptor.
    pub fn shares_output_and_error(&self) -> bool {
        match (&self.output, &self.error) {
            (Some(out), Some(err)) => out.path == err.path,
            _ => false,
        }
    }

    pub fn with_input(mut self, path: impl Into<String>) -> Self {
        self.input = Some(path.into());
        self
    }

    pub fn with_output(mut self, redirect: Redirect) -> Self {
        self.output = Some(redirect);
        self
    }

    pub fn with_error(mut self, redirect: Redirect) -> Self {
        self.error = Some(redirect);
        self
    }
}
