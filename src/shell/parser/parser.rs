use super::ast::{CommandNode, Operator, Redirect, SimpleCommand};
use super::lexer::{Lexer, RedirectOp, Token};

/// Recursive-descent parser producing a binary command tree.
///
/// Precedence, lowest first: `;`, `&`, `&&`/`||`, `|`. Every level is
/// left-associative, so `a | b | c` parses as `(a | b) | c`.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current_token: Token,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Result<Self, String> {
        let mut lexer = Lexer::new(input);
        let current_token = lexer.next_token()?;
        Ok(Parser {
            lexer,
            current_token,
        })
    }

    fn next_token(&mut self) -> Result<(), String> {
        self.current_token = self.lexer.next_token()?;
        Ok(())
    }

    /// Parses the whole line. Blank input yields `None`.
    pub fn parse_command(&mut self) -> Result<Option<CommandNode>, String> {
        if self.current_token == Token::EOF {
            return Ok(None);
        }

        let mut node = self.parse_parallel()?;
        while self.current_token == Token::Semi {
            self.next_token()?;
            if self.current_token == Token::EOF {
                break;
            }
            let right = self.parse_parallel()?;
            node = CommandNode::internal(Operator::Sequential, node, right);
        }

        match &self.current_token {
            Token::EOF => Ok(Some(node)),
            token => Err(format!("unexpected token {:?}", token)),
        }
    }

    fn parse_parallel(&mut self) -> Result<CommandNode, String> {
        let mut node = self.parse_conditional()?;
        while self.current_token == Token::Background {
            self.next_token()?;
            let right = self.parse_conditional()?;
            node = CommandNode::internal(Operator::Parallel, node, right);
        }
        Ok(node)
    }

    fn parse_conditional(&mut self) -> Result<CommandNode, String> {
        let mut node = self.parse_pipeline()?;
        loop {
            let op = match self.current_token {
                Token::And => Operator::AndThen,
                Token::Or => Operator::OrElse,
                _ => return Ok(node),
            };
            self.next_token()?;
            let right = self.parse_pipeline()?;
            node = CommandNode::internal(op, node, right);
        }
    }

    fn parse_pipeline(&mut self) -> Result<CommandNode, String> {
        let mut node = CommandNode::Leaf(self.parse_simple_command()?);
        while self.current_token == Token::Pipe {
            self.next_token()?;
            let right = CommandNode::Leaf(self.parse_simple_command()?);
            node = CommandNode::internal(Operator::Pipe, node, right);
        }
        Ok(node)
    }

    fn parse_simple_command(&mut self) -> Result<SimpleCommand, String> {
        let mut words = Vec::new();
        let mut redirects = Vec::new();

        // words and redirections, in any order
        loop {
            match &self.current_token {
                Token::Word(word) => {
                    words.push(word.clone());
                    self.next_token()?;
                }
                Token::Redirect(op) => {
                    let op = *op;
                    let path = self.parse_redirection()?;
                    redirects.push((op, path));
                }
                _ => break,
            }
        }

        if words.is_empty() && redirects.is_empty() {
            return Err(format!("expected command, found {:?}", self.current_token));
        }

        let mut command = SimpleCommand::new(words);
        for (op, path) in redirects {
            command = match op {
                RedirectOp::Input => command.with_input(path),
                RedirectOp::Output => command.with_output(Redirect::truncate(path)),
                RedirectOp::Append => command.with_output(Redirect::append(path)),
                RedirectOp::Error => command.with_error(Redirect::truncate(path)),
                RedirectOp::ErrorAppend => command.with_error(Redirect::append(path)),
                RedirectOp::Both => command
                    .with_output(Redirect::truncate(path.clone()))
                    .with_error(Redirect::truncate(path)),
                RedirectOp::BothAppend => command
                    .with_output(Redirect::append(path.clone()))
                    .with_error(Redirect::append(path)),
            };
        }
        Ok(command)
    }

    fn parse_redirection(&mut self) -> Result<String, String> {
        self.next_token()?; // operator

        match &self.current_token {
            Token::Word(filename) => {
                let filename = filename.clone();
                self.next_token()?;
                Ok(filename)
            }
            _ => Err("expected filename after redirection operator".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(clippy::unwrap_used)]
    fn parse(input: &str) -> CommandNode {
        Parser::new(input).unwrap().parse_command().unwrap().unwrap()
    }

    fn leaf(words: &[&str]) -> CommandNode {
        CommandNode::Leaf(SimpleCommand::new(words.iter().copied()))
    }

    #[test]
    fn test_simple_command() {
        assert_eq!(parse("ls -l"), leaf(&["ls", "-l"]));
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_blank_line() {
        assert_eq!(Parser::new("   ").unwrap().parse_command().unwrap(), None);
    }

    #[test]
    fn test_pipeline_is_left_associative() {
        let expected = CommandNode::internal(
            Operator::Pipe,
            CommandNode::internal(Operator::Pipe, leaf(&["ls"]), leaf(&["grep", "foo"])),
            leaf(&["wc", "-l"]),
        );
        assert_eq!(parse("ls | grep foo | wc -l"), expected);
    }

    #[test]
    fn test_precedence() {
        // a ; b & c && d | e
        let expected = CommandNode::internal(
            Operator::Sequential,
            leaf(&["a"]),
            CommandNode::internal(
                Operator::Parallel,
                leaf(&["b"]),
                CommandNode::internal(
                    Operator::AndThen,
                    leaf(&["c"]),
                    CommandNode::internal(Operator::Pipe, leaf(&["d"]), leaf(&["e"])),
                ),
            ),
        );
        assert_eq!(parse("a ; b & c && d | e"), expected);
    }

    #[test]
    fn test_and_or_share_a_level() {
        let expected = CommandNode::internal(
            Operator::OrElse,
            CommandNode::internal(Operator::AndThen, leaf(&["a"]), leaf(&["b"])),
            leaf(&["c"]),
        );
        assert_eq!(parse("a && b || c"), expected);
    }

    #[test]
    fn test_trailing_semicolon() {
        assert_eq!(parse("echo hi ;"), leaf(&["echo", "hi"]));
    }

    #[test]
    fn test_redirections() {
        let expected = SimpleCommand::new(["sort"])
            .with_input("in.txt")
            .with_output(Redirect::append("out.txt"))
            .with_error(Redirect::truncate("err.txt"));
        assert_eq!(
            parse("sort < in.txt >> out.txt 2> err.txt"),
            CommandNode::Leaf(expected)
        );
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_both_streams_redirect() {
        let CommandNode::Leaf(cmd) = parse("make &> build.log") else {
            panic!("Expected leaf");
        };
        assert!(cmd.shares_output_and_error());
        assert!(!cmd.output.unwrap().append);
    }

    #[test]
    fn test_redirect_only_is_empty_leaf() {
        let CommandNode::Leaf(cmd) = parse("> touched") else {
            panic!("Expected leaf");
        };
        assert!(cmd.verb.is_empty());
        assert_eq!(cmd.output, Some(Redirect::truncate("touched")));
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_syntax_errors() {
        for line in ["| ls", "ls &&", "ls >", "ls & ", "a ;; b"] {
            let result = Parser::new(line).unwrap().parse_command();
            assert!(result.is_err(), "expected error for {:?}", line);
        }
    }
}
