use std::iter::Peekable;
use std::str::Chars;

#[derive(Debug, PartialEq, Clone)]
pub enum Token {
    Word(String),
    Pipe,
    Or,
    And,
    Background,
    Semi,
    Redirect(RedirectOp),
    EOF,
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum RedirectOp {
    Input,       // <
    Output,      // >
    Append,      // >>
    Error,       // 2>
    ErrorAppend, // 2>>
    Both,        // &>
    BothAppend,  // &>>
}

pub struct Lexer<'a> {
    input: Peekable<Chars<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input: input.chars().peekable(),
        }
    }

    pub fn next_token(&mut self) -> Result<Token, String> {
        self.skip_whitespace();

        let token = match self.peek_char() {
            None => Token::EOF,
            Some(c) => match c {
                '|' => {
                    self.read_char();
                    if self.eat('|') {
                        Token::Or
                    } else {
                        Token::Pipe
                    }
                }
                ';' => {
                    self.read_char();
                    Token::Semi
                }
                '&' => {
                    self.read_char();
                    if self.eat('&') {
                        Token::And
                    } else if self.eat('>') {
                        Token::Redirect(self.append_or(RedirectOp::Both, RedirectOp::BothAppend))
                    } else {
                        Token::Background
                    }
                }
                '<' => {
                    self.read_char();
                    Token::Redirect(RedirectOp::Input)
                }
                '>' => {
                    self.read_char();
                    Token::Redirect(self.append_or(RedirectOp::Output, RedirectOp::Append))
                }
                '2' if self.second_char() == Some('>') => {
                    self.read_char();
                    self.read_char();
                    Token::Redirect(self.append_or(RedirectOp::Error, RedirectOp::ErrorAppend))
                }
                _ => self.read_word()?,
            },
        };
        Ok(token)
    }

    fn read_char(&mut self) -> Option<char> {
        self.input.next()
    }

    fn peek_char(&mut self) -> Option<char> {
        self.input.peek().copied()
    }

    fn second_char(&self) -> Option<char> {
        let mut ahead = self.input.clone();
        ahead.next();
        ahead.next()
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek_char() == Some(expected) {
            self.read_char();
            true
        } else {
            false
        }
    }

    fn append_or(&mut self, plain: RedirectOp, append: RedirectOp) -> RedirectOp {
        if self.eat('>') {
            append
        } else {
            plain
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek_char() {
            if !c.is_whitespace() {
                break;
            }
            self.read_char();
        }
    }

    fn read_word(&mut self) -> Result<Token, String> {
        let mut word = String::new();

        while let Some(c) = self.peek_char() {
            if c.is_whitespace() || ";<>|&".contains(c) {
                break;
            }
            self.read_char();
            match c {
                '\'' | '"' => self.read_quoted(c, &mut word)?,
                '\\' => {
                    if let Some(escaped) = self.read_char() {
                        word.push(escaped);
                    }
                }
                c => word.push(c),
            }
        }

        Ok(Token::Word(word))
    }

    // Single quotes are literal; double quotes honour backslash escapes.
    fn read_quoted(&mut self, quote: char, word: &mut String) -> Result<(), String> {
        let mut escaped = false;

        while let Some(c) = self.read_char() {
            match (escaped, c) {
                (true, _) => {
                    word.push(c);
                    escaped = false;
                }
                (false, '\\') if quote == '"' => escaped = true,
                (false, c) if c == quote => return Ok(()),
                (false, c) => word.push(c),
            }
        }

        Err(format!("unterminated {} quote", quote))
    }
}
