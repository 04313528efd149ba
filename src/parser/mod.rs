// Author: Dustin Pilgrim
// License: MIT

use crate::ast::{Body, Pos};
use crate::lexer::{Lexer, Token};
use crate::ConfigError;

mod document;
mod expression;

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    peek: Option<(Token, Pos)>,
}

impl<'a> Parser<'a> {
    pub fn new(file: impl Into<String>, input: &'a str) -> Result<Self, ConfigError> {
        let mut lexer = Lexer::new(file, input);
        let first = lexer.next_token()?;
        let peek = Some((first, lexer.token_pos()));
        Ok(Self { lexer, peek })
    }

    pub(crate) fn bump(&mut self) -> Result<Token, ConfigError> {
        let (curr, _) = self.peek.take().ok_or_else(|| ConfigError::UnexpectedEof {
            message: "Unexpected end of input".into(),
            file: self.lexer.file().to_string(),
            line: self.lexer.line(),
            column: self.lexer.column(),
            hint: None,
            code: Some(201),
        })?;
        let next = self.lexer.next_token()?;
        self.peek = Some((next, self.lexer.token_pos()));
        Ok(curr)
    }

    pub(crate) fn peek(&self) -> Option<&Token> {
        self.peek.as_ref().map(|(tok, _)| tok)
    }

    /// Position of the token [`Parser::peek`] returns.
    pub(crate) fn pos(&self) -> Pos {
        match &self.peek {
            Some((_, pos)) => pos.clone(),
            None => Pos::new(self.lexer.file(), self.lexer.line(), self.lexer.column()),
        }
    }

    pub(crate) fn expect(&mut self, expected: Token) -> Result<Token, ConfigError> {
        if self.peek() != Some(&expected) {
            let found = self.peek().cloned().unwrap_or(Token::Eof);
            return Err(self.syntax_error(
                format!("Expected {:?}, got {:?}", expected, found),
                Some("Check your syntax"),
                202,
            ));
        }
        self.bump()
    }

    pub(crate) fn skip_newlines(&mut self) -> Result<(), ConfigError> {
        while let Some(Token::Newline) = self.peek() {
            self.bump()?;
        }
        Ok(())
    }

    /// Syntax error located at the upcoming token.
    pub(crate) fn syntax_error(&self, message: impl Into<String>, hint: Option<&str>, code: u32) -> ConfigError {
        let pos = self.pos();
        ConfigError::SyntaxError {
            message: message.into(),
            file: pos.file,
            line: pos.line,
            column: pos.column,
            hint: hint.map(String::from),
            code: Some(code),
        }
    }

    pub(crate) fn invalid_token(&self, hint: &str, code: u32) -> ConfigError {
        let pos = self.pos();
        ConfigError::InvalidToken {
            token: format!("{:?}", self.peek().cloned().unwrap_or(Token::Eof)),
            file: pos.file,
            line: pos.line,
            column: pos.column,
            hint: Some(hint.into()),
            code: Some(code),
        }
    }

    /// Parse a whole file into its top-level body.
    pub fn parse_body(&mut self) -> Result<Body, ConfigError> {
        document::parse_file(self)
    }

    /// Parse a single standalone expression.
    pub fn parse_expression(&mut self) -> Result<crate::ast::Expr, ConfigError> {
        self.skip_newlines()?;
        let expr = expression::parse_expr(self)?;
        self.skip_newlines()?;
        if self.peek() != Some(&Token::Eof) {
            return Err(self.invalid_token("Unexpected token after expression", 214));
        }
        Ok(expr)
    }
}
