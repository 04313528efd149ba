// Author: Dustin Pilgrim
// License: MIT

use std::str::Chars;

use crate::ast::Pos;
use crate::ConfigError;

mod scanner;
mod tokenizer;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // --- literals ---
    Ident(String),
    String(String),
    Number(f64),
    Bool(bool),
    Null,

    // --- structure ---
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    LParen,
    RParen,

    // --- symbols ---
    Equals,
    Colon,
    Comma,
    Dot,

    // --- layout ---
    Newline,
    Eof,
}

pub struct Lexer<'a> {
    input: Chars<'a>,
    peek: Option<char>,
    file: String,
    line: usize,
    column: usize,
    token_line: usize,
    token_column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(file: impl Into<String>, input: &'a str) -> Self {
        let mut lexer = Lexer {
            input: input.chars(),
            peek: None,
            file: file.into(),
            line: 1,
            column: 0,
            token_line: 1,
            token_column: 1,
        };
        lexer.peek = lexer.input.next();
        lexer
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn column(&self) -> usize {
        self.column
    }

    /// Where the most recently returned token starts.
    pub fn token_pos(&self) -> Pos {
        Pos::new(self.file.clone(), self.token_line, self.token_column)
    }

    /// Next token; newlines are significant and come back as [`Token::Newline`].
    pub fn next_token(&mut self) -> Result<Token, ConfigError> {
        tokenizer::next_token(self)
    }
}
