////////////////////////////////////////////////////////////////////////////////////
// Copyright (c) 2019 DasEtwas - All Rights Reserved                               /
//      Unauthorized copying of this file, via any medium is strictly prohibited   /
//      Proprietary and confidential                                               /
////////////////////////////////////////////////////////////////////////////////////

//! Tokenizer for the one-line C declarations found in the reference tables.

use std::fmt;

use crate::error::{Error, Result};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TokenKind {
    Identifier,
    LiteralHexadecimal,
    LiteralDecimal,
    LiteralString,
    Asterisk,
    Equal,
    Semicolon,
    LeftParen,
    RightParen,
    Comma,
    Hashtag,
    Pipe,
    LineComment,
    BlockComment,
    LeftBracket,
    RightBracket,
    EndOfInput,
}

impl TokenKind {
    pub fn is_comment(self) -> bool {
        self == TokenKind::LineComment || self == TokenKind::BlockComment
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>) -> Token {
        Token { kind, text: text.into() }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::EndOfInput => write!(f, "end of input"),
            kind => write!(f, "{:?} '{}'", kind, self.text),
        }
    }
}

fn single_char_token(c: char) -> Option<TokenKind> {
    Some(match c {
        '*' => TokenKind::Asterisk,
        '=' => TokenKind::Equal,
        ';' => TokenKind::Semicolon,
        '(' => TokenKind::LeftParen,
        ')' => TokenKind::RightParen,
        ',' => TokenKind::Comma,
        '#' => TokenKind::Hashtag,
        '|' => TokenKind::Pipe,
        '[' => TokenKind::LeftBracket,
        ']' => TokenKind::RightBracket,
        _ => return None,
    })
}

/// Splits one declaration line into tokens. The result always ends with `EndOfInput`.
pub fn tokenize(line: &str) -> Result<Vec<Token>> {
    let mut lexer = Lexer::new(line);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let done = token.kind == TokenKind::EndOfInput;
        tokens.push(token);
        if done {
            return Ok(tokens);
        }
    }
}

pub struct Lexer<'a> {
    line: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(line: &'a str) -> Lexer<'a> {
        Lexer {
            line,
            chars: line.chars().collect(),
            pos: 0,
        }
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn follows(&self, literal: &str) -> bool {
        literal.chars().enumerate().all(|(i, c)| self.peek_at(i) == Some(c))
    }

    fn read_while<P>(&mut self, predicate: P) -> String
    where P: Fn(char) -> bool {
        let start = self.pos;
        while self.peek_at(0).map_or(false, &predicate) {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    fn skip_spaces(&mut self) {
        self.read_while(char::is_whitespace);
    }

    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_spaces();

        let next = match self.peek_at(0) {
            Some(c) => c,
            None => return Ok(Token::new(TokenKind::EndOfInput, "")),
        };

        if self.follows("//") {
            let comment = self.read_while(|c| c != '\n');
            return Ok(Token::new(TokenKind::LineComment, comment));
        }

        if self.follows("/*") {
            return self.read_block_comment();
        }

        let negative_number = next == '-' && self.peek_at(1).map_or(false, |c| c.is_ascii_digit());
        if next.is_ascii_digit() || negative_number {
            return Ok(self.read_number());
        }

        if next == '"' {
            return self.read_string();
        }

        if next.is_alphabetic() || next == '_' {
            let word = self.read_while(|c| c.is_alphanumeric() || c == '_');
            return Ok(Token::new(TokenKind::Identifier, word));
        }

        if let Some(kind) = single_char_token(next) {
            self.pos += 1;
            return Ok(Token::new(kind, next.to_string()));
        }

        Err(Error::UnexpectedCharacter {
            ch: next,
            column: self.pos,
            line: self.line.to_string(),
        })
    }

    fn read_block_comment(&mut self) -> Result<Token> {
        let start = self.pos;
        self.pos += 2;
        while self.pos < self.chars.len() {
            if self.follows("*/") {
                self.pos += 2;
                let comment: String = self.chars[start..self.pos].iter().collect();
                return Ok(Token::new(TokenKind::BlockComment, comment));
            }
            self.pos += 1;
        }
        Err(Error::UnterminatedComment { line: self.line.to_string() })
    }

    fn read_number(&mut self) -> Token {
        if self.follows("0x") {
            self.pos += 2;
            let digits = self.read_while(|c| c.is_ascii_hexdigit());
            return Token::new(TokenKind::LiteralHexadecimal, format!("0x{}", digits));
        }

        let mut value = String::new();
        if self.peek_at(0) == Some('-') {
            self.pos += 1;
            value.push('-');
        }
        value += &self.read_while(|c| c.is_ascii_digit());
        Token::new(TokenKind::LiteralDecimal, value)
    }

    fn read_string(&mut self) -> Result<Token> {
        self.pos += 1;
        let content = self.read_while(|c| c != '"');
        if self.peek_at(0) != Some('"') {
            return Err(Error::UnterminatedString { line: self.line.to_string() });
        }
        self.pos += 1;
        Ok(Token::new(TokenKind::LiteralString, content))
    }
}
