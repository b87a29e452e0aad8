////////////////////////////////////////////////////////////////////////////////////
// Copyright (c) 2019 DasEtwas - All Rights Reserved                               /
//      Unauthorized copying of this file, via any medium is strictly prohibited   /
//      Proprietary and confidential                                               /
////////////////////////////////////////////////////////////////////////////////////

//! Declaration parsers.
//!
//! Every grammar rule is a free function over a [`Cursor`]. The cursor has one token of lookahead
//! and can step back explicitly with [`Cursor::regress`].

mod functions;
mod macros;
mod typedefs;

pub use self::functions::parse_function;
pub use self::macros::parse_macro;
pub use self::typedefs::{parse_struct_field, parse_type_def};

use crate::error::{Error, Result};
use crate::lexer::{Token, TokenKind};
use crate::registry::{CType, Parameter};

const TYPE_QUALIFIERS: &[&str] = &["unsigned", "const"];

pub struct Cursor<'a> {
    tokens: &'a [Token],
    /// Index of the next token to consume.
    position: usize,
    line: &'a str,
}

impl<'a> Cursor<'a> {
    pub fn new(tokens: &'a [Token], line: &'a str) -> Cursor<'a> {
        Cursor { tokens, position: 0, line }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.position)
    }

    /// The tokens after the cursor, excluding the terminating `EndOfInput`.
    pub fn remaining(&self) -> &'a [Token] {
        let end = match self.tokens.last() {
            Some(t) if t.kind == TokenKind::EndOfInput => self.tokens.len() - 1,
            _ => self.tokens.len(),
        };
        &self.tokens[self.position.min(end)..end]
    }

    pub fn regress(&mut self) {
        assert!(self.position > 0, "cannot regress before the first token");
        self.position -= 1;
    }

    pub fn consume(&mut self, kind: TokenKind) -> Result<&'a Token> {
        self.consume_where(kind, |_| true, None)
    }

    /// Consumes an identifier with exactly the text `word`.
    pub fn consume_word(&mut self, word: &str) -> Result<&'a Token> {
        self.consume_where(TokenKind::Identifier, |t| t.text == word, Some(word))
    }

    fn consume_where<P>(&mut self, kind: TokenKind, predicate: P, wanted: Option<&str>) -> Result<&'a Token>
    where P: Fn(&Token) -> bool {
        match self.peek() {
            Some(token) if token.kind == kind && predicate(token) => {
                self.position += 1;
                Ok(token)
            },
            found => Err(Error::Grammar {
                expected: match wanted {
                    Some(text) => format!("'{}'", text),
                    None => format!("{:?}", kind),
                },
                found: found.map_or_else(|| "end of tokens".to_string(), |t| t.to_string()),
                line: self.line.to_string(),
            }),
        }
    }

    pub fn try_consume(&mut self, kind: TokenKind) -> Option<&'a Token> {
        self.try_consume_where(kind, |_| true)
    }

    pub fn try_consume_where<P>(&mut self, kind: TokenKind, predicate: P) -> Option<&'a Token>
    where P: Fn(&Token) -> bool {
        match self.peek() {
            Some(token) if token.kind == kind && predicate(token) => {
                self.position += 1;
                Some(token)
            },
            _ => None,
        }
    }

    pub fn follows(&self, kind: TokenKind) -> bool {
        self.peek().map_or(false, |t| t.kind == kind)
    }

    /// Fails unless everything but `EndOfInput` has been consumed.
    pub fn expect_end(&mut self) -> Result<()> {
        self.consume(TokenKind::EndOfInput).map(|_| ())
    }
}

fn parse_array_size(token: &Token) -> Option<i64> {
    match token.kind {
        TokenKind::LiteralDecimal => token.text.parse().ok(),
        TokenKind::LiteralHexadecimal => i64::from_str_radix(&token.text[2..], 16).ok(),
        _ => None,
    }
}

/// `qualifier* identifier '*'*`, followed by a peek at a possible `name [ size? ]` suffix.
///
/// When the suffix is present the returned type is marked as an array, and the cursor is put back
/// in front of `name` so the caller reads the declared name itself.
pub fn parse_type(cursor: &mut Cursor) -> Result<CType> {
    let mut qualifiers = Vec::new();
    while let Some(q) = cursor.try_consume_where(TokenKind::Identifier, |t| TYPE_QUALIFIERS.contains(&t.text.as_str())) {
        qualifiers.push(q.text.as_str());
    }

    let base = cursor.consume(TokenKind::Identifier)?;

    let mut pointer_depth = 0;
    while cursor.try_consume(TokenKind::Asterisk).is_some() {
        pointer_depth += 1;
    }

    let mut is_array = false;
    let mut array_size = -1;
    if cursor.try_consume(TokenKind::Identifier).is_some() {
        let mut steps_back = 1;
        if cursor.try_consume(TokenKind::LeftBracket).is_some() {
            steps_back += 1;
            if let Some(size) = cursor.peek().and_then(parse_array_size) {
                cursor.position += 1;
                array_size = size;
                steps_back += 1;
            }
            cursor.consume(TokenKind::RightBracket)?;
            steps_back += 1;
            is_array = true;
        }
        for _ in 0..steps_back {
            cursor.regress();
        }
    }

    let mut name = String::new();
    for q in &qualifiers {
        name.push_str(q);
        name.push(' ');
    }
    name.push_str(&base.text);
    name.push_str(&"*".repeat(pointer_depth));

    Ok(CType {
        name,
        is_array,
        array_size: if is_array { array_size } else { -1 },
    })
}

/// `identifier ( '[' size? ']' )?`: the declared name, with any array suffix skipped.
pub fn parse_identifier(cursor: &mut Cursor) -> Result<String> {
    let name = cursor.consume(TokenKind::Identifier)?.text.clone();
    if cursor.try_consume(TokenKind::LeftBracket).is_some() {
        if cursor.peek().and_then(parse_array_size).is_some() {
            cursor.position += 1;
        }
        cursor.consume(TokenKind::RightBracket)?;
    }
    Ok(name)
}

/// `( type identifier? ( ',' type identifier? )* )?` up to and including the closing `)`.
///
/// A lone `void` stands for an empty list.
pub fn parse_parameters(cursor: &mut Cursor) -> Result<Vec<Parameter>> {
    let mut parameters = Vec::new();
    while cursor.try_consume(TokenKind::RightParen).is_none() {
        if !parameters.is_empty() {
            cursor.consume(TokenKind::Comma)?;
        }

        let ty = parse_type(cursor)?;
        let name = if cursor.follows(TokenKind::RightParen) || cursor.follows(TokenKind::Comma) {
            String::new()
        } else {
            parse_identifier(cursor)?
        };
        parameters.push(Parameter { name, ty });
    }

    if parameters.len() == 1 && parameters[0].ty.is_void() && parameters[0].name.is_empty() {
        parameters.clear();
    }
    Ok(parameters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn with_cursor<T, F>(line: &str, rule: F) -> (T, usize)
    where F: FnOnce(&mut Cursor) -> Result<T> {
        let tokens = tokenize(line).unwrap();
        let mut cursor = Cursor::new(&tokens, line);
        let result = rule(&mut cursor).unwrap();
        (result, cursor.position())
    }

    #[test]
    fn type_expressions() {
        let cases = [
            ("int", "int", 1),
            ("const char* title", "const char*", 3),
            ("unsigned short** ramp", "unsigned short**", 4),
            ("const unsigned char *pixels", "const unsigned char*", 4),
            ("GLFWwindow* window", "GLFWwindow*", 2),
        ];
        for (input, name, position) in &cases {
            let (ty, pos) = with_cursor(input, parse_type);
            assert_eq!(ty.name, *name, "{}", input);
            assert!(!ty.is_array, "{}", input);
            assert_eq!(ty.array_size, -1, "{}", input);
            assert_eq!(pos, *position, "{}", input);
        }
    }

    #[test]
    fn array_suffix_is_detected_and_given_back() {
        let (ty, pos) = with_cursor("int data[4]", parse_type);
        assert_eq!(ty, CType::array("int", 4));
        assert_eq!(pos, 1);

        let (name, pos) = with_cursor("int data[4]", |c| {
            parse_type(c)?;
            parse_identifier(c)
        });
        assert_eq!(name, "data");
        assert_eq!(pos, 5);
    }

    #[test]
    fn array_suffix_without_size() {
        let (ty, pos) = with_cursor("float axes[]", parse_type);
        assert_eq!(ty, CType::array("float", -1));
        assert_eq!(pos, 1);
    }

    #[test]
    fn array_suffix_in_hex() {
        let (ty, _) = with_cursor("unsigned char buttons[0x0F]", parse_type);
        assert_eq!(ty, CType::array("unsigned char", 15));
    }

    #[test]
    fn parameter_lists() {
        let (params, _) = with_cursor("(void)", |c| {
            c.consume(TokenKind::LeftParen)?;
            parse_parameters(c)
        });
        assert!(params.is_empty());

        let (params, _) = with_cursor("(int, const char*)", |c| {
            c.consume(TokenKind::LeftParen)?;
            parse_parameters(c)
        });
        assert_eq!(params, vec![
            Parameter::new("", CType::new("int")),
            Parameter::new("", CType::new("const char*")),
        ]);

        let (params, _) = with_cursor("(void* pointer)", |c| {
            c.consume(TokenKind::LeftParen)?;
            parse_parameters(c)
        });
        assert_eq!(params, vec![Parameter::new("pointer", CType::new("void*"))]);
    }

    #[test]
    fn grammar_error_names_the_line() {
        let line = "int (";
        let tokens = tokenize(line).unwrap();
        let mut cursor = Cursor::new(&tokens, line);
        parse_type(&mut cursor).unwrap();
        match parse_identifier(&mut cursor) {
            Err(Error::Grammar { expected, found, line }) => {
                assert_eq!(expected, "Identifier");
                assert_eq!(found, "LeftParen '('");
                assert_eq!(line, "int (");
            },
            other => panic!("unexpected {:?}", other),
        }
    }
}
