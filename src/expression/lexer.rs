// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Tokenizer for the query-expression language.

use serde_json::Value;
use std::iter::Peekable;
use std::str::CharIndices;

use crate::errors::ParseError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Identifier(String),
    QuotedIdentifier(String),
    RawString(String),
    Literal(Value),
    Number(i64),
    Dot,
    Star,
    At,
    Ampersand,
    Pipe,
    Or,
    And,
    Not,
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    Comma,
    Colon,
    Flatten,
    Filter,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    LParen,
    RParen,
    Eof,
}

impl Token {
    /// Left binding power used by the Pratt parser.
    pub(crate) fn lbp(&self) -> u8 {
        match self {
            Token::Pipe => 1,
            Token::Or => 2,
            Token::And => 3,
            Token::Eq | Token::Ne | Token::Lt | Token::Lte | Token::Gt | Token::Gte => 5,
            Token::Flatten => 9,
            Token::Star => 20,
            Token::Filter => 21,
            Token::Dot => 40,
            Token::Not => 45,
            Token::LBrace => 50,
            Token::LBracket => 55,
            Token::LParen => 60,
            _ => 0,
        }
    }
}

pub(crate) struct Tokenizer<'a> {
    source: &'a str,
    iter: Peekable<CharIndices<'a>>,
}

impl<'a> Tokenizer<'a> {
    pub(crate) fn new(source: &'a str) -> Self {
        Self {
            source,
            iter: source.char_indices().peekable(),
        }
    }

    /// Scan the whole source into `(offset, token)` pairs terminated by `Eof`.
    pub(crate) fn scan_tokens(mut self) -> Result<Vec<(usize, Token)>, ParseError> {
        let mut tokens = Vec::new();
        while let Some(&(offset, ch)) = self.iter.peek() {
            let token = match ch {
                ' ' | '\t' | '\r' | '\n' => {
                    self.iter.next();
                    continue;
                }
                '.' => self.single(Token::Dot),
                '*' => self.single(Token::Star),
                '@' => self.single(Token::At),
                ',' => self.single(Token::Comma),
                ':' => self.single(Token::Colon),
                ']' => self.single(Token::RBracket),
                '{' => self.single(Token::LBrace),
                '}' => self.single(Token::RBrace),
                '(' => self.single(Token::LParen),
                ')' => self.single(Token::RParen),
                '[' => {
                    self.iter.next();
                    match self.iter.peek() {
                        Some(&(_, ']')) => {
                            self.iter.next();
                            Token::Flatten
                        }
                        Some(&(_, '?')) => {
                            self.iter.next();
                            Token::Filter
                        }
                        _ => Token::LBracket,
                    }
                }
                '&' => self.one_or_two('&', Token::Ampersand, Token::And),
                '|' => self.one_or_two('|', Token::Pipe, Token::Or),
                '!' => self.one_or_two('=', Token::Not, Token::Ne),
                '<' => self.one_or_two('=', Token::Lt, Token::Lte),
                '>' => self.one_or_two('=', Token::Gt, Token::Gte),
                '=' => {
                    self.iter.next();
                    match self.iter.next() {
                        Some((_, '=')) => Token::Eq,
                        _ => return Err(ParseError::new(offset, "expected '=' after '='")),
                    }
                }
                '\'' => self.scan_raw_string(offset)?,
                '"' => self.scan_quoted_identifier(offset)?,
                '`' => self.scan_literal(offset)?,
                c if c == '-' || c.is_ascii_digit() => self.scan_number(offset)?,
                c if c.is_ascii_alphabetic() || c == '_' => self.scan_identifier(),
                other => {
                    return Err(ParseError::new(
                        offset,
                        format!("unexpected character '{}'", other),
                    ))
                }
            };
            tokens.push((offset, token));
        }
        tokens.push((self.source.len(), Token::Eof));
        Ok(tokens)
    }

    fn single(&mut self, token: Token) -> Token {
        self.iter.next();
        token
    }

    fn one_or_two(&mut self, second: char, one: Token, two: Token) -> Token {
        self.iter.next();
        if let Some(&(_, c)) = self.iter.peek() {
            if c == second {
                self.iter.next();
                return two;
            }
        }
        one
    }

    /// `'text'` where only `\'` is an escape.
    fn scan_raw_string(&mut self, start: usize) -> Result<Token, ParseError> {
        self.iter.next();
        let mut value = String::new();
        while let Some((_, ch)) = self.iter.next() {
            match ch {
                '\'' => return Ok(Token::RawString(value)),
                '\\' => match self.iter.peek() {
                    Some(&(_, '\'')) => {
                        self.iter.next();
                        value.push('\'');
                    }
                    _ => value.push('\\'),
                },
                _ => value.push(ch),
            }
        }
        Err(ParseError::new(start, "unterminated raw string"))
    }

    /// `"name"` decoded with JSON string escapes.
    fn scan_quoted_identifier(&mut self, start: usize) -> Result<Token, ParseError> {
        self.iter.next();
        let mut escaped = false;
        while let Some((offset, ch)) = self.iter.next() {
            match ch {
                '\\' if !escaped => escaped = true,
                '"' if !escaped => {
                    let raw = &self.source[start..=offset];
                    return serde_json::from_str::<String>(raw)
                        .map(Token::QuotedIdentifier)
                        .map_err(|e| ParseError::new(start, format!("invalid quoted identifier: {}", e)));
                }
                _ => escaped = false,
            }
        }
        Err(ParseError::new(start, "unterminated quoted identifier"))
    }

    /// `` `json` `` where a backtick inside the literal is written `` \` ``.
    fn scan_literal(&mut self, start: usize) -> Result<Token, ParseError> {
        self.iter.next();
        let mut raw = String::new();
        while let Some((_, ch)) = self.iter.next() {
            match ch {
                '`' => {
                    return serde_json::from_str::<Value>(raw.trim())
                        .map(Token::Literal)
                        .map_err(|e| ParseError::new(start, format!("invalid JSON literal: {}", e)));
                }
                '\\' => match self.iter.peek() {
                    Some(&(_, '`')) => {
                        self.iter.next();
                        raw.push('`');
                    }
                    _ => raw.push('\\'),
                },
                _ => raw.push(ch),
            }
        }
        Err(ParseError::new(start, "unterminated JSON literal"))
    }

    fn scan_number(&mut self, start: usize) -> Result<Token, ParseError> {
        let mut value = String::new();
        if let Some(&(_, '-')) = self.iter.peek() {
            value.push('-');
            self.iter.next();
        }
        while let Some(&(_, ch)) = self.iter.peek() {
            if ch.is_ascii_digit() {
                value.push(ch);
                self.iter.next();
            } else {
                break;
            }
        }
        value
            .parse::<i64>()
            .map(Token::Number)
            .map_err(|_| ParseError::new(start, format!("invalid number '{}'", value)))
    }

    fn scan_identifier(&mut self) -> Token {
        let mut value = String::new();
        while let Some(&(_, ch)) = self.iter.peek() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                value.push(ch);
                self.iter.next();
            } else {
                break;
            }
        }
        Token::Identifier(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        Tokenizer::new(source)
            .scan_tokens()
            .unwrap()
            .into_iter()
            .map(|(_, t)| t)
            .collect()
    }

    #[test]
    fn test_projection_tokens() {
        assert_eq!(
            kinds("input.products[].name"),
            vec![
                Token::Identifier("input".into()),
                Token::Dot,
                Token::Identifier("products".into()),
                Token::Flatten,
                Token::Dot,
                Token::Identifier("name".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_raw_string_keeps_backslashes_and_newlines() {
        let tokens = kinds("'a\\'b\n\\n'");
        assert_eq!(tokens[0], Token::RawString("a'b\n\\n".into()));
    }

    #[test]
    fn test_literal_and_operators() {
        let tokens = kinds("`[1, 2]` == @ || !a && b != `null`");
        assert_eq!(tokens[0], Token::Literal(serde_json::json!([1, 2])));
        assert_eq!(tokens[1], Token::Eq);
        assert_eq!(tokens[2], Token::At);
        assert_eq!(tokens[3], Token::Or);
        assert_eq!(tokens[4], Token::Not);
        assert_eq!(tokens[6], Token::And);
        assert_eq!(tokens[8], Token::Ne);
    }

    #[test]
    fn test_expression_reference_and_negative_index() {
        let tokens = kinds("&foo[-1]");
        assert_eq!(tokens[0], Token::Ampersand);
        assert_eq!(tokens[2], Token::LBracket);
        assert_eq!(tokens[3], Token::Number(-1));
    }

    #[test]
    fn test_unterminated_raw_string_reports_offset() {
        let err = Tokenizer::new("join('x").scan_tokens().unwrap_err();
        assert_eq!(err.offset, 5);
    }

    #[test]
    fn test_single_equals_is_rejected() {
        assert!(Tokenizer::new("a = b").scan_tokens().is_err());
    }
}
