// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Binding-power parser producing an [`Ast`] from tokens.

use super::ast::{Ast, Comparator};
use super::lexer::{Token, Tokenizer};
use crate::errors::ParseError;

/// Tokens binding tighter than this continue a projection's right-hand side.
const PROJECTION_STOP: u8 = 10;

pub(crate) fn parse(source: &str) -> Result<Ast, ParseError> {
    let tokens = Tokenizer::new(source).scan_tokens()?;
    let mut parser = Parser { tokens, current: 0 };
    let ast = parser.expr(0)?;
    match parser.peek() {
        Token::Eof => Ok(ast),
        other => Err(parser.error(format!("unexpected trailing token {:?}", other))),
    }
}

struct Parser {
    tokens: Vec<(usize, Token)>,
    current: usize,
}

impl Parser {
    fn expr(&mut self, rbp: u8) -> Result<Ast, ParseError> {
        let token = self.advance();
        let mut left = self.nud(token)?;
        while rbp < self.peek().lbp() {
            let token = self.advance();
            left = self.led(token, left)?;
        }
        Ok(left)
    }

    fn nud(&mut self, token: Token) -> Result<Ast, ParseError> {
        match token {
            Token::At => Ok(Ast::Identity),
            Token::Identifier(name) => Ok(Ast::Field(name)),
            Token::QuotedIdentifier(name) => {
                if self.peek() == &Token::LParen {
                    return Err(self.error("quoted identifiers cannot be called as functions"));
                }
                Ok(Ast::Field(name))
            }
            Token::RawString(s) => Ok(Ast::Literal(serde_json::Value::String(s))),
            Token::Literal(value) => Ok(Ast::Literal(value)),
            Token::Number(n) => Ok(Ast::Literal(serde_json::Value::from(n))),
            Token::Star => {
                let rhs = self.projection_rhs(Token::Star.lbp())?;
                Ok(Ast::Projection {
                    lhs: Box::new(Ast::ObjectValues(Box::new(Ast::Identity))),
                    rhs: Box::new(rhs),
                })
            }
            Token::Flatten => {
                let rhs = self.projection_rhs(Token::Flatten.lbp())?;
                Ok(Ast::Projection {
                    lhs: Box::new(Ast::Flatten(Box::new(Ast::Identity))),
                    rhs: Box::new(rhs),
                })
            }
            Token::LBracket => match (self.peek().clone(), self.peek_at(1).clone()) {
                (Token::Number(n), Token::RBracket) => {
                    self.advance();
                    self.advance();
                    Ok(Ast::Index(n))
                }
                (Token::Star, Token::RBracket) => {
                    self.advance();
                    self.advance();
                    let rhs = self.projection_rhs(Token::Star.lbp())?;
                    Ok(Ast::Projection {
                        lhs: Box::new(Ast::Identity),
                        rhs: Box::new(rhs),
                    })
                }
                _ => self.multi_list(),
            },
            Token::LBrace => self.multi_hash(),
            Token::Ampersand => {
                let rhs = self.expr(Token::Ampersand.lbp())?;
                Ok(Ast::ExpRef(Box::new(rhs)))
            }
            Token::Not => {
                let rhs = self.expr(Token::Not.lbp())?;
                Ok(Ast::Not(Box::new(rhs)))
            }
            Token::LParen => {
                let inner = self.expr(0)?;
                self.expect(Token::RParen, "')'")?;
                Ok(inner)
            }
            Token::Filter => Err(self.error("filter expressions are not supported")),
            other => Err(self.error(format!("unexpected token {:?}", other))),
        }
    }

    fn led(&mut self, token: Token, left: Ast) -> Result<Ast, ParseError> {
        match token {
            Token::Dot => {
                if self.peek() == &Token::Star {
                    self.advance();
                    let rhs = self.projection_rhs(Token::Star.lbp())?;
                    return Ok(Ast::Projection {
                        lhs: Box::new(Ast::ObjectValues(Box::new(left))),
                        rhs: Box::new(rhs),
                    });
                }
                let rhs = self.dot_rhs(Token::Dot.lbp())?;
                Ok(Ast::Subexpr(Box::new(left), Box::new(rhs)))
            }
            Token::LBracket => match (self.peek().clone(), self.peek_at(1).clone()) {
                (Token::Number(n), Token::RBracket) => {
                    self.advance();
                    self.advance();
                    Ok(Ast::Subexpr(Box::new(left), Box::new(Ast::Index(n))))
                }
                (Token::Star, Token::RBracket) => {
                    self.advance();
                    self.advance();
                    let rhs = self.projection_rhs(Token::Star.lbp())?;
                    Ok(Ast::Projection {
                        lhs: Box::new(left),
                        rhs: Box::new(rhs),
                    })
                }
                _ => Err(self.error("expected an index or '*' inside brackets")),
            },
            Token::Flatten => {
                let rhs = self.projection_rhs(Token::Flatten.lbp())?;
                Ok(Ast::Projection {
                    lhs: Box::new(Ast::Flatten(Box::new(left))),
                    rhs: Box::new(rhs),
                })
            }
            Token::LParen => match left {
                Ast::Field(name) => {
                    let args = self.function_args()?;
                    Ok(Ast::Function { name, args })
                }
                _ => Err(self.error("only plain identifiers can be called as functions")),
            },
            Token::Pipe => {
                let rhs = self.expr(Token::Pipe.lbp())?;
                Ok(Ast::Pipe(Box::new(left), Box::new(rhs)))
            }
            Token::Or => {
                let rhs = self.expr(Token::Or.lbp())?;
                Ok(Ast::Or(Box::new(left), Box::new(rhs)))
            }
            Token::And => {
                let rhs = self.expr(Token::And.lbp())?;
                Ok(Ast::And(Box::new(left), Box::new(rhs)))
            }
            Token::Eq => self.comparison(Comparator::Eq, left),
            Token::Ne => self.comparison(Comparator::Ne, left),
            Token::Lt => self.comparison(Comparator::Lt, left),
            Token::Lte => self.comparison(Comparator::Lte, left),
            Token::Gt => self.comparison(Comparator::Gt, left),
            Token::Gte => self.comparison(Comparator::Gte, left),
            Token::Filter => Err(self.error("filter expressions are not supported")),
            other => Err(self.error(format!("unexpected token {:?}", other))),
        }
    }

    fn comparison(&mut self, comparator: Comparator, left: Ast) -> Result<Ast, ParseError> {
        let rhs = self.expr(Token::Eq.lbp())?;
        Ok(Ast::Comparison {
            comparator,
            lhs: Box::new(left),
            rhs: Box::new(rhs),
        })
    }

    /// Right-hand side after `.`; `[` here starts a multi-select list.
    fn dot_rhs(&mut self, lbp: u8) -> Result<Ast, ParseError> {
        match self.peek() {
            Token::LBracket => {
                self.advance();
                self.multi_list()
            }
            Token::Identifier(_)
            | Token::QuotedIdentifier(_)
            | Token::LBrace
            | Token::At
            | Token::Ampersand => self.expr(lbp),
            other => Err(self.error(format!("unexpected token {:?} after '.'", other))),
        }
    }

    fn projection_rhs(&mut self, lbp: u8) -> Result<Ast, ParseError> {
        if self.peek().lbp() < PROJECTION_STOP {
            return Ok(Ast::Identity);
        }
        match self.peek() {
            Token::Dot => {
                self.advance();
                self.dot_rhs(lbp)
            }
            Token::LBracket | Token::Filter => self.expr(lbp),
            other => Err(self.error(format!("unexpected token {:?} after projection", other))),
        }
    }

    /// Called with the opening `[` already consumed.
    fn multi_list(&mut self) -> Result<Ast, ParseError> {
        let mut items = Vec::new();
        loop {
            items.push(self.expr(0)?);
            match self.advance() {
                Token::Comma => continue,
                Token::RBracket => break,
                other => return Err(self.error(format!("expected ',' or ']', found {:?}", other))),
            }
        }
        Ok(Ast::MultiList(items))
    }

    /// Called with the opening `{` already consumed.
    fn multi_hash(&mut self) -> Result<Ast, ParseError> {
        let mut pairs = Vec::new();
        loop {
            let key = match self.advance() {
                Token::Identifier(k) | Token::QuotedIdentifier(k) => k,
                other => return Err(self.error(format!("expected a key, found {:?}", other))),
            };
            self.expect(Token::Colon, "':'")?;
            let value = self.expr(0)?;
            pairs.push((key, value));
            match self.advance() {
                Token::Comma => continue,
                Token::RBrace => break,
                other => return Err(self.error(format!("expected ',' or '}}', found {:?}", other))),
            }
        }
        Ok(Ast::MultiHash(pairs))
    }

    /// Called with the opening `(` already consumed.
    fn function_args(&mut self) -> Result<Vec<Ast>, ParseError> {
        let mut args = Vec::new();
        if self.peek() == &Token::RParen {
            self.advance();
            return Ok(args);
        }
        loop {
            args.push(self.expr(0)?);
            match self.advance() {
                Token::Comma => continue,
                Token::RParen => break,
                other => return Err(self.error(format!("expected ',' or ')', found {:?}", other))),
            }
        }
        Ok(args)
    }

    fn expect(&mut self, expected: Token, label: &str) -> Result<(), ParseError> {
        if self.peek() == &expected {
            self.advance();
            Ok(())
        } else {
            Err(self.error(format!("expected {}, found {:?}", label, self.peek())))
        }
    }

    fn peek(&self) -> &Token {
        self.peek_at(0)
    }

    fn peek_at(&self, distance: usize) -> &Token {
        self.tokens
            .get(self.current + distance)
            .map(|(_, t)| t)
            .unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.current < self.tokens.len() {
            self.current += 1;
        }
        token
    }

    fn error(&self, reason: impl Into<String>) -> ParseError {
        let offset = self
            .tokens
            .get(self.current.saturating_sub(1))
            .map(|(o, _)| *o)
            .unwrap_or(0);
        ParseError::new(offset, reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn field(name: &str) -> Box<Ast> {
        Box::new(Ast::Field(name.to_string()))
    }

    #[test]
    fn test_parse_subexpression_chain() {
        assert_eq!(
            parse("input.need").unwrap(),
            Ast::Subexpr(field("input"), field("need"))
        );
    }

    #[test]
    fn test_parse_flatten_projection() {
        assert_eq!(
            parse("input.products[].name").unwrap(),
            Ast::Projection {
                lhs: Box::new(Ast::Flatten(Box::new(Ast::Subexpr(
                    field("input"),
                    field("products")
                )))),
                rhs: field("name"),
            }
        );
    }

    #[test]
    fn test_parse_index_binds_inside_projection() {
        let ast = parse("input[].products[0]").unwrap();
        assert_eq!(
            ast,
            Ast::Projection {
                lhs: Box::new(Ast::Flatten(field("input"))),
                rhs: Box::new(Ast::Subexpr(field("products"), Box::new(Ast::Index(0)))),
            }
        );
    }

    #[test]
    fn test_parse_function_with_expression_reference() {
        let ast = parse("zip_map(&{a: @[0]}, [`[1]`, `[2]`])").unwrap();
        match ast {
            Ast::Function { name, args } => {
                assert_eq!(name, "zip_map");
                assert_eq!(args.len(), 2);
                assert!(matches!(args[0], Ast::ExpRef(_)));
                assert_eq!(
                    args[1],
                    Ast::MultiList(vec![
                        Ast::Literal(json!([1])),
                        Ast::Literal(json!([2]))
                    ])
                );
            }
            other => panic!("expected function, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_current_node_multi_hash() {
        let ast = parse("@.{need: input[0].need}").unwrap();
        assert!(matches!(ast, Ast::Subexpr(ref lhs, ref rhs)
            if **lhs == Ast::Identity && matches!(**rhs, Ast::MultiHash(_))));
    }

    #[test]
    fn test_parse_pipe_stops_projection() {
        let ast = parse("a[*].b | [0]").unwrap();
        assert!(matches!(ast, Ast::Pipe(_, _)));
    }

    #[test]
    fn test_parse_comparison_precedence() {
        let ast = parse("length(a) == `2` && !b").unwrap();
        assert!(matches!(ast, Ast::And(_, _)));
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse("a.").is_err());
        assert!(parse("foo(").is_err());
        assert!(parse("{a b}").is_err());
        assert!(parse("a[?b]").is_err());
        assert!(parse("a b").is_err());
    }
}
