// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
}

/// Parsed expression tree. Evaluation walks it recursively against a
/// `serde_json::Value` current node.
#[derive(Debug, Clone, PartialEq)]
pub enum Ast {
    /// `@`
    Identity,
    Field(String),
    Index(i64),
    Literal(Value),
    /// `lhs.rhs`: evaluate `rhs` with the result of `lhs` as current node.
    Subexpr(Box<Ast>, Box<Ast>),
    /// Evaluate `rhs` against every element of the array produced by `lhs`,
    /// dropping `null` results.
    Projection { lhs: Box<Ast>, rhs: Box<Ast> },
    /// Flatten one level of nested arrays.
    Flatten(Box<Ast>),
    /// Values of an object, in key order.
    ObjectValues(Box<Ast>),
    MultiList(Vec<Ast>),
    MultiHash(Vec<(String, Ast)>),
    Function { name: String, args: Vec<Ast> },
    /// `&expr`, passed unevaluated to functions such as `zip_map`.
    ExpRef(Box<Ast>),
    Pipe(Box<Ast>, Box<Ast>),
    Or(Box<Ast>, Box<Ast>),
    And(Box<Ast>, Box<Ast>),
    Not(Box<Ast>),
    Comparison {
        comparator: Comparator,
        lhs: Box<Ast>,
        rhs: Box<Ast>,
    },
}
