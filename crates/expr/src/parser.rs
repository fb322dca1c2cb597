//! Expression parser and call-shape validation.
//!
//! The parser accepts a broad subset of Python expression syntax so that
//! disallowed constructs are reported as a shape or literal problem rather
//! than a syntax error. Only [`parse_call`] decides what may be executed.

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::ast::{Argument, Call, CallExpr, ComprehensionKind, Constant, Expr};
use crate::lexer::{Token, TokenKind, tokenize};
use crate::{Error, Result};

const KEYWORDS: [&str; 35] = [
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class", "continue",
    "def", "del", "elif", "else", "except", "finally", "for", "from", "global", "if", "import",
    "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return", "try", "while",
    "with", "yield",
];

/// Binary operator precedence levels between comparisons and unary operators,
/// lowest first.
const BINARY_LEVELS: [&[&str]; 6] = [
    &["|"],
    &["^"],
    &["&"],
    &["<<", ">>"],
    &["+", "-"],
    &["*", "/", "//", "%", "@"],
];

const COMPARISONS: [&str; 6] = ["==", "!=", "<", "<=", ">", ">="];

/// Deepest nesting of brackets and prefix operators accepted.
const MAX_DEPTH: usize = 100;

/// Parse `source` as a single expression.
pub fn parse_expression(source: &str) -> Result<Expr> {
    let mut parser = Parser::new(tokenize(source)?);
    let expr = parser.expression_list()?;
    parser.expect_eof()?;
    Ok(expr)
}

/// Parse `source` and check it is exactly one call to a bare name.
///
/// Attribute access, subscripts, calls on call results, starred arguments
/// and comprehension arguments are rejected with [`Error::Shape`].
/// Arguments are returned unevaluated.
pub fn parse_call(source: &str) -> Result<CallExpr> {
    let expr = parse_expression(source)?;
    let Expr::Call(call) = expr else {
        return Err(Error::Shape(format!(
            "expected a function call, found {}",
            expr.describe()
        )));
    };

    let name = match *call.func {
        Expr::Name(name) => name,
        other => {
            return Err(Error::Shape(format!(
                "callee must be a bare name, found {}",
                other.describe()
            )));
        }
    };

    let mut args = Vec::new();
    let mut kwargs = IndexMap::new();
    for argument in call.args {
        match argument {
            Argument::Positional(Expr::Comprehension { .. })
            | Argument::Keyword {
                value: Expr::Comprehension { .. },
                ..
            } => {
                return Err(Error::Shape(
                    "comprehension arguments are not allowed".into(),
                ));
            }
            Argument::Positional(value) => args.push(value),
            Argument::Keyword { name, value } => {
                kwargs.insert(name, value);
            }
            Argument::Starred(_) => {
                return Err(Error::Shape("starred arguments are not allowed".into()));
            }
            Argument::DoubleStarred(_) => {
                return Err(Error::Shape(
                    "double-starred arguments are not allowed".into(),
                ));
            }
        }
    }

    Ok(CallExpr::new(name, args, kwargs))
}

/// Whether `name` is a bare identifier that is not a reserved word.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let starts_well = chars.next().is_some_and(crate::lexer::is_name_start);
    starts_well && chars.all(crate::lexer::is_name_continue) && !KEYWORDS.contains(&name)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    /// Run `parse` one nesting level deeper, failing past [`MAX_DEPTH`].
    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.depth == MAX_DEPTH {
            return Err(Error::syntax(self.offset(), "expression nested too deeply"));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn peek(&self) -> &TokenKind {
        &self.tokens[self.pos.min(self.tokens.len() - 1)].kind
    }

    fn peek_nth(&self, n: usize) -> &TokenKind {
        &self.tokens[(self.pos + n).min(self.tokens.len() - 1)].kind
    }

    fn offset(&self) -> usize {
        self.tokens[self.pos.min(self.tokens.len() - 1)].offset
    }

    fn advance(&mut self) -> TokenKind {
        let kind = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        kind
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek() == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind, what: &str) -> Result<()> {
        if self.eat(kind) {
            Ok(())
        } else {
            Err(self.unexpected(what))
        }
    }

    fn expect_eof(&mut self) -> Result<()> {
        match self.peek() {
            TokenKind::Eof => Ok(()),
            _ => Err(self.unexpected("end of input")),
        }
    }

    fn eat_op(&mut self, ops: &[&'static str]) -> Option<&'static str> {
        match self.peek() {
            TokenKind::Op(op) if ops.contains(op) => {
                let op = *op;
                self.advance();
                Some(op)
            }
            _ => None,
        }
    }

    fn at_keyword(&self, keyword: &str) -> bool {
        matches!(self.peek(), TokenKind::Name(name) if name == keyword)
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if self.at_keyword(keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn unexpected(&self, expected: &str) -> Error {
        let found = match self.peek() {
            TokenKind::Eof => "end of input".to_string(),
            TokenKind::Name(name) => format!("'{name}'"),
            TokenKind::Op(op) => format!("'{op}'"),
            TokenKind::Int { .. } | TokenKind::Float(_) => "number".to_string(),
            TokenKind::Str(_) => "string".to_string(),
            other => format!("{other:?}"),
        };
        Error::syntax(self.offset(), format!("expected {expected}, found {found}"))
    }

    /// `expr (',' expr)* [',']`, producing a tuple when a comma is present.
    fn expression_list(&mut self) -> Result<Expr> {
        let first = self.expression()?;
        if self.peek() != &TokenKind::Comma {
            return Ok(first);
        }

        let mut items = vec![first];
        while self.eat(&TokenKind::Comma) {
            if matches!(self.peek(), TokenKind::Eof | TokenKind::RParen | TokenKind::RBracket) {
                break;
            }
            items.push(self.expression()?);
        }
        Ok(Expr::Tuple(items))
    }

    fn expression(&mut self) -> Result<Expr> {
        self.or_test()
    }

    fn or_test(&mut self) -> Result<Expr> {
        let mut left = self.and_test()?;
        while self.eat_keyword("or") {
            let right = self.and_test()?;
            left = binary("or", left, right);
        }
        Ok(left)
    }

    fn and_test(&mut self) -> Result<Expr> {
        let mut left = self.not_test()?;
        while self.eat_keyword("and") {
            let right = self.not_test()?;
            left = binary("and", left, right);
        }
        Ok(left)
    }

    fn not_test(&mut self) -> Result<Expr> {
        if self.eat_keyword("not") {
            let operand = self.nested(Self::not_test)?;
            return Ok(Expr::Unary {
                op: "not",
                operand: Box::new(operand),
            });
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Result<Expr> {
        let mut left = self.binary(0)?;
        loop {
            let op = if let Some(op) = self.eat_op(&COMPARISONS) {
                op
            } else if self.eat_keyword("in") {
                "in"
            } else if self.at_keyword("not") && matches!(self.peek_nth(1), TokenKind::Name(n) if n == "in") {
                self.advance();
                self.advance();
                "not in"
            } else if self.eat_keyword("is") {
                if self.eat_keyword("not") { "is not" } else { "is" }
            } else {
                return Ok(left);
            };
            let right = self.binary(0)?;
            left = binary(op, left, right);
        }
    }

    /// Left-associative binary operators binding at least as tightly as
    /// `min_level`.
    fn binary(&mut self, min_level: usize) -> Result<Expr> {
        let mut left = self.unary()?;
        while let Some((level, op)) = self.eat_binary_op(min_level) {
            let right = self.binary(level + 1)?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn eat_binary_op(&mut self, min_level: usize) -> Option<(usize, &'static str)> {
        let TokenKind::Op(op) = self.peek() else {
            return None;
        };
        let level = BINARY_LEVELS
            .iter()
            .position(|ops| ops.contains(op))
            .filter(|level| *level >= min_level)?;
        let op = *op;
        self.advance();
        Some((level, op))
    }

    fn unary(&mut self) -> Result<Expr> {
        if let Some(op) = self.eat_op(&["+", "-", "~"]) {
            let operand = self.nested(Self::unary)?;
            return Ok(Expr::Unary {
                op,
                operand: Box::new(operand),
            });
        }
        self.power()
    }

    fn power(&mut self) -> Result<Expr> {
        let base = self.postfix()?;
        if let Some(op) = self.eat_op(&["**"]) {
            let exponent = self.nested(Self::unary)?;
            return Ok(binary(op, base, exponent));
        }
        Ok(base)
    }

    fn postfix(&mut self) -> Result<Expr> {
        let mut expr = self.atom()?;
        loop {
            match self.peek() {
                TokenKind::Dot => {
                    self.advance();
                    let attr = self.name("attribute name")?;
                    expr = Expr::Attribute {
                        value: Box::new(expr),
                        attr,
                    };
                }
                TokenKind::LParen => {
                    self.advance();
                    let args = self.nested(Self::arguments)?;
                    expr = Expr::Call(Call {
                        func: Box::new(expr),
                        args,
                    });
                }
                TokenKind::LBracket => {
                    self.advance();
                    let index = self.nested(Self::expression_list)?;
                    self.expect(&TokenKind::RBracket, "']'")?;
                    expr = Expr::Subscript {
                        value: Box::new(expr),
                        index: Box::new(index),
                    };
                }
                _ => return Ok(expr),
            }
        }
    }

    fn name(&mut self, what: &str) -> Result<String> {
        match self.peek() {
            TokenKind::Name(name) if !KEYWORDS.contains(&name.as_str()) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected(what)),
        }
    }

    fn atom(&mut self) -> Result<Expr> {
        let start = self.pos;
        let offset = self.offset();
        match self.advance() {
            TokenKind::Name(name) => match name.as_str() {
                "True" => Ok(Expr::Constant(Constant::Bool(true))),
                "False" => Ok(Expr::Constant(Constant::Bool(false))),
                "None" => Ok(Expr::Constant(Constant::None)),
                keyword if KEYWORDS.contains(&keyword) => Err(Error::syntax(
                    offset,
                    format!("unexpected keyword '{keyword}'"),
                )),
                _ => Ok(Expr::Name(name)),
            },
            TokenKind::Int { digits, radix } => Ok(Expr::Constant(Constant::Int { digits, radix })),
            TokenKind::Float(text) => Ok(Expr::Constant(Constant::Float(text))),
            TokenKind::Str(mut value) => {
                // Adjacent string literals concatenate
                while let TokenKind::Str(next) = self.peek() {
                    value.push_str(next);
                    self.advance();
                }
                Ok(Expr::Constant(Constant::Str(value)))
            }
            TokenKind::LParen => self.nested(Self::parenthesized),
            TokenKind::LBracket => self.nested(Self::list_display),
            TokenKind::LBrace => self.nested(Self::brace_display),
            _ => {
                self.pos = start;
                Err(self.unexpected("an expression"))
            }
        }
    }

    fn parenthesized(&mut self) -> Result<Expr> {
        if self.eat(&TokenKind::RParen) {
            return Ok(Expr::Tuple(Vec::new()));
        }

        let first = self.expression()?;
        if self.at_keyword("for") {
            self.comprehension_clauses()?;
            self.expect(&TokenKind::RParen, "')'")?;
            return Ok(comprehension(ComprehensionKind::Generator, first));
        }

        if self.eat(&TokenKind::RParen) {
            return Ok(first);
        }

        let items = self.sequence_tail(first, &TokenKind::RParen, "')'")?;
        Ok(Expr::Tuple(items))
    }

    fn list_display(&mut self) -> Result<Expr> {
        if self.eat(&TokenKind::RBracket) {
            return Ok(Expr::List(Vec::new()));
        }

        let first = self.expression()?;
        if self.at_keyword("for") {
            self.comprehension_clauses()?;
            self.expect(&TokenKind::RBracket, "']'")?;
            return Ok(comprehension(ComprehensionKind::List, first));
        }

        let items = self.sequence_tail(first, &TokenKind::RBracket, "']'")?;
        Ok(Expr::List(items))
    }

    fn brace_display(&mut self) -> Result<Expr> {
        if self.eat(&TokenKind::RBrace) {
            return Ok(Expr::Dict(Vec::new()));
        }

        let first = self.expression()?;
        if !self.eat(&TokenKind::Colon) {
            if self.at_keyword("for") {
                self.comprehension_clauses()?;
                self.expect(&TokenKind::RBrace, "'}'")?;
                return Ok(comprehension(ComprehensionKind::Set, first));
            }
            let items = self.sequence_tail(first, &TokenKind::RBrace, "'}'")?;
            return Ok(Expr::Set(items));
        }

        let value = self.expression()?;
        if self.at_keyword("for") {
            self.comprehension_clauses()?;
            self.expect(&TokenKind::RBrace, "'}'")?;
            return Ok(comprehension(ComprehensionKind::Dict, value));
        }

        let mut entries = vec![(first, value)];
        while self.eat(&TokenKind::Comma) {
            if self.eat(&TokenKind::RBrace) {
                return Ok(Expr::Dict(entries));
            }
            let key = self.expression()?;
            self.expect(&TokenKind::Colon, "':'")?;
            let value = self.expression()?;
            entries.push((key, value));
        }
        self.expect(&TokenKind::RBrace, "'}'")?;
        Ok(Expr::Dict(entries))
    }

    /// Remaining comma-separated items of a display after its first element,
    /// through the closing token.
    fn sequence_tail(&mut self, first: Expr, close: &TokenKind, what: &str) -> Result<Vec<Expr>> {
        let mut items = vec![first];
        while self.eat(&TokenKind::Comma) {
            if self.eat(close) {
                return Ok(items);
            }
            items.push(self.expression()?);
        }
        self.expect(close, what)?;
        Ok(items)
    }

    /// `('for' targets 'in' or_test ('if' or_test)*)+`
    fn comprehension_clauses(&mut self) -> Result<()> {
        while self.eat_keyword("for") {
            self.binary(0)?;
            while self.eat(&TokenKind::Comma) {
                self.binary(0)?;
            }
            if !self.eat_keyword("in") {
                return Err(self.unexpected("'in'"));
            }
            self.or_test()?;
            while self.eat_keyword("if") {
                self.or_test()?;
            }
        }
        Ok(())
    }

    /// Call arguments after the opening parenthesis, through `)`.
    fn arguments(&mut self) -> Result<Vec<Argument>> {
        let mut args = Vec::new();
        let mut keywords = HashSet::new();
        let mut after_keyword = false;

        loop {
            if self.eat(&TokenKind::RParen) {
                return Ok(args);
            }

            let offset = self.offset();
            let argument = if self.eat_op(&["**"]).is_some() {
                after_keyword = true;
                Argument::DoubleStarred(self.expression()?)
            } else if self.eat_op(&["*"]).is_some() {
                Argument::Starred(self.expression()?)
            } else if let (TokenKind::Name(name), TokenKind::Assign) = (self.peek(), self.peek_nth(1)) {
                let name = name.clone();
                if KEYWORDS.contains(&name.as_str()) {
                    return Err(Error::syntax(offset, format!("cannot assign to keyword '{name}'")));
                }
                if !keywords.insert(name.clone()) {
                    return Err(Error::syntax(offset, format!("keyword argument repeated: {name}")));
                }
                self.advance();
                self.advance();
                after_keyword = true;
                Argument::Keyword {
                    name,
                    value: self.expression()?,
                }
            } else {
                if after_keyword {
                    return Err(Error::syntax(
                        offset,
                        "positional argument follows keyword argument",
                    ));
                }
                let value = self.expression()?;
                if self.at_keyword("for") {
                    self.comprehension_clauses()?;
                    Argument::Positional(comprehension(ComprehensionKind::Generator, value))
                } else {
                    Argument::Positional(value)
                }
            };
            args.push(argument);

            if !self.eat(&TokenKind::Comma) {
                self.expect(&TokenKind::RParen, "',' or ')'")?;
                return Ok(args);
            }
        }
    }
}

fn binary(op: &'static str, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

fn comprehension(kind: ComprehensionKind, element: Expr) -> Expr {
    Expr::Comprehension {
        kind,
        element: Box::new(element),
    }
}
