//! Attribute expression parsing for the `where` parameter.
//!
//! Supports the attribute subset of ECQL:
//!
//! - `a = 1`, `a <> 'x'`, `a != 'x'`, `<`, `<=`, `>`, `>=` (either side may
//!   be an attribute or a literal, so `1=1` is valid)
//! - `a [NOT] LIKE 'pat%'`, `a [NOT] ILIKE 'pat_'`
//! - `a IS [NOT] NULL`
//! - `a [NOT] BETWEEN 1 AND 10`
//! - `a [NOT] IN (1, 2, 3)`
//! - `INCLUDE`, `EXCLUDE`
//! - `NOT`, `AND`, `OR` and parentheses; `NOT` binds tighter than `AND`,
//!   which binds tighter than `OR`
//!
//! Strings are single-quoted with `''` as the escaped quote. Attribute names
//! may be double-quoted. Keywords are case-insensitive.

use thiserror::Error;

use crate::filter::{ComparisonOp, Expression, Filter, Literal};

/// A parse failure with the byte offset where it was detected.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{message} at position {position}")]
pub struct CqlError {
    position: usize,
    message: String,
    input: String,
}

impl CqlError {
    fn new(input: &str, position: usize, message: impl Into<String>) -> Self {
        Self {
            position,
            message: message.into(),
            input: input.to_string(),
        }
    }

    /// Byte offset into the input.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The expression that failed to parse.
    pub fn input(&self) -> &str {
        &self.input
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    QuotedIdent(String),
    Str(String),
    Number(f64),
    Op(ComparisonOp),
    LParen,
    RParen,
    Comma,
}

/// Parse an attribute expression into a filter.
pub fn parse(input: &str) -> Result<Filter, CqlError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(CqlError::new(input, 0, "Empty expression"));
    }

    let mut parser = Parser {
        input,
        tokens,
        pos: 0,
    };
    let filter = parser.or_expr()?;
    if parser.pos < parser.tokens.len() {
        return Err(parser.error("Unexpected token"));
    }
    Ok(filter)
}

fn tokenize(input: &str) -> Result<Vec<(usize, Token)>, CqlError> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];
        let start = i;
        match c {
            b' ' | b'\t' | b'\n' | b'\r' => {
                i += 1;
            }
            b'(' => {
                tokens.push((start, Token::LParen));
                i += 1;
            }
            b')' => {
                tokens.push((start, Token::RParen));
                i += 1;
            }
            b',' => {
                tokens.push((start, Token::Comma));
                i += 1;
            }
            b'=' => {
                tokens.push((start, Token::Op(ComparisonOp::Eq)));
                i += 1;
            }
            b'<' => {
                let (op, len) = match bytes.get(i + 1) {
                    Some(b'=') => (ComparisonOp::LtEq, 2),
                    Some(b'>') => (ComparisonOp::NotEq, 2),
                    _ => (ComparisonOp::Lt, 1),
                };
                tokens.push((start, Token::Op(op)));
                i += len;
            }
            b'>' => {
                let (op, len) = match bytes.get(i + 1) {
                    Some(b'=') => (ComparisonOp::GtEq, 2),
                    _ => (ComparisonOp::Gt, 1),
                };
                tokens.push((start, Token::Op(op)));
                i += len;
            }
            b'!' => {
                if bytes.get(i + 1) != Some(&b'=') {
                    return Err(CqlError::new(input, start, "Expected '=' after '!'"));
                }
                tokens.push((start, Token::Op(ComparisonOp::NotEq)));
                i += 2;
            }
            b'\'' | b'"' => {
                let (text, end) = quoted(input, start, c)?;
                let token = if c == b'\'' {
                    Token::Str(text)
                } else {
                    Token::QuotedIdent(text)
                };
                tokens.push((start, token));
                i = end;
            }
            b'0'..=b'9' | b'.' | b'-' | b'+' => {
                let end = number_end(bytes, i);
                let text = &input[start..end];
                let value: f64 = text
                    .parse()
                    .map_err(|_| CqlError::new(input, start, format!("Invalid number '{}'", text)))?;
                tokens.push((start, Token::Number(value)));
                i = end;
            }
            c if c.is_ascii_alphabetic() || c == b'_' => {
                let mut end = i + 1;
                while end < bytes.len()
                    && (bytes[end].is_ascii_alphanumeric() || matches!(bytes[end], b'_' | b'.' | b':'))
                {
                    end += 1;
                }
                tokens.push((start, Token::Ident(input[start..end].to_string())));
                i = end;
            }
            _ => {
                let ch = input[start..].chars().next().unwrap_or('?');
                return Err(CqlError::new(
                    input,
                    start,
                    format!("Unexpected character '{}'", ch),
                ));
            }
        }
    }

    Ok(tokens)
}

/// Read a quoted run starting at `start`; a doubled quote is an escaped quote.
fn quoted(input: &str, start: usize, quote: u8) -> Result<(String, usize), CqlError> {
    let bytes = input.as_bytes();
    let mut i = start + 1;
    let mut run_start = i;
    let mut text = String::new();

    while i < bytes.len() {
        if bytes[i] == quote {
            text.push_str(&input[run_start..i]);
            if bytes.get(i + 1) == Some(&quote) {
                text.push(quote as char);
                i += 2;
                run_start = i;
                continue;
            }
            return Ok((text, i + 1));
        }
        i += 1;
    }

    Err(CqlError::new(input, start, "Unterminated quoted text"))
}

fn number_end(bytes: &[u8], start: usize) -> usize {
    let mut i = start;
    if matches!(bytes.get(i), Some(b'-') | Some(b'+')) {
        i += 1;
    }
    while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'.') {
        i += 1;
    }
    if matches!(bytes.get(i), Some(b'e') | Some(b'E')) {
        let mut j = i + 1;
        if matches!(bytes.get(j), Some(b'-') | Some(b'+')) {
            j += 1;
        }
        if bytes.get(j).map_or(false, u8::is_ascii_digit) {
            i = j;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
        }
    }
    i
}

const RESERVED: &[&str] = &[
    "AND", "OR", "NOT", "LIKE", "ILIKE", "IS", "NULL", "BETWEEN", "IN", "INCLUDE", "EXCLUDE",
];

struct Parser<'a> {
    input: &'a str,
    tokens: Vec<(usize, Token)>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn error(&self, message: impl Into<String>) -> CqlError {
        let position = self
            .tokens
            .get(self.pos)
            .map(|(offset, _)| *offset)
            .unwrap_or(self.input.len());
        CqlError::new(self.input, position, message)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(_, t)| t)
    }

    fn at_keyword(&self, keyword: &str) -> bool {
        matches!(self.peek(), Some(Token::Ident(name)) if name.eq_ignore_ascii_case(keyword))
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if self.at_keyword(keyword) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<(), CqlError> {
        if self.eat_keyword(keyword) {
            Ok(())
        } else {
            Err(self.error(format!("Expected {}", keyword)))
        }
    }

    fn expect(&mut self, expected: Token, what: &str) -> Result<(), CqlError> {
        if self.peek() == Some(&expected) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(format!("Expected {}", what)))
        }
    }

    fn or_expr(&mut self) -> Result<Filter, CqlError> {
        let mut children = vec![self.and_expr()?];
        while self.eat_keyword("OR") {
            children.push(self.and_expr()?);
        }
        Ok(collapse(children, Filter::Or))
    }

    fn and_expr(&mut self) -> Result<Filter, CqlError> {
        let mut children = vec![self.not_expr()?];
        while self.eat_keyword("AND") {
            children.push(self.not_expr()?);
        }
        Ok(collapse(children, Filter::And))
    }

    fn not_expr(&mut self) -> Result<Filter, CqlError> {
        if self.eat_keyword("NOT") {
            return Ok(self.not_expr()?.negate());
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Filter, CqlError> {
        if self.peek() == Some(&Token::LParen) {
            self.pos += 1;
            let inner = self.or_expr()?;
            self.expect(Token::RParen, "')'")?;
            return Ok(inner);
        }
        if self.eat_keyword("INCLUDE") {
            return Ok(Filter::Include);
        }
        if self.eat_keyword("EXCLUDE") {
            return Ok(Filter::Exclude);
        }
        self.predicate()
    }

    fn predicate(&mut self) -> Result<Filter, CqlError> {
        let left = self.operand()?;

        if let Some(Token::Op(op)) = self.peek() {
            let op = *op;
            self.pos += 1;
            let right = self.operand()?;
            return Ok(Filter::Compare { left, op, right });
        }

        if self.eat_keyword("IS") {
            let negated = self.eat_keyword("NOT");
            self.expect_keyword("NULL")?;
            return Ok(negate_if(Filter::IsNull(left), negated));
        }

        let negated = self.eat_keyword("NOT");

        if self.at_keyword("LIKE") || self.at_keyword("ILIKE") {
            let case_insensitive = self.at_keyword("ILIKE");
            self.pos += 1;
            let pattern = match self.peek() {
                Some(Token::Str(pattern)) => pattern.clone(),
                _ => return Err(self.error("Expected pattern string")),
            };
            self.pos += 1;
            let filter = Filter::Like {
                expr: left,
                pattern,
                case_insensitive,
            };
            return Ok(negate_if(filter, negated));
        }

        if self.eat_keyword("BETWEEN") {
            let lower = self.operand()?;
            self.expect_keyword("AND")?;
            let upper = self.operand()?;
            let filter = Filter::Between {
                expr: left,
                lower,
                upper,
            };
            return Ok(negate_if(filter, negated));
        }

        if self.eat_keyword("IN") {
            self.expect(Token::LParen, "'('")?;
            let mut values = vec![self.operand()?];
            while self.peek() == Some(&Token::Comma) {
                self.pos += 1;
                values.push(self.operand()?);
            }
            self.expect(Token::RParen, "')'")?;
            return Ok(negate_if(Filter::In { expr: left, values }, negated));
        }

        if negated {
            Err(self.error("Expected LIKE, ILIKE, BETWEEN or IN after NOT"))
        } else {
            Err(self.error("Expected comparison operator"))
        }
    }

    fn operand(&mut self) -> Result<Expression, CqlError> {
        let expr = match self.peek() {
            Some(Token::Ident(name)) => {
                if name.eq_ignore_ascii_case("TRUE") {
                    Expression::Literal(Literal::Bool(true))
                } else if name.eq_ignore_ascii_case("FALSE") {
                    Expression::Literal(Literal::Bool(false))
                } else if RESERVED.iter().any(|kw| name.eq_ignore_ascii_case(kw)) {
                    return Err(self.error("Expected attribute or literal"));
                } else {
                    Expression::Property(name.clone())
                }
            }
            Some(Token::QuotedIdent(name)) => Expression::Property(name.clone()),
            Some(Token::Str(text)) => Expression::Literal(Literal::String(text.clone())),
            Some(Token::Number(value)) => Expression::Literal(Literal::Number(*value)),
            _ => return Err(self.error("Expected attribute or literal")),
        };
        self.pos += 1;
        Ok(expr)
    }
}

fn collapse(mut children: Vec<Filter>, combine: fn(Vec<Filter>) -> Filter) -> Filter {
    if children.len() == 1 {
        children.remove(0)
    } else {
        combine(children)
    }
}

fn negate_if(filter: Filter, negated: bool) -> Filter {
    if negated {
        filter.negate()
    } else {
        filter
    }
}
