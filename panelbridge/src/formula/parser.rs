//! Recursive-descent parser producing an [`Expr`] tree.
//!
//! Precedence, lowest first:
//!
//! ```text
//! ||
//! &&
//! == != < <= > >=
//! + -
//! * / %
//! unary - + !
//! ^            (right associative)
//! ```

use std::collections::HashSet;

use super::ast::{BinaryOp, Expr, Function, UnaryOp};
use super::error::FormulaError;
use super::lexer::{tokenize, Spanned, Token};

/// Named constants available in every expression.
pub(crate) fn constant(name: &str) -> Option<f64> {
    match name.to_ascii_lowercase().as_str() {
        "pi" => Some(std::f64::consts::PI),
        "e" => Some(std::f64::consts::E),
        _ => None,
    }
}

/// Deepest nesting of parentheses, calls and prefix operators.
pub(crate) const MAX_DEPTH: usize = 256;

/// Longest expression, in tokens. Bounds the depth of operator chains,
/// which the evaluator walks recursively.
pub(crate) const MAX_TOKENS: usize = 1024;

struct Parser<'a> {
    tokens: Vec<Spanned>,
    pos: usize,
    end: usize,
    depth: usize,
    variables: &'a HashSet<&'a str>,
}

/// Parse `input`, resolving identifiers against `variables`.
pub(crate) fn parse(input: &str, variables: &HashSet<&str>) -> Result<Expr, FormulaError> {
    let tokens = tokenize(input)?;
    if let Some(extra) = tokens.get(MAX_TOKENS) {
        return Err(FormulaError::Syntax {
            position: extra.position,
            message: format!("expression longer than {} tokens", MAX_TOKENS),
        });
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        end: input.chars().count(),
        depth: 0,
        variables,
    };

    let expr = parser.or()?;
    if let Some(extra) = parser.tokens.get(parser.pos) {
        return Err(FormulaError::Syntax {
            position: extra.position,
            message: "unexpected trailing input".to_string(),
        });
    }
    Ok(expr)
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn position(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|s| s.position)
            .unwrap_or(self.end)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|s| s.token.clone());
        self.pos += 1;
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn error(&self, message: impl Into<String>) -> FormulaError {
        FormulaError::Syntax {
            position: self.position(),
            message: message.into(),
        }
    }

    fn or(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.and()?;
        while self.eat(&Token::OrOr) {
            let rhs = self.and()?;
            lhs = Expr::Binary(BinaryOp::Or, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn and(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.comparison()?;
        while self.eat(&Token::AndAnd) {
            let rhs = self.comparison()?;
            lhs = Expr::Binary(BinaryOp::And, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn comparison(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.additive()?;
        loop {
            let op = match self.peek() {
                Some(Token::EqEq) => BinaryOp::Eq,
                Some(Token::NotEq) => BinaryOp::Ne,
                Some(Token::Less) => BinaryOp::Lt,
                Some(Token::LessEq) => BinaryOp::Le,
                Some(Token::Greater) => BinaryOp::Gt,
                Some(Token::GreaterEq) => BinaryOp::Ge,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.additive()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn additive(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.term()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn term(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                Some(Token::Percent) => BinaryOp::Rem,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.unary()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    /// Every nested sub-expression passes through here, so this is where
    /// depth is counted.
    fn unary(&mut self) -> Result<Expr, FormulaError> {
        if self.depth >= MAX_DEPTH {
            return Err(self.error(format!("nested deeper than {} levels", MAX_DEPTH)));
        }
        self.depth += 1;
        let result = self.prefixed();
        self.depth -= 1;
        result
    }

    fn prefixed(&mut self) -> Result<Expr, FormulaError> {
        match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                Ok(Expr::Unary(UnaryOp::Neg, Box::new(self.unary()?)))
            }
            Some(Token::Plus) => {
                self.pos += 1;
                self.unary()
            }
            Some(Token::Bang) => {
                self.pos += 1;
                Ok(Expr::Unary(UnaryOp::Not, Box::new(self.unary()?)))
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> Result<Expr, FormulaError> {
        let base = self.primary()?;
        if self.eat(&Token::Caret) {
            let exponent = self.unary()?;
            return Ok(Expr::Binary(
                BinaryOp::Pow,
                Box::new(base),
                Box::new(exponent),
            ));
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<Expr, FormulaError> {
        let position = self.position();
        match self.advance() {
            Some(Token::Number(n)) => Ok(Expr::Number(n)),
            Some(Token::LParen) => {
                let inner = self.or()?;
                if !self.eat(&Token::RParen) {
                    return Err(self.error("expected ')'"));
                }
                Ok(inner)
            }
            Some(Token::Ident(name)) => {
                if self.peek() == Some(&Token::LParen) {
                    self.pos += 1;
                    return self.call(name);
                }
                if self.variables.contains(name.as_str()) {
                    return Ok(Expr::Variable(name));
                }
                if let Some(value) = constant(&name) {
                    return Ok(Expr::Number(value));
                }
                Err(FormulaError::UnknownIdentifier(name))
            }
            Some(_) => Err(FormulaError::Syntax {
                position,
                message: "expected a number, identifier or '('".to_string(),
            }),
            None => Err(FormulaError::Syntax {
                position,
                message: "unexpected end of expression".to_string(),
            }),
        }
    }

    fn call(&mut self, name: String) -> Result<Expr, FormulaError> {
        let function = Function::lookup(&name).ok_or(FormulaError::UnknownFunction(name))?;

        let mut args = Vec::new();
        if !self.eat(&Token::RParen) {
            loop {
                args.push(self.or()?);
                if self.eat(&Token::Comma) {
                    continue;
                }
                if self.eat(&Token::RParen) {
                    break;
                }
                return Err(self.error("expected ',' or ')'"));
            }
        }

        function.check_arity(args.len())?;
        Ok(Expr::Call(function, args))
    }
}
