//! Parsed expression tree and its evaluator.

use super::error::FormulaError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinaryOp {
    pub(crate) fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Pow => "^",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }
}

/// Built-in functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Function {
    Abs,
    Floor,
    Ceiling,
    Round,
    Trunc,
    Sqrt,
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Ln,
    Log10,
    Log,
    Exp,
    Min,
    Max,
    If,
    Clamp,
}

impl Function {
    /// Resolve a function by name (case-insensitive).
    pub(crate) fn lookup(name: &str) -> Option<Self> {
        let function = match name.to_ascii_lowercase().as_str() {
            "abs" => Function::Abs,
            "floor" => Function::Floor,
            "ceiling" | "ceil" => Function::Ceiling,
            "round" => Function::Round,
            "trunc" | "truncate" => Function::Trunc,
            "sqrt" => Function::Sqrt,
            "sin" => Function::Sin,
            "cos" => Function::Cos,
            "tan" => Function::Tan,
            "asin" => Function::Asin,
            "acos" => Function::Acos,
            "atan" => Function::Atan,
            "ln" | "loge" => Function::Ln,
            "log10" => Function::Log10,
            "log" | "logn" => Function::Log,
            "exp" => Function::Exp,
            "min" => Function::Min,
            "max" => Function::Max,
            "if" => Function::If,
            "clamp" => Function::Clamp,
            _ => return None,
        };
        Some(function)
    }

    pub(crate) fn name(&self) -> &'static str {
        match self {
            Function::Abs => "abs",
            Function::Floor => "floor",
            Function::Ceiling => "ceiling",
            Function::Round => "round",
            Function::Trunc => "trunc",
            Function::Sqrt => "sqrt",
            Function::Sin => "sin",
            Function::Cos => "cos",
            Function::Tan => "tan",
            Function::Asin => "asin",
            Function::Acos => "acos",
            Function::Atan => "atan",
            Function::Ln => "ln",
            Function::Log10 => "log10",
            Function::Log => "log",
            Function::Exp => "exp",
            Function::Min => "min",
            Function::Max => "max",
            Function::If => "if",
            Function::Clamp => "clamp",
        }
    }

    /// Check the argument count.
    pub(crate) fn check_arity(&self, found: usize) -> Result<(), FormulaError> {
        let (ok, expected) = match self {
            Function::Log => (found == 1 || found == 2, "1 or 2"),
            Function::Min | Function::Max => (found >= 2, "at least 2"),
            Function::If | Function::Clamp => (found == 3, "3"),
            _ => (found == 1, "1"),
        };
        if ok {
            Ok(())
        } else {
            Err(FormulaError::Arity {
                function: self.name(),
                expected,
                found,
            })
        }
    }
}

/// Expression tree. Variables are looked up by name at evaluation time.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
    Number(f64),
    Variable(String),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Call(Function, Vec<Expr>),
}

fn truth(value: f64) -> bool {
    value != 0.0
}

fn flag(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

impl Expr {
    pub(crate) fn eval(&self, lookup: &impl Fn(&str) -> f64) -> Result<f64, FormulaError> {
        match self {
            Expr::Number(n) => Ok(*n),
            Expr::Variable(name) => Ok(lookup(name)),
            Expr::Unary(op, operand) => {
                let value = operand.eval(lookup)?;
                Ok(match op {
                    UnaryOp::Neg => -value,
                    UnaryOp::Not => flag(!truth(value)),
                })
            }
            Expr::Binary(op, lhs, rhs) => {
                // Short-circuit logical operators.
                match op {
                    BinaryOp::And => {
                        return Ok(flag(truth(lhs.eval(lookup)?) && truth(rhs.eval(lookup)?)))
                    }
                    BinaryOp::Or => {
                        return Ok(flag(truth(lhs.eval(lookup)?) || truth(rhs.eval(lookup)?)))
                    }
                    _ => {}
                }

                let a = lhs.eval(lookup)?;
                let b = rhs.eval(lookup)?;
                let result = match op {
                    BinaryOp::Add => a + b,
                    BinaryOp::Sub => a - b,
                    BinaryOp::Mul => a * b,
                    BinaryOp::Div => {
                        if b == 0.0 {
                            return Err(FormulaError::DivisionByZero);
                        }
                        a / b
                    }
                    BinaryOp::Rem => {
                        if b == 0.0 {
                            return Err(FormulaError::DivisionByZero);
                        }
                        a % b
                    }
                    BinaryOp::Pow => a.powf(b),
                    BinaryOp::Eq => flag(a == b),
                    BinaryOp::Ne => flag(a != b),
                    BinaryOp::Lt => flag(a < b),
                    BinaryOp::Le => flag(a <= b),
                    BinaryOp::Gt => flag(a > b),
                    BinaryOp::Ge => flag(a >= b),
                    BinaryOp::And | BinaryOp::Or => unreachable!("handled above"),
                };

                if result.is_nan() {
                    return Err(FormulaError::Domain(format!(
                        "{} {} {} is undefined",
                        a,
                        op.symbol(),
                        b
                    )));
                }
                Ok(result)
            }
            Expr::Call(function, args) => eval_call(*function, args, lookup),
        }
    }
}

fn eval_call(
    function: Function,
    args: &[Expr],
    lookup: &impl Fn(&str) -> f64,
) -> Result<f64, FormulaError> {
    if function == Function::If {
        let condition = args[0].eval(lookup)?;
        return if truth(condition) {
            args[1].eval(lookup)
        } else {
            args[2].eval(lookup)
        };
    }

    let values = args
        .iter()
        .map(|arg| arg.eval(lookup))
        .collect::<Result<Vec<_>, _>>()?;
    let x = values[0];

    let result = match function {
        Function::Abs => x.abs(),
        Function::Floor => x.floor(),
        Function::Ceiling => x.ceil(),
        Function::Round => x.round(),
        Function::Trunc => x.trunc(),
        Function::Sqrt => x.sqrt(),
        Function::Sin => x.sin(),
        Function::Cos => x.cos(),
        Function::Tan => x.tan(),
        Function::Asin => x.asin(),
        Function::Acos => x.acos(),
        Function::Atan => x.atan(),
        Function::Ln => x.ln(),
        Function::Log10 => x.log10(),
        Function::Log => match values.get(1) {
            Some(base) => x.log(*base),
            None => x.log10(),
        },
        Function::Exp => x.exp(),
        Function::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
        Function::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        Function::Clamp => {
            let (lo, hi) = (values[1], values[2]);
            // Also rejects NaN bounds, which f64::clamp panics on.
            if !(lo <= hi) {
                return Err(FormulaError::Domain(format!(
                    "clamp bounds out of order: {} > {}",
                    lo, hi
                )));
            }
            x.clamp(lo, hi)
        }
        Function::If => unreachable!("handled above"),
    };

    if result.is_nan() {
        return Err(FormulaError::Domain(format!(
            "{}({}) is undefined",
            function.name(),
            x
        )));
    }
    Ok(result)
}
