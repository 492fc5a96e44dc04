//! 사용자 수식 평가기.
//!
//! 수식 문자열을 트리로 파싱한 뒤 주어진 변수 컨텍스트 안에서만 평가한다.
//! 산술/비교/논리/삼항 연산 외의 기능(함수 호출, 대입, 멤버 접근)은 문법에
//! 존재하지 않는다.

mod lexer;
mod parser;

use std::collections::{BTreeSet, HashMap};

use thiserror::Error;

pub use parser::{BinaryOp, Expr, UnaryOp};

pub(crate) use lexer::{is_ident_continue, is_ident_start};

/// 수식 평가 실패.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaEvaluationError {
    #[error("{position}번째 문자 근처 구문 오류: {message}")]
    Syntax { position: usize, message: String },
    #[error("빈 수식")]
    Empty,
    #[error("정의되지 않은 변수: {0}")]
    UnknownVariable(String),
    #[error("자료형 오류: {0}")]
    TypeMismatch(&'static str),
    #[error("결과가 숫자가 아님")]
    NonNumeric,
    #[error("결과가 유한한 숫자가 아님: {0}")]
    NonFinite(f64),
}

/// 컨텍스트 값. 숫자 또는 참/거짓.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Number(f64),
    Bool(bool),
}

impl Value {
    fn number(self, what: &'static str) -> Result<f64, FormulaEvaluationError> {
        match self {
            Value::Number(v) => Ok(v),
            Value::Bool(_) => Err(FormulaEvaluationError::TypeMismatch(what)),
        }
    }

    /// 조건식 판정. 숫자는 0/NaN 이 아니면 참이다.
    fn truthy(self) -> bool {
        match self {
            Value::Bool(b) => b,
            Value::Number(v) => v != 0.0 && !v.is_nan(),
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

/// 수식에서 참조할 수 있는 변수 집합.
#[derive(Debug, Clone, Default)]
pub struct Context {
    vars: HashMap<String, Value>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.vars.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.vars.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

/// 파싱이 끝난 수식. 같은 수식을 여러 컨텍스트에서 반복 평가할 때 쓴다.
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    source: String,
    expr: Expr,
}

impl Formula {
    pub fn parse(source: &str) -> Result<Self, FormulaEvaluationError> {
        Ok(Self {
            source: source.to_string(),
            expr: parser::parse(source)?,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    pub fn variables(&self) -> BTreeSet<String> {
        self.expr.variables()
    }

    /// 유한한 숫자 결과만 성공으로 본다.
    pub fn evaluate(&self, ctx: &Context) -> Result<f64, FormulaEvaluationError> {
        match eval_expr(&self.expr, ctx)? {
            Value::Number(v) if v.is_finite() => Ok(v),
            Value::Number(v) => Err(FormulaEvaluationError::NonFinite(v)),
            Value::Bool(_) => Err(FormulaEvaluationError::NonNumeric),
        }
    }
}

/// 수식 문자열을 파싱해서 바로 평가한다.
pub fn evaluate(expression: &str, ctx: &Context) -> Result<f64, FormulaEvaluationError> {
    Formula::parse(expression)?.evaluate(ctx)
}

fn eval_expr(expr: &Expr, ctx: &Context) -> Result<Value, FormulaEvaluationError> {
    match expr {
        Expr::Number(v) => Ok(Value::Number(*v)),
        Expr::Var(name) => ctx
            .get(name)
            .ok_or_else(|| FormulaEvaluationError::UnknownVariable(name.clone())),
        Expr::Unary(op, operand) => {
            let v = eval_expr(operand, ctx)?;
            match op {
                UnaryOp::Neg => Ok(Value::Number(-v.number("단항 '-' 에는 숫자가 필요함")?)),
                UnaryOp::Plus => Ok(Value::Number(v.number("단항 '+' 에는 숫자가 필요함")?)),
                UnaryOp::Not => Ok(Value::Bool(!v.truthy())),
            }
        }
        Expr::Binary(BinaryOp::And, l, r) => {
            let lhs = eval_expr(l, ctx)?;
            if !lhs.truthy() {
                return Ok(Value::Bool(false));
            }
            Ok(Value::Bool(eval_expr(r, ctx)?.truthy()))
        }
        Expr::Binary(BinaryOp::Or, l, r) => {
            let lhs = eval_expr(l, ctx)?;
            if lhs.truthy() {
                return Ok(Value::Bool(true));
            }
            Ok(Value::Bool(eval_expr(r, ctx)?.truthy()))
        }
        Expr::Binary(op, l, r) => {
            let lhs = eval_expr(l, ctx)?;
            let rhs = eval_expr(r, ctx)?;
            eval_binary(*op, lhs, rhs)
        }
        Expr::Conditional(cond, then, otherwise) => {
            if eval_expr(cond, ctx)?.truthy() {
                eval_expr(then, ctx)
            } else {
                eval_expr(otherwise, ctx)
            }
        }
    }
}

fn eval_binary(op: BinaryOp, lhs: Value, rhs: Value) -> Result<Value, FormulaEvaluationError> {
    if let (BinaryOp::Eq | BinaryOp::Ne, Value::Bool(a), Value::Bool(b)) = (op, lhs, rhs) {
        return Ok(Value::Bool((a == b) == (op == BinaryOp::Eq)));
    }
    const ARITH: &str = "산술/비교 연산에는 숫자가 필요함";
    let a = lhs.number(ARITH)?;
    let b = rhs.number(ARITH)?;
    let value = match op {
        BinaryOp::Add => Value::Number(a + b),
        BinaryOp::Sub => Value::Number(a - b),
        BinaryOp::Mul => Value::Number(a * b),
        BinaryOp::Div => Value::Number(a / b),
        BinaryOp::Rem => Value::Number(a % b),
        BinaryOp::Lt => Value::Bool(a < b),
        BinaryOp::Le => Value::Bool(a <= b),
        BinaryOp::Gt => Value::Bool(a > b),
        BinaryOp::Ge => Value::Bool(a >= b),
        BinaryOp::Eq => Value::Bool(a == b),
        BinaryOp::Ne => Value::Bool(a != b),
        BinaryOp::And | BinaryOp::Or => unreachable!("short-circuit operators are handled in eval_expr"),
    };
    Ok(value)
}
