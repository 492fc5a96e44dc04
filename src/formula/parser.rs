use std::collections::BTreeSet;

use super::lexer::{tokenize, Spanned, Token};
use super::FormulaEvaluationError;

/// 사용자 수식 중첩 한도. 악의적인 입력으로 스택이 넘치지 않게 한다.
const MAX_DEPTH: usize = 128;

/// 연산자 노드 수 한도. 연산자 체인은 괄호 없이도 트리를 한쪽으로 깊게 만든다.
const MAX_NODES: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Plus,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    And,
    Or,
}

/// 파싱된 수식 트리.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Var(String),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Conditional(Box<Expr>, Box<Expr>, Box<Expr>),
}

impl Expr {
    /// 수식이 참조하는 변수 이름 집합.
    pub fn variables(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_variables(&mut out);
        out
    }

    fn collect_variables(&self, out: &mut BTreeSet<String>) {
        match self {
            Expr::Number(_) => {}
            Expr::Var(name) => {
                out.insert(name.clone());
            }
            Expr::Unary(_, e) => e.collect_variables(out),
            Expr::Binary(_, l, r) => {
                l.collect_variables(out);
                r.collect_variables(out);
            }
            Expr::Conditional(c, t, e) => {
                c.collect_variables(out);
                t.collect_variables(out);
                e.collect_variables(out);
            }
        }
    }
}

pub(crate) fn parse(src: &str) -> Result<Expr, FormulaEvaluationError> {
    let tokens = tokenize(src)?;
    if tokens.is_empty() {
        return Err(FormulaEvaluationError::Empty);
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
        nodes: 0,
        end: src.chars().count(),
    };
    let expr = parser.conditional()?;
    if let Some(extra) = parser.tokens.get(parser.pos) {
        return Err(FormulaEvaluationError::Syntax {
            position: extra.position,
            message: "수식 끝에 불필요한 토큰".to_string(),
        });
    }
    Ok(expr)
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    depth: usize,
    nodes: usize,
    end: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn position(&self) -> usize {
        self.tokens.get(self.pos).map_or(self.end, |s| s.position)
    }

    fn error(&self, message: &str) -> FormulaEvaluationError {
        FormulaEvaluationError::Syntax {
            position: self.position(),
            message: message.to_string(),
        }
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn enter(&mut self) -> Result<(), FormulaEvaluationError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(self.error("수식 중첩이 너무 깊음"));
        }
        Ok(())
    }

    fn node(&mut self) -> Result<(), FormulaEvaluationError> {
        self.nodes += 1;
        if self.nodes > MAX_NODES {
            return Err(self.error("수식이 너무 김"));
        }
        Ok(())
    }

    // cond ? a : b  (우결합)
    fn conditional(&mut self) -> Result<Expr, FormulaEvaluationError> {
        self.enter()?;
        let cond = self.or()?;
        let expr = if self.eat(&Token::Question) {
            let then = self.conditional()?;
            if !self.eat(&Token::Colon) {
                return Err(self.error("삼항 연산자에 ':' 가 없음"));
            }
            let otherwise = self.conditional()?;
            self.node()?;
            Expr::Conditional(Box::new(cond), Box::new(then), Box::new(otherwise))
        } else {
            cond
        };
        self.depth -= 1;
        Ok(expr)
    }

    fn binary_level(
        &mut self,
        ops: &[(Token, BinaryOp)],
        next: fn(&mut Self) -> Result<Expr, FormulaEvaluationError>,
    ) -> Result<Expr, FormulaEvaluationError> {
        let mut lhs = next(self)?;
        'outer: loop {
            for (token, op) in ops {
                if self.eat(token) {
                    self.node()?;
                    let rhs = next(self)?;
                    lhs = Expr::Binary(*op, Box::new(lhs), Box::new(rhs));
                    continue 'outer;
                }
            }
            return Ok(lhs);
        }
    }

    fn or(&mut self) -> Result<Expr, FormulaEvaluationError> {
        self.binary_level(&[(Token::OrOr, BinaryOp::Or)], Self::and)
    }

    fn and(&mut self) -> Result<Expr, FormulaEvaluationError> {
        self.binary_level(&[(Token::AndAnd, BinaryOp::And)], Self::equality)
    }

    fn equality(&mut self) -> Result<Expr, FormulaEvaluationError> {
        self.binary_level(
            &[(Token::EqEq, BinaryOp::Eq), (Token::NotEq, BinaryOp::Ne)],
            Self::comparison,
        )
    }

    fn comparison(&mut self) -> Result<Expr, FormulaEvaluationError> {
        self.binary_level(
            &[
                (Token::LessEq, BinaryOp::Le),
                (Token::Less, BinaryOp::Lt),
                (Token::GreaterEq, BinaryOp::Ge),
                (Token::Greater, BinaryOp::Gt),
            ],
            Self::additive,
        )
    }

    fn additive(&mut self) -> Result<Expr, FormulaEvaluationError> {
        self.binary_level(
            &[(Token::Plus, BinaryOp::Add), (Token::Minus, BinaryOp::Sub)],
            Self::multiplicative,
        )
    }

    fn multiplicative(&mut self) -> Result<Expr, FormulaEvaluationError> {
        self.binary_level(
            &[
                (Token::Star, BinaryOp::Mul),
                (Token::Slash, BinaryOp::Div),
                (Token::Percent, BinaryOp::Rem),
            ],
            Self::unary,
        )
    }

    fn unary(&mut self) -> Result<Expr, FormulaEvaluationError> {
        let op = match self.peek() {
            Some(Token::Minus) => Some(UnaryOp::Neg),
            Some(Token::Plus) => Some(UnaryOp::Plus),
            Some(Token::Bang) => Some(UnaryOp::Not),
            _ => None,
        };
        match op {
            Some(op) => {
                self.pos += 1;
                self.node()?;
                self.enter()?;
                let operand = self.unary()?;
                self.depth -= 1;
                Ok(Expr::Unary(op, Box::new(operand)))
            }
            None => self.primary(),
        }
    }

    fn primary(&mut self) -> Result<Expr, FormulaEvaluationError> {
        match self.peek().cloned() {
            Some(Token::Number(v)) => {
                self.pos += 1;
                Ok(Expr::Number(v))
            }
            Some(Token::Ident(name)) => {
                self.pos += 1;
                if self.peek() == Some(&Token::LParen) {
                    return Err(self.error("함수 호출은 지원하지 않음"));
                }
                Ok(Expr::Var(name))
            }
            Some(Token::LParen) => {
                self.pos += 1;
                let inner = self.conditional()?;
                if !self.eat(&Token::RParen) {
                    return Err(self.error("닫는 괄호가 없음"));
                }
                Ok(inner)
            }
            Some(_) => Err(self.error("피연산자가 와야 함")),
            None => Err(self.error("수식이 중간에 끝남")),
        }
    }
}
