//! Recursive-descent parser for candidate expressions.
//!
//! The grammar is a small pandas-flavoured subset. Precedence, lowest first:
//!
//! | Level | Operators                     |
//! |-------|-------------------------------|
//! | 1     | `or`                          |
//! | 2     | `and`                         |
//! | 3     | `not`                         |
//! | 4     | `== != < <= > >=` (no chains) |
//! | 5     | `\|`                          |
//! | 6     | `&`                           |
//! | 7     | `+ -`                         |
//! | 8     | `* / // %`                    |
//! | 9     | unary `- + ~`                 |
//! | 10    | `**` (right associative)      |
//! | 11    | `.method()`, `.dt.x`, `.str.x()` |
//!
//! Columns are read through the `df` binding (`df['name']`, `df["name"]`,
//! `df.name`). Helpers are called bare (`log(x)`), through `np.`/`pd.`, or as
//! methods on a value.

use std::f64::consts;

use crate::ast::{BinaryOp, CastType, DatePart, Expr, Function, UnaryOp};
use crate::error::{ExprError, Result};
use crate::lexer::{Spanned, Token, tokenize};

/// Name the dataset is bound to inside expressions.
pub const DATASET_BINDING: &str = "df";

/// Parses `source` into an expression tree no deeper than `max_depth`.
pub fn parse(source: &str, max_depth: usize) -> Result<Expr> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
        max_depth,
    };
    let expr = parser.expression()?;
    if parser.peek() != &Token::End {
        return Err(parser.unexpected());
    }
    if expr.depth() > max_depth {
        return Err(ExprError::TooDeep { max: max_depth });
    }
    Ok(expr)
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    depth: usize,
    max_depth: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)].token
    }

    fn peek_next(&self) -> &Token {
        &self.tokens[(self.pos + 1).min(self.tokens.len() - 1)].token
    }

    fn offset(&self) -> usize {
        self.tokens[self.pos.min(self.tokens.len() - 1)].offset
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    /// Steps back over a token returned by [`Parser::advance`].
    fn back(&mut self, token: &Token) {
        if *token != Token::End {
            self.pos -= 1;
        }
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == token {
            self.advance();
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if matches!(self.peek(), Token::Ident(name) if name == keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token) -> Result<()> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.syntax(format!("expected {token}, found {}", self.peek())))
        }
    }

    fn ident(&mut self) -> Result<String> {
        match self.advance() {
            Token::Ident(name) => Ok(name),
            other => {
                self.back(&other);
                Err(self.syntax(format!("expected a name, found {other}")))
            }
        }
    }

    fn syntax(&self, message: impl Into<String>) -> ExprError {
        ExprError::Syntax {
            offset: self.offset(),
            message: message.into(),
        }
    }

    fn unexpected(&self) -> ExprError {
        self.syntax(format!("unexpected {}", self.peek()))
    }

    fn enter(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(ExprError::TooDeep {
                max: self.max_depth,
            });
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn expression(&mut self) -> Result<Expr> {
        self.enter()?;
        let expr = self.or();
        self.leave();
        expr
    }

    fn or(&mut self) -> Result<Expr> {
        let mut left = self.and()?;
        while self.eat_keyword("or") {
            let right = self.and()?;
            left = binary(BinaryOp::Or, left, right);
        }
        Ok(left)
    }

    fn and(&mut self) -> Result<Expr> {
        let mut left = self.not()?;
        while self.eat_keyword("and") {
            let right = self.not()?;
            left = binary(BinaryOp::And, left, right);
        }
        Ok(left)
    }

    fn not(&mut self) -> Result<Expr> {
        if self.eat_keyword("not") {
            self.enter()?;
            let operand = self.not();
            self.leave();
            return Ok(unary(UnaryOp::Not, operand?));
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Result<Expr> {
        let left = self.bit_or()?;
        let Some(op) = comparison_op(self.peek()) else {
            return Ok(left);
        };
        self.advance();
        let right = self.bit_or()?;
        if comparison_op(self.peek()).is_some() {
            return Err(self.syntax("chained comparisons are not supported"));
        }
        Ok(binary(op, left, right))
    }

    fn bit_or(&mut self) -> Result<Expr> {
        let mut left = self.bit_and()?;
        while self.eat(&Token::Pipe) {
            let right = self.bit_and()?;
            left = binary(BinaryOp::Or, left, right);
        }
        Ok(left)
    }

    fn bit_and(&mut self) -> Result<Expr> {
        let mut left = self.arith()?;
        while self.eat(&Token::Amp) {
            let right = self.arith()?;
            left = binary(BinaryOp::And, left, right);
        }
        Ok(left)
    }

    fn arith(&mut self) -> Result<Expr> {
        let mut left = self.term()?;
        loop {
            let op = match self.peek() {
                Token::Plus => BinaryOp::Add,
                Token::Minus => BinaryOp::Sub,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.term()?;
            left = binary(op, left, right);
        }
    }

    fn term(&mut self) -> Result<Expr> {
        let mut left = self.unary()?;
        loop {
            let op = match self.peek() {
                Token::Star => BinaryOp::Mul,
                Token::Slash => BinaryOp::Div,
                Token::DoubleSlash => BinaryOp::FloorDiv,
                Token::Percent => BinaryOp::Mod,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.unary()?;
            left = binary(op, left, right);
        }
    }

    fn unary(&mut self) -> Result<Expr> {
        let op = match self.peek() {
            Token::Minus => Some(UnaryOp::Neg),
            Token::Tilde => Some(UnaryOp::Not),
            Token::Plus => None,
            _ => return self.power(),
        };
        self.advance();
        self.enter()?;
        let operand = self.unary();
        self.leave();
        let operand = operand?;
        Ok(match (op, operand) {
            (Some(UnaryOp::Neg), Expr::Number(n)) => Expr::Number(-n),
            (Some(op), operand) => unary(op, operand),
            (None, operand) => operand,
        })
    }

    fn power(&mut self) -> Result<Expr> {
        let base = self.postfix()?;
        if self.eat(&Token::DoubleStar) {
            self.enter()?;
            let exponent = self.unary();
            self.leave();
            return Ok(binary(BinaryOp::Pow, base, exponent?));
        }
        Ok(base)
    }

    fn postfix(&mut self) -> Result<Expr> {
        let mut expr = self.atom()?;
        loop {
            match self.peek() {
                Token::Dot => {
                    self.advance();
                    expr = self.member(expr)?;
                }
                Token::LBracket => {
                    return Err(self.syntax(format!(
                        "indexing is only supported on '{DATASET_BINDING}'"
                    )));
                }
                _ => return Ok(expr),
            }
        }
    }

    /// Handles everything after a `.` on a value.
    fn member(&mut self, receiver: Expr) -> Result<Expr> {
        let name = self.ident()?;
        match name.as_str() {
            "dt" => {
                self.expect(&Token::Dot)?;
                let part_name = self.ident()?;
                let part = DatePart::from_name(&part_name).ok_or_else(|| {
                    ExprError::UnknownFunction {
                        name: format!("dt.{part_name}"),
                    }
                })?;
                Ok(Expr::Call {
                    function: Function::DatePart(part),
                    args: vec![receiver],
                })
            }
            "str" => {
                self.expect(&Token::Dot)?;
                let method = self.ident()?;
                let function = Function::from_str_accessor(&method).ok_or_else(|| {
                    ExprError::UnknownFunction {
                        name: format!("str.{method}"),
                    }
                })?;
                self.call(function, Some(receiver))
            }
            "astype" => {
                self.expect(&Token::LParen)?;
                let type_name = match self.advance() {
                    Token::Ident(name) | Token::Str(name) => name,
                    other => {
                        return Err(self.syntax(format!("expected a type name, found {other}")));
                    }
                };
                let cast = CastType::from_name(&type_name).ok_or_else(|| {
                    self.syntax(format!("unsupported astype target '{type_name}'"))
                })?;
                self.expect(&Token::RParen)?;
                Ok(Expr::Call {
                    function: Function::Cast(cast),
                    args: vec![receiver],
                })
            }
            _ if self.peek() == &Token::LParen => {
                let function =
                    Function::from_name(&name).ok_or(ExprError::UnknownFunction { name })?;
                self.call(function, Some(receiver))
            }
            _ => Err(ExprError::UnknownFunction { name }),
        }
    }

    fn atom(&mut self) -> Result<Expr> {
        match self.advance() {
            Token::Number(n) => Ok(Expr::Number(n)),
            Token::Str(s) => Ok(Expr::Text(s)),
            Token::LParen => {
                let expr = self.expression()?;
                self.expect(&Token::RParen)?;
                Ok(expr)
            }
            Token::Ident(name) => self.named(name),
            other => {
                self.back(&other);
                Err(self.unexpected())
            }
        }
    }

    fn named(&mut self, name: String) -> Result<Expr> {
        match name.as_str() {
            "True" => Ok(Expr::Boolean(true)),
            "False" => Ok(Expr::Boolean(false)),
            "None" => Ok(Expr::Null),
            DATASET_BINDING => self.column(),
            "np" | "pd" => {
                self.expect(&Token::Dot)?;
                let member = self.ident()?;
                match member.as_str() {
                    "nan" | "NaN" | "NA" => Ok(Expr::Null),
                    "pi" => Ok(Expr::Number(consts::PI)),
                    "e" => Ok(Expr::Number(consts::E)),
                    _ => {
                        let function = Function::from_name(&member).ok_or_else(|| {
                            ExprError::UnknownFunction {
                                name: format!("{name}.{member}"),
                            }
                        })?;
                        self.call(function, None)
                    }
                }
            }
            _ if self.peek() == &Token::LParen => {
                let function =
                    Function::from_name(&name).ok_or(ExprError::UnknownFunction { name })?;
                self.call(function, None)
            }
            _ => {
                self.pos -= 1;
                Err(self.syntax(format!("unknown name '{name}'")))
            }
        }
    }

    fn column(&mut self) -> Result<Expr> {
        if self.eat(&Token::LBracket) {
            let name = match self.advance() {
                Token::Str(name) => name,
                other => {
                    return Err(self.syntax(format!("expected a quoted column name, found {other}")));
                }
            };
            self.expect(&Token::RBracket)?;
            return Ok(Expr::Column(name));
        }
        if self.eat(&Token::Dot) {
            let name = self.ident()?;
            if self.peek() == &Token::LParen {
                return Err(ExprError::UnknownFunction {
                    name: format!("{DATASET_BINDING}.{name}"),
                });
            }
            return Ok(Expr::Column(name));
        }
        Err(self.syntax(format!(
            "'{DATASET_BINDING}' must be indexed by a column name"
        )))
    }

    /// Parses a parenthesized argument list, receiver first.
    fn call(&mut self, function: Function, receiver: Option<Expr>) -> Result<Expr> {
        self.expect(&Token::LParen)?;
        let mut args: Vec<Expr> = receiver.into_iter().collect();
        let mut keywords: Vec<(usize, Expr)> = Vec::new();
        while self.peek() != &Token::RParen {
            if let (Token::Ident(key), Token::Assign) = (self.peek(), self.peek_next()) {
                let key = key.clone();
                self.advance();
                self.advance();
                let value = self.expression()?;
                match keyword_slot(function, &key) {
                    Some(slot) => keywords.push((slot, value)),
                    None if is_ignored_keyword(function, &key) => {}
                    None => {
                        return Err(self.syntax(format!(
                            "{} got an unexpected keyword argument '{key}'",
                            function.name()
                        )));
                    }
                }
            } else {
                if !keywords.is_empty() {
                    return Err(self.syntax("positional argument follows keyword argument"));
                }
                args.push(self.expression()?);
            }
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        self.expect(&Token::RParen)?;

        for (slot, value) in keywords {
            while args.len() < slot {
                args.push(Expr::Null);
            }
            if args.len() == slot {
                args.push(value);
            } else {
                return Err(self.syntax(format!(
                    "{} got multiple values for one argument",
                    function.name()
                )));
            }
        }
        if function == Function::Clip && args.len() < 3 {
            args.resize(3, Expr::Null);
        }
        let function = function.resolve(args.len())?;
        Ok(Expr::Call { function, args })
    }
}

fn keyword_slot(function: Function, key: &str) -> Option<usize> {
    match (function, key) {
        (Function::Clip, "lower") | (Function::Round, "decimals") => Some(1),
        (Function::FillNa, "value") | (Function::Contains, "pat") => Some(1),
        (Function::Clip, "upper") => Some(2),
        _ => None,
    }
}

/// Keywords accepted for compatibility that do not change evaluation.
fn is_ignored_keyword(function: Function, key: &str) -> bool {
    matches!(
        (function, key),
        (Function::ToDatetime, "errors") | (Function::Contains, "regex")
    )
}

fn comparison_op(token: &Token) -> Option<BinaryOp> {
    Some(match token {
        Token::Eq => BinaryOp::Eq,
        Token::NotEq => BinaryOp::NotEq,
        Token::Lt => BinaryOp::Lt,
        Token::LtEq => BinaryOp::LtEq,
        Token::Gt => BinaryOp::Gt,
        Token::GtEq => BinaryOp::GtEq,
        _ => return None,
    })
}

fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

fn unary(op: UnaryOp, operand: Expr) -> Expr {
    Expr::Unary {
        op,
        operand: Box::new(operand),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(name: &str) -> Expr {
        Expr::Column(name.to_string())
    }

    fn parse_ok(source: &str) -> Expr {
        parse(source, 64).unwrap()
    }

    #[test]
    fn test_arithmetic_precedence() {
        assert_eq!(
            parse_ok("df['a'] + df.b * 2"),
            binary(
                BinaryOp::Add,
                col("a"),
                binary(BinaryOp::Mul, col("b"), Expr::Number(2.0))
            )
        );
        // -x ** 2 is -(x ** 2)
        assert_eq!(
            parse_ok("-df['a'] ** 2"),
            unary(
                UnaryOp::Neg,
                binary(BinaryOp::Pow, col("a"), Expr::Number(2.0))
            )
        );
        assert_eq!(
            parse_ok("2 ** -1"),
            binary(BinaryOp::Pow, Expr::Number(2.0), Expr::Number(-1.0))
        );
    }

    #[test]
    fn test_comparison_binds_looser_than_bitwise() {
        let expr = parse_ok("(df['a'] > 1) & (df['b'] <= 2)");
        let Expr::Binary { op, .. } = expr else {
            panic!("binary expected");
        };
        assert_eq!(op, BinaryOp::And);
        assert!(matches!(
            parse("df['a'] < df['b'] < 3", 64),
            Err(ExprError::Syntax { .. })
        ));
    }

    #[test]
    fn test_function_spellings() {
        let expected = Expr::Call {
            function: Function::Log1p,
            args: vec![col("a")],
        };
        assert_eq!(parse_ok("np.log1p(df['a'])"), expected);
        assert_eq!(parse_ok("log1p(df['a'])"), expected);
        assert_eq!(parse_ok("df['a'].log1p()"), expected);
    }

    #[test]
    fn test_accessors_and_cast() {
        assert_eq!(
            parse_ok("df['d'].dt.dayofweek"),
            Expr::Call {
                function: Function::DatePart(DatePart::DayOfWeek),
                args: vec![col("d")],
            }
        );
        assert_eq!(
            parse_ok("df['s'].str.contains('x')"),
            Expr::Call {
                function: Function::Contains,
                args: vec![col("s"), Expr::Text("x".into())],
            }
        );
        assert_eq!(
            parse_ok("(df['a'] > 0).astype(int)"),
            Expr::Call {
                function: Function::Cast(CastType::Int),
                args: vec![binary(BinaryOp::Gt, col("a"), Expr::Number(0.0))],
            }
        );
    }

    #[test]
    fn test_keyword_arguments() {
        assert_eq!(
            parse_ok("df['a'].clip(upper=10)"),
            Expr::Call {
                function: Function::Clip,
                args: vec![col("a"), Expr::Null, Expr::Number(10.0)],
            }
        );
        assert!(parse("df['a'].clip(bound=1)", 64).is_err());
        assert!(parse_ok("pd.to_datetime(df['d'], errors='coerce')").columns().contains("d"));
    }

    #[test]
    fn test_min_max_resolve_by_arity() {
        assert!(matches!(
            parse_ok("np.max(df['a'])"),
            Expr::Call { function: Function::Max, .. }
        ));
        assert!(matches!(
            parse_ok("max(df['a'], df['b'])"),
            Expr::Call { function: Function::Maximum, .. }
        ));
        assert!(matches!(
            parse("np.sqrt(df['a'], 2)", 64),
            Err(ExprError::Arity { function: "sqrt", .. })
        ));
    }

    #[test]
    fn test_unknown_names() {
        assert!(matches!(
            parse("df['a'].apply(len)", 64),
            Err(ExprError::UnknownFunction { name }) if name == "apply"
        ));
        assert!(matches!(
            parse("print(df['a'])", 64),
            Err(ExprError::UnknownFunction { .. })
        ));
        assert!(matches!(parse("x + 1", 64), Err(ExprError::Syntax { .. })));
        assert!(matches!(parse("df", 64), Err(ExprError::Syntax { .. })));
    }

    #[test]
    fn test_depth_limit() {
        let nested = format!("{}df['a']{}", "(".repeat(10), ")".repeat(10));
        assert!(parse(&nested, 64).is_ok());
        assert!(matches!(parse(&nested, 5), Err(ExprError::TooDeep { max: 5 })));
        let chain = vec!["df['a']"; 10].join(" + ");
        assert!(matches!(parse(&chain, 5), Err(ExprError::TooDeep { .. })));
    }

    #[test]
    fn test_trailing_tokens_rejected() {
        assert!(matches!(parse("df['a'] 2", 64), Err(ExprError::Syntax { offset: 8, .. })));
    }
}
