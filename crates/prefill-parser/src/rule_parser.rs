//! Rule parser
//!
//! Parses a rewritten rule into a [`RuleProgram`].
//!
//! Supported syntax:
//! - Statements separated by `;`
//! - `if (cond) { ... } else { ... }`, `else if`, brace-less single statements
//! - Blocks still open at the end of the input are closed implicitly
//! - Binary operators: `||`, `&&`, `==`, `!=`, `<`, `<=`, `>`, `>=`, `+`, `-`, `*`, `/`, `%`
//! - Unary operators: `!`, `-`
//! - Assignment: `target = value` (evaluates to `value`)
//! - Literals: `42`, `3.14`, `'text'`, `"text"`, `true`, `false`, `null`
//! - Identifiers and parentheses

use crate::error::{ParseError, Result};
use crate::lexer::{Lexer, Spanned, Token};
use prefill_core::ast::{Expression, Operator, RuleProgram, Statement, UnaryOperator};
use prefill_core::Value;

/// Default nesting limit for blocks and sub-expressions
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Rule parser
pub struct RuleParser {
    tokens: Vec<Spanned>,
    pos: usize,
    depth: usize,
    max_depth: usize,
}

impl RuleParser {
    /// Parse a rule with the default nesting limit
    pub fn parse(input: &str) -> Result<RuleProgram> {
        Self::parse_with_depth(input, DEFAULT_MAX_DEPTH)
    }

    /// Parse a rule, failing with `NestingTooDeep` beyond `max_depth`
    pub fn parse_with_depth(input: &str, max_depth: usize) -> Result<RuleProgram> {
        let tokens = Lexer::tokenize(input)?;
        if tokens.is_empty() {
            return Err(ParseError::InvalidExpression("Empty rule".to_string()));
        }

        let mut parser = RuleParser {
            tokens,
            pos: 0,
            depth: 0,
            max_depth,
        };

        let statements = parser.parse_statements()?;
        if let Some(extra) = parser.peek() {
            return Err(parser.unexpected(extra.clone(), "end of rule"));
        }
        Ok(RuleProgram::new(statements))
    }

    // ===== Statements =====

    /// Statements until `}` or end of input
    fn parse_statements(&mut self) -> Result<Vec<Statement>> {
        let mut statements = Vec::new();
        loop {
            while self.eat(&Token::Semicolon) {}
            match self.peek() {
                None | Some(Token::RBrace) => return Ok(statements),
                Some(_) => statements.push(self.parse_statement()?),
            }
        }
    }

    fn parse_statement(&mut self) -> Result<Statement> {
        self.enter()?;
        let statement = if self.eat(&Token::If) {
            self.parse_if()?
        } else {
            Statement::Expression(self.parse_expression()?)
        };
        self.leave();
        Ok(statement)
    }

    fn parse_if(&mut self) -> Result<Statement> {
        self.expect(&Token::LParen, "'(' after 'if'")?;
        let condition = self.parse_expression()?;
        self.expect(&Token::RParen, "')' after condition")?;

        let then_branch = self.parse_branch()?;
        let else_branch = if self.eat(&Token::Else) {
            if self.eat(&Token::If) {
                self.enter()?;
                let nested = self.parse_if()?;
                self.leave();
                Some(vec![nested])
            } else {
                Some(self.parse_branch()?)
            }
        } else {
            None
        };

        Ok(Statement::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    /// `{ statements }` or a single statement
    fn parse_branch(&mut self) -> Result<Vec<Statement>> {
        if self.eat(&Token::LBrace) {
            self.enter()?;
            let statements = self.parse_statements()?;
            self.leave();
            // An unterminated block is closed by the end of input
            if !self.eat(&Token::RBrace) && self.peek().is_some() {
                let found = self.peek().cloned().unwrap_or(Token::RBrace);
                return Err(self.unexpected(found, "'}'"));
            }
            Ok(statements)
        } else {
            Ok(vec![self.parse_statement()?])
        }
    }

    // ===== Expressions =====

    fn parse_expression(&mut self) -> Result<Expression> {
        self.enter()?;
        let expr = self.parse_assignment();
        self.leave();
        expr
    }

    fn parse_assignment(&mut self) -> Result<Expression> {
        let target = self.parse_or()?;
        if self.eat(&Token::Assign) {
            let value = self.parse_expression()?;
            return Ok(Expression::assign(target, value));
        }
        Ok(target)
    }

    fn parse_or(&mut self) -> Result<Expression> {
        let mut left = self.parse_and()?;
        while self.eat(&Token::OrOr) {
            let right = self.parse_and()?;
            left = Expression::binary(left, Operator::Or, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expression> {
        let mut left = self.parse_equality()?;
        while self.eat(&Token::AndAnd) {
            let right = self.parse_equality()?;
            left = Expression::binary(left, Operator::And, right);
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Expression> {
        let mut left = self.parse_comparison()?;
        loop {
            let op = match self.peek() {
                Some(Token::EqEq) => Operator::Eq,
                Some(Token::NotEq) => Operator::Ne,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_comparison()?;
            left = Expression::binary(left, op, right);
        }
    }

    fn parse_comparison(&mut self) -> Result<Expression> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.peek() {
                Some(Token::Lt) => Operator::Lt,
                Some(Token::Le) => Operator::Le,
                Some(Token::Gt) => Operator::Gt,
                Some(Token::Ge) => Operator::Ge,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_additive()?;
            left = Expression::binary(left, op, right);
        }
    }

    fn parse_additive(&mut self) -> Result<Expression> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => Operator::Add,
                Some(Token::Minus) => Operator::Sub,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = Expression::binary(left, op, right);
        }
    }

    fn parse_multiplicative(&mut self) -> Result<Expression> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => Operator::Mul,
                Some(Token::Slash) => Operator::Div,
                Some(Token::Percent) => Operator::Mod,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_unary()?;
            left = Expression::binary(left, op, right);
        }
    }

    fn parse_unary(&mut self) -> Result<Expression> {
        let op = match self.peek() {
            Some(Token::Bang) => UnaryOperator::Not,
            Some(Token::Minus) => UnaryOperator::Negate,
            _ => return self.parse_primary(),
        };
        self.advance();
        self.enter()?;
        let operand = self.parse_unary()?;
        self.leave();
        Ok(Expression::unary(op, operand))
    }

    fn parse_primary(&mut self) -> Result<Expression> {
        let Some(spanned) = self.tokens.get(self.pos).cloned() else {
            return Err(ParseError::UnexpectedEnd("an expression".to_string()));
        };
        self.pos += 1;

        match spanned.token {
            Token::Number(n) => Ok(Expression::Literal(Value::Number(n))),
            Token::Str(s) => Ok(Expression::Literal(Value::String(s))),
            Token::True => Ok(Expression::Literal(Value::Bool(true))),
            Token::False => Ok(Expression::Literal(Value::Bool(false))),
            Token::Null => Ok(Expression::Literal(Value::Null)),
            Token::Ident(name) => Ok(Expression::Identifier(name)),
            Token::LParen => {
                let inner = self.parse_expression()?;
                self.expect(&Token::RParen, "')'")?;
                Ok(inner)
            }
            other => Err(ParseError::UnexpectedToken {
                found: other.to_string(),
                expected: "an expression".to_string(),
                offset: spanned.offset,
            }),
        }
    }

    // ===== Helpers =====

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token, expected: &str) -> Result<()> {
        match self.peek().cloned() {
            Some(t) if &t == token => {
                self.pos += 1;
                Ok(())
            }
            Some(other) => Err(self.unexpected(other, expected)),
            None => Err(ParseError::UnexpectedEnd(expected.to_string())),
        }
    }

    fn unexpected(&self, found: Token, expected: &str) -> ParseError {
        let offset = self.tokens.get(self.pos).map(|s| s.offset).unwrap_or(0);
        ParseError::UnexpectedToken {
            found: found.to_string(),
            expected: expected.to_string(),
            offset,
        }
    }

    fn enter(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(ParseError::NestingTooDeep(self.max_depth));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(s: &str) -> Expression {
        Expression::Literal(Value::String(s.to_string()))
    }

    #[test]
    fn test_parse_literal() {
        let program = RuleParser::parse("'N'").unwrap();
        assert_eq!(program.statements, vec![Statement::Expression(lit("N"))]);
    }

    #[test]
    fn test_parse_if_else_with_implicit_close() {
        let program = RuleParser::parse("if (0 > 0) { 'Z'  = 'Y' } else { 'N'").unwrap();

        assert_eq!(
            program.statements,
            vec![Statement::If {
                condition: Expression::binary(
                    Expression::literal(0.0),
                    Operator::Gt,
                    Expression::literal(0.0)
                ),
                then_branch: vec![Statement::Expression(Expression::assign(lit("Z"), lit("Y")))],
                else_branch: Some(vec![Statement::Expression(lit("N"))]),
            }]
        );
    }

    #[test]
    fn test_precedence_and_binds_tighter_than_or() {
        let program = RuleParser::parse("a || b && c").unwrap();
        match &program.statements[0] {
            Statement::Expression(Expression::Binary { op, right, .. }) => {
                assert_eq!(*op, Operator::Or);
                assert!(matches!(**right, Expression::Binary { op: Operator::And, .. }));
            }
            other => panic!("Unexpected statement: {:?}", other),
        }
    }

    #[test]
    fn test_else_if_chain() {
        let program =
            RuleParser::parse("if (a == 1) { 'A' } else if (a == 2) { 'B' } else { 'C' }").unwrap();
        match &program.statements[0] {
            Statement::If { else_branch: Some(branch), .. } => {
                assert!(matches!(branch[0], Statement::If { .. }));
            }
            other => panic!("Unexpected statement: {:?}", other),
        }
    }

    #[test]
    fn test_multiple_statements() {
        let program = RuleParser::parse("x = 1; y = x + 1;").unwrap();
        assert_eq!(program.statements.len(), 2);
    }

    #[test]
    fn test_unbalanced_paren_is_error() {
        assert!(RuleParser::parse("if ((a > 1) { 'Y' }").is_err());
    }

    #[test]
    fn test_stray_closing_brace_is_error() {
        let err = RuleParser::parse("'Y' }").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedToken { .. }));
    }

    #[test]
    fn test_nesting_limit() {
        let deep = format!("{}1{}", "(".repeat(20), ")".repeat(20));
        assert!(RuleParser::parse_with_depth(&deep, 64).is_ok());
        let err = RuleParser::parse_with_depth(&deep, 8).unwrap_err();
        assert!(matches!(err, ParseError::NestingTooDeep(8)));
    }

    #[test]
    fn test_empty_rule() {
        assert!(matches!(
            RuleParser::parse("  ").unwrap_err(),
            ParseError::InvalidExpression(_)
        ));
    }
}
