use std::mem;

use aurora_bytecode::{CodeUnit, Opcode, Value};
use aurora_syn::{Lexer, Literal, Token, TokenKind};
use smol_str::SmolStr;

use crate::error::{CompileError, Result};
use crate::unit::UnitBuilder;

/// Single-pass compiler from source text to code units.
///
/// There is no syntax tree: every construct is emitted into the current unit
/// as soon as it is recognized. Blocks are compiled into units of their own
/// (see [`Compiler::nested`]).
pub struct Compiler<'src> {
    lexer: Lexer<'src>,
    /// One-token lookahead
    pub(crate) current: Token,
    /// The unit currently receiving instructions
    pub(crate) unit: UnitBuilder,
    /// Number of loops enclosing the current position inside the current function
    pub(crate) loop_depth: u32,
    pub(crate) in_function: bool,
}

impl<'src> Compiler<'src> {
    pub fn new(source: &'src str) -> Self {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token();
        Compiler {
            lexer,
            current,
            unit: UnitBuilder::new(),
            loop_depth: 0,
            in_function: false,
        }
    }

    /// The top-level unit built so far. It is not sealed, so running past
    /// its end behaves as `END`.
    pub fn code(&self) -> &CodeUnit {
        self.unit.code()
    }

    /// Seal and return the top-level unit.
    pub fn finish(self) -> CodeUnit {
        self.unit.finish()
    }

    // === token helpers ===

    pub(crate) fn peek_is(&self, kind: TokenKind) -> bool {
        self.current.is(kind)
    }

    /// Move to the next token, returning the one just passed.
    pub(crate) fn advance(&mut self) -> Token {
        let next = self.lexer.next_token();
        mem::replace(&mut self.current, next)
    }

    pub(crate) fn eat(&mut self, kind: TokenKind) -> bool {
        if self.peek_is(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn expect(&mut self, kind: TokenKind) -> Result<Token> {
        if self.peek_is(kind) {
            Ok(self.advance())
        } else {
            Err(CompileError::expected(kind, &self.current))
        }
    }

    pub(crate) fn expect_identifier(&mut self) -> Result<SmolStr> {
        self.expect(TokenKind::Identifier).map(|t| t.lexeme)
    }

    pub(crate) fn unexpected(&self) -> CompileError {
        CompileError::unexpected(&self.current)
    }

    pub(crate) fn skip_newlines(&mut self) {
        while self.eat(TokenKind::Newline) {}
    }

    /// Parse `open`, then `f`, then `close`, ignoring newlines in between.
    pub(crate) fn delimited<T>(
        &mut self,
        open: TokenKind,
        close: TokenKind,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        // the flag has to be set before `open` is consumed, since consuming it
        // already lexes the following token
        let prev = self.lexer.ignore_newline(true);
        let res = self.expect(open).and_then(|_| f(self));
        self.lexer.ignore_newline(prev);
        let res = res?;
        self.expect(close)?;
        Ok(res)
    }

    /// Compile `f` into a fresh unit and return it sealed. The current unit
    /// is restored afterwards, whether `f` succeeds or not.
    pub(crate) fn nested(&mut self, f: impl FnOnce(&mut Self) -> Result<()>) -> Result<CodeUnit> {
        let saved = mem::take(&mut self.unit);
        let res = f(self);
        let unit = mem::replace(&mut self.unit, saved);
        res?;
        Ok(unit.finish())
    }

    /// Emit `PUSH` of a sealed unit.
    pub(crate) fn push_unit(&mut self, unit: CodeUnit) {
        tracing::debug!(
            len = unit.instructions.len(),
            constants = unit.constants.len(),
            "nested unit"
        );
        self.unit.emit_const(Value::CodeUnit(unit.into()));
    }

    // === expressions ===

    pub fn expression(&mut self) -> Result<()> {
        self.binary(Self::and_expr, &[(TokenKind::Or, Opcode::Or)])
    }

    fn and_expr(&mut self) -> Result<()> {
        self.binary(Self::equality, &[(TokenKind::And, Opcode::And)])
    }

    fn equality(&mut self) -> Result<()> {
        self.binary(
            Self::comparison,
            &[(TokenKind::Eq, Opcode::Eq), (TokenKind::Neq, Opcode::Neq)],
        )
    }

    fn comparison(&mut self) -> Result<()> {
        self.binary(
            Self::term,
            &[
                (TokenKind::Lt, Opcode::Lt),
                (TokenKind::Lte, Opcode::Lte),
                (TokenKind::Gt, Opcode::Gt),
                (TokenKind::Gte, Opcode::Gte),
            ],
        )
    }

    fn term(&mut self) -> Result<()> {
        self.binary(
            Self::factor,
            &[
                (TokenKind::Plus, Opcode::Add),
                (TokenKind::Minus, Opcode::Sub),
            ],
        )
    }

    fn factor(&mut self) -> Result<()> {
        self.binary(
            Self::unary,
            &[
                (TokenKind::Star, Opcode::Mul),
                (TokenKind::Slash, Opcode::Div),
                (TokenKind::Percent, Opcode::Mod),
            ],
        )
    }

    /// A left-associative chain of `operand`s joined by any of `ops`.
    fn binary(
        &mut self,
        operand: fn(&mut Self) -> Result<()>,
        ops: &[(TokenKind, Opcode)],
    ) -> Result<()> {
        operand(self)?;
        loop {
            let current = self.current.kind;
            let op = match ops.iter().find(|(kind, _)| *kind == current) {
                Some(&(_, op)) => op,
                None => return Ok(()),
            };
            self.advance();
            operand(self)?;
            self.unit.emit(op);
        }
    }

    fn unary(&mut self) -> Result<()> {
        if self.eat(TokenKind::Not) {
            self.unary()?;
            self.unit.emit(Opcode::Not);
        } else if self.eat(TokenKind::Minus) {
            self.unary()?;
            self.unit.emit(Opcode::Neg);
        } else {
            self.call()?;
        }
        Ok(())
    }

    fn call(&mut self) -> Result<()> {
        self.primary()?;
        loop {
            if self.peek_is(TokenKind::LParen) {
                let n_args = self.arguments()?;
                self.unit.emit_p(Opcode::Call, n_args);
            } else if self.eat(TokenKind::Colon) {
                self.primary()?;
                self.unit.emit(Opcode::Idx);
            } else {
                return Ok(());
            }
        }
    }

    /// `( expr, expr, ... )`, returning the number of arguments.
    pub(crate) fn arguments(&mut self) -> Result<i32> {
        self.delimited(TokenKind::LParen, TokenKind::RParen, |this| {
            if this.peek_is(TokenKind::RParen) {
                Ok(0)
            } else {
                this.expression_list()
            }
        })
    }

    /// One or more comma-separated expressions.
    pub(crate) fn expression_list(&mut self) -> Result<i32> {
        let mut n = 0;
        loop {
            self.expression()?;
            n += 1;
            if !self.eat(TokenKind::Comma) {
                return Ok(n);
            }
        }
    }

    fn primary(&mut self) -> Result<()> {
        match self.current.kind {
            TokenKind::Number => {
                let tok = self.advance();
                match tok.literal {
                    Some(Literal::Number(n)) => self.number(n),
                    _ => return Err(CompileError::unexpected(&tok)),
                }
            }
            TokenKind::String => {
                let tok = self.advance();
                match tok.literal {
                    Some(Literal::String(s)) => self.unit.emit_const(Value::String(s)),
                    _ => return Err(CompileError::unexpected(&tok)),
                };
            }
            TokenKind::True => {
                self.advance();
                self.unit.emit(Opcode::True);
            }
            TokenKind::False => {
                self.advance();
                self.unit.emit(Opcode::False);
            }
            TokenKind::Nil => {
                self.advance();
                self.unit.emit_const(Value::Nil);
            }
            TokenKind::Identifier => {
                let name = self.advance().lexeme;
                self.unit.emit_name(Opcode::Load, &name);
            }
            TokenKind::LParen => {
                self.delimited(TokenKind::LParen, TokenKind::RParen, Self::expression)?;
            }
            TokenKind::LBrace => {
                // elements are separated by commas, newlines or both
                let len = self.delimited(TokenKind::LBrace, TokenKind::RBrace, |this| {
                    let mut len = 0;
                    while !this.peek_is(TokenKind::RBrace) {
                        this.expression()?;
                        len += 1;
                        this.eat(TokenKind::Comma);
                    }
                    Ok(len)
                })?;
                self.unit.emit_p(Opcode::List, len);
            }
            _ => return Err(self.unexpected()),
        }
        Ok(())
    }

    fn number(&mut self, n: f64) {
        if n.fract() == 0.0 && n >= i32::MIN as f64 && n <= i32::MAX as f64 {
            self.unit.emit_p(Opcode::PushI, n as i32);
        } else {
            self.unit.emit_const(Value::Number(n));
        }
    }
}
