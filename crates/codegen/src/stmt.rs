use std::ops::Range;
use std::rc::Rc;

use aurora_bytecode::{Function, Opcode, Value};
use aurora_syn::TokenKind;
use smol_str::SmolStr;
use tracing::debug;

use crate::compiler::Compiler;
use crate::error::{CompileError, CompileErrorKind, Result};

/// The binary operator a compound assignment applies.
fn compound_op(kind: TokenKind) -> Option<Opcode> {
    match kind {
        TokenKind::PlusAssign => Some(Opcode::Add),
        TokenKind::MinusAssign => Some(Opcode::Sub),
        TokenKind::StarAssign => Some(Opcode::Mul),
        TokenKind::SlashAssign => Some(Opcode::Div),
        TokenKind::PercentAssign => Some(Opcode::Mod),
        _ => None,
    }
}

impl<'src> Compiler<'src> {
    /// Compile the next top-level statement into the top-level unit.
    ///
    /// Returns the range of instructions appended for it, or `None` once the
    /// input is exhausted.
    pub fn compile_statement(&mut self) -> Result<Option<Range<usize>>> {
        self.skip_newlines();
        if self.peek_is(TokenKind::Eof) {
            return Ok(None);
        }
        let start = self.unit.len();
        self.statement()?;
        Ok(Some(start..self.unit.len()))
    }

    pub(crate) fn statement(&mut self) -> Result<()> {
        match self.current.kind {
            TokenKind::Newline => {
                self.advance();
                Ok(())
            }
            TokenKind::If => self.if_statement(),
            TokenKind::While => self.while_statement(),
            TokenKind::For => self.for_statement(),
            TokenKind::Fn => self.function_statement(),
            TokenKind::Return => self.return_statement(),
            TokenKind::Break => {
                if self.loop_depth == 0 {
                    return Err(CompileError::new(
                        CompileErrorKind::BreakOutsideLoop,
                        &self.current,
                    ));
                }
                self.advance();
                self.unit.emit(Opcode::Break);
                self.end_of_statement()
            }
            TokenKind::Continue => {
                if self.loop_depth == 0 {
                    return Err(CompileError::new(
                        CompileErrorKind::ContinueOutsideLoop,
                        &self.current,
                    ));
                }
                self.advance();
                self.unit.emit(Opcode::Continue);
                self.end_of_statement()
            }
            TokenKind::Identifier => self.identifier_statement(),
            _ => Err(self.unexpected()),
        }
    }

    /// A statement ends at a newline or at the end of input.
    fn end_of_statement(&mut self) -> Result<()> {
        if self.peek_is(TokenKind::Eof) {
            Ok(())
        } else {
            self.expect(TokenKind::Newline).map(|_| ())
        }
    }

    /// Statements up to (not including) one of `terminators`.
    fn block_body(&mut self, terminators: &[TokenKind]) -> Result<()> {
        while !terminators.contains(&self.current.kind) {
            if self.peek_is(TokenKind::Eof) {
                return Err(CompileError::expected(TokenKind::End, &self.current));
            }
            self.statement()?;
        }
        Ok(())
    }

    /// `end` closing a block statement.
    fn block_end(&mut self) -> Result<()> {
        self.expect(TokenKind::End)?;
        self.end_of_statement()
    }

    fn in_loop<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.loop_depth += 1;
        let res = f(self);
        self.loop_depth -= 1;
        res
    }

    fn if_statement(&mut self) -> Result<()> {
        self.expect(TokenKind::If)?;
        self.expression()?;

        let (then_unit, else_unit) = if self.eat(TokenKind::Newline) {
            let then_unit =
                self.nested(|this| this.block_body(&[TokenKind::Else, TokenKind::End]))?;
            let else_unit = if self.eat(TokenKind::Else) {
                self.expect(TokenKind::Newline)?;
                self.nested(|this| this.block_body(&[TokenKind::End]))?
            } else {
                self.nested(|_| Ok(()))?
            };
            self.block_end()?;
            (then_unit, else_unit)
        } else {
            let then_unit = self.nested(Self::statement)?;
            let else_unit = if self.eat(TokenKind::Else) {
                self.nested(Self::statement)?
            } else {
                self.nested(|_| Ok(()))?
            };
            (then_unit, else_unit)
        };

        self.push_unit(else_unit);
        self.push_unit(then_unit);
        self.unit.emit(Opcode::If);
        Ok(())
    }

    fn while_statement(&mut self) -> Result<()> {
        self.expect(TokenKind::While)?;
        let cond_unit = self.nested(|this| {
            this.expression()?;
            this.unit.emit(Opcode::Res);
            Ok(())
        })?;
        let body_unit = self.in_loop(|this| this.loop_body())?;

        self.push_unit(cond_unit);
        self.push_unit(body_unit);
        self.unit.emit(Opcode::WLoop);
        Ok(())
    }

    fn for_statement(&mut self) -> Result<()> {
        self.expect(TokenKind::For)?;
        let name = self.expect_identifier()?;
        self.expect(TokenKind::Comma)?;
        self.expression()?;
        let body_unit = self.in_loop(|this| this.loop_body())?;

        self.push_unit(body_unit);
        self.unit.emit_name(Opcode::FLoop, &name);
        Ok(())
    }

    /// Block or inline body of a loop, compiled into its own unit.
    fn loop_body(&mut self) -> Result<aurora_bytecode::CodeUnit> {
        if self.eat(TokenKind::Newline) {
            let body = self.nested(|this| this.block_body(&[TokenKind::End]))?;
            self.block_end()?;
            Ok(body)
        } else {
            self.nested(Self::statement)
        }
    }

    fn function_statement(&mut self) -> Result<()> {
        self.expect(TokenKind::Fn)?;
        let name = self.expect_identifier()?;
        let mut parameters = vec![];
        if !self.peek_is(TokenKind::Newline) && !self.peek_is(TokenKind::Arrow) {
            parameters.push(self.expect_identifier()?);
            while self.eat(TokenKind::Comma) {
                parameters.push(self.expect_identifier()?);
            }
        }

        // a function body never sees the loops around its definition
        let outer_loop_depth = std::mem::replace(&mut self.loop_depth, 0);
        let outer_in_function = std::mem::replace(&mut self.in_function, true);
        let body = self.function_body();
        self.loop_depth = outer_loop_depth;
        self.in_function = outer_in_function;
        let body = body?;

        debug!(%name, ?parameters, "function defined");
        let func = Function {
            name: Some(name.clone()),
            parameters,
            body,
        };
        self.unit.emit_const(Value::Function(Rc::new(func)));
        self.unit.emit_name(Opcode::Store, &name);
        Ok(())
    }

    fn function_body(&mut self) -> Result<aurora_bytecode::CodeUnit> {
        if self.eat(TokenKind::Arrow) {
            let body = self.nested(|this| {
                this.expression()?;
                this.unit.emit(Opcode::Ret);
                Ok(())
            })?;
            self.end_of_statement()?;
            Ok(body)
        } else {
            self.expect(TokenKind::Newline)?;
            let body = self.nested(|this| {
                this.block_body(&[TokenKind::End])?;
                this.unit.emit_const(Value::Nil).emit(Opcode::Ret);
                Ok(())
            })?;
            self.block_end()?;
            Ok(body)
        }
    }

    fn return_statement(&mut self) -> Result<()> {
        if !self.in_function {
            return Err(CompileError::new(
                CompileErrorKind::ReturnOutsideFunction,
                &self.current,
            ));
        }
        self.expect(TokenKind::Return)?;
        if self.peek_is(TokenKind::Newline) || self.peek_is(TokenKind::Eof) {
            self.unit.emit_const(Value::Nil);
        } else {
            self.expression()?;
        }
        self.unit.emit(Opcode::Ret);
        self.end_of_statement()
    }

    /// Assignment, indexed assignment or call, all starting with a name.
    fn identifier_statement(&mut self) -> Result<()> {
        let name_tok = self.advance();
        let name = name_tok.lexeme;

        match self.current.kind {
            kind if kind.is_assign() => {
                self.advance();
                self.assignment(&name, kind)?;
            }
            TokenKind::Colon => {
                self.advance();
                self.indexed_assignment(&name)?;
            }
            // `name(args)` with no space before the parenthesis
            TokenKind::LParen if self.current.span.start == name_tok.span.end => {
                self.unit.emit_name(Opcode::Load, &name);
                let n_args = self.arguments()?;
                self.unit.emit_p(Opcode::Call, n_args).emit(Opcode::Pop);
            }
            // command-style call: `name arg, arg, ...`
            _ => {
                self.unit.emit_name(Opcode::Load, &name);
                let n_args = if self.peek_is(TokenKind::Newline) || self.peek_is(TokenKind::Eof) {
                    0
                } else {
                    self.expression_list()?
                };
                self.unit.emit_p(Opcode::Call, n_args).emit(Opcode::Pop);
            }
        }
        self.end_of_statement()
    }

    fn assignment(&mut self, name: &SmolStr, op: TokenKind) -> Result<()> {
        match compound_op(op) {
            None => {
                self.expression()?;
            }
            Some(op) => {
                self.unit.emit_name(Opcode::Load, name);
                self.expression()?;
                self.unit.emit(op);
            }
        }
        self.unit.emit_name(Opcode::Store, name);
        Ok(())
    }

    /// `name: index op= value`. The stored value is a copy of `name` with one
    /// element replaced.
    fn indexed_assignment(&mut self, name: &SmolStr) -> Result<()> {
        self.expression()?;
        let op = self.current.kind;
        if !op.is_assign() {
            return Err(CompileError::new(
                CompileErrorKind::ExpectedAssignment(op),
                &self.current,
            ));
        }
        self.advance();

        match compound_op(op) {
            None => {
                self.expression()?;
            }
            Some(op) => {
                // [idx] -> [idx, idx] -> [idx, idx, list] -> [idx, list, idx]
                // -> [idx, elem] -> [idx, elem, rhs] -> [idx, new_elem]
                self.unit
                    .emit(Opcode::Dup)
                    .emit_name(Opcode::Load, name)
                    .emit(Opcode::Swap)
                    .emit(Opcode::Idx);
                self.expression()?;
                self.unit.emit(op);
            }
        }
        self.unit
            .emit_name(Opcode::Load, name)
            .emit(Opcode::SetIdx)
            .emit_name(Opcode::Store, name);
        Ok(())
    }
}
