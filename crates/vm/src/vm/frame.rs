use std::ops::Range;

use aurora_bytecode::{CodeUnit, Instruction, Value};

use crate::error::{Result, RuntimeError};

/// Execution state of one run of a code unit: its value stack and
/// instruction pointer.
pub(crate) struct Frame<'u> {
    unit: &'u CodeUnit,
    stack: Vec<Value>,
    ip: usize,
    /// Running up to this instruction behaves as `END`
    end: usize,
}

impl<'u> Frame<'u> {
    pub fn new(unit: &'u CodeUnit, range: Range<usize>) -> Self {
        Self {
            unit,
            stack: Vec::with_capacity(unit.max_stack as usize),
            ip: range.start,
            end: range.end,
        }
    }

    /// Get the next instruction and advance past it.
    pub fn fetch(&mut self) -> Instruction {
        if self.ip >= self.end {
            return Instruction::END;
        }
        let inst = self.unit.fetch(self.ip);
        self.ip += 1;
        inst
    }

    pub fn ip(&self) -> usize {
        self.ip
    }

    pub fn pop(&mut self) -> Result<Value> {
        self.stack.pop().ok_or(RuntimeError::StackUnderflow)
    }

    pub fn push(&mut self, val: Value) {
        self.stack.push(val);
    }

    pub fn pop2(&mut self) -> Result<(Value, Value)> {
        let rhs = self.pop()?;
        let lhs = self.pop()?;
        Ok((lhs, rhs))
    }

    /// Pop the topmost `n` values, in the order they were pushed.
    pub fn pop_n(&mut self, n: usize) -> Result<Vec<Value>> {
        if n > self.stack.len() {
            return Err(RuntimeError::StackUnderflow);
        }
        Ok(self.stack.split_off(self.stack.len() - n))
    }

    pub fn peek(&self) -> Result<&Value> {
        self.stack.last().ok_or(RuntimeError::StackUnderflow)
    }

    pub fn constant(&self, idx: i32) -> Result<&'u Value> {
        self.unit
            .constant(idx)
            .ok_or(RuntimeError::InvalidConstant(idx))
    }
}
