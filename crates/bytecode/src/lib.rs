pub mod error;
pub mod inst;
pub mod value;

#[cfg(test)]
mod test;

use std::fmt;

use smol_str::SmolStr;

pub use error::{ArgCount, ValueError};
pub use inst::{Instruction, Opcode, OperandKind};
pub use value::{NativeFn, NativeFunction, Value, ValueKind};

/// A compiled sequence of instructions together with its constant table.
///
/// Units are immutable once sealed by the compiler, and every sealed unit
/// ends with [`Opcode::End`].
#[derive(Debug, Clone, Default)]
pub struct CodeUnit {
    pub instructions: Vec<Instruction>,
    pub constants: Vec<Value>,
    /// Deepest value stack this unit can build up. Used as a capacity hint.
    pub max_stack: u32,
}

impl CodeUnit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the index of an existing constant equal to `v`, if `v` may be
    /// shared at all.
    pub fn constant_index(&self, v: &Value) -> Option<u32> {
        if !v.is_poolable() {
            return None;
        }
        self.constants
            .iter()
            .position(|c| c == v)
            .map(|idx| idx as u32)
    }

    /// Get the instruction at `ip`. Reading past the end yields [`Instruction::END`].
    pub fn fetch(&self, ip: usize) -> Instruction {
        self.instructions
            .get(ip)
            .copied()
            .unwrap_or(Instruction::END)
    }

    pub fn constant(&self, idx: i32) -> Option<&Value> {
        usize::try_from(idx).ok().and_then(|i| self.constants.get(i))
    }

    /// Returns a value that displays as a listing of this unit and every unit
    /// nested in its constants.
    pub fn disassemble(&self) -> Disassembly<'_> {
        Disassembly { unit: self }
    }
}

/// A user-defined function.
#[derive(Debug, Clone)]
pub struct Function {
    pub name: Option<SmolStr>,
    pub parameters: Vec<SmolStr>,
    pub body: CodeUnit,
}

impl Function {
    pub fn arity(&self) -> usize {
        self.parameters.len()
    }
}

pub struct Disassembly<'a> {
    unit: &'a CodeUnit,
}

impl Disassembly<'_> {
    fn write_unit(unit: &CodeUnit, indent: usize, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pad = "    ".repeat(indent);
        for (ip, inst) in unit.instructions.iter().enumerate() {
            write!(f, "{}{:04} {}", pad, ip, inst.op)?;
            match inst.op.operand_kind() {
                None => writeln!(f)?,
                Some(OperandKind::Int) | Some(OperandKind::Count) => {
                    writeln!(f, " {}", inst.operand)?
                }
                Some(OperandKind::Const) | Some(OperandKind::Name) => {
                    match unit.constant(inst.operand) {
                        Some(Value::String(s)) => writeln!(f, " {}  ; {:?}", inst.operand, s)?,
                        Some(Value::Function(func)) => {
                            writeln!(
                                f,
                                " {}  ; fn {}({})",
                                inst.operand,
                                func.name.as_deref().unwrap_or("<anonymous>"),
                                func.parameters.join(", ")
                            )?;
                            Self::write_unit(&func.body, indent + 1, f)?;
                        }
                        Some(Value::CodeUnit(nested)) => {
                            writeln!(f, " {}  ; unit", inst.operand)?;
                            Self::write_unit(nested, indent + 1, f)?;
                        }
                        Some(v) => writeln!(f, " {}  ; {}", inst.operand, v)?,
                        None => writeln!(f, " {}  ; <invalid>", inst.operand)?,
                    }
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for Disassembly<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Self::write_unit(self.unit, 0, f)
    }
}
