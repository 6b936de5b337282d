mod compiler;
pub mod error;
mod stmt;
mod unit;

#[cfg(test)]
mod test;

use aurora_bytecode::{CodeUnit, Opcode};
use aurora_syn::TokenKind;

pub use compiler::Compiler;
pub use error::{CompileError, CompileErrorKind};
pub use unit::UnitBuilder;

/// Compile a whole program into one sealed unit.
pub fn compile_chunk(source: &str) -> error::Result<CodeUnit> {
    let mut compiler = Compiler::new(source);
    while compiler.compile_statement()?.is_some() {}
    Ok(compiler.finish())
}

/// Compile a single expression into a unit that results in its value.
pub fn compile_expression(source: &str) -> error::Result<CodeUnit> {
    let mut compiler = Compiler::new(source);
    compiler.skip_newlines();
    compiler.expression()?;
    compiler.skip_newlines();
    compiler.expect(TokenKind::Eof)?;
    compiler.unit.emit(Opcode::Res);
    Ok(compiler.finish())
}
