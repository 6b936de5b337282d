//! The Aurora scripting language.
//!
//! Source text is compiled one top-level statement at a time and each
//! statement is executed as soon as it is compiled, so a program observes
//! the effects of earlier statements even if a later one fails to parse.

pub mod report;


use std::fmt;

use aurora_bytecode::ValueError;
use aurora_codegen::{compile_expression, Compiler};
use aurora_vm::{stdlib, Globals, Outcome, Vm, VmConfig};

pub use aurora_bytecode::Value;
pub use aurora_codegen::{CompileError, CompileErrorKind};
pub use aurora_vm::RuntimeError;

#[derive(Debug)]
pub enum Error {
    Compile(CompileError),
    Runtime(RuntimeError),
}

impl From<CompileError> for Error {
    fn from(e: CompileError) -> Self {
        Error::Compile(e)
    }
}

impl From<RuntimeError> for Error {
    fn from(e: RuntimeError) -> Self {
        Error::Runtime(e)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Compile(e) => write!(f, "Compile error: {}", e),
            Error::Runtime(e) => write!(f, "Runtime error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Compile(_) => None,
            Error::Runtime(e) => Some(e),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// A virtual machine together with the compiler driving it.
///
/// Globals persist between calls to [`Interpreter::run`] and
/// [`Interpreter::eval`].
pub struct Interpreter {
    vm: Vm,
}

impl Interpreter {
    /// An interpreter with the standard library installed.
    pub fn new() -> Self {
        Self::with_config(VmConfig::default())
    }

    pub fn with_config(config: VmConfig) -> Self {
        Interpreter {
            vm: Vm::with_config(stdlib::globals(), config),
        }
    }

    /// An interpreter starting from exactly `globals`, without the
    /// standard library.
    pub fn with_globals(globals: Globals) -> Self {
        Interpreter {
            vm: Vm::new(globals),
        }
    }

    /// Run a whole program. The result of a program is always nil.
    pub fn run(&mut self, source: &str) -> Result<Value> {
        let mut compiler = Compiler::new(source);
        while let Some(range) = compiler.compile_statement()? {
            tracing::trace!(?range, "executing statement");
            match self.vm.execute_range(compiler.code(), range)? {
                Outcome::Normal(_) => {}
                stray => return Err(RuntimeError::StrayControl(stray.signal_name()).into()),
            }
        }
        Ok(Value::Nil)
    }

    /// Evaluate a single expression and return its value.
    pub fn eval(&mut self, source: &str) -> Result<Value> {
        let unit = compile_expression(source)?;
        match self.vm.execute(&unit)? {
            Outcome::Normal(value) => Ok(value),
            stray => Err(RuntimeError::StrayControl(stray.signal_name()).into()),
        }
    }

    /// Bind a host function as a global.
    pub fn define_native(
        &mut self,
        name: &str,
        f: impl Fn(Vec<Value>) -> std::result::Result<Value, ValueError> + 'static,
    ) {
        self.vm.define(name, Value::native(name, f));
    }

    pub fn global(&self, name: &str) -> Option<&Value> {
        self.vm.globals().get(name)
    }

    /// Call a function value from the host.
    pub fn call(&mut self, callee: &Value, args: Vec<Value>) -> Result<Value> {
        Ok(self.vm.call(callee, args)?)
    }

    /// Look up a global function by name and call it.
    pub fn call_global(&mut self, name: &str, args: Vec<Value>) -> Result<Value> {
        let callee = self.vm.load(name)?;
        self.call(&callee, args)
    }

    pub fn vm(&self) -> &Vm {
        &self.vm
    }

    pub fn vm_mut(&mut self) -> &mut Vm {
        &mut self.vm
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}
