mod dispatch;
pub(crate) mod frame;

use std::mem;
use std::ops::Range;
use std::rc::Rc;

use aurora_bytecode::{CodeUnit, Function, Value};
use fnv::FnvHashMap;
use smol_str::SmolStr;
use tracing::{debug, trace};

use crate::error::{Result, RuntimeError};
use frame::Frame;

/// Name to value bindings of one block.
pub type Scope = FnvHashMap<SmolStr, Value>;

/// The global variable table, shared by every function activation.
pub type Globals = FnvHashMap<SmolStr, Value>;

/// How the execution of a code unit ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The unit ran to its end, or finished with `RES`
    Normal(Value),
    /// A `return` unwinding to the nearest call boundary
    Return(Value),
    /// A `break` unwinding to the nearest loop
    Break,
    /// A `continue` unwinding to the nearest loop
    Continue,
}

impl Outcome {
    pub fn signal_name(&self) -> &'static str {
        match self {
            Outcome::Normal(_) => "normal",
            Outcome::Return(_) => "return",
            Outcome::Break => "break",
            Outcome::Continue => "continue",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct VmConfig {
    /// Nesting limit of function calls. `None` means unlimited.
    pub max_call_depth: Option<usize>,
}

/// The virtual machine.
///
/// Control flow constructs run their blocks by re-entering
/// [`Vm::execute`] recursively, so the host stack mirrors the nesting of
/// blocks and calls being executed.
pub struct Vm {
    globals: Globals,
    /// Scopes of the active function, innermost last. Empty at top level.
    scopes: Vec<Scope>,
    config: VmConfig,
    call_depth: usize,
}

impl Vm {
    pub fn new(globals: Globals) -> Self {
        Self::with_config(globals, VmConfig::default())
    }

    pub fn with_config(globals: Globals, config: VmConfig) -> Self {
        Vm {
            globals,
            scopes: vec![],
            config,
            call_depth: 0,
        }
    }

    pub fn config(&self) -> &VmConfig {
        &self.config
    }

    /// Get a reference to the vm's globals.
    pub fn globals(&self) -> &Globals {
        &self.globals
    }

    /// Get a mutable reference to the vm's globals.
    pub fn globals_mut(&mut self) -> &mut Globals {
        &mut self.globals
    }

    /// Bind a global, replacing any previous value.
    pub fn define(&mut self, name: impl Into<SmolStr>, value: Value) {
        self.globals.insert(name.into(), value);
    }

    /// Resolve a name: innermost scope first, then outwards, then globals.
    pub fn load(&self, name: &str) -> Result<Value> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name))
            .or_else(|| self.globals.get(name))
            .cloned()
            .ok_or_else(|| RuntimeError::UndefinedVariable(name.into()))
    }

    /// Assign a name.
    ///
    /// The innermost scope already binding the name wins. Failing that, an
    /// existing global is updated. Otherwise the name is created in the
    /// innermost scope, or as a global at top level.
    pub fn store(&mut self, name: &SmolStr, value: Value) {
        let local = self
            .scopes
            .iter_mut()
            .rev()
            .find_map(|scope| scope.get_mut(name));
        if let Some(slot) = local {
            *slot = value;
            return;
        }
        if let Some(slot) = self.globals.get_mut(name) {
            *slot = value;
            return;
        }
        match self.scopes.last_mut() {
            Some(scope) => scope.insert(name.clone(), value),
            None => self.globals.insert(name.clone(), value),
        };
    }

    /// Run a whole unit against the current scopes.
    pub fn execute(&mut self, unit: &CodeUnit) -> Result<Outcome> {
        self.execute_range(unit, 0..unit.instructions.len())
    }

    /// Run the instructions of `unit` in `range`. Reaching the end of the
    /// range behaves as `END`.
    pub fn execute_range(&mut self, unit: &CodeUnit, range: Range<usize>) -> Result<Outcome> {
        let mut frame = Frame::new(unit, range);
        loop {
            let ip = frame.ip();
            let inst = frame.fetch();
            let (op, handler) = dispatch::DISPATCH[inst.ordinal()];
            debug_assert_eq!(op, inst.op);
            trace!(ip, %op, operand = inst.operand, "dispatch");
            if let Some(outcome) = handler(self, &mut frame, inst.operand)? {
                return Ok(outcome);
            }
        }
    }

    /// Run `unit` in a new innermost scope, optionally holding one binding.
    /// The scope is removed on every path out.
    pub(crate) fn execute_scoped(
        &mut self,
        unit: &CodeUnit,
        binding: Option<(SmolStr, Value)>,
    ) -> Result<Outcome> {
        self.scopes.push(binding.into_iter().collect());
        let res = self.execute(unit);
        self.scopes.pop();
        res
    }

    /// Call a function or native function with the given arguments.
    pub fn call(&mut self, callee: &Value, args: Vec<Value>) -> Result<Value> {
        match callee {
            Value::Function(func) => self.call_function(func, args),
            Value::NativeFunction(native) => {
                debug!(name = native.name(), n_args = args.len(), "native call");
                Ok(native.call(args)?)
            }
            other => Err(RuntimeError::NotCallable(other.kind())),
        }
    }

    fn call_function(&mut self, func: &Rc<Function>, args: Vec<Value>) -> Result<Value> {
        // extra arguments are ignored
        if args.len() < func.arity() {
            return Err(RuntimeError::FunctionArity {
                name: func.name.clone(),
                expected: func.arity(),
                got: args.len(),
            });
        }
        if let Some(limit) = self.config.max_call_depth {
            if self.call_depth >= limit {
                return Err(RuntimeError::CallDepth(limit));
            }
        }
        debug!(name = ?func.name, depth = self.call_depth, "call");

        // functions see their parameters and the globals, never the caller's scopes
        let scope: Scope = func.parameters.iter().cloned().zip(args).collect();
        let caller_scopes = mem::replace(&mut self.scopes, vec![scope]);
        self.call_depth += 1;
        let res = self.execute(&func.body);
        self.call_depth -= 1;
        self.scopes = caller_scopes;

        match res? {
            Outcome::Return(v) => Ok(v),
            Outcome::Normal(_) => Ok(Value::Nil),
            stray => Err(RuntimeError::StrayControl(stray.signal_name())),
        }
    }
}
