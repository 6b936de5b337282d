use std::fmt;
use std::rc::Rc;

use itertools::Itertools;
use smol_str::SmolStr;

use crate::error::{Result, ValueError};
use crate::{CodeUnit, Function};

/// Signature of a host function callable from scripts.
pub type NativeFn = dyn Fn(Vec<Value>) -> Result<Value>;

/// A runtime value.
///
/// Lists and strings are value types: every operation that "modifies" one
/// produces a new value. Lists share their storage until written to.
#[derive(Clone, Debug, Default)]
pub enum Value {
    Number(f64),
    String(SmolStr),
    Boolean(bool),
    List(Rc<Vec<Value>>),
    Function(Rc<Function>),
    CodeUnit(Rc<CodeUnit>),
    #[default]
    Nil,
    NativeFunction(NativeFunction),
}

/// The variant of a [`Value`], used in error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Number,
    String,
    Boolean,
    List,
    Function,
    CodeUnit,
    Nil,
    NativeFunction,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ValueKind::Number => "number",
            ValueKind::String => "string",
            ValueKind::Boolean => "bool",
            ValueKind::List => "list",
            ValueKind::Function => "function",
            ValueKind::CodeUnit => "code unit",
            ValueKind::Nil => "null",
            ValueKind::NativeFunction => "native function",
        })
    }
}

/// A function provided by the host.
#[derive(Clone)]
pub struct NativeFunction {
    name: SmolStr,
    f: Rc<NativeFn>,
}

impl NativeFunction {
    pub fn new(name: impl Into<SmolStr>, f: impl Fn(Vec<Value>) -> Result<Value> + 'static) -> Self {
        NativeFunction {
            name: name.into(),
            f: Rc::new(f),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, args: Vec<Value>) -> Result<Value> {
        (self.f)(args)
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl Value {
    pub fn list(items: Vec<Value>) -> Value {
        Value::List(Rc::new(items))
    }

    pub fn native(
        name: impl Into<SmolStr>,
        f: impl Fn(Vec<Value>) -> Result<Value> + 'static,
    ) -> Value {
        Value::NativeFunction(NativeFunction::new(name, f))
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Number(_) => ValueKind::Number,
            Value::String(_) => ValueKind::String,
            Value::Boolean(_) => ValueKind::Boolean,
            Value::List(_) => ValueKind::List,
            Value::Function(_) => ValueKind::Function,
            Value::CodeUnit(_) => ValueKind::CodeUnit,
            Value::Nil => ValueKind::Nil,
            Value::NativeFunction(_) => ValueKind::NativeFunction,
        }
    }

    /// Whether equal copies of this value share one constant table entry.
    ///
    /// Only variants with a structural equality are pooled.
    pub fn is_poolable(&self) -> bool {
        matches!(
            self,
            Value::Number(_) | Value::String(_) | Value::Boolean(_) | Value::List(_)
        )
    }

    fn mismatch(&self, expected: ValueKind) -> ValueError {
        ValueError::TypeMismatch {
            expected,
            got: self.kind(),
        }
    }

    pub fn as_number(&self) -> Result<f64> {
        match self {
            Value::Number(n) => Ok(*n),
            _ => Err(self.mismatch(ValueKind::Number)),
        }
    }

    pub fn as_string(&self) -> Result<&SmolStr> {
        match self {
            Value::String(s) => Ok(s),
            _ => Err(self.mismatch(ValueKind::String)),
        }
    }

    pub fn as_bool(&self) -> Result<bool> {
        match self {
            Value::Boolean(b) => Ok(*b),
            _ => Err(self.mismatch(ValueKind::Boolean)),
        }
    }

    pub fn as_list(&self) -> Result<&[Value]> {
        match self {
            Value::List(l) => Ok(l),
            _ => Err(self.mismatch(ValueKind::List)),
        }
    }

    pub fn as_function(&self) -> Result<&Rc<Function>> {
        match self {
            Value::Function(func) => Ok(func),
            _ => Err(self.mismatch(ValueKind::Function)),
        }
    }

    pub fn as_code_unit(&self) -> Result<&Rc<CodeUnit>> {
        match self {
            Value::CodeUnit(unit) => Ok(unit),
            _ => Err(self.mismatch(ValueKind::CodeUnit)),
        }
    }

    pub fn as_native(&self) -> Result<&NativeFunction> {
        match self {
            Value::NativeFunction(native) => Ok(native),
            _ => Err(self.mismatch(ValueKind::NativeFunction)),
        }
    }

    pub fn into_list(self) -> Result<Rc<Vec<Value>>> {
        match self {
            Value::List(l) => Ok(l),
            other => Err(other.mismatch(ValueKind::List)),
        }
    }

    pub fn into_code_unit(self) -> Result<Rc<CodeUnit>> {
        match self {
            Value::CodeUnit(unit) => Ok(unit),
            other => Err(other.mismatch(ValueKind::CodeUnit)),
        }
    }

    /// Read the element at `index` of a list, or the character at `index` of
    /// a string.
    pub fn index(&self, index: &Value) -> Result<Value> {
        match self {
            Value::List(list) => {
                let i = element_index(index, list.len())?;
                Ok(list[i].clone())
            }
            Value::String(s) => {
                let i = element_index(index, s.chars().count())?;
                let ch = s.chars().nth(i).unwrap_or_default();
                Ok(Value::String(SmolStr::from(ch.encode_utf8(&mut [0; 4]))))
            }
            other => Err(ValueError::InvalidOperands {
                op: "indexing",
                lhs: other.kind(),
                rhs: index.kind(),
            }),
        }
    }

    /// Returns a copy of this list or string with the element at `index`
    /// replaced. A string element must be a single character.
    pub fn with_index(self, index: &Value, element: Value) -> Result<Value> {
        match self {
            Value::List(mut list) => {
                let i = element_index(index, list.len())?;
                Rc::make_mut(&mut list)[i] = element;
                Ok(Value::List(list))
            }
            Value::String(s) => {
                let i = element_index(index, s.chars().count())?;
                let replacement = single_char(&element)?;
                let replaced: String = s
                    .chars()
                    .enumerate()
                    .map(|(j, c)| if j == i { replacement } else { c })
                    .collect();
                Ok(Value::String(replaced.into()))
            }
            other => Err(ValueError::InvalidOperands {
                op: "indexing",
                lhs: other.kind(),
                rhs: index.kind(),
            }),
        }
    }
}

fn element_index(index: &Value, len: usize) -> Result<usize> {
    let i = index.as_number()?;
    if i >= 0.0 && i.trunc() < len as f64 {
        Ok(i as usize)
    } else {
        Err(ValueError::IndexOutOfRange { index: i, len })
    }
}

fn single_char(v: &Value) -> Result<char> {
    let s = v.as_string()?;
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(ValueError::native(format!(
            "Expected a single character, got \"{}\".",
            s
        ))),
    }
}

/// Structural equality. Functions, code units and native functions are never
/// equal to anything, themselves included.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::List(a), Value::List(b)) => a[..] == b[..],
            (Value::Nil, Value::Nil) => true,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => fmt_number(*n, f),
            Value::String(s) => f.write_str(s),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::List(l) if l.is_empty() => f.write_str("[]"),
            Value::List(l) => write!(f, "{{{}}}", l.iter().join(", ")),
            Value::Function(_) => f.write_str("function"),
            Value::CodeUnit(_) => f.write_str("code unit"),
            Value::Nil => f.write_str("null"),
            Value::NativeFunction(_) => f.write_str("native function"),
        }
    }
}

/// Six decimal places, then trailing zeros and a trailing point are dropped.
fn fmt_number(n: f64, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = format!("{:.6}", n);
    if s.contains('.') {
        f.write_str(s.trim_end_matches('0').trim_end_matches('.'))
    } else {
        f.write_str(&s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s.into())
    }
}

impl From<SmolStr> for Value {
    fn from(s: SmolStr) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::list(items)
    }
}
