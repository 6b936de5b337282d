mod error;
mod ops;
pub mod stdlib;
mod vm;


pub use error::{Result, RuntimeError};
pub use vm::{Globals, Outcome, Scope, Vm, VmConfig};
