use enum_ordinalize::Ordinalize;

/// The kind of operand an instruction carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandKind {
    /// Index into the unit's constant table
    Const,
    /// Index into the constant table. The constant is the name of a variable.
    Name,
    /// An integer literal inlined into the instruction
    Int,
    /// Number of values taken from the stack
    Count,
}

macro_rules! define_inst {
    (
        $(#[$meta:meta])*
        // type names
        $ty_vis:vis $type:ident,
        // instruction variant definition
        $(
            // metadata for this variant. Will be put inside the final enum
            $(#[$variant_meta:meta])*
            // variant name
            $name:ident
            // operand
            $(($param_name:ident : $param:ident))?

            // Pop and push specs
            $(>> $pop_cnt:literal)?
            $(<< $push_cnt:literal)?
        ),*
    ) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Copy, Hash, Ordinalize)]
        #[repr(u8)]
        $ty_vis enum $type {$(
            $(#[$variant_meta])*
            $name
        ),*}

        impl $type {
            /// Number of opcodes.
            pub const COUNT: usize = [$(stringify!($name)),*].len();

            /// Returns the kind of operand of this instruction, or `None` if the
            /// operand is unused.
            #[allow(path_statements)]
            pub fn operand_kind(self) -> Option<OperandKind> {
                match self {$(
                    $type::$name => {
                        None::<OperandKind>
                        $(; Some(OperandKind::$param))?
                    }
                ),*
                }
            }

            /// Number of values this instruction always pops.
            pub fn pop_count(self) -> usize {
                match self {$(
                    Self::$name => {
                        0
                        $(; $pop_cnt)?
                    }
                ),*}
            }

            /// Number of values this instruction pushes.
            pub fn push_count(self) -> usize {
                match self {$(
                    Self::$name => {
                        0
                        $(; $push_cnt)?
                    }
                ),*}
            }
        }

        impl ::std::fmt::Display for $type {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {$(
                    Self::$name => f.write_str(stringify!($name)),
                )*}
            }
        }
    };
}

// instruction definition.
//
// Each line is an instruction. `>>` and `<<` are the number of values popped
// from and pushed into the stack. `Call` and `List` additionally pop as many
// values as their operand says.
//
// Each instruction carries exactly one 32-bit operand, which is ignored by
// instructions that don't declare one.
define_inst! {
    /// The instruction set of the virtual machine.
    pub Opcode,

    // constants
    /// Push the `idx`th constant of the unit
    Push(idx: Const)                      << 1,
    /// Push an inlined integer as a number
    PushI(num: Int)                       << 1,
    /// Push boolean true
    True                                  << 1,
    /// Push boolean false
    False                                 << 1,

    // stack manipulation
    /// Pop a value from stack
    Pop                          >> 1,
    /// Duplicate the stack top value
    Dup                          >> 1     << 2,
    /// Exchange the two topmost values
    Swap                         >> 2     << 2,

    // arithmetic
    /// Add two numbers or concatenate two strings
    Add                          >> 2     << 1,
    Sub                          >> 2     << 1,
    Mul                          >> 2     << 1,
    Div                          >> 2     << 1,
    /// Truncating remainder: `x - trunc(x / y) * y`
    Mod                          >> 2     << 1,
    Neg                          >> 1     << 1,

    // logic, never short-circuiting
    Not                          >> 1     << 1,
    And                          >> 2     << 1,
    Or                           >> 2     << 1,

    // comparison
    Eq                           >> 2     << 1,
    Neq                          >> 2     << 1,
    Lt                           >> 2     << 1,
    Gt                           >> 2     << 1,
    Lte                          >> 2     << 1,
    Gte                          >> 2     << 1,

    // function
    /// Call a function. The stack contains first the callee, and then the
    /// `n_args` arguments to be passed into it.
    ///
    /// ```plaintext
    /// (stack bottom) ..., callee, arg0, arg1, ..., argN (stack top)
    ///                    |-----> These values are popped
    ///                    |<-- This value is pushed
    /// (stack bottom) ..., result (stack top)
    /// ```
    Call(n_args: Count)          >> 1     << 1,
    /// Unwind to the nearest call boundary with the stack top as result
    Ret                          >> 1,
    /// Finish the current unit with the stack top as its result
    Res                          >> 1,

    // load/stores
    /// Load a variable by name
    Load(name: Name)                      << 1,
    /// Store the stack top into a variable
    Store(name: Name)            >> 1,

    // control flow
    /// Pops `[condition, else_unit, then_unit]` and runs one of the units in
    /// a new scope.
    If                           >> 3,
    /// Pops `[iterable, body_unit]` and runs the body once per element, with
    /// the element bound to `name`.
    FLoop(name: Name)            >> 2,
    /// Pops `[condition_unit, body_unit]` and runs the body while the
    /// condition unit results in `true`.
    WLoop                        >> 2,
    /// Leave the innermost loop
    Break,
    /// Skip to the next iteration of the innermost loop
    Continue,

    // compound types
    /// Pops `[container, index]`, pushes the element
    Idx                          >> 2     << 1,
    /// Pops `[index, element, container]`, pushes a copy of the container
    /// with the element replaced
    SetIdx                       >> 3     << 1,
    /// Create a new list. Pops additional `len` items into the list.
    List(len: Count)                      << 1,

    /// Finish the current unit with `nil`
    End
}

impl Opcode {
    /// Net change of stack height when executing this instruction with the given operand.
    pub fn stack_effect(self, operand: i32) -> i32 {
        let dynamic = match self {
            Opcode::Call | Opcode::List => operand,
            _ => 0,
        };
        self.push_count() as i32 - self.pop_count() as i32 - dynamic
    }
}

/// A single instruction: an opcode and its operand.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Instruction {
    pub op: Opcode,
    pub operand: i32,
}

impl Instruction {
    pub const fn new(op: Opcode, operand: i32) -> Self {
        Instruction { op, operand }
    }

    /// An instruction whose operand is unused.
    pub const fn simple(op: Opcode) -> Self {
        Instruction { op, operand: 0 }
    }

    pub const END: Instruction = Instruction::simple(Opcode::End);

    /// Index of the opcode in the dispatch table.
    pub fn ordinal(&self) -> usize {
        self.op.ordinal() as usize
    }
}
