use aurora_bytecode::{CodeUnit, Instruction, Opcode, Value};
use fnv::FnvHashMap;
use smol_str::SmolStr;

/// Type used to build a code unit: its instructions and its constant table.
#[derive(Debug, Default)]
pub struct UnitBuilder {
    unit: CodeUnit,
    reverse_string_map: FnvHashMap<SmolStr, u32>,
    /// Stack height after the last emitted instruction
    depth: i32,
}

impl UnitBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, op: Opcode) -> &mut Self {
        self.emit_p(op, 0)
    }

    pub fn emit_p(&mut self, op: Opcode, operand: i32) -> &mut Self {
        debug_assert!(
            op.operand_kind().is_some() || operand == 0,
            "{} takes no operand",
            op
        );
        self.unit.instructions.push(Instruction::new(op, operand));
        self.depth = (self.depth + op.stack_effect(operand)).max(0);
        self.unit.max_stack = self.unit.max_stack.max(self.depth as u32);
        self
    }

    /// Emit `PUSH` of a constant.
    pub fn emit_const(&mut self, v: Value) -> &mut Self {
        let idx = self.insert(v);
        self.emit_p(Opcode::Push, idx as i32)
    }

    /// Emit an instruction whose operand names a variable.
    pub fn emit_name(&mut self, op: Opcode, name: &str) -> &mut Self {
        let idx = self.insert_string(name);
        self.emit_p(op, idx as i32)
    }

    pub fn insert_string(&mut self, s: &str) -> u32 {
        if let Some(&v) = self.reverse_string_map.get(s) {
            v
        } else {
            self.do_insert_constant(Value::String(s.into()))
        }
    }

    /// Add a constant, reusing an equal entry for poolable values.
    pub fn insert(&mut self, v: Value) -> u32 {
        if let Value::String(s) = &v {
            return self.insert_string(s);
        }
        match self.unit.constant_index(&v) {
            Some(idx) => idx,
            None => self.do_insert_constant(v),
        }
    }

    fn do_insert_constant(&mut self, v: Value) -> u32 {
        let id = self.unit.constants.len();
        assert!(
            id < i32::MAX as usize,
            "Cannot allocate more than 2^31 constants"
        );
        let id = id as u32;
        if let Value::String(s) = &v {
            self.reverse_string_map.insert(s.clone(), id);
        }
        self.unit.constants.push(v);
        id
    }

    /// Number of instructions emitted so far.
    pub fn len(&self) -> usize {
        self.unit.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.unit.instructions.is_empty()
    }

    /// The unit built so far, without the terminating `END`.
    pub fn code(&self) -> &CodeUnit {
        &self.unit
    }

    /// Seal the unit.
    pub fn finish(mut self) -> CodeUnit {
        self.emit(Opcode::End);
        self.unit
    }
}
