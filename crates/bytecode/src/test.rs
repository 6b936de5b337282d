use std::rc::Rc;

use pretty_assertions::assert_eq;
use test_log::test;

use crate::*;

fn func(params: &[&str]) -> Value {
    Value::Function(Rc::new(Function {
        name: Some("f".into()),
        parameters: params.iter().map(|&p| p.into()).collect(),
        body: CodeUnit::new(),
    }))
}

#[test]
fn structural_equality() {
    assert_eq!(Value::from(1.0), Value::from(1.0));
    assert_eq!(Value::from("abc"), Value::from("abc"));
    assert_eq!(
        Value::list(vec![1.0.into(), Value::list(vec!["x".into()])]),
        Value::list(vec![1.0.into(), Value::list(vec!["x".into()])])
    );
    assert_eq!(Value::Nil, Value::Nil);

    assert_ne!(Value::from(1.0), Value::from("1"));
    assert_ne!(Value::from(true), Value::from(1.0));
    assert_ne!(Value::list(vec![]), Value::Nil);
}

#[test]
fn callables_are_never_equal() {
    let f = func(&["a"]);
    assert_ne!(f, f.clone());
    assert_ne!(func(&["a"]), func(&["a"]));

    let unit = Value::CodeUnit(Rc::new(CodeUnit::new()));
    assert_ne!(unit, unit.clone());

    let native = Value::native("id", |mut args| Ok(args.pop().unwrap_or_default()));
    assert_ne!(native, native.clone());
}

#[test]
fn rendering() {
    assert_eq!(Value::from(5.0).to_string(), "5");
    assert_eq!(Value::from(0.5).to_string(), "0.5");
    assert_eq!(Value::from(1.0 / 3.0).to_string(), "0.333333");
    assert_eq!(Value::from(-2.0).to_string(), "-2");
    assert_eq!(Value::from(100.0).to_string(), "100");
    assert_eq!(Value::from("hi").to_string(), "hi");
    assert_eq!(Value::from(false).to_string(), "false");
    assert_eq!(Value::Nil.to_string(), "null");
    assert_eq!(Value::list(vec![]).to_string(), "[]");
    assert_eq!(
        Value::list(vec![1.0.into(), "a".into(), Value::list(vec![true.into()])]).to_string(),
        "{1, a, {true}}"
    );
    assert_eq!(func(&[]).to_string(), "function");
}

#[test]
fn guarded_accessors() {
    assert_eq!(Value::from(2.5).as_number(), Ok(2.5));
    assert_eq!(
        Value::from("x").as_number(),
        Err(ValueError::TypeMismatch {
            expected: ValueKind::Number,
            got: ValueKind::String
        })
    );
    let err = Value::Nil.as_list().unwrap_err();
    assert_eq!(err.to_string(), "Expected list, got null.");
    assert!(Value::from(true).as_code_unit().is_err());

    let native = Value::native("id", |mut args| Ok(args.pop().unwrap_or_default()));
    assert_eq!(native.as_native().map(|n| n.name()), Ok("id"));
    assert_eq!(
        native.as_function().unwrap_err(),
        ValueError::TypeMismatch {
            expected: ValueKind::Function,
            got: ValueKind::NativeFunction
        }
    );
}

#[test]
fn set_index_copies_list() {
    let original = Value::list(vec![1.0.into(), 2.0.into(), 3.0.into()]);
    let updated = original
        .clone()
        .with_index(&1.0.into(), "two".into())
        .unwrap();

    assert_eq!(
        original,
        Value::list(vec![1.0.into(), 2.0.into(), 3.0.into()])
    );
    assert_eq!(
        updated,
        Value::list(vec![1.0.into(), "two".into(), 3.0.into()])
    );
}

#[test]
fn string_indexing() {
    let s = Value::from("héllo");
    assert_eq!(s.index(&1.0.into()), Ok("é".into()));
    assert_eq!(s.index(&4.9.into()), Ok("o".into()));
    assert_eq!(
        s.clone().with_index(&0.0.into(), "j".into()),
        Ok("jéllo".into())
    );
    assert!(s.clone().with_index(&0.0.into(), "jj".into()).is_err());
    assert_eq!(
        s.index(&5.0.into()),
        Err(ValueError::IndexOutOfRange { index: 5.0, len: 5 })
    );
    assert!(s.index(&(-1.0).into()).is_err());
    assert!(s.index(&f64::NAN.into()).is_err());
}

#[test]
fn indexing_other_values_fails() {
    let err = Value::from(3.0).index(&0.0.into()).unwrap_err();
    assert_eq!(
        err,
        ValueError::InvalidOperands {
            op: "indexing",
            lhs: ValueKind::Number,
            rhs: ValueKind::Number
        }
    );
}

#[test]
fn constant_pooling_rules() {
    let mut unit = CodeUnit::new();
    unit.constants = vec![
        "a".into(),
        2.0.into(),
        Value::list(vec![1.0.into()]),
        func(&[]),
        Value::Nil,
    ];

    assert_eq!(unit.constant_index(&"a".into()), Some(0));
    assert_eq!(unit.constant_index(&2.0.into()), Some(1));
    assert_eq!(unit.constant_index(&Value::list(vec![1.0.into()])), Some(2));
    assert_eq!(unit.constant_index(&"b".into()), None);
    assert_eq!(unit.constant_index(&func(&[])), None);
    assert_eq!(unit.constant_index(&Value::Nil), None);
}

#[test]
fn fetch_past_end_is_end() {
    let unit = CodeUnit {
        instructions: vec![Instruction::simple(Opcode::True)],
        ..CodeUnit::new()
    };
    assert_eq!(unit.fetch(0), Instruction::simple(Opcode::True));
    assert_eq!(unit.fetch(1), Instruction::END);
    assert_eq!(unit.fetch(100), Instruction::END);
}

#[test]
fn opcode_table() {
    assert_eq!(Opcode::COUNT, 36);
    assert_eq!(Opcode::Push.operand_kind(), Some(OperandKind::Const));
    assert_eq!(Opcode::Store.operand_kind(), Some(OperandKind::Name));
    assert_eq!(Opcode::Add.operand_kind(), None);

    assert_eq!(Opcode::Push.stack_effect(0), 1);
    assert_eq!(Opcode::Add.stack_effect(0), -1);
    assert_eq!(Opcode::SetIdx.stack_effect(0), -2);
    assert_eq!(Opcode::Call.stack_effect(3), -3);
    assert_eq!(Opcode::List.stack_effect(4), -3);
    assert_eq!(Opcode::If.stack_effect(0), -3);
}

#[test]
fn disassembly_lists_nested_units() {
    let body = CodeUnit {
        instructions: vec![Instruction::new(Opcode::PushI, 1), Instruction::END],
        ..CodeUnit::new()
    };
    let unit = CodeUnit {
        instructions: vec![
            Instruction::simple(Opcode::True),
            Instruction::new(Opcode::Push, 0),
            Instruction::new(Opcode::Store, 1),
            Instruction::END,
        ],
        constants: vec![Value::CodeUnit(Rc::new(body)), "x".into()],
        max_stack: 2,
    };

    assert_eq!(
        unit.disassemble().to_string(),
        "\
0000 True
0001 Push 0  ; unit
    0000 PushI 1
    0001 End
0002 Store 1  ; \"x\"
0003 End
"
    );
}
