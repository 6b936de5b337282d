use aurora_bytecode::{CodeUnit, Opcode, Value};
use expect_test::expect;
use pretty_assertions::assert_eq;
use test_log::test;

use crate::{compile_chunk, compile_expression, CompileErrorKind, Compiler};
use aurora_syn::TokenKind;
use smol_str::SmolStr;

fn compile(src: &str) -> CodeUnit {
    match compile_chunk(src) {
        Ok(unit) => unit,
        Err(e) => panic!("Compile error: {}", e),
    }
}

fn opcodes(unit: &CodeUnit) -> Vec<Opcode> {
    unit.instructions.iter().map(|i| i.op).collect()
}

fn assert_disasm_matches(unit: &CodeUnit, expected: &str) {
    let result_formatted = unit.disassemble().to_string();
    let actual = result_formatted.trim();
    let expected = expected.trim();
    if actual != expected {
        let diff = colored_diff::PrettyDifference { actual, expected };
        panic!("disassembly mismatch (< expected / > actual):\n{}", diff);
    }
}

fn nested_unit(unit: &CodeUnit, idx: usize) -> &CodeUnit {
    match &unit.constants[idx] {
        Value::CodeUnit(u) => u,
        Value::Function(f) => &f.body,
        other => panic!("constant {} is not a unit: {:?}", idx, other),
    }
}

#[test]
fn test_compile_assignment() {
    let unit = compile("x = 1 + 2.5");
    assert_disasm_matches(
        &unit,
        r#"
0000 PushI 1
0001 Push 0  ; 2.5
0002 Add
0003 Store 1  ; "x"
0004 End
        "#,
    );
}

#[test]
fn test_constants_are_pooled() {
    let unit = compile("a = \"hi\"\nb = \"hi\"\nc = 3.5\nd = 3.5\ne = a");
    let operands = unit
        .instructions
        .iter()
        .filter(|i| i.op == Opcode::Push)
        .map(|i| i.operand)
        .collect::<Vec<_>>();
    assert_eq!(operands, vec![0, 0, 3, 3]);
    // the name `a` is shared by its store and its load
    assert_eq!(unit.constants.len(), 7);
    assert_eq!(unit.constants[1], Value::from("a"));
}

#[test]
fn test_functions_are_not_pooled() {
    let unit = compile("fn f -> 1\nfn f -> 1");
    let pushes = unit
        .instructions
        .iter()
        .filter(|i| i.op == Opcode::Push)
        .map(|i| i.operand)
        .collect::<Vec<_>>();
    assert_eq!(pushes, vec![0, 2]);
}

#[test]
fn test_empty_units_are_not_pooled() {
    let unit = compile("if true x = 1\nif true x = 1");
    let pushes = unit
        .instructions
        .iter()
        .filter(|i| i.op == Opcode::Push)
        .count();
    assert_eq!(pushes, 4);
    assert_eq!(unit.constants.len(), 4);
}

#[test]
fn test_small_integers_are_inlined() {
    let unit = compile("x = 3000000000\ny = 7\nz = 0.5");
    assert_eq!(unit.instructions[0].op, Opcode::Push);
    assert_eq!(unit.constants[0], Value::from(3000000000.0));
    assert_eq!(unit.instructions[2].op, Opcode::PushI);
    assert_eq!(unit.instructions[2].operand, 7);
}

#[test]
fn test_compile_if_else() {
    let unit = compile(
        r#"
if x > 1
  y = "big"
else
  y = "small"
end
"#,
    );
    assert_disasm_matches(
        &unit,
        r#"
0000 Load 0  ; "x"
0001 PushI 1
0002 Gt
0003 Push 1  ; unit
    0000 Push 0  ; "small"
    0001 Store 1  ; "y"
    0002 End
0004 Push 2  ; unit
    0000 Push 0  ; "big"
    0001 Store 1  ; "y"
    0002 End
0005 If
0006 End
        "#,
    );
}

#[test]
fn test_inline_if_without_else() {
    let unit = compile("if true x = 1");
    assert_eq!(
        opcodes(&unit),
        vec![Opcode::True, Opcode::Push, Opcode::Push, Opcode::If, Opcode::End]
    );
    assert_eq!(opcodes(nested_unit(&unit, 0)), vec![Opcode::End]);
    assert_eq!(
        opcodes(nested_unit(&unit, 1)),
        vec![Opcode::PushI, Opcode::Store, Opcode::End]
    );
}

#[test]
fn test_compile_while() {
    let unit = compile("i = 0\nwhile i < 3\n  i += 1\nend\n");
    expect![[r#"
        0000 PushI 0
        0001 Store 0  ; "i"
        0002 Push 1  ; unit
            0000 Load 0  ; "i"
            0001 PushI 3
            0002 Lt
            0003 Res
            0004 End
        0003 Push 2  ; unit
            0000 Load 0  ; "i"
            0001 PushI 1
            0002 Add
            0003 Store 0  ; "i"
            0004 End
        0004 WLoop
        0005 End
    "#]]
    .assert_eq(&unit.disassemble().to_string());
}

#[test]
fn test_compile_for() {
    let unit = compile("for x, {1, 2}\n  print x\nend");
    expect![[r#"
        0000 PushI 1
        0001 PushI 2
        0002 List 2
        0003 Push 0  ; unit
            0000 Load 0  ; "print"
            0001 Load 1  ; "x"
            0002 Call 1
            0003 Pop
            0004 End
        0004 FLoop 1  ; "x"
        0005 End
    "#]]
    .assert_eq(&unit.disassemble().to_string());
}

#[test]
fn test_compile_functions() {
    let unit = compile("fn double a -> a * 2\nfn greet name\n  print \"hi \" + name\nend");
    assert_eq!(
        opcodes(nested_unit(&unit, 0)),
        vec![
            Opcode::Load,
            Opcode::PushI,
            Opcode::Mul,
            Opcode::Ret,
            Opcode::End
        ]
    );
    let greet = nested_unit(&unit, 2);
    assert_eq!(
        &opcodes(greet)[greet.instructions.len() - 3..],
        &[Opcode::Push, Opcode::Ret, Opcode::End]
    );
    match &unit.constants[2] {
        Value::Function(f) => assert_eq!(f.parameters, vec![SmolStr::from("name")]),
        other => panic!("expected function, got {:?}", other),
    }
}

#[test]
fn test_compound_assignment_keeps_operand_order() {
    let unit = compile("x -= 3");
    assert_eq!(
        opcodes(&unit),
        vec![
            Opcode::Load,
            Opcode::PushI,
            Opcode::Sub,
            Opcode::Store,
            Opcode::End
        ]
    );
}

#[test]
fn test_indexed_assignment() {
    let unit = compile("xs: 1 = 5");
    assert_eq!(
        opcodes(&unit),
        vec![
            Opcode::PushI,
            Opcode::PushI,
            Opcode::Load,
            Opcode::SetIdx,
            Opcode::Store,
            Opcode::End
        ]
    );

    let unit = compile("xs: 1 += 5");
    assert_eq!(
        opcodes(&unit),
        vec![
            Opcode::PushI,
            Opcode::Dup,
            Opcode::Load,
            Opcode::Swap,
            Opcode::Idx,
            Opcode::PushI,
            Opcode::Add,
            Opcode::Load,
            Opcode::SetIdx,
            Opcode::Store,
            Opcode::End
        ]
    );
}

#[test]
fn test_call_statements_discard_result() {
    let paren = compile("print(1, 2)");
    let command = compile("print 1, 2");
    let expected = vec![
        Opcode::Load,
        Opcode::PushI,
        Opcode::PushI,
        Opcode::Call,
        Opcode::Pop,
        Opcode::End,
    ];
    assert_eq!(opcodes(&paren), expected);
    assert_eq!(opcodes(&command), expected);
    assert_eq!(paren.instructions[3].operand, 2);

    let bare = compile("print");
    assert_eq!(bare.instructions[1].operand, 0);

    // with a space the parenthesis starts the first argument
    let spaced = compile("print (1 + 2), 3");
    assert_eq!(spaced.instructions[5].op, Opcode::Call);
    assert_eq!(spaced.instructions[5].operand, 2);
}

#[test]
fn test_newlines_inside_brackets() {
    let unit = compile("xs = {\n  1,\n  2\n  3\n}\nf(\n  xs,\n  2\n)");
    assert_eq!(unit.instructions[3].op, Opcode::List);
    assert_eq!(unit.instructions[3].operand, 3);
    let call = unit
        .instructions
        .iter()
        .find(|i| i.op == Opcode::Call)
        .map(|i| i.operand);
    assert_eq!(call, Some(2));
}

#[test]
fn test_max_stack() {
    let unit = compile("x = {1, 2, {3, 4}}");
    assert_eq!(unit.max_stack, 4);
}

#[test]
fn test_compile_expression() {
    let unit = compile_expression("add(2, 3)").unwrap();
    assert_eq!(
        opcodes(&unit),
        vec![
            Opcode::Load,
            Opcode::PushI,
            Opcode::PushI,
            Opcode::Call,
            Opcode::Res,
            Opcode::End
        ]
    );
    assert!(compile_expression("1 2").is_err());
}

#[test]
fn test_statement_ranges() {
    let mut compiler = Compiler::new("a = 1\n\nb = 2\n");
    assert_eq!(compiler.compile_statement().unwrap(), Some(0..2));
    assert_eq!(compiler.compile_statement().unwrap(), Some(2..4));
    assert_eq!(compiler.compile_statement().unwrap(), None);
    assert_eq!(compiler.code().instructions.len(), 4);
    assert_eq!(compiler.finish().instructions.len(), 5);
}

fn error_kind(src: &str) -> CompileErrorKind {
    match compile_chunk(src) {
        Ok(unit) => panic!("expected an error, got\n{}", unit.disassemble()),
        Err(e) => e.kind,
    }
}

#[test]
fn test_syntax_errors() {
    assert_eq!(error_kind("x = )"), CompileErrorKind::Unexpected(TokenKind::RParen));
    assert_eq!(
        error_kind("if x\n  y = 1\n"),
        CompileErrorKind::Expected {
            expected: TokenKind::End,
            got: TokenKind::Eof
        }
    );
    assert_eq!(
        error_kind("xs: 1 2"),
        CompileErrorKind::ExpectedAssignment(TokenKind::Number)
    );
    assert_eq!(
        error_kind("x = 1 @"),
        CompileErrorKind::InvalidToken("@".into())
    );
    assert_eq!(error_kind("1 + 2"), CompileErrorKind::Unexpected(TokenKind::Number));
}

#[test]
fn test_misplaced_control_flow() {
    assert_eq!(error_kind("break"), CompileErrorKind::BreakOutsideLoop);
    assert_eq!(
        error_kind("if true\n  continue\nend"),
        CompileErrorKind::ContinueOutsideLoop
    );
    assert_eq!(error_kind("return 1"), CompileErrorKind::ReturnOutsideFunction);
    assert_eq!(
        error_kind("while true\n  fn f\n    break\n  end\nend"),
        CompileErrorKind::BreakOutsideLoop
    );

    compile("fn f\n  for x, {1}\n    if x == 1 return x\n    continue\n  end\nend");
}

#[test]
fn test_error_messages() {
    let err = compile_chunk("x = 1\nfor x 1").unwrap_err();
    assert_eq!(err.line, 2);
    assert_eq!(err.span, 12..13);
    assert_eq!(
        err.to_string(),
        "Unexpected token number at line 2, expected ','."
    );

    let err = compile_chunk("y = (1").unwrap_err();
    assert_eq!(
        err.to_string(),
        "Unexpected token end of input at line 1, expected ')'."
    );
}
