//! Chunk-level driver behavior and local-variable declaration semantics.

use crate::opcode::OpCode;
use crate::proto::LINE_INFO_SENTINEL;
use crate::{compile, compile_with_name};

#[test]
fn empty_chunk_is_exactly_one_return() {
    let proto = compile("").unwrap();
    assert_eq!(proto.code, vec![OpCode::Return { first: 0, nret: 0 }]);
    assert_eq!(proto.line_info.len(), proto.code.len() + 1);
    assert_eq!(*proto.line_info.last().unwrap(), LINE_INFO_SENTINEL);
    assert_eq!(proto.num_upvalues, 0);
}

#[test]
fn whitespace_and_comments_only_chunk_compiles_to_same_thing() {
    let proto = compile("-- just a comment\n\n   \n").unwrap();
    assert_eq!(proto.code, vec![OpCode::Return { first: 0, nret: 0 }]);
}

#[test]
fn local_arithmetic_precedence_matches_scenario_one() {
    // `local x = 1 + 2 * 3`: `*` binds tighter than
    // `+`, so the multiplication's operands are pushed and combined first.
    let proto = compile("local x = 1 + 2 * 3").unwrap();
    assert_eq!(proto.number_constants, vec![1.0, 2.0, 3.0]);
    assert_eq!(
        &proto.code[..5],
        &[
            OpCode::PushNum(0),
            OpCode::PushNum(1),
            OpCode::PushNum(2),
            OpCode::Mul,
            OpCode::Add,
        ]
    );
    assert_eq!(proto.local_vars.len(), 1);
    assert_eq!(proto.local_vars[0].name, "x");
}

#[test]
fn deeply_parenthesized_expression_compiles_identically_to_bare() {
    let bare = compile("local x = 1 + 2").unwrap();
    let parens = compile("local x = ((((1)) + (2))) ").unwrap();
    assert_eq!(bare.code, parens.code);
    assert_eq!(bare.number_constants, parens.number_constants);
}

#[test]
fn local_x_equals_x_binds_to_the_prior_binding() {
    // Two-phase declaration: `new_local` reserves a slot
    // without activating it, so the initializer still resolves the old
    // `x`, here the global assigned on the line above, not the new local.
    let proto = compile("x = 1\nlocal x = x\nlocal y = x\n").unwrap();
    // First `x` on the RHS of `local x = x` must load the global, not a
    // freshly (but not yet activated) local.
    assert!(proto.code.contains(&OpCode::GetGlobal(0)));
    // Second `x` reference (`local y = x`) now sees the just-activated
    // local.
    assert!(proto.code.contains(&OpCode::GetLocal(0)));
    assert_eq!(proto.local_vars.len(), 2);
    assert_eq!(proto.local_vars[0].name, "x");
    assert_eq!(proto.local_vars[1].name, "y");
}

#[test]
fn multiple_assignment_pads_with_nils_and_truncates_extras() {
    let padded = compile("local a, b = 1").unwrap();
    assert!(padded.code.contains(&OpCode::PushNil(1)));

    let truncated = compile("local a = 1, 2, 3").unwrap();
    assert!(truncated.code.contains(&OpCode::Pop(2)));
}

#[test]
fn compile_with_name_sets_source_name() {
    let proto = compile_with_name("return", "my_chunk").unwrap();
    assert_eq!(proto.source_name, "my_chunk");
}

#[test]
fn swap_via_multiple_assignment() {
    let proto = compile("local a, b = 1, 2\na, b = b, a").unwrap();
    assert_eq!(proto.local_vars.len(), 2);
    // Both locals are read before either is stored: stores happen only
    // after the full right-hand side expression list is evaluated.
    assert!(proto.code.contains(&OpCode::GetLocal(0)));
    assert!(proto.code.contains(&OpCode::GetLocal(1)));
    assert!(proto.code.contains(&OpCode::SetLocal(0)));
    assert!(proto.code.contains(&OpCode::SetLocal(1)));
}
