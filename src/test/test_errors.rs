//! Resource-limit enforcement and static semantic errors.

use crate::{compile, compile_with_name_and_limits, Limits};

fn locals_decl(n: u32) -> String {
    (0..n).map(|i| format!("local v{i} = {i}\n")).collect()
}

#[test]
fn max_locals_boundary() {
    let limits = Limits {
        max_locals: 4,
        ..Limits::default()
    };
    let ok = compile_with_name_and_limits(&locals_decl(4), "chunk", limits);
    assert!(ok.is_ok(), "{ok:?}");

    let over = compile_with_name_and_limits(&locals_decl(5), "chunk", limits);
    let err = over.unwrap_err();
    assert!(err.message.contains("local"), "{err:?}");
}

#[test]
fn max_params_boundary() {
    let limits = Limits {
        max_params: 2,
        ..Limits::default()
    };
    let ok = compile_with_name_and_limits("function f(a, b) end", "chunk", limits);
    assert!(ok.is_ok(), "{ok:?}");

    let over = compile_with_name_and_limits("function f(a, b, c) end", "chunk", limits);
    let err = over.unwrap_err();
    assert!(err.message.contains("parameter"), "{err:?}");
}

#[test]
fn max_multi_assign_boundary() {
    let limits = Limits {
        max_multi_assign: 2,
        ..Limits::default()
    };
    let ok = compile_with_name_and_limits("local a, b = 1, 2", "chunk", limits);
    assert!(ok.is_ok(), "{ok:?}");

    let over = compile_with_name_and_limits("local a, b, c = 1, 2, 3", "chunk", limits);
    let err = over.unwrap_err();
    assert!(err.message.contains("many variables"), "{err:?}");
}

#[test]
fn max_multi_assign_boundary_on_plain_assignment() {
    let limits = Limits {
        max_multi_assign: 2,
        ..Limits::default()
    };
    let over = compile_with_name_and_limits("a, b, c = 1, 2, 3", "chunk", limits);
    let err = over.unwrap_err();
    assert!(err.message.contains("many targets"), "{err:?}");
}

#[test]
fn max_upvalues_boundary() {
    let limits = Limits {
        max_upvalues: 1,
        ..Limits::default()
    };
    let ok = compile_with_name_and_limits(
        "local a\nfunction f() return %a end",
        "chunk",
        limits,
    );
    assert!(ok.is_ok(), "{ok:?}");

    let over = compile_with_name_and_limits(
        "local a\nlocal b\nfunction f() return %a + %b end",
        "chunk",
        limits,
    );
    let err = over.unwrap_err();
    assert!(err.message.contains("upvalue"), "{err:?}");
}

#[test]
fn max_instructions_boundary() {
    let limits = Limits {
        max_instructions: 2,
        ..Limits::default()
    };
    let over = compile_with_name_and_limits("x = 1\ny = 2\nz = 3\n", "chunk", limits);
    assert!(over.is_err());
    let err = over.unwrap_err();
    assert!(err.message.contains("instructions"), "{err:?}");
}

#[test]
fn max_arg_u_boundary_on_table_constructor() {
    let limits = Limits {
        max_arg_u: 3,
        ..Limits::default()
    };
    let ok = compile_with_name_and_limits("local t = {1, 2, 3}", "chunk", limits);
    assert!(ok.is_ok(), "{ok:?}");

    let over = compile_with_name_and_limits("local t = {1, 2, 3, 4}", "chunk", limits);
    let err = over.unwrap_err();
    assert!(err.message.contains("table"), "{err:?}");
}

#[test]
fn bare_reference_to_outer_function_local_is_a_hard_error() {
    let err = compile("local a\nfunction f() return a end").unwrap_err();
    assert!(err.message.contains("outer function"), "{err:?}");
}

#[test]
fn explicit_upvalue_of_grandparent_local_is_rejected() {
    // `%name` may only reach the *immediately* enclosing function.
    let src = "local a\nfunction outer()\n  function inner() return %a end\nend";
    let err = compile(src).unwrap_err();
    assert!(err.message.contains("upvalue"), "{err:?}");
}

#[test]
fn upvalue_at_top_level_is_rejected() {
    let err = compile("return %a").unwrap_err();
    assert!(err.message.contains("top level"), "{err:?}");
}

#[test]
fn break_outside_loop_is_rejected() {
    let err = compile("break").unwrap_err();
    assert_eq!(err.message, "no loop to break out of");
}

#[test]
fn assigning_to_a_call_result_is_rejected() {
    // `f()` parses through `suffixedexp` fine but yields a plain value,
    // not an assignable target.
    let err = compile("f() = 2").unwrap_err();
    assert!(err.message.contains("cannot assign"), "{err:?}");
}

#[test]
fn bare_name_expression_statement_that_is_not_a_call_is_rejected() {
    let err = compile("a").unwrap_err();
    assert!(err.message.contains("function call expected"), "{err:?}");
}

#[test]
fn trailing_garbage_after_chunk_is_rejected() {
    let err = compile("return 1 end").unwrap_err();
    assert!(!err.message.is_empty());
}
