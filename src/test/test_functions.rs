//! Function literals, method sugar, and the explicit upvalue syntax.

use crate::opcode::OpCode;
use crate::{compile, Limits};

#[test]
fn method_definition_prepends_implicit_self() {
    let proto = compile("o = {}\nfunction o:m(x) return self + x end").unwrap();
    let closure = proto
        .code
        .iter()
        .find_map(|op| match op {
            OpCode::Closure { proto: idx, .. } => Some(*idx as usize),
            _ => None,
        })
        .expect("a closure is emitted for the method");
    let method = &proto.nested_protos[closure];
    assert_eq!(method.num_params, 2, "self plus x");
    assert_eq!(method.local_vars[0].name, "self");
    assert_eq!(method.local_vars[1].name, "x");
    assert!(method.code.contains(&OpCode::GetLocal(0)));
    assert!(method.code.contains(&OpCode::GetLocal(1)));
    assert!(method.code.contains(&OpCode::Add));
}

#[test]
fn colon_call_pushes_self_via_pushself() {
    let proto = compile("o = {}\no:m(1)").unwrap();
    assert!(proto
        .code
        .iter()
        .any(|op| matches!(op, OpCode::PushSelf(_))));
}

#[test]
fn plain_function_has_no_implicit_self() {
    let proto = compile("function f(x) return x end").unwrap();
    let closure = proto
        .code
        .iter()
        .find_map(|op| match op {
            OpCode::Closure { proto: idx, .. } => Some(*idx as usize),
            _ => None,
        })
        .unwrap();
    let f = &proto.nested_protos[closure];
    assert_eq!(f.num_params, 1);
    assert_eq!(f.local_vars[0].name, "x");
}

#[test]
fn vararg_function_declares_arg_local_but_excludes_it_from_num_params() {
    let proto = compile("function f(a, ...) end").unwrap();
    let closure = proto
        .code
        .iter()
        .find_map(|op| match op {
            OpCode::Closure { proto: idx, .. } => Some(*idx as usize),
            _ => None,
        })
        .unwrap();
    let f = &proto.nested_protos[closure];
    assert!(f.is_vararg);
    assert_eq!(f.num_params, 1, "`...` must not be counted as a parameter");
    assert_eq!(f.local_vars[0].name, "a");
    assert_eq!(f.local_vars[1].name, "arg");
}

#[test]
fn nested_closure_captures_outer_local_only_via_explicit_upvalue() {
    let proto = compile("local a = 1\nfunction f() return %a end").unwrap();
    let closure = proto
        .code
        .iter()
        .find_map(|op| match op {
            OpCode::Closure {
                proto: idx,
                nupvalues,
            } => Some((*idx as usize, *nupvalues)),
            _ => None,
        })
        .unwrap();
    let (idx, nupvalues) = closure;
    assert_eq!(nupvalues, 1);
    let f = &proto.nested_protos[idx];
    assert!(f.code.contains(&OpCode::PushUpvalue(0)));
    // The capturing GetLocal for `a` is emitted in the *enclosing* function,
    // right before CLOSURE, not inside the nested prototype's own code.
    assert!(proto.code.contains(&OpCode::GetLocal(0)));
}

#[test]
fn local_function_recurses_via_explicit_upvalue() {
    // Unlike plain `local`, the name is activated before the body is
    // parsed, but a bare reference to it from inside the body is still
    // an outer-function local and hits the same hard error as any other
    // bare outer access. Recursion must go through `%fact`.
    let proto = compile("local function fact(n) return %fact(n) end").unwrap();
    let closure = proto
        .code
        .iter()
        .find_map(|op| match op {
            OpCode::Closure { proto: idx, .. } => Some(*idx as usize),
            _ => None,
        })
        .unwrap();
    let f = &proto.nested_protos[closure];
    assert!(f.code.contains(&OpCode::PushUpvalue(0)));
}

#[test]
fn bare_self_reference_inside_local_function_body_is_rejected() {
    let err = compile("local function fact(n) return fact(n) end").unwrap_err();
    assert!(err.message.contains("outer function"), "{err:?}");
}

#[test]
fn function_keyword_followed_by_lparen_is_not_mistaken_for_a_named_funcstat() {
    // `function (x) ... end` at statement position has no name to parse,
    // so `statement` must peek past `function` before committing to
    // `funcstat`'s `funcname` production.
    let err = compile("function (x) return x end").unwrap_err();
    assert!(err.message.contains("function call expected"), "{err:?}");
}

#[test]
fn function_keyword_followed_by_a_name_still_parses_as_a_named_funcstat() {
    let proto = compile("function f(x) return x end").unwrap();
    assert!(proto
        .code
        .iter()
        .any(|op| matches!(op, OpCode::Closure { .. })));
}

#[test]
fn immediately_invoked_function_literal_is_a_valid_expression_statement() {
    // `function() ... end()` is a primary expression (the literal) with a
    // call suffix applied, same as any other suffixed primary.
    let proto = compile("function() x = 1 end()").unwrap();
    assert!(proto
        .code
        .iter()
        .any(|op| matches!(op, OpCode::Closure { .. })));
    assert!(proto
        .code
        .iter()
        .any(|op| matches!(op, OpCode::Call { .. })));
}

#[test]
fn string_literal_takes_a_method_call_suffix() {
    let proto = compile("x = 's':byte()").unwrap();
    assert!(proto
        .code
        .iter()
        .any(|op| matches!(op, OpCode::PushSelf(_))));
}

#[test]
fn function_with_too_many_params_is_rejected_with_custom_limits() {
    let limits = Limits {
        max_params: 1,
        ..Limits::default()
    };
    let err = crate::compile_with_name_and_limits(
        "function f(a, b) end",
        "chunk",
        limits,
    )
    .unwrap_err();
    assert!(err.message.contains("parameter"));
}
