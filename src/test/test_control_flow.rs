//! `if`/`while`/`repeat`/`for`/`break` codegen.

use crate::compile;
use crate::opcode::OpCode;

#[test]
fn if_without_else_jumps_past_the_call() {
    // `if a then b() end`: the false-jump targets the instruction right
    // after the call, and there is no escape list to patch since there's
    // no `elseif`/`else`.
    let proto = compile("if a then b() end").unwrap();
    assert_eq!(
        proto.code,
        vec![
            OpCode::GetGlobal(0),
            OpCode::JmpFalsePop(4),
            OpCode::GetGlobal(1),
            OpCode::Call { func_offset: 0, nret: 0 },
            OpCode::Return { first: 0, nret: 0 },
        ]
    );
}

#[test]
fn if_elseif_else_chain_converges_on_one_escape_target() {
    let proto = compile("if a then x=1 elseif b then x=2 else x=3 end").unwrap();
    // Every branch's final instruction before `end` is a jump, and they
    // all converge on the same pc (the statement right after the chain).
    let jumps: Vec<i32> = proto
        .code
        .iter()
        .filter_map(|op| match op {
            OpCode::Jmp(t) => Some(*t),
            _ => None,
        })
        .collect();
    assert!(jumps.len() >= 2, "if and elseif each emit an escape jump");
    assert!(jumps.iter().all(|t| *t == jumps[0]));
}

#[test]
fn while_loop_back_edge_and_break_converge_after_it() {
    let proto = compile("while true do break end").unwrap();
    assert_eq!(
        proto.code,
        vec![
            OpCode::PushTrue,
            OpCode::JmpFalsePop(4),
            OpCode::Jmp(4),
            OpCode::Jmp(0),
            OpCode::Return { first: 0, nret: 0 },
        ]
    );
}

#[test]
fn break_pops_locals_declared_since_loop_entry() {
    let proto = compile("while true do local x = 1 break end").unwrap();
    assert!(
        proto.code.contains(&OpCode::Pop(1)),
        "break must reconcile the stack back to loop-entry level: {:?}",
        proto.code
    );
}

#[test]
fn repeat_until_condition_sees_block_locals() {
    // `until`'s condition is parsed before the block's locals are
    // deactivated, so `x` must resolve as a
    // local, not a global, in the `until` clause.
    let proto = compile("repeat local x = 1 until x == 1").unwrap();
    assert!(proto.code.contains(&OpCode::GetLocal(0)));
    assert!(!proto.code.contains(&OpCode::GetGlobal(0)));
}

#[test]
fn numeric_for_emits_forprep_forloop_pair() {
    let proto = compile("for i = 1, 10 do x = i end").unwrap();
    assert!(proto.code.iter().any(|op| matches!(op, OpCode::ForPrep(_))));
    assert!(proto.code.iter().any(|op| matches!(op, OpCode::ForLoop(_))));
    assert_eq!(proto.local_vars[0].name, "(for index)");
    assert_eq!(proto.local_vars[1].name, "(for limit)");
    assert_eq!(proto.local_vars[2].name, "(for step)");
    assert_eq!(proto.local_vars[3].name, "i");
}

#[test]
fn numeric_for_default_step_is_one() {
    let proto = compile("for i = 1, 10 do end").unwrap();
    assert!(proto.code.contains(&OpCode::PushInt(1)));
}

#[test]
fn generic_for_emits_lforprep_lforloop_pair() {
    let proto = compile("for k, v in pairs(t) do end").unwrap();
    assert!(proto.code.iter().any(|op| matches!(op, OpCode::LForPrep(_))));
    assert!(proto.code.iter().any(|op| matches!(op, OpCode::LForLoop(_))));
    assert_eq!(proto.local_vars[0].name, "(for iterator)");
    assert_eq!(proto.local_vars[1].name, "(for state)");
    assert_eq!(proto.local_vars[2].name, "(for control)");
    assert_eq!(proto.local_vars[3].name, "k");
    assert_eq!(proto.local_vars[4].name, "v");
}

#[test]
fn do_block_scopes_its_locals() {
    let proto = compile("do local x = 1 end\nx = 2").unwrap();
    // The `x` assigned after the `do` block is a distinct global, not the
    // block-local one (which is already out of scope).
    assert!(proto.code.contains(&OpCode::SetGlobal(0)));
}

#[test]
fn jump_targets_never_point_outside_code() {
    let sources = [
        "if a then b() end",
        "while a do b() end",
        "repeat b() until a",
        "for i=1,10 do b() end",
        "for k,v in pairs(t) do b() end",
        "if a then elseif b then else end",
    ];
    for src in sources {
        let proto = compile(src).unwrap();
        let size = proto.code.len() as i32;
        for op in &proto.code {
            if let t @ 0.. = op.jump_target() {
                assert!(t < size, "{src:?}: jump target {t} out of range {size}");
            }
        }
    }
}
