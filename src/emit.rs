//! The emitter contract: loading/storing variables, creating and patching
//! jumps, adjusting the symbolic stack, and combining unary/binary
//! operators onto an `ExpDesc`. Kept in its own module to mark the seam.

use crate::binop::{BinOp, UnOp};
use crate::compiler::Compiler;
use crate::error::Result;
use crate::expdesc::ExpDesc;
use crate::jumplist;
use crate::opcode::{OpCode, NO_JUMP};

/// Forces `v` onto the top of the stack as a concrete value, discharging
/// `VLOCAL`/`VGLOBAL`/`VINDEXED` into the corresponding load instruction.
/// By construction (and/or resolve eagerly, see `expr.rs`), any `VEXP`
/// reaching this function already carries empty jump lists.
pub fn discharge(c: &mut Compiler, v: &mut ExpDesc) {
    let line = c.ls.line();
    match *v {
        ExpDesc::Local { index } => {
            c.fs().emit(OpCode::GetLocal(index), line);
            c.fs().adjust_stack(1);
        }
        ExpDesc::Global { name_const } => {
            c.fs().emit(OpCode::GetGlobal(name_const), line);
            c.fs().adjust_stack(1);
        }
        ExpDesc::Indexed => {
            c.fs().emit(OpCode::GetTable, line);
            c.fs().adjust_stack(-1);
        }
        ExpDesc::Exp { .. } => {}
    }
    *v = ExpDesc::exp();
}

/// True if the instruction just emitted is an open call: its return count
/// is still undecided.
pub fn last_is_open_call(c: &Compiler) -> bool {
    c.fs_ref()
        .proto
        .code
        .last()
        .map(|op| op.is_open_call())
        .unwrap_or(false)
}

/// Fixes the arity of the last-emitted open call to `n` (or leaves it
/// `MULT_RET` if `n < 0`), and reconciles the symbolic stack level: the
/// call's consumer always decides its arity, not the call site itself.
pub fn set_call_returns(c: &mut Compiler, n: i32) {
    let fs = c.fs();
    if let Some(OpCode::Call { nret, .. }) = fs.proto.code.last_mut() {
        *nret = n;
    }
    if n >= 0 {
        fs.adjust_stack(n);
    }
}

/// `luaK_tostack(ls, v, one)`: discharges `v` to the stack. If `one` is
/// true, an open call is pinned down to exactly one return value; if
/// false, an open call is left open (multi-value) for the caller to
/// decide later (e.g. the last element of an expression list).
pub fn to_stack(c: &mut Compiler, v: &mut ExpDesc, one: bool) {
    discharge(c, v);
    if last_is_open_call(c) {
        if one {
            set_call_returns(c, 1);
        }
        // else: leave it open; stacklevel already sits at the call's slot.
    }
}

/// Emits an unconditional jump and returns its pc (usable as a one-element
/// jump list).
pub fn jump(c: &mut Compiler) -> i32 {
    let line = c.ls.line();
    c.fs().emit(OpCode::Jmp(NO_JUMP), line) as i32
}

pub fn get_label(c: &Compiler) -> i32 {
    c.fs_ref().pc() as i32
}

pub fn concat(c: &mut Compiler, l1: i32, l2: i32) -> i32 {
    jumplist::concat(c.fs(), l1, l2)
}

pub fn patch_list(c: &mut Compiler, list: i32, target: i32) {
    jumplist::patch_list(c.fs(), list, target);
}

pub fn patch_to_here(c: &mut Compiler, list: i32) {
    jumplist::patch_to_here(c.fs(), list);
}

/// `go_if_true`: discharges `v` to a concrete value and emits a
/// pop-and-jump-if-falsy test, returning the resulting false list. This is
/// the building block for `if`/`while`/`repeat` conditions, where the
/// tested value is never needed again.
pub fn go_if_true(c: &mut Compiler, mut v: ExpDesc) -> i32 {
    discharge(c, &mut v);
    if last_is_open_call(c) {
        set_call_returns(c, 1);
    }
    let line = c.ls.line();
    let pc = c.fs().emit(OpCode::JmpFalsePop(NO_JUMP), line);
    c.fs().adjust_stack(-1);
    pc as i32
}

/// Emits the short-circuit test for `and`'s left operand: peeks the
/// top-of-stack value, jumps (keeping it) if falsy, else pops it so the
/// right operand's value can be pushed in its place. Returns the jump pc.
pub fn and_test(c: &mut Compiler) -> i32 {
    let line = c.ls.line();
    let pc = c.fs().emit(OpCode::JmpOnFalse(NO_JUMP), line);
    c.fs().emit(OpCode::Pop(1), line);
    c.fs().adjust_stack(-1);
    pc as i32
}

/// Symmetric short-circuit test for `or`.
pub fn or_test(c: &mut Compiler) -> i32 {
    let line = c.ls.line();
    let pc = c.fs().emit(OpCode::JmpOnTrue(NO_JUMP), line);
    c.fs().emit(OpCode::Pop(1), line);
    c.fs().adjust_stack(-1);
    pc as i32
}

/// Applies a prefix unary operator to `v`, discharging it to a concrete
/// value first.
pub fn prefix(c: &mut Compiler, op: UnOp, v: &mut ExpDesc) {
    discharge(c, v);
    let line = c.ls.line();
    let code = match op {
        UnOp::Minus => OpCode::Neg,
        UnOp::Not => OpCode::Not,
    };
    c.fs().emit(code, line);
    *v = ExpDesc::exp();
}

/// Applies a binary operator combining `v1` and `v2` (both already
/// discharged to the stack in left-to-right order), leaving the result as
/// a plain value. Comparisons produce a boolean value rather than a jump
/// list, a deliberate simplification noted in DESIGN.md.
pub fn binop(c: &mut Compiler, op: BinOp, v1: &mut ExpDesc, v2: &mut ExpDesc) {
    discharge(c, v2);
    let line = c.ls.line();
    let code = match op {
        BinOp::Add => OpCode::Add,
        BinOp::Sub => OpCode::Sub,
        BinOp::Mul => OpCode::Mul,
        BinOp::Div => OpCode::Div,
        BinOp::Pow => OpCode::Pow,
        BinOp::Concat => OpCode::Concat,
        BinOp::Eq => OpCode::Eq,
        BinOp::Ne => OpCode::Ne,
        BinOp::Lt => OpCode::Lt,
        BinOp::Le => OpCode::Le,
        BinOp::Gt => OpCode::Gt,
        BinOp::Ge => OpCode::Ge,
    };
    c.fs().emit(code, line);
    c.fs().adjust_stack(-1); // pop2 push1
    *v1 = ExpDesc::exp();
    let _ = v2;
}

/// Stores the value currently on top of stack into `target`. For an
/// indexed target, `stack_offset` is how many extra slots sit between the
/// table/key pair and the value.
pub fn store_var(c: &mut Compiler, target: &ExpDesc, stack_offset: u32) -> Result<()> {
    let line = c.ls.line();
    match *target {
        ExpDesc::Local { index } => {
            c.fs().emit(OpCode::SetLocal(index), line);
            c.fs().adjust_stack(-1);
        }
        ExpDesc::Global { name_const } => {
            c.fs().emit(OpCode::SetGlobal(name_const), line);
            c.fs().adjust_stack(-1);
        }
        ExpDesc::Indexed => {
            c.fs().emit(OpCode::SetTable(stack_offset), line);
            // table + key + value popped; net effect computed by caller,
            // who knows how much surrounding garbage also needs popping.
        }
        ExpDesc::Exp { .. } => unreachable!("assignment target must be assignable"),
    }
    Ok(())
}

/// Adjusts the stack by pushing nils (positive) or popping (negative);
/// used by `adjust_mult_assign` to reconcile a multiple assignment's
/// target/value count mismatch.
pub fn adjust_stack_by(c: &mut Compiler, delta: i32) {
    let line = c.ls.line();
    if delta > 0 {
        c.fs().emit(OpCode::PushNil(delta as u32), line);
    } else if delta < 0 {
        c.fs().emit(OpCode::Pop((-delta) as u32), line);
    }
    c.fs().adjust_stack(delta);
}

/// Reconciles a multi-assignment's value count against its variable count
///: an open trailing call absorbs or
/// supplies the difference; otherwise nils are pushed or extras popped.
///
/// Note the sign here is `nvars - nexps`, not `nexps - nvars`: too few
/// values (`nvars > nexps`) must *push* nils, which is `adjust_stack_by`'s
/// positive case, so the variable count leads.
pub fn adjust_mult_assign(c: &mut Compiler, nvars: usize, nexps: usize) {
    if nexps > 0 && last_is_open_call(c) {
        // The open call itself doesn't count as one of `nexps`'s values;
        // `explicit` is how many concrete values precede it.
        let explicit = nexps as i32 - 1;
        let needed = nvars as i32 - explicit;
        if needed > 0 {
            // Call must supply exactly the shortfall; no further push/pop.
            set_call_returns(c, needed);
        } else {
            // Explicit values already cover (or exceed) nvars; call
            // contributes nothing, and any excess is popped below.
            set_call_returns(c, 0);
            adjust_stack_by(c, needed);
        }
    } else {
        adjust_stack_by(c, nvars as i32 - nexps as i32);
    }
}
