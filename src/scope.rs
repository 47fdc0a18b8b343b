//! Scope manager: local-variable slot allocation, name resolution, explicit
//! upvalue references, and the break-label stack.

use crate::compiler::Compiler;
use crate::error::{CompileError, Result};
use crate::expdesc::ExpDesc;
use crate::opcode::OpCode;
use smol_str::SmolStr;

/// Result of walking the `FuncState` chain looking for `name`.
enum Found {
    /// Found as a local at `level` levels out (0 = current function), at
    /// slot `index` within that function's active-local array.
    Local { level: usize, index: u32 },
    NotFound,
}

/// Walks the `FuncState` chain from innermost outward, scanning each
/// function's active locals from highest slot to lowest (inner shadowing
/// wins).
fn search_local(c: &Compiler, name: &str) -> Found {
    for (level, fs) in c.funcs.iter().rev().enumerate() {
        for slot in (0..fs.nactloc).rev() {
            let locvar_idx = fs.actloc[slot];
            if fs.proto.local_vars[locvar_idx].name == name {
                return Found::Local {
                    level,
                    index: slot as u32,
                };
            }
        }
    }
    Found::NotFound
}

/// Interns `name` into `fs`'s string-constant pool (by value, no sharing
/// across functions).
fn intern_in(fs: &mut crate::func_state::FuncState, name: &str, limit: u32, line: u32) -> Result<u32> {
    if let Some(i) = fs
        .proto
        .string_constants
        .iter()
        .position(|s| s.as_str() == name)
    {
        return Ok(i as u32);
    }
    if fs.proto.string_constants.len() as u32 >= limit {
        return Err(CompileError::new("constant table overflow", line));
    }
    fs.proto.string_constants.push(SmolStr::new(name));
    Ok(fs.proto.string_constants.len() as u32 - 1)
}

/// Interns `name` as a string constant of the current function, for use as
/// a table-constructor record key or any other bare string literal.
pub fn intern_string(c: &mut Compiler, name: &str) -> Result<u32> {
    let line = c.ls.line();
    let limit = c.limits.max_constants;
    intern_in(c.fs(), name, limit, line)
}

/// Classifies a bare name reference: a local in the current function, or a
/// global. A local found at level >= 1 is a hard error; bare references
/// never implicitly close over outer scopes.
pub fn singlevar(c: &mut Compiler, name: &str) -> Result<ExpDesc> {
    let line = c.ls.line();
    match search_local(c, name) {
        Found::Local { level: 0, index } => Ok(ExpDesc::Local { index }),
        Found::Local { .. } => Err(CompileError::new(
            "cannot access a variable in outer function",
            line,
        )),
        Found::NotFound => {
            let limit = c.limits.max_constants;
            let idx = intern_in(c.fs(), name, limit, line)?;
            Ok(ExpDesc::Global { name_const: idx })
        }
    }
}

/// Resolves the explicit upvalue-reference syntax `%name`.
/// Must be either a global, or a local of the *immediately* enclosing
/// function; no transitive closures over grandparent scopes.
fn resolve_upvalue_target(c: &mut Compiler, name: &str) -> Result<ExpDesc> {
    let line = c.ls.line();
    match search_local(c, name) {
        Found::Local { level: 1, index } => Ok(ExpDesc::Local { index }),
        Found::Local { .. } => Err(CompileError::new(
            "upvalue must be global or local to immediately outer function",
            line,
        )),
        Found::NotFound => {
            if c.depth() < 2 {
                return Err(CompileError::new(
                    "cannot access an upvalue at top level",
                    line,
                ));
            }
            let limit = c.limits.max_constants;
            let parent = &mut c.funcs[c.funcs.len() - 2];
            let idx = intern_in(parent, name, limit, line)?;
            Ok(ExpDesc::Global { name_const: idx })
        }
    }
}

/// Deduplicates `target` against the current function's upvalue table,
/// appending a new entry if needed, and returns its index.
fn index_upvalue(c: &mut Compiler, target: ExpDesc, name: &str) -> Result<u32> {
    let fs = c.fs();
    if let Some(i) = fs.upvalues.iter().position(|u| *u == target) {
        return Ok(i as u32);
    }
    if fs.upvalues.len() as u32 >= c.limits.max_upvalues {
        let line = c.ls.line();
        return Err(CompileError::new("too many upvalues", line));
    }
    fs.upvalues.push(target);
    fs.upvalue_names.push(SmolStr::new(name));
    Ok(fs.upvalues.len() as u32 - 1)
}

/// `%name`, resolves, records in the current function's upvalue table,
/// and emits `PushUpvalue`.
pub fn push_upvalue(c: &mut Compiler, name: &str) -> Result<ExpDesc> {
    let target = resolve_upvalue_target(c, name)?;
    let idx = index_upvalue(c, target, name)?;
    let line = c.ls.line();
    c.fs().emit(OpCode::PushUpvalue(idx), line);
    c.fs().adjust_stack(1);
    Ok(ExpDesc::exp())
}

/// Declares a new local variable in two phases: reserves a `LocVar` record
/// without activating it yet.
pub fn new_local(c: &mut Compiler, name: &str) -> Result<()> {
    let line = c.ls.line();
    let fs = c.fs();
    if fs.nactloc as u32 + 1 > c.limits.max_locals {
        return Err(CompileError::new("too many local variables", line));
    }
    fs.new_local(SmolStr::new(name));
    Ok(())
}

/// Activates the last `n` pending locals.
pub fn activate(c: &mut Compiler, n: usize) {
    c.fs().activate(n);
}

/// Deactivates the last `n` active locals (closes their debug scope) and
/// pops their stack slots, restoring the `stacklevel == nactloc` invariant
/// at every scope exit.
pub fn deactivate(c: &mut Compiler, n: usize) {
    if n > 0 {
        let line = c.ls.line();
        c.fs().emit(OpCode::Pop(n as u32), line);
        c.fs().adjust_stack(-(n as i32));
    }
    c.fs().deactivate(n);
}

pub fn enter_break(c: &mut Compiler) {
    c.fs().enter_break();
}

/// Patches all jumps in the break list to the current pc and asserts the
/// stack level matches loop entry.
pub fn leave_break(c: &mut Compiler) {
    let bl = c.fs().leave_break();
    debug_assert_eq!(bl.stacklevel, c.fs_ref().stacklevel);
    crate::jumplist::patch_to_here(c.fs(), bl.breaklist);
}
