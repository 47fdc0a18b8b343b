//! `FuncState`, per-function compilation context.
//!
//! The chain of enclosing functions is a flat `Vec<FuncState>` owned by the
//! driver (`Compiler`) rather than a linked list of boxes: nested function
//! compilation pushes a new `FuncState` and pops it back off on
//! `close_func`, and upvalue resolution walks the vector from the end.

use crate::expdesc::ExpDesc;
use crate::opcode::{OpCode, NO_JUMP};
use crate::proto::{LocVar, Prototype, LINE_INFO_SENTINEL};
use smol_str::SmolStr;

pub struct BreakLabel {
    pub stacklevel: u32,
    pub breaklist: i32,
}

/// A local variable slot pending activation: `new_local` reserves without
/// activating so `local x = x` sees the outer `x` on the right-hand side.
struct PendingLocal {
    locvar_index: usize,
}

pub struct FuncState {
    pub proto: Prototype,
    /// Current logical operand-stack depth (symbolic, reconciled with the
    /// physical stack at every statement boundary).
    pub stacklevel: u32,
    pub nactloc: usize,
    /// Maps active-local slot -> index into `proto.local_vars`.
    pub actloc: Vec<usize>,
    pending: Vec<PendingLocal>,
    pub upvalues: Vec<ExpDesc>,
    pub upvalue_names: Vec<SmolStr>,
    pub break_stack: Vec<BreakLabel>,
}

impl FuncState {
    pub fn new(source_name: SmolStr) -> Self {
        let mut proto = Prototype::new();
        proto.source_name = source_name;
        FuncState {
            proto,
            stacklevel: 0,
            nactloc: 0,
            actloc: Vec::new(),
            pending: Vec::new(),
            upvalues: Vec::new(),
            upvalue_names: Vec::new(),
            break_stack: Vec::new(),
        }
    }

    pub fn pc(&self) -> usize {
        self.proto.code.len()
    }

    /// Emits `op` at the current line, returning its pc.
    pub fn emit(&mut self, op: OpCode, line: u32) -> usize {
        let pc = self.proto.code.len();
        self.proto.code.push(op);
        self.proto.line_info.push(line);
        pc
    }

    /// Grows `stacklevel` by `delta` (may be negative), tracking the peak
    /// as `proto.max_stack_size`.
    pub fn adjust_stack(&mut self, delta: i32) {
        let level = self.stacklevel as i64 + delta as i64;
        debug_assert!(level >= 0, "stack underflow in symbolic tracking");
        self.stacklevel = level.max(0) as u32;
        if self.stacklevel > self.proto.max_stack_size {
            self.proto.max_stack_size = self.stacklevel;
        }
    }

    /// Reserves a local-variable record without activating it (the
    /// `new_local`/`activate` two-phase protocol).
    pub fn new_local(&mut self, name: SmolStr) -> usize {
        let idx = self.proto.local_vars.len();
        self.proto.local_vars.push(LocVar {
            name,
            start_pc: 0,
            end_pc: 0,
        });
        self.pending.push(PendingLocal { locvar_index: idx });
        idx
    }

    /// Activates the last `n` pending locals: sets their `start_pc` to the
    /// current pc and makes them visible to name resolution.
    pub fn activate(&mut self, n: usize) {
        let pc = self.pc();
        for _ in 0..n {
            let pending = self.pending.remove(0);
            self.proto.local_vars[pending.locvar_index].start_pc = pc;
            self.actloc.push(pending.locvar_index);
            self.nactloc += 1;
        }
    }

    /// Deactivates the last `n` active locals, closing their debug scope.
    pub fn deactivate(&mut self, n: usize) {
        let pc = self.pc();
        for _ in 0..n {
            let slot = self.actloc.pop().expect("deactivate underflow");
            self.proto.local_vars[slot].end_pc = pc;
            self.nactloc -= 1;
        }
    }

    /// Final `RETURN`, sentinel line-info entry, and vector trim: the
    /// analogue of `close_func`. Called by the driver once per `FuncState`
    /// right before popping it.
    pub fn close(&mut self, line: u32) {
        self.emit(
            OpCode::Return {
                first: self.nactloc as u32,
                nret: 0,
            },
            line,
        );
        self.deactivate(self.nactloc);
        self.proto.line_info.push(LINE_INFO_SENTINEL);
        self.proto.num_upvalues = self.upvalues.len() as u32;
    }

    pub fn enter_break(&mut self) {
        self.break_stack.push(BreakLabel {
            stacklevel: self.stacklevel,
            breaklist: NO_JUMP,
        });
    }

    pub fn leave_break(&mut self) -> BreakLabel {
        self.break_stack.pop().expect("leave_break without enter_break")
    }
}
