//! `ExpDesc`, the tagged descriptor of where an in-progress expression's
//! result currently is. Deliberately the simpler Lua 5.0 shape (four
//! variants) rather than a Lua 5.4 register-machine `ExpKind` (twenty-odd
//! variants): this language's VM is stack-based, so there is no register to
//! track, only stack depth.

use crate::opcode::NO_JUMP;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExpDesc {
    /// In local slot `index` of the current function.
    Local { index: u32 },
    /// A named global, not yet loaded; `name_const` indexes the current
    /// function's string-constant pool.
    Global { name_const: u32 },
    /// Top two stack slots are table and key.
    Indexed,
    /// Result is on top of stack; `t`/`f` are pending jump lists awaiting
    /// patching by a consumer that forces this value to a boolean.
    Exp { t: i32, f: i32 },
}

impl ExpDesc {
    /// A `VEXP` with no pending jumps, the common case once a value has
    /// been pushed and has no conditional meaning yet.
    pub fn exp() -> Self {
        ExpDesc::Exp { t: NO_JUMP, f: NO_JUMP }
    }

    pub fn has_jumps(&self) -> bool {
        matches!(self, ExpDesc::Exp { t, f } if *t != NO_JUMP || *f != NO_JUMP)
    }

    /// Whether this descriptor denotes something assignable: targets must
    /// be `VLOCAL`, `VGLOBAL`, or `VINDEXED`.
    pub fn is_assignable(&self) -> bool {
        matches!(self, ExpDesc::Local { .. } | ExpDesc::Global { .. } | ExpDesc::Indexed)
    }
}
