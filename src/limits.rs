//! Resource caps checked during parsing.
//!
//! All fixed at compile time but constructible with overrides, the way a
//! config builder lets a caller pick a language level.

/// Resource caps checked during parsing. Exceeding any of these raises a
/// `CompileError` naming the resource.
#[derive(Debug, Clone, Copy)]
pub struct Limits {
    /// Max simultaneously active local variables in one function.
    pub max_locals: u32,
    /// Max upvalues a single function may reference.
    pub max_upvalues: u32,
    /// Max declared parameters in one function.
    pub max_params: u32,
    /// Max entries in any one constant pool (strings or numbers).
    pub max_constants: u32,
    /// Max left-hand-side targets in one multiple assignment.
    pub max_multi_assign: u32,
    /// Max instructions emitted into one function's code vector.
    pub max_instructions: u32,
    /// Max operand width for a single instruction field (`MAXARG_U`).
    pub max_arg_u: u32,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_locals: 200,
            max_upvalues: 60,
            max_params: 100,
            max_constants: 1 << 24,
            max_multi_assign: 100,
            max_instructions: 1 << 24,
            max_arg_u: (1 << 24) - 1,
        }
    }
}
