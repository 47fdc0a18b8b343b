//! The compiler's output: an executable function prototype plus debug
//! metadata.

use crate::opcode::OpCode;
use smol_str::SmolStr;

/// Sentinel terminating the line-info table: the last entry always equals
/// this sentinel.
pub const LINE_INFO_SENTINEL: u32 = u32::MAX;

#[derive(Debug, Clone)]
pub struct LocVar {
    pub name: SmolStr,
    pub start_pc: usize,
    pub end_pc: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Prototype {
    pub code: Vec<OpCode>,
    /// One entry per instruction, plus a final `LINE_INFO_SENTINEL` entry.
    pub line_info: Vec<u32>,
    pub string_constants: Vec<SmolStr>,
    pub number_constants: Vec<f64>,
    pub nested_protos: Vec<Prototype>,
    pub local_vars: Vec<LocVar>,
    pub num_params: u32,
    pub is_vararg: bool,
    pub max_stack_size: u32,
    pub source_name: SmolStr,
    /// Line the `function` keyword (or chunk start) appeared on.
    pub line_defined: u32,
    /// Number of upvalues this prototype's *body* references. The
    /// enclosing `CLOSURE` instruction that builds a closure over this
    /// prototype carries the same count. Always 0 for the top-level
    /// chunk's prototype, since it has no enclosing scope to capture from.
    pub num_upvalues: u32,
}

impl Prototype {
    pub fn new() -> Self {
        Prototype::default()
    }
}
