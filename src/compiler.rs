//! The driver: wires the lexer into the grammar and owns the `FuncState`
//! chain.

use crate::error::Result;
use crate::func_state::FuncState;
use crate::lex_state::LexState;
use crate::limits::Limits;
use crate::proto::Prototype;
use smol_str::SmolStr;

pub struct Compiler<'a> {
    pub ls: LexState<'a>,
    /// `FuncState` stack, innermost (current) function last. Nested
    /// function definitions push; `close_func` pops.
    pub funcs: Vec<FuncState>,
    pub limits: Limits,
}

impl<'a> Compiler<'a> {
    fn new(source: &'a str, source_name: &str, limits: Limits) -> Result<Self> {
        let ls = LexState::new(source)?;
        Ok(Compiler {
            ls,
            funcs: vec![FuncState::new(SmolStr::new(source_name))],
            limits,
        })
    }

    pub fn fs(&mut self) -> &mut FuncState {
        self.funcs.last_mut().expect("no active FuncState")
    }

    pub fn fs_ref(&self) -> &FuncState {
        self.funcs.last().expect("no active FuncState")
    }

    /// Number of functions currently open (1 = top-level chunk only).
    pub fn depth(&self) -> usize {
        self.funcs.len()
    }

    /// Opens a nested `FuncState`, pushing it as the new current function.
    pub fn open_func(&mut self) {
        let name = self.fs_ref().proto.source_name.clone();
        self.funcs.push(FuncState::new(name));
    }

    /// Closes the current (innermost) `FuncState` and returns its finished
    /// prototype together with the upvalue targets it captured (each
    /// resolved against what is, after this pop, the current function's
    /// namespace), the caller still needs these to emit the capturing
    /// `CLOSURE` sequence before folding the prototype into `nested_protos`.
    pub fn close_func(&mut self, line: u32) -> (Prototype, Vec<crate::expdesc::ExpDesc>) {
        let mut fs = self.funcs.pop().expect("close_func without open_func");
        fs.close(line);
        (fs.proto, fs.upvalues)
    }
}

/// Compiles `source` into a top-level `Prototype`. Mirrors `luaY_parser`:
/// opens the main `FuncState`, pulls the first token implicitly via
/// `LexState::new`, parses the chunk, and closes the function.
pub fn compile(source: &str) -> Result<Prototype> {
    compile_with_name_and_limits(source, "chunk", Limits::default())
}

pub fn compile_with_name(source: &str, chunk_name: &str) -> Result<Prototype> {
    compile_with_name_and_limits(source, chunk_name, Limits::default())
}

pub fn compile_with_name_and_limits(
    source: &str,
    chunk_name: &str,
    limits: Limits,
) -> Result<Prototype> {
    let mut c = Compiler::new(source, chunk_name, limits)?;
    crate::stmt::compile_main_chunk(&mut c)?;
    let line = c.ls.line();
    if c.ls.current.kind != crate::token::TokenKind::TkEos {
        return Err(c.ls.error_expected(crate::token::TokenKind::TkEos));
    }
    let (proto, upvalues) = c.close_func(line);
    debug_assert!(upvalues.is_empty(), "top-level chunk cannot capture upvalues");
    debug_assert!(c.funcs.is_empty());
    debug_assert_eq!(proto.num_upvalues, 0);
    Ok(proto)
}
