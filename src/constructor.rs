//! Table constructors: `{ }` literals with up to two `;`-separated
//! sub-parts, each uniformly list-fields or record-fields, grounded on
//! `lparser.c`'s `constructor`/`constructor_part`/`recfields`/`listfields`.

use crate::compiler::Compiler;
use crate::emit;
use crate::error::{CompileError, Result};
use crate::expdesc::ExpDesc;
use crate::opcode::OpCode;
use crate::scope;
use crate::token::TokenKind;

/// Array-style values flushed into the table per `SetList`, mirroring the
/// source's `LFIELDS_PER_FLUSH`.
const LFIELDS_PER_FLUSH: u32 = 50;
/// Record-style key/value pairs flushed into the table per `SetMap`,
/// mirroring the source's `RFIELDS_PER_FLUSH`.
const RFIELDS_PER_FLUSH: u32 = 50;

#[derive(Clone, Copy, PartialEq, Eq)]
enum PartKind {
    Empty,
    List,
    Record,
}

/// Parses a `{ ... }` table constructor. The current token must be `{`.
pub fn constructor(c: &mut Compiler) -> Result<ExpDesc> {
    let open_line = c.ls.line();
    c.ls.expect(TokenKind::TkLBrace)?;

    let line = c.ls.line();
    let table_pc = c.fs().emit(OpCode::CreateTable(0), line);
    c.fs().adjust_stack(1);

    let (kind, mut total) = constructor_part(c)?;
    if c.ls.accept(TokenKind::TkSemi)? {
        let (other_kind, n) = constructor_part(c)?;
        let conflict = matches!(
            (kind, other_kind),
            (PartKind::List, PartKind::List) | (PartKind::Record, PartKind::Record)
        );
        if conflict {
            return Err(CompileError::new("invalid constructor syntax", open_line));
        }
        total += n;
    }
    c.ls.expect_match(TokenKind::TkRBrace, TokenKind::TkLBrace, open_line)?;

    if total > c.limits.max_arg_u {
        return Err(CompileError::new("table constructor too large", open_line));
    }
    if let OpCode::CreateTable(t) = &mut c.fs().proto.code[table_pc] {
        *t = total;
    }
    Ok(ExpDesc::exp())
}

/// One `;`-separated sub-part: empty (immediately `;` or `}`), uniformly
/// record-fields, or uniformly list-fields. A leading `NAME` is
/// ambiguous — `{a}` is a list field, `{a = 1}` is a record field — so it
/// takes one token of look-ahead to decide.
fn constructor_part(c: &mut Compiler) -> Result<(PartKind, u32)> {
    match c.ls.current.kind {
        TokenKind::TkSemi | TokenKind::TkRBrace => Ok((PartKind::Empty, 0)),
        TokenKind::TkLBracket => Ok((PartKind::Record, recfields(c)?)),
        TokenKind::TkName if c.ls.peek_next()?.kind == TokenKind::TkAssign => {
            Ok((PartKind::Record, recfields(c)?))
        }
        _ => Ok((PartKind::List, listfields(c)?)),
    }
}

/// `recfields -> recfield { ',' recfield } [',']`, batching every
/// `RFIELDS_PER_FLUSH` pairs through `SetMap` (plus a final flush for the
/// remainder).
fn recfields(c: &mut Compiler) -> Result<u32> {
    let mut n = 0u32;
    let mut pending = 0u32;
    recfield(c)?;
    n += 1;
    pending += 1;
    while c.ls.current.kind == TokenKind::TkComma {
        c.ls.advance()?;
        if matches!(c.ls.current.kind, TokenKind::TkSemi | TokenKind::TkRBrace) {
            break;
        }
        if pending == RFIELDS_PER_FLUSH {
            flush_record(c, pending);
            pending = 0;
        }
        recfield(c)?;
        n += 1;
        pending += 1;
    }
    flush_record(c, pending);
    Ok(n)
}

/// `recfield -> (NAME | '[' expr ']') '=' expr`
fn recfield(c: &mut Compiler) -> Result<()> {
    match c.ls.current.kind {
        TokenKind::TkLBracket => {
            c.ls.advance()?;
            let mut key = crate::expr::expr(c)?;
            emit::to_stack(c, &mut key, true);
            c.ls.expect(TokenKind::TkRBracket)?;
        }
        TokenKind::TkName => {
            let name = c.ls.current.name().to_string();
            c.ls.advance()?;
            let idx = scope::intern_string(c, &name)?;
            let line = c.ls.line();
            c.fs().emit(OpCode::PushString(idx), line);
            c.fs().adjust_stack(1);
        }
        _ => return Err(c.ls.error_here("<name> or '[' expected")),
    }
    c.ls.expect(TokenKind::TkAssign)?;
    let mut value = crate::expr::expr(c)?;
    emit::to_stack(c, &mut value, true);
    Ok(())
}

fn flush_record(c: &mut Compiler, pending: u32) {
    if pending == 0 {
        return;
    }
    let line = c.ls.line();
    c.fs().emit(OpCode::SetMap { count: pending }, line);
    c.fs().adjust_stack(-(2 * pending as i32));
}

/// `listfields -> expr1 { ',' expr1 } [',']`; every value but the last is
/// forced to exactly one result, the last keeps its open (possibly
/// multi-value) arity, batching every `LFIELDS_PER_FLUSH` through `SetList`.
fn listfields(c: &mut Compiler) -> Result<u32> {
    let mut n = 1u32;
    let mut flushed = 0u32;
    let mut pending = 0u32;
    let mut v = crate::expr::expr(c)?;
    while c.ls.current.kind == TokenKind::TkComma {
        c.ls.advance()?;
        if matches!(c.ls.current.kind, TokenKind::TkSemi | TokenKind::TkRBrace) {
            break;
        }
        emit::to_stack(c, &mut v, true);
        pending += 1;
        if pending == LFIELDS_PER_FLUSH {
            flush_list(c, &mut flushed, pending);
            pending = 0;
        }
        v = crate::expr::expr(c)?;
        n += 1;
    }
    emit::to_stack(c, &mut v, false);
    pending += 1;
    flush_list(c, &mut flushed, pending);
    Ok(n)
}

fn flush_list(c: &mut Compiler, flushed: &mut u32, pending: u32) {
    if pending == 0 {
        return;
    }
    let line = c.ls.line();
    c.fs().emit(
        OpCode::SetList {
            batch: pending,
            table_offset: *flushed,
        },
        line,
    );
    c.fs().adjust_stack(-(pending as i32));
    *flushed += pending;
}
