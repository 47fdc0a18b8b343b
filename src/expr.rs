//! Expression grammar: precedence-climbing binary/unary operators,
//! primary/suffixed expressions, and call-site argument lists, grounded on
//! `lparser.c`'s `subexpr`/`simpleexp`/`primaryexp`/`suffixedexp`/`funcargs`.

use crate::binop::{priority, BinOp, UnOp, UNARY_PRIORITY};
use crate::compiler::Compiler;
use crate::constructor;
use crate::emit;
use crate::error::Result;
use crate::expdesc::ExpDesc;
use crate::opcode::OpCode;
use crate::scope;
use crate::token::TokenKind;

/// Parses a full expression.
pub fn expr(c: &mut Compiler) -> Result<ExpDesc> {
    subexpr(c, 0)
}

/// Parses an expression and forces it to exactly one stack value, used for
/// index keys, loop bounds, and conditions that are about to be discharged
/// anyway.
pub fn exp1(c: &mut Compiler) -> Result<ExpDesc> {
    let mut v = expr(c)?;
    emit::to_stack(c, &mut v, true);
    Ok(v)
}

fn get_unop(kind: TokenKind) -> Option<UnOp> {
    match kind {
        TokenKind::TkMinus => Some(UnOp::Minus),
        TokenKind::TkNot => Some(UnOp::Not),
        _ => None,
    }
}

fn get_binop(kind: TokenKind) -> Option<BinOp> {
    match kind {
        TokenKind::TkPlus => Some(BinOp::Add),
        TokenKind::TkMinus => Some(BinOp::Sub),
        TokenKind::TkStar => Some(BinOp::Mul),
        TokenKind::TkSlash => Some(BinOp::Div),
        TokenKind::TkCaret => Some(BinOp::Pow),
        TokenKind::TkConcat => Some(BinOp::Concat),
        TokenKind::TkEq => Some(BinOp::Eq),
        TokenKind::TkNe => Some(BinOp::Ne),
        TokenKind::TkLt => Some(BinOp::Lt),
        TokenKind::TkLe => Some(BinOp::Le),
        TokenKind::TkGt => Some(BinOp::Gt),
        TokenKind::TkGe => Some(BinOp::Ge),
        _ => None,
    }
}

/// Precedence-climbing subexpression parser. `and`/`or` are handled
/// outside the binary-operator priority table since they short-circuit
/// rather than combine via `emit::binop`.
fn subexpr(c: &mut Compiler, limit: u8) -> Result<ExpDesc> {
    let mut v = if let Some(op) = get_unop(c.ls.current.kind) {
        c.ls.advance()?;
        let mut operand = subexpr(c, UNARY_PRIORITY)?;
        emit::prefix(c, op, &mut operand);
        operand
    } else {
        simpleexp(c)?
    };

    loop {
        match c.ls.current.kind {
            TokenKind::TkAnd if limit < 1 => {
                c.ls.advance()?;
                emit::discharge(c, &mut v);
                if emit::last_is_open_call(c) {
                    emit::set_call_returns(c, 1);
                }
                let jump = emit::and_test(c);
                let mut rhs = subexpr(c, 1)?;
                emit::discharge(c, &mut rhs);
                emit::patch_to_here(c, jump);
                v = rhs;
            }
            TokenKind::TkOr if limit < 1 => {
                c.ls.advance()?;
                emit::discharge(c, &mut v);
                if emit::last_is_open_call(c) {
                    emit::set_call_returns(c, 1);
                }
                let jump = emit::or_test(c);
                let mut rhs = subexpr(c, 1)?;
                emit::discharge(c, &mut rhs);
                emit::patch_to_here(c, jump);
                v = rhs;
            }
            kind => {
                let Some(op) = get_binop(kind) else { break };
                let (left, right) = priority(op);
                if left <= limit {
                    break;
                }
                c.ls.advance()?;
                emit::discharge(c, &mut v);
                if emit::last_is_open_call(c) {
                    emit::set_call_returns(c, 1);
                }
                let mut rhs = subexpr(c, right)?;
                emit::discharge(c, &mut rhs);
                if emit::last_is_open_call(c) {
                    emit::set_call_returns(c, 1);
                }
                emit::binop(c, op, &mut v, &mut rhs);
                v = ExpDesc::exp();
            }
        }
    }
    Ok(v)
}

/// `simpleexp`: a primary expression followed by any suffix chain —
/// exactly `suffixedexp`, since every primary form (literal, name,
/// parenthesized, upvalue) is subject to the same `{ '.' NAME | '[' expr ']'
/// | ':' NAME funcargs | funcargs }` suffix set.
fn simpleexp(c: &mut Compiler) -> Result<ExpDesc> {
    suffixedexp(c)
}

fn intern_number(c: &mut Compiler, n: f64) -> u32 {
    let fs = c.fs();
    if let Some(i) = fs
        .proto
        .number_constants
        .iter()
        .position(|x| x.to_bits() == n.to_bits())
    {
        return i as u32;
    }
    fs.proto.number_constants.push(n);
    fs.proto.number_constants.len() as u32 - 1
}

/// `primaryexp`: numbers, strings, `nil`/`true`/`false`, table
/// constructors, function literals, a name (local/global/upvalue), or a
/// parenthesized expression (forced to exactly one value — parentheses
/// truncate a multi-value expression). Every form here is a valid base for
/// `suffixedexp`'s trailer loop.
fn primaryexp(c: &mut Compiler) -> Result<ExpDesc> {
    let line = c.ls.line();
    match c.ls.current.kind {
        TokenKind::TkNumber => {
            let n = c.ls.current.number();
            c.ls.advance()?;
            let idx = intern_number(c, n);
            c.fs().emit(OpCode::PushNum(idx), line);
            c.fs().adjust_stack(1);
            Ok(ExpDesc::exp())
        }
        TokenKind::TkString => {
            let s = c.ls.current.name().to_string();
            c.ls.advance()?;
            let idx = scope::intern_string(c, &s)?;
            c.fs().emit(OpCode::PushString(idx), line);
            c.fs().adjust_stack(1);
            Ok(ExpDesc::exp())
        }
        TokenKind::TkNil => {
            c.ls.advance()?;
            c.fs().emit(OpCode::PushNil(1), line);
            c.fs().adjust_stack(1);
            Ok(ExpDesc::exp())
        }
        TokenKind::TkTrue => {
            c.ls.advance()?;
            c.fs().emit(OpCode::PushTrue, line);
            c.fs().adjust_stack(1);
            Ok(ExpDesc::exp())
        }
        TokenKind::TkFalse => {
            c.ls.advance()?;
            c.fs().emit(OpCode::PushFalse, line);
            c.fs().adjust_stack(1);
            Ok(ExpDesc::exp())
        }
        TokenKind::TkLBrace => constructor::constructor(c),
        TokenKind::TkFunction => {
            c.ls.advance()?;
            crate::stmt::function_body(c, false, line)
        }
        TokenKind::TkName => {
            let name = c.ls.current.name().to_string();
            c.ls.advance()?;
            scope::singlevar(c, &name)
        }
        TokenKind::TkPercent => {
            c.ls.advance()?;
            if c.ls.current.kind != TokenKind::TkName {
                return Err(c.ls.error_expected(TokenKind::TkName));
            }
            let name = c.ls.current.name().to_string();
            c.ls.advance()?;
            scope::push_upvalue(c, &name)
        }
        TokenKind::TkLParen => {
            let open_line = c.ls.line();
            c.ls.advance()?;
            let mut v = expr(c)?;
            emit::to_stack(c, &mut v, true);
            c.ls
                .expect_match(TokenKind::TkRParen, TokenKind::TkLParen, open_line)?;
            Ok(v)
        }
        _ => Err(c.ls.error_here("unexpected symbol")),
    }
}

/// `suffixedexp`: a primary expression followed by any number of `.name`,
/// `[exp]`, `:name(args)`, or call trailers. Exposed to `stmt.rs`, which
/// parses assignment targets and expression-statements through it
/// directly rather than through the full `expr`/`subexpr` entry point.
pub(crate) fn suffixedexp(c: &mut Compiler) -> Result<ExpDesc> {
    let mut v = primaryexp(c)?;
    loop {
        match c.ls.current.kind {
            TokenKind::TkDot => {
                c.ls.advance()?;
                let line = c.ls.line();
                if c.ls.current.kind != TokenKind::TkName {
                    return Err(c.ls.error_expected(TokenKind::TkName));
                }
                let name = c.ls.current.name().to_string();
                c.ls.advance()?;
                emit::to_stack(c, &mut v, true);
                let idx = scope::intern_string(c, &name)?;
                c.fs().emit(OpCode::PushString(idx), line);
                c.fs().adjust_stack(1);
                v = ExpDesc::Indexed;
            }
            TokenKind::TkLBracket => {
                c.ls.advance()?;
                emit::to_stack(c, &mut v, true);
                exp1(c)?;
                c.ls.expect(TokenKind::TkRBracket)?;
                v = ExpDesc::Indexed;
            }
            TokenKind::TkColon => {
                c.ls.advance()?;
                let line = c.ls.line();
                if c.ls.current.kind != TokenKind::TkName {
                    return Err(c.ls.error_expected(TokenKind::TkName));
                }
                let name = c.ls.current.name().to_string();
                c.ls.advance()?;
                emit::to_stack(c, &mut v, true);
                let idx = scope::intern_string(c, &name)?;
                c.fs().emit(OpCode::PushSelf(idx), line);
                c.fs().adjust_stack(1); // table -> table, method
                let callee_slot = c.fs_ref().stacklevel - 1;
                v = funcargs(c, callee_slot)?;
            }
            TokenKind::TkLParen | TokenKind::TkString | TokenKind::TkLBrace => {
                emit::to_stack(c, &mut v, true);
                let callee_slot = c.fs_ref().stacklevel - 1;
                v = funcargs(c, callee_slot)?;
            }
            _ => break,
        }
    }
    Ok(v)
}

/// Parses a call's argument list, `(explist)`, a table constructor, or a
/// bare string literal, and emits an
/// open `Call` at `callee_slot`.
fn funcargs(c: &mut Compiler, callee_slot: u32) -> Result<ExpDesc> {
    let line = c.ls.line();
    match c.ls.current.kind {
        TokenKind::TkLParen => {
            let open_line = c.ls.line();
            c.ls.advance()?;
            if c.ls.current.kind != TokenKind::TkRParen {
                explist(c)?;
            }
            c.ls
                .expect_match(TokenKind::TkRParen, TokenKind::TkLParen, open_line)?;
        }
        TokenKind::TkLBrace => {
            let mut v = constructor::constructor(c)?;
            emit::to_stack(c, &mut v, true);
        }
        TokenKind::TkString => {
            let s = c.ls.current.name().to_string();
            c.ls.advance()?;
            let idx = scope::intern_string(c, &s)?;
            c.fs().emit(OpCode::PushString(idx), line);
            c.fs().adjust_stack(1);
        }
        _ => return Err(c.ls.error_here("function arguments expected")),
    }
    c.fs().emit(
        OpCode::Call {
            func_offset: callee_slot,
            nret: crate::opcode::MULT_RET,
        },
        line,
    );
    // symbolic stack truncates to the call's own slot; consumer decides arity.
    c.fs().stacklevel = callee_slot;
    Ok(ExpDesc::exp())
}

/// Parses a comma-separated expression list, forcing every expression but
/// the last to exactly one value; the last is left open if it is a call
///.
pub fn explist(c: &mut Compiler) -> Result<usize> {
    let mut count = 1;
    let mut v = expr(c)?;
    while c.ls.accept(TokenKind::TkComma)? {
        emit::to_stack(c, &mut v, true);
        v = expr(c)?;
        count += 1;
    }
    emit::to_stack(c, &mut v, false);
    Ok(count)
}
