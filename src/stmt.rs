//! Statement grammar and function-body parsing,
//! grounded on `lparser.c`'s `statement`/`block`/`ifstat`/`whilestat`/
//! `repeatstat`/`forstat`/`localstat`/`funcstat`/`retstat`/`breakstat`/
//! `body`.

use crate::compiler::Compiler;
use crate::emit;
use crate::error::{CompileError, Result};
use crate::expdesc::ExpDesc;
use crate::expr;
use crate::opcode::{OpCode, NO_JUMP};
use crate::scope;
use crate::token::TokenKind;

/// Top-level driver entry point: a chunk is just a block up to EOF.
pub fn compile_main_chunk(c: &mut Compiler) -> Result<()> {
    block(c)
}

fn block_follow(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::TkElse
            | TokenKind::TkElseIf
            | TokenKind::TkEnd
            | TokenKind::TkUntil
            | TokenKind::TkEos
    )
}

fn expect_name(c: &mut Compiler) -> Result<String> {
    if c.ls.current.kind != TokenKind::TkName {
        return Err(c.ls.error_expected(TokenKind::TkName));
    }
    let name = c.ls.current.name().to_string();
    c.ls.advance()?;
    Ok(name)
}

/// A block owns its own local scope: locals declared inside are
/// deactivated (and their stack slots popped) on the way out, regardless
/// of how the block ends (falls off the end, hits `return`/`break`).
fn block(c: &mut Compiler) -> Result<()> {
    let saved = c.fs_ref().nactloc;
    while !block_follow(c.ls.current.kind) {
        if c.ls.current.kind == TokenKind::TkReturn {
            retstat(c)?;
            break;
        }
        // `break`, like `return`, must be the last statement of its block
        //, the parser enforces this by stopping
        // right here rather than checking what follows.
        if c.ls.current.kind == TokenKind::TkBreak {
            breakstat(c)?;
            break;
        }
        statement(c)?;
    }
    let n = c.fs_ref().nactloc - saved;
    scope::deactivate(c, n);
    Ok(())
}

fn statement(c: &mut Compiler) -> Result<()> {
    if c.fs_ref().pc() as u32 >= c.limits.max_instructions {
        return Err(CompileError::new(
            "function has too many instructions",
            c.ls.line(),
        ));
    }
    match c.ls.current.kind {
        TokenKind::TkIf => ifstat(c),
        TokenKind::TkWhile => whilestat(c),
        TokenKind::TkDo => {
            let open_line = c.ls.line();
            c.ls.advance()?;
            block(c)?;
            c.ls.expect_match(TokenKind::TkEnd, TokenKind::TkDo, open_line)
        }
        TokenKind::TkFor => forstat(c),
        TokenKind::TkRepeat => repeatstat(c),
        TokenKind::TkFunction => {
            // `function (` at statement position is an anonymous function
            // literal, not a named `funcstat`; both start identically, so
            // only the lookahead tells them apart.
            if c.ls.peek_next()?.kind == TokenKind::TkLParen {
                exprstat(c)
            } else {
                funcstat(c)
            }
        }
        TokenKind::TkLocal => {
            c.ls.advance()?;
            if c.ls.accept(TokenKind::TkFunction)? {
                localfunc(c)
            } else {
                localstat(c)
            }
        }
        TokenKind::TkSemi => c.ls.advance(),
        _ => exprstat(c),
    }
}

// ---- if / while / repeat -------------------------------------------------

fn cond_then_block(c: &mut Compiler) -> Result<i32> {
    let cond = expr::expr(c)?;
    let false_list = emit::go_if_true(c, cond);
    c.ls.expect(TokenKind::TkThen)?;
    block(c)?;
    Ok(false_list)
}

fn ifstat(c: &mut Compiler) -> Result<()> {
    let open_line = c.ls.line();
    c.ls.advance()?; // 'if'
    let mut escape = NO_JUMP;
    let mut false_list = cond_then_block(c)?;
    while c.ls.current.kind == TokenKind::TkElseIf {
        c.ls.advance()?;
        let j = emit::jump(c);
        escape = emit::concat(c, escape, j);
        emit::patch_to_here(c, false_list);
        false_list = cond_then_block(c)?;
    }
    if c.ls.accept(TokenKind::TkElse)? {
        let j = emit::jump(c);
        escape = emit::concat(c, escape, j);
        emit::patch_to_here(c, false_list);
        block(c)?;
    } else {
        escape = emit::concat(c, escape, false_list);
    }
    c.ls.expect_match(TokenKind::TkEnd, TokenKind::TkIf, open_line)?;
    emit::patch_to_here(c, escape);
    Ok(())
}

fn whilestat(c: &mut Compiler) -> Result<()> {
    let open_line = c.ls.line();
    c.ls.advance()?; // 'while'
    let loop_start = emit::get_label(c);
    scope::enter_break(c);
    let cond = expr::expr(c)?;
    let false_list = emit::go_if_true(c, cond);
    c.ls.expect(TokenKind::TkDo)?;
    block(c)?;
    let back = emit::jump(c);
    emit::patch_list(c, back, loop_start);
    c.ls.expect_match(TokenKind::TkEnd, TokenKind::TkWhile, open_line)?;
    emit::patch_to_here(c, false_list);
    scope::leave_break(c);
    Ok(())
}

fn repeatstat(c: &mut Compiler) -> Result<()> {
    let open_line = c.ls.line();
    c.ls.advance()?; // 'repeat'
    let loop_start = emit::get_label(c);
    scope::enter_break(c);
    // `until`'s condition can see the block's own locals, so this can't
    // reuse `block()` (which closes its scope before we get to parse cond).
    let saved = c.fs_ref().nactloc;
    while !block_follow(c.ls.current.kind) {
        if c.ls.current.kind == TokenKind::TkReturn {
            retstat(c)?;
            break;
        }
        if c.ls.current.kind == TokenKind::TkBreak {
            breakstat(c)?;
            break;
        }
        statement(c)?;
    }
    c.ls
        .expect_match(TokenKind::TkUntil, TokenKind::TkRepeat, open_line)?;
    let cond = expr::expr(c)?;
    let false_list = emit::go_if_true(c, cond);
    emit::patch_list(c, false_list, loop_start);
    let n = c.fs_ref().nactloc - saved;
    scope::deactivate(c, n);
    scope::leave_break(c);
    Ok(())
}

fn breakstat(c: &mut Compiler) -> Result<()> {
    let line = c.ls.line();
    c.ls.advance()?;
    if c.fs_ref().break_stack.is_empty() {
        return Err(CompileError::new("no loop to break out of", line));
    }
    let target_level = c.fs_ref().break_stack.last().unwrap().stacklevel;
    let current_level = c.fs_ref().stacklevel;
    if current_level > target_level {
        c.fs().emit(OpCode::Pop(current_level - target_level), line);
    }
    let j = emit::jump(c);
    let list = c
        .fs_ref()
        .break_stack
        .last()
        .map(|b| b.breaklist)
        .unwrap_or(NO_JUMP);
    let merged = crate::jumplist::concat(c.fs(), list, j);
    c.fs().break_stack.last_mut().unwrap().breaklist = merged;
    Ok(())
}

// ---- for ------------------------------------------------------------------

fn forstat(c: &mut Compiler) -> Result<()> {
    let open_line = c.ls.line();
    c.ls.advance()?; // 'for'
    let name = expect_name(c)?;
    match c.ls.current.kind {
        TokenKind::TkAssign => fornum(c, name, open_line),
        TokenKind::TkComma | TokenKind::TkIn => forlist(c, name, open_line),
        _ => Err(c.ls.error_here("'=' or 'in' expected")),
    }
}

fn fornum(c: &mut Compiler, var_name: String, open_line: u32) -> Result<()> {
    c.ls.expect(TokenKind::TkAssign)?;
    expr::exp1(c)?; // initial value
    c.ls.expect(TokenKind::TkComma)?;
    expr::exp1(c)?; // limit
    if c.ls.accept(TokenKind::TkComma)? {
        expr::exp1(c)?; // step
    } else {
        let line = c.ls.line();
        c.fs().emit(OpCode::PushInt(1), line);
        c.fs().adjust_stack(1);
    }
    scope::new_local(c, "(for index)")?;
    scope::new_local(c, "(for limit)")?;
    scope::new_local(c, "(for step)")?;
    scope::activate(c, 3);

    let prep_pc = c.fs_ref().pc();
    let line = c.ls.line();
    c.fs().emit(OpCode::ForPrep(NO_JUMP), line);

    scope::new_local(c, &var_name)?;
    let line = c.ls.line();
    c.fs().emit(OpCode::PushNil(1), line);
    c.fs().adjust_stack(1);
    scope::activate(c, 1);

    c.ls.expect(TokenKind::TkDo)?;
    scope::enter_break(c);
    block(c)?;

    let test_pc = c.fs_ref().pc() as i32;
    if let OpCode::ForPrep(t) = &mut c.fs().proto.code[prep_pc] {
        *t = test_pc;
    }
    let line = c.ls.line();
    c.fs().emit(OpCode::ForLoop(prep_pc as i32 + 1), line);
    c.ls
        .expect_match(TokenKind::TkEnd, TokenKind::TkFor, open_line)?;
    scope::leave_break(c);
    scope::deactivate(c, 4);
    Ok(())
}

fn forlist(c: &mut Compiler, first_name: String, open_line: u32) -> Result<()> {
    let mut names = vec![first_name];
    while c.ls.accept(TokenKind::TkComma)? {
        names.push(expect_name(c)?);
    }
    c.ls.expect(TokenKind::TkIn)?;
    let nexps = expr::explist(c)?;
    emit::adjust_mult_assign(c, 3, nexps);
    scope::new_local(c, "(for iterator)")?;
    scope::new_local(c, "(for state)")?;
    scope::new_local(c, "(for control)")?;
    scope::activate(c, 3);

    let prep_pc = c.fs_ref().pc();
    let line = c.ls.line();
    c.fs().emit(OpCode::LForPrep(NO_JUMP), line);

    for name in &names {
        scope::new_local(c, name)?;
        c.fs().emit(OpCode::PushNil(1), line);
        c.fs().adjust_stack(1);
    }
    scope::activate(c, names.len());

    c.ls.expect(TokenKind::TkDo)?;
    scope::enter_break(c);
    block(c)?;

    let test_pc = c.fs_ref().pc() as i32;
    if let OpCode::LForPrep(t) = &mut c.fs().proto.code[prep_pc] {
        *t = test_pc;
    }
    let line = c.ls.line();
    c.fs().emit(OpCode::LForLoop(prep_pc as i32 + 1), line);
    c.ls
        .expect_match(TokenKind::TkEnd, TokenKind::TkFor, open_line)?;
    scope::leave_break(c);
    scope::deactivate(c, 3 + names.len());
    Ok(())
}

// ---- local / function --------------------------------------------------

fn localstat(c: &mut Compiler) -> Result<()> {
    let mut names = vec![expect_name(c)?];
    while c.ls.accept(TokenKind::TkComma)? {
        names.push(expect_name(c)?);
    }
    if names.len() as u32 > c.limits.max_multi_assign {
        return Err(CompileError::new("too many variables in local declaration", c.ls.line()));
    }
    for name in &names {
        scope::new_local(c, name)?;
    }
    let nexps = if c.ls.accept(TokenKind::TkAssign)? {
        expr::explist(c)?
    } else {
        0
    };
    emit::adjust_mult_assign(c, names.len(), nexps);
    scope::activate(c, names.len());
    Ok(())
}

fn localfunc(c: &mut Compiler) -> Result<()> {
    let line = c.ls.line();
    let name = expect_name(c)?;
    // Declared and activated *before* the body is parsed, unlike plain
    // `local`, so the function can call itself by name.
    scope::new_local(c, &name)?;
    scope::activate(c, 1);
    let mut v = function_body(c, false, line)?;
    emit::to_stack(c, &mut v, true);
    let index = c.fs_ref().nactloc as u32 - 1;
    c.fs().emit(OpCode::SetLocal(index), line);
    c.fs().adjust_stack(-1);
    Ok(())
}

fn funcname(c: &mut Compiler) -> Result<(ExpDesc, bool)> {
    let name = expect_name(c)?;
    let mut v = scope::singlevar(c, &name)?;
    while c.ls.accept(TokenKind::TkDot)? {
        let field = expect_name(c)?;
        push_field_key(c, &mut v, &field)?;
    }
    let is_method = if c.ls.accept(TokenKind::TkColon)? {
        let field = expect_name(c)?;
        push_field_key(c, &mut v, &field)?;
        true
    } else {
        false
    };
    Ok((v, is_method))
}

fn push_field_key(c: &mut Compiler, v: &mut ExpDesc, field: &str) -> Result<()> {
    emit::to_stack(c, v, true);
    let idx = scope::intern_string(c, field)?;
    let line = c.ls.line();
    c.fs().emit(OpCode::PushString(idx), line);
    c.fs().adjust_stack(1);
    *v = ExpDesc::Indexed;
    Ok(())
}

fn funcstat(c: &mut Compiler) -> Result<()> {
    let line = c.ls.line();
    c.ls.advance()?; // 'function'
    let (target, is_method) = funcname(c)?;
    let mut v = function_body(c, is_method, line)?;
    emit::to_stack(c, &mut v, true);
    emit::store_var(c, &target, 0)?;
    if matches!(target, ExpDesc::Indexed) {
        c.fs().adjust_stack(-3);
    }
    Ok(())
}

/// `body`: parameter list plus block, compiled in a fresh nested
/// `FuncState` and folded back as a `CLOSURE` in the enclosing function
///. `is_method` prepends an implicit `self` parameter.
pub fn function_body(c: &mut Compiler, is_method: bool, line: u32) -> Result<ExpDesc> {
    c.open_func();
    c.fs().proto.line_defined = line;
    if is_method {
        scope::new_local(c, "self")?;
        scope::activate(c, 1);
    }

    let open_line = c.ls.line();
    c.ls.expect(TokenKind::TkLParen)?;
    let mut is_vararg = false;
    if c.ls.current.kind != TokenKind::TkRParen {
        loop {
            if c.ls.current.kind == TokenKind::TkDots {
                c.ls.advance()?;
                is_vararg = true;
                break;
            }
            let pname = expect_name(c)?;
            if c.fs_ref().nactloc as u32 >= c.limits.max_params {
                return Err(CompileError::new("too many parameters", c.ls.line()));
            }
            scope::new_local(c, &pname)?;
            scope::activate(c, 1);
            if !c.ls.accept(TokenKind::TkComma)? {
                break;
            }
        }
    }
    c.ls
        .expect_match(TokenKind::TkRParen, TokenKind::TkLParen, open_line)?;
    c.fs().proto.num_params = c.fs_ref().nactloc as u32;
    c.fs().proto.is_vararg = is_vararg;
    if is_vararg {
        scope::new_local(c, "arg")?;
        scope::activate(c, 1);
    }
    // Parameters (and `self`) occupy stack slots the calling convention
    // already reserved before entering the body, so the symbolic stack
    // must start there too, not at 0.
    let nactloc = c.fs_ref().nactloc as i32;
    c.fs().adjust_stack(nactloc);

    block(c)?;
    let end_line = c.ls.line();
    c.ls.expect(TokenKind::TkEnd)?;

    let (proto, upvalues) = c.close_func(end_line);
    let proto_idx = c.fs_ref().proto.nested_protos.len() as u32;
    for target in &upvalues {
        match target {
            ExpDesc::Local { index } => {
                c.fs().emit(OpCode::GetLocal(*index), end_line);
                c.fs().adjust_stack(1);
            }
            ExpDesc::Global { name_const } => {
                c.fs().emit(OpCode::GetGlobal(*name_const), end_line);
                c.fs().adjust_stack(1);
            }
            ExpDesc::Indexed | ExpDesc::Exp { .. } => {
                unreachable!("upvalue target is always a local or a global")
            }
        }
    }
    c.fs().proto.nested_protos.push(proto);
    c.fs().emit(
        OpCode::Closure {
            proto: proto_idx,
            nupvalues: upvalues.len() as u32,
        },
        end_line,
    );
    c.fs().adjust_stack(1 - upvalues.len() as i32);
    Ok(ExpDesc::exp())
}

// ---- return / expression statements ------------------------------------

fn retstat(c: &mut Compiler) -> Result<()> {
    let line = c.ls.line();
    c.ls.advance()?; // 'return'
    let at_end = block_follow(c.ls.current.kind) || c.ls.current.kind == TokenKind::TkSemi;
    let nexps = if at_end { 0 } else { expr::explist(c)? };
    c.ls.accept(TokenKind::TkSemi)?;
    let first = c.fs_ref().nactloc as u32;
    let nret = if nexps > 0 && emit::last_is_open_call(c) {
        crate::opcode::MULT_RET
    } else {
        nexps as i32
    };
    c.fs().emit(OpCode::Return { first, nret }, line);
    // A `return` discards everything above the active locals; reset the
    // symbolic stack to match so a (dead-code) statement following it in
    // the same block doesn't inflate `max_stack_size`.
    c.fs().stacklevel = first;
    Ok(())
}

fn exprstat(c: &mut Compiler) -> Result<()> {
    let line = c.ls.line();
    // An anonymous function literal is a valid `simpleexp` primary like any
    // other, so `function() ... end()` (an immediately-invoked literal) is
    // accepted here the same way `suffixedexp`'s trailer loop accepts a
    // call trailer on any other primary; a bare (uncalled) literal falls
    // through to the "not an open call" rejection below, same as any other
    // non-call expression statement.
    let first = expr::suffixedexp(c)?;
    if c.ls.current.kind == TokenKind::TkAssign || c.ls.current.kind == TokenKind::TkComma {
        if !first.is_assignable() {
            return Err(CompileError::new("syntax error (cannot assign to this expression)", line));
        }
        assignment(c, first)
    } else {
        if !emit::last_is_open_call(c) {
            return Err(CompileError::new("syntax error (function call expected)", line));
        }
        emit::set_call_returns(c, 0);
        Ok(())
    }
}

fn assignment(c: &mut Compiler, first: ExpDesc) -> Result<()> {
    let mut targets = vec![first];
    while c.ls.accept(TokenKind::TkComma)? {
        let line = c.ls.line();
        let t = expr::suffixedexp(c)?;
        if !t.is_assignable() {
            return Err(CompileError::new("syntax error (cannot assign to this expression)", line));
        }
        targets.push(t);
    }
    if targets.len() as u32 > c.limits.max_multi_assign {
        return Err(CompileError::new(
            "too many targets in multiple assignment",
            c.ls.line(),
        ));
    }
    c.ls.expect(TokenKind::TkAssign)?;
    let nexps = expr::explist(c)?;
    emit::adjust_mult_assign(c, targets.len(), nexps);

    // Values for targets 1..N sit on the stack in declaration order; every
    // indexed target's table/key pair was pushed, also in declaration
    // order, beneath the whole value block. Storing back-to-front means
    // target i's own pair is always the shallowest remaining one, exactly
    // `i` slots below the value currently on top.
    let n = targets.len();
    for i in (0..n).rev() {
        emit::store_var(c, &targets[i], i as u32)?;
        if matches!(targets[i], ExpDesc::Indexed) {
            c.fs().adjust_stack(-3);
        }
    }
    Ok(())
}
