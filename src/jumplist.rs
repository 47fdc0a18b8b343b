//! Forward-jump list backpatching. A jump list is represented the same way
//! the source does:
//! the head is the pc of the first unpatched jump, and each unpatched jump's
//! operand doubles as the pc of the *next* jump in the same list, terminated
//! by [`NO_JUMP`]. Patching walks the chain once and rewrites every link to
//! the final absolute target.

use crate::func_state::FuncState;
use crate::opcode::NO_JUMP;

/// Reads the chain-link (or already-patched target) out of the jump at `pc`.
fn get_jump(fs: &FuncState, pc: usize) -> i32 {
    fs.proto.code[pc].jump_target()
}

fn fix_jump(fs: &mut FuncState, pc: usize, target: i32) {
    fs.proto.code[pc].set_jump_target(target);
}

/// Appends list `l2` onto the end of list `l1`, returning the combined list.
pub fn concat(fs: &mut FuncState, l1: i32, l2: i32) -> i32 {
    if l2 == NO_JUMP {
        return l1;
    }
    if l1 == NO_JUMP {
        return l2;
    }
    let mut list = l1;
    loop {
        let next = get_jump(fs, list as usize);
        if next == NO_JUMP {
            break;
        }
        list = next;
    }
    fix_jump(fs, list as usize, l2);
    l1
}

/// Patches every jump in `list` to target `target`.
pub fn patch_list(fs: &mut FuncState, list: i32, target: i32) {
    let mut list = list;
    while list != NO_JUMP {
        let next = get_jump(fs, list as usize);
        fix_jump(fs, list as usize, target);
        list = next;
    }
}

/// Patches every jump in `list` to the next instruction to be emitted.
pub fn patch_to_here(fs: &mut FuncState, list: i32) {
    let here = fs.pc() as i32;
    patch_list(fs, list, here);
}
