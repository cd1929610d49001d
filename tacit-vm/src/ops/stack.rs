//! List-aware stack shuffling built-ins. Each "element" may span multiple
//! cells (a LIST and its payload travels as one atomic unit);
//! `Vm::element_at_depth` locates spans and `Vm::rotate_left_cells`
//! rearranges them via the three-reverses algorithm.

use crate::error::{VmError, VmResult};
use crate::interpreter::Vm;
use tacit_types::{Cell, Decoded, Tag, CELL_SIZE};

pub fn dup(vm: &mut Vm) -> VmResult<()> {
    vm.require_cells(1)?;
    let (start, span) = vm.element_at_depth(0)?;
    let dst = vm.sp;
    if dst + span * CELL_SIZE > tacit_types::Segment::Stack.end() {
        return Err(VmError::StackOverflow);
    }
    vm.copy_cells(start, dst, span)?;
    vm.sp += span * CELL_SIZE;
    Ok(())
}

pub fn drop(vm: &mut Vm) -> VmResult<()> {
    vm.require_cells(1)?;
    let (start, _span) = vm.element_at_depth(0)?;
    vm.sp = start;
    Ok(())
}

pub fn swap(vm: &mut Vm) -> VmResult<()> {
    vm.require_cells(2)?;
    let (start_b, span_b) = vm.element_at_depth(0)?;
    let (start_a, _span_a) = vm.element_at_depth(1)?;
    let _ = span_b;
    let span_a = (start_b - start_a) / CELL_SIZE;
    vm.rotate_left_cells(start_a, vm.sp, span_a)
}

pub fn over(vm: &mut Vm) -> VmResult<()> {
    vm.require_cells(2)?;
    let (start_a, span_a) = vm.element_at_depth(1)?;
    let dst = vm.sp;
    if dst + span_a * CELL_SIZE > tacit_types::Segment::Stack.end() {
        return Err(VmError::StackOverflow);
    }
    vm.copy_cells(start_a, dst, span_a)?;
    vm.sp += span_a * CELL_SIZE;
    Ok(())
}

pub fn nip(vm: &mut Vm) -> VmResult<()> {
    vm.require_cells(2)?;
    let (start_b, span_b) = vm.element_at_depth(0)?;
    let (start_a, _) = vm.element_at_depth(1)?;
    vm.copy_cells(start_b, start_a, span_b)?;
    vm.sp = start_a + span_b * CELL_SIZE;
    Ok(())
}

pub fn tuck(vm: &mut Vm) -> VmResult<()> {
    vm.require_cells(2)?;
    let (start_b, _span_b) = vm.element_at_depth(0)?;
    let (start_a, _span_a) = vm.element_at_depth(1)?;
    let rotate_by = (start_b - start_a) / CELL_SIZE;
    vm.rotate_left_cells(start_a, vm.sp, rotate_by)?;
    // Stack is now `b a`; duplicate the new NOS (`b`, at start_a) to the top.
    let (new_nos_start, new_nos_span) = vm.element_at_depth(1)?;
    debug_assert_eq!(new_nos_start, start_a);
    let dst = vm.sp;
    if dst + new_nos_span * CELL_SIZE > tacit_types::Segment::Stack.end() {
        return Err(VmError::StackOverflow);
    }
    vm.copy_cells(new_nos_start, dst, new_nos_span)?;
    vm.sp += new_nos_span * CELL_SIZE;
    Ok(())
}

pub fn rot(vm: &mut Vm) -> VmResult<()> {
    vm.require_cells(3)?;
    let (start_a, _) = vm.element_at_depth(2)?;
    let (start_b, _) = vm.element_at_depth(1)?;
    let span_a = (start_b - start_a) / CELL_SIZE;
    vm.rotate_left_cells(start_a, vm.sp, span_a)
}

pub fn revrot(vm: &mut Vm) -> VmResult<()> {
    vm.require_cells(3)?;
    let (start_c, _) = vm.element_at_depth(0)?;
    let (start_a, _) = vm.element_at_depth(2)?;
    let span_ab = (start_c - start_a) / CELL_SIZE;
    vm.rotate_left_cells(start_a, vm.sp, span_ab)
}

pub fn pick(vm: &mut Vm) -> VmResult<()> {
    vm.require_cells(1)?;
    let k_cell = vm.pop()?;
    let k = match k_cell.decode() {
        Decoded::Number(n) => {
            if n < 0.0 {
                return Err(VmError::runtime("pick: negative index", vm.render_stack()));
            }
            n as usize
        }
        Decoded::Tagged {
            tag: Tag::Integer,
            value,
        } => value as usize,
        _ => return Err(VmError::runtime("pick: expected a numeric index", vm.render_stack())),
    };
    vm.require_cells(k + 1)?;
    let (start, span) = vm.element_at_depth(k)?;
    let dst = vm.sp;
    if dst + span * CELL_SIZE > tacit_types::Segment::Stack.end() {
        return Err(VmError::StackOverflow);
    }
    vm.copy_cells(start, dst, span)?;
    vm.sp += span * CELL_SIZE;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push_n(vm: &mut Vm, values: &[f32]) {
        for v in values {
            vm.push(Cell::number(*v)).unwrap();
        }
    }

    fn numbers(vm: &Vm) -> Vec<f32> {
        let mut out = Vec::new();
        let mut addr = tacit_types::Segment::Stack.base();
        while addr < vm.sp {
            out.push(vm.mem.read_cell(addr).unwrap().as_number().unwrap());
            addr += CELL_SIZE;
        }
        out
    }

    #[test]
    fn dup_duplicates_top_cell() {
        let mut vm = Vm::new();
        push_n(&mut vm, &[1.0, 2.0]);
        dup(&mut vm).unwrap();
        assert_eq!(numbers(&vm), vec![1.0, 2.0, 2.0]);
    }

    #[test]
    fn drop_removes_top_cell() {
        let mut vm = Vm::new();
        push_n(&mut vm, &[1.0, 2.0]);
        drop(&mut vm).unwrap();
        assert_eq!(numbers(&vm), vec![1.0]);
    }

    #[test]
    fn swap_exchanges_top_two() {
        let mut vm = Vm::new();
        push_n(&mut vm, &[1.0, 2.0]);
        swap(&mut vm).unwrap();
        assert_eq!(numbers(&vm), vec![2.0, 1.0]);
    }

    #[test]
    fn double_swap_is_identity() {
        let mut vm = Vm::new();
        push_n(&mut vm, &[1.0, 2.0]);
        swap(&mut vm).unwrap();
        swap(&mut vm).unwrap();
        assert_eq!(numbers(&vm), vec![1.0, 2.0]);
    }

    #[test]
    fn over_copies_nos_to_top() {
        let mut vm = Vm::new();
        push_n(&mut vm, &[1.0, 2.0]);
        over(&mut vm).unwrap();
        assert_eq!(numbers(&vm), vec![1.0, 2.0, 1.0]);
    }

    #[test]
    fn nip_removes_nos() {
        let mut vm = Vm::new();
        push_n(&mut vm, &[1.0, 2.0]);
        nip(&mut vm).unwrap();
        assert_eq!(numbers(&vm), vec![2.0]);
    }

    #[test]
    fn tuck_inserts_copy_below() {
        let mut vm = Vm::new();
        push_n(&mut vm, &[1.0, 2.0]);
        tuck(&mut vm).unwrap();
        assert_eq!(numbers(&vm), vec![2.0, 1.0, 2.0]);
    }

    #[test]
    fn rot_moves_deepest_to_top() {
        let mut vm = Vm::new();
        push_n(&mut vm, &[1.0, 2.0, 3.0]);
        rot(&mut vm).unwrap();
        assert_eq!(numbers(&vm), vec![2.0, 3.0, 1.0]);
    }

    #[test]
    fn revrot_is_inverse_of_rot() {
        let mut vm = Vm::new();
        push_n(&mut vm, &[1.0, 2.0, 3.0]);
        rot(&mut vm).unwrap();
        revrot(&mut vm).unwrap();
        assert_eq!(numbers(&vm), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn pick_copies_kth_element() {
        let mut vm = Vm::new();
        push_n(&mut vm, &[10.0, 20.0, 30.0]);
        vm.push(Cell::number(2.0)).unwrap();
        pick(&mut vm).unwrap();
        assert_eq!(numbers(&vm), vec![10.0, 20.0, 30.0, 10.0]);
    }

    #[test]
    fn dup_preserves_list_span_atomically() {
        let mut vm = Vm::new();
        push_n(&mut vm, &[1.0, 2.0]);
        vm.push(Cell::tagged(Tag::List, 2)).unwrap();
        dup(&mut vm).unwrap();
        assert_eq!(vm.stack_depth(), 6);
        let top_header = vm.mem.read_cell(vm.sp - CELL_SIZE).unwrap();
        assert_eq!(top_header.as_tagged_value(Tag::List), Some(2));
    }
}
