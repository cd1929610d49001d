//! Structural list built-ins. These manipulate the payload span below a
//! LIST header; several exploit the fact that wrapping a contiguous run of
//! already-correctly-ordered cells in a header (`pack`) or stripping a
//! header back off (`unpack`) needs no data movement at all, the same
//! trick `OPEN_LIST`/`CLOSE_LIST` use in [`crate::interpreter::Vm::step`].

use crate::error::{VmError, VmResult};
use crate::interpreter::Vm;
use tacit_types::{Cell, Decoded, Tag, CELL_SIZE};

/// Pop the LIST element at TOS, returning its header's `(start, span)` as
/// located by [`Vm::element_at_depth`], without yet touching the stack
/// pointer. Fails if TOS is not LIST-tagged.
fn locate_list(vm: &mut Vm) -> VmResult<(usize, usize, u16)> {
    vm.require_cells(1)?;
    let (start, span) = vm.element_at_depth(0)?;
    let header_addr = start + (span - 1) * CELL_SIZE;
    let header = vm.mem.read_cell(header_addr)?;
    match header.decode() {
        Decoded::Tagged {
            tag: Tag::List,
            value,
        } => Ok((start, span, value)),
        _ => Err(VmError::runtime("expected a list", vm.render_stack())),
    }
}

pub fn length(vm: &mut Vm) -> VmResult<()> {
    let (start, span, n) = locate_list(vm)?;
    let header_addr = start + (span - 1) * CELL_SIZE;
    let count = if n == 0 {
        0
    } else {
        vm.list_element_spans(start, header_addr)?.len()
    };
    vm.sp = start;
    vm.push(Cell::tagged(Tag::Integer, count as u16))
}

pub fn slots(vm: &mut Vm) -> VmResult<()> {
    let (start, _span, n) = locate_list(vm)?;
    vm.sp = start;
    vm.push(Cell::tagged(Tag::Integer, n))
}

pub fn head(vm: &mut Vm) -> VmResult<()> {
    let (start, span, n) = locate_list(vm)?;
    vm.sp = start;
    if n == 0 {
        return vm.push(Cell::nil());
    }
    let header_addr = start + (span - 1) * CELL_SIZE;
    let spans = vm.list_element_spans(start, header_addr)?;
    let (x1_start, x1_span) = *spans.last().expect("n > 0 implies at least one element");
    let dst = vm.sp;
    vm.copy_cells(x1_start, dst, x1_span)?;
    vm.sp += x1_span * CELL_SIZE;
    Ok(())
}

pub fn tail(vm: &mut Vm) -> VmResult<()> {
    let (start, span, n) = locate_list(vm)?;
    vm.sp = start;
    if n == 0 {
        return vm.push(Cell::tagged(Tag::List, 0));
    }
    let header_addr = start + (span - 1) * CELL_SIZE;
    let spans = vm.list_element_spans(start, header_addr)?;
    let (x1_start, x1_span) = *spans.last().expect("n > 0 implies at least one element");
    let remaining_start = x1_start + x1_span * CELL_SIZE;
    let remaining_cells = (header_addr - remaining_start) / CELL_SIZE;
    vm.copy_cells(remaining_start, start, remaining_cells)?;
    vm.sp = start + remaining_cells * CELL_SIZE;
    vm.push(Cell::tagged(Tag::List, remaining_cells as u16))
}

pub fn cons(vm: &mut Vm) -> VmResult<()> {
    vm.require_cells(2)?;
    let (x_start, x_span) = vm.element_at_depth(0)?;
    let x_cells: Vec<Cell> = (0..x_span)
        .map(|i| vm.mem.read_cell(x_start + i * CELL_SIZE))
        .collect::<VmResult<_>>()?;
    vm.sp = x_start;
    let (list_start, _list_span, n) = locate_list(vm)?;
    let old_payload: Vec<Cell> = (0..n as usize)
        .map(|i| vm.mem.read_cell(list_start + i * CELL_SIZE))
        .collect::<VmResult<_>>()?;
    vm.sp = list_start;
    for cell in &x_cells {
        vm.push(*cell)?;
    }
    for cell in &old_payload {
        vm.push(*cell)?;
    }
    vm.push(Cell::tagged(Tag::List, n + x_span as u16))
}

pub fn uncons(vm: &mut Vm) -> VmResult<()> {
    let (start, span, n) = locate_list(vm)?;
    if n == 0 {
        vm.sp = start;
        vm.push(Cell::tagged(Tag::List, 0))?;
        return vm.push(Cell::nil());
    }
    let header_addr = start + (span - 1) * CELL_SIZE;
    let spans = vm.list_element_spans(start, header_addr)?;
    let (x1_start, x1_span) = *spans.last().expect("n > 0 implies at least one element");
    let remaining_start = x1_start + x1_span * CELL_SIZE;
    let remaining_cells = (header_addr - remaining_start) / CELL_SIZE;
    let head_cells: Vec<Cell> = (0..x1_span)
        .map(|i| vm.mem.read_cell(x1_start + i * CELL_SIZE))
        .collect::<VmResult<_>>()?;
    vm.copy_cells(remaining_start, start, remaining_cells)?;
    vm.sp = start + remaining_cells * CELL_SIZE;
    vm.push(Cell::tagged(Tag::List, remaining_cells as u16))?;
    for cell in &head_cells {
        vm.push(*cell)?;
    }
    Ok(())
}

pub fn concat(vm: &mut Vm) -> VmResult<()> {
    vm.require_cells(2)?;
    let (start2, span2, n2) = locate_list(vm)?;
    let _ = span2;
    let list2: Vec<Cell> = (0..n2 as usize)
        .map(|i| vm.mem.read_cell(start2 + i * CELL_SIZE))
        .collect::<VmResult<_>>()?;
    vm.sp = start2;
    let (start1, span1, n1) = locate_list(vm)?;
    let _ = span1;
    let list1: Vec<Cell> = (0..n1 as usize)
        .map(|i| vm.mem.read_cell(start1 + i * CELL_SIZE))
        .collect::<VmResult<_>>()?;
    vm.sp = start1;
    for cell in &list1 {
        vm.push(*cell)?;
    }
    for cell in &list2 {
        vm.push(*cell)?;
    }
    vm.push(Cell::tagged(Tag::List, n1 + n2))
}

pub fn reverse(vm: &mut Vm) -> VmResult<()> {
    let (start, span, n) = locate_list(vm)?;
    let header_addr = start + (span - 1) * CELL_SIZE;
    let spans = vm.list_element_spans(start, header_addr)?;
    let mut new_payload = Vec::with_capacity(n as usize);
    for (elem_start, elem_span) in &spans {
        for i in 0..*elem_span {
            new_payload.push(vm.mem.read_cell(elem_start + i * CELL_SIZE)?);
        }
    }
    vm.sp = start;
    for cell in &new_payload {
        vm.push(*cell)?;
    }
    vm.push(Cell::tagged(Tag::List, n))
}

pub fn pack(vm: &mut Vm) -> VmResult<()> {
    vm.require_cells(1)?;
    let n_cell = vm.pop()?;
    let n = match n_cell.decode() {
        Decoded::Number(v) if v >= 0.0 => v as usize,
        Decoded::Tagged {
            tag: Tag::Integer,
            value,
        } => value as usize,
        _ => return Err(VmError::runtime("pack: expected a non-negative count", vm.render_stack())),
    };
    if n == 0 {
        return vm.push(Cell::tagged(Tag::List, 0));
    }
    vm.require_cells(n)?;
    let (start, _span) = vm.element_at_depth(n - 1)?;
    let total_cells = (vm.sp - start) / CELL_SIZE;
    vm.push(Cell::tagged(Tag::List, total_cells as u16))
}

pub fn unpack(vm: &mut Vm) -> VmResult<()> {
    let (start, span, _n) = locate_list(vm)?;
    let header_addr = start + (span - 1) * CELL_SIZE;
    vm.sp = header_addr;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push_list(vm: &mut Vm, values: &[f32]) {
        for v in values {
            vm.push(Cell::number(*v)).unwrap();
        }
        vm.push(Cell::tagged(Tag::List, values.len() as u16)).unwrap();
    }

    #[test]
    fn nested_list_length_and_slots() {
        let mut vm = Vm::new();
        vm.push(Cell::number(1.0)).unwrap();
        push_list(&mut vm, &[2.0, 3.0]);
        vm.push(Cell::number(4.0)).unwrap();
        let total_span = 1 + 3 + 1; // 1 + (2 payload + header) + 1
        vm.push(Cell::tagged(Tag::List, total_span as u16)).unwrap();

        let mut vm2 = Vm::new();
        vm2.push(Cell::number(1.0)).unwrap();
        push_list(&mut vm2, &[2.0, 3.0]);
        vm2.push(Cell::number(4.0)).unwrap();
        vm2.push(Cell::tagged(Tag::List, total_span as u16)).unwrap();

        slots(&mut vm2).unwrap();
        let top2 = vm2.mem.read_cell(vm2.sp - CELL_SIZE).unwrap();
        assert_eq!(top2.as_tagged_value(Tag::Integer), Some(total_span as u16));

        length(&mut vm).unwrap();
        let top = vm.mem.read_cell(vm.sp - CELL_SIZE).unwrap();
        assert_eq!(top.as_tagged_value(Tag::Integer), Some(3));
    }

    #[test]
    fn head_and_tail_of_flat_list() {
        let mut vm = Vm::new();
        push_list(&mut vm, &[10.0, 20.0, 30.0]);
        head(&mut vm).unwrap();
        assert_eq!(
            vm.mem.read_cell(vm.sp - CELL_SIZE).unwrap().as_number(),
            Some(10.0)
        );

        let mut vm2 = Vm::new();
        push_list(&mut vm2, &[10.0, 20.0, 30.0]);
        tail(&mut vm2).unwrap();
        let (start, span) = vm2.element_at_depth(0).unwrap();
        assert_eq!(span, 3); // 2 payload cells + header
        let header = vm2.mem.read_cell(start + (span - 1) * CELL_SIZE).unwrap();
        assert_eq!(header.as_tagged_value(Tag::List), Some(2));
    }

    #[test]
    fn head_of_empty_list_is_nil() {
        let mut vm = Vm::new();
        push_list(&mut vm, &[]);
        head(&mut vm).unwrap();
        assert!(vm.mem.read_cell(vm.sp - CELL_SIZE).unwrap().is_nil());
    }

    #[test]
    fn tail_of_empty_list_stays_empty() {
        let mut vm = Vm::new();
        push_list(&mut vm, &[]);
        tail(&mut vm).unwrap();
        let top = vm.mem.read_cell(vm.sp - CELL_SIZE).unwrap();
        assert_eq!(top.as_tagged_value(Tag::List), Some(0));
    }

    #[test]
    fn cons_prepends_element() {
        let mut vm = Vm::new();
        push_list(&mut vm, &[20.0, 30.0]);
        vm.push(Cell::number(10.0)).unwrap();
        cons(&mut vm).unwrap();
        head(&mut vm).unwrap();
        assert_eq!(
            vm.mem.read_cell(vm.sp - CELL_SIZE).unwrap().as_number(),
            Some(10.0)
        );
    }

    #[test]
    fn concat_sums_header_values() {
        let mut vm = Vm::new();
        push_list(&mut vm, &[1.0, 2.0]);
        push_list(&mut vm, &[3.0]);
        concat(&mut vm).unwrap();
        let top = vm.mem.read_cell(vm.sp - CELL_SIZE).unwrap();
        assert_eq!(top.as_tagged_value(Tag::List), Some(3));
    }

    #[test]
    fn reverse_flips_logical_order() {
        let mut vm = Vm::new();
        push_list(&mut vm, &[1.0, 2.0, 3.0]);
        reverse(&mut vm).unwrap();
        head(&mut vm).unwrap();
        assert_eq!(
            vm.mem.read_cell(vm.sp - CELL_SIZE).unwrap().as_number(),
            Some(3.0)
        );
    }

    #[test]
    fn pack_and_unpack_round_trip() {
        let mut vm = Vm::new();
        vm.push(Cell::number(1.0)).unwrap();
        vm.push(Cell::number(2.0)).unwrap();
        vm.push(Cell::number(3.0)).unwrap();
        vm.push(Cell::number(3.0)).unwrap(); // n
        pack(&mut vm).unwrap();
        assert_eq!(vm.stack_depth(), 4);
        unpack(&mut vm).unwrap();
        assert_eq!(vm.stack_depth(), 3);
    }
}
