//! `print` and the stack-trace renderer.

use crate::error::VmResult;
use crate::interpreter::Vm;
use tacit_types::{Cell, Decoded, Segment, Tag, CELL_SIZE};

/// Format a non-LIST cell for display. Every call site resolves a LIST cell
/// to [`render_list_at`] *before* reaching here (that's the only rendering
/// that can recover a list's payload, since it needs the header's stack
/// address, not just its tagged value) — the LIST arm below exists only so
/// this match stays exhaustive over [`Tag`], and is never exercised from
/// within this crate.
fn render_cell(vm: &Vm, cell: Cell) -> String {
    match cell.decode() {
        Decoded::Number(n) => render_number(n),
        Decoded::Tagged {
            tag: Tag::String,
            value,
        } => vm
            .digest
            .get(&vm.mem, value as usize)
            .unwrap_or_else(|_| "<invalid string>".to_string()),
        Decoded::Tagged {
            tag: Tag::List,
            value,
        } => format!("(list of {value} slot(s))"),
        Decoded::Tagged { tag, value } => format!("[{tag}:{value}]"),
    }
}

fn render_number(n: f32) -> String {
    if n.fract() == 0.0 && n.is_finite() {
        format!("{n:.0}")
    } else {
        let rounded = (n * 100.0).round() / 100.0;
        let mut s = format!("{rounded:.2}");
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
        s
    }
}

/// Render a LIST element living on the data stack at `header_addr`, whose
/// payload occupies `[floor, header_addr)`, recursively formatting nested
/// lists by walking header-declared spans, as `( e1 e2 ... en )`.
pub fn render_list_at(vm: &Vm, floor: usize, header_addr: usize) -> VmResult<String> {
    let spans = vm.list_element_spans(floor, header_addr)?;
    let mut elements: Vec<String> = Vec::with_capacity(spans.len());
    for (start, span) in spans.iter().rev() {
        let top_cell = vm.mem.read_cell(start + (span - 1) * tacit_types::CELL_SIZE)?;
        let text = match top_cell.decode() {
            Decoded::Tagged {
                tag: Tag::List,
                value: _,
            } => render_list_at(vm, *start, start + (span - 1) * tacit_types::CELL_SIZE)?,
            _ => render_cell(vm, vm.mem.read_cell(*start)?),
        };
        elements.push(text);
    }
    Ok(format!("( {} )", elements.join(" ")))
}

/// Render the whole data stack bottom-to-top as `[e0, e1, ...]`, for error
/// messages that must include stack state. Walks the stack element-by-
/// element (not cell-by-cell) via [`Vm::list_element_spans`], so a LIST
/// element's whole span is located and handed to [`render_list_at`] rather
/// than being read one raw cell at a time.
pub fn render_stack(vm: &Vm) -> String {
    let floor = Segment::Stack.base();
    let spans = match vm.list_element_spans(floor, vm.sp) {
        Ok(spans) => spans,
        Err(_) => return "[<corrupt stack>]".to_string(),
    };
    let parts: Vec<String> = spans
        .iter()
        .rev()
        .map(|(start, span)| {
            let top_addr = start + (span - 1) * CELL_SIZE;
            let top_cell = match vm.mem.read_cell(top_addr) {
                Ok(cell) => cell,
                Err(_) => return "<corrupt>".to_string(),
            };
            match top_cell.decode() {
                Decoded::Tagged {
                    tag: Tag::List, ..
                } => render_list_at(vm, *start, top_addr)
                    .unwrap_or_else(|_| "<corrupt list>".to_string()),
                _ => render_cell(vm, top_cell),
            }
        })
        .collect();
    format!("[{}]", parts.join(", "))
}

/// `print`: pop the TOS cell, format it, and append the line to
/// `vm.output`. Consumes the cell (and, for a LIST, its whole span) from
/// the data stack.
pub fn print(vm: &mut Vm) -> VmResult<()> {
    vm.require_cells(1)?;
    let (start, span) = vm.element_at_depth(0)?;
    let header_addr = start + (span - 1) * tacit_types::CELL_SIZE;
    let top_cell = vm.mem.read_cell(header_addr)?;
    let line = match top_cell.decode() {
        Decoded::Tagged {
            tag: Tag::List,
            value: _,
        } => render_list_at(vm, start, header_addr)?,
        _ => render_cell(vm, top_cell),
    };
    vm.sp = start;
    vm.output.push(line);
    Ok(())
}
