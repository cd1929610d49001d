//! The VM proper: owns memory, compiler, digest, symbol table, and the four
//! execution registers, and runs the opcode dispatch loop.

use crate::compiler::Compiler;
use crate::digest::Digest;
use crate::error::{VmError, VmResult};
use crate::memory::Memory;
use crate::ops;
use crate::symbol::SymbolTable;
use tacit_asm::Opcode;
use tacit_types::{Cell, Decoded, Segment, Tag, CELL_SIZE};

/// The concatenative bytecode interpreter. All interpreter state lives
/// here as plain fields, passed explicitly rather than shared through
/// process-wide statics.
pub struct Vm {
    pub mem: Memory,
    pub compiler: Compiler,
    pub digest: Digest,
    pub symbols: SymbolTable,
    /// Instruction pointer: linear address of the next opcode byte.
    pub ip: usize,
    /// Data stack pointer: linear address one past the top cell.
    pub sp: usize,
    /// Return stack pointer: linear address one past the top cell.
    pub rp: usize,
    /// Base pointer: RP at the moment the current call frame was pushed.
    pub bp: usize,
    /// Cleared by `ABORT` or by `EXIT` unwinding the outermost frame.
    pub running: bool,
    /// When set, the interpreter emits a `tracing::trace!` per dispatched
    /// opcode.
    pub debug: bool,
    /// Lines written by `print`, in order. The host (REPL/file runner)
    /// drains this after each top-level `execute`.
    pub output: Vec<String>,
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}

impl Vm {
    /// A fresh VM with empty stacks, built-ins registered, and the
    /// compiler cursor at the start of CODE.
    pub fn new() -> Self {
        Vm {
            mem: Memory::new(),
            compiler: Compiler::new(),
            digest: Digest::new(),
            symbols: SymbolTable::with_builtins(),
            ip: 0,
            sp: Segment::Stack.base(),
            rp: Segment::RStack.base(),
            bp: Segment::RStack.base(),
            running: false,
            debug: false,
            output: Vec::new(),
        }
    }

    // --- data stack -----------------------------------------------------

    /// Push one cell onto the data stack.
    pub fn push(&mut self, cell: Cell) -> VmResult<()> {
        if self.sp + CELL_SIZE > Segment::Stack.end() {
            return Err(VmError::StackOverflow);
        }
        self.mem.write_cell(self.sp, cell)?;
        self.sp += CELL_SIZE;
        Ok(())
    }

    /// Pop one cell from the data stack.
    pub fn pop(&mut self) -> VmResult<Cell> {
        if self.sp < Segment::Stack.base() + CELL_SIZE {
            return Err(VmError::stack_underflow(1, self.render_stack()));
        }
        self.sp -= CELL_SIZE;
        self.mem.read_cell(self.sp)
    }

    /// Number of cells currently on the data stack.
    pub fn stack_depth(&self) -> usize {
        (self.sp - Segment::Stack.base()) / CELL_SIZE
    }

    /// Fail with [`VmError::StackUnderflow`], without consuming anything,
    /// unless at least `n` cells are present. Built-ins call this before
    /// popping their operands so a failed operation leaves the stack
    /// exactly as it was: the stack at the moment of failure stays
    /// observable, never partially consumed.
    pub fn require_cells(&self, n: usize) -> VmResult<()> {
        if self.stack_depth() < n {
            return Err(VmError::stack_underflow(n, self.render_stack()));
        }
        Ok(())
    }

    /// Render the data stack bottom-to-top as `[e0, e1, ...]`, for error
    /// messages that include stack state.
    pub fn render_stack(&self) -> String {
        ops::format::render_stack(self)
    }

    // --- return stack -----------------------------------------------------

    /// Push one cell onto the return stack.
    pub fn rpush(&mut self, cell: Cell) -> VmResult<()> {
        if self.rp + CELL_SIZE > Segment::RStack.end() {
            return Err(VmError::ReturnStackOverflow);
        }
        self.mem.write_cell(self.rp, cell)?;
        self.rp += CELL_SIZE;
        Ok(())
    }

    /// Pop one cell from the return stack.
    pub fn rpop(&mut self) -> VmResult<Cell> {
        if self.rp < Segment::RStack.base() + CELL_SIZE {
            return Err(VmError::runtime(
                "return stack underflow",
                self.render_stack(),
            ));
        }
        self.rp -= CELL_SIZE;
        self.mem.read_cell(self.rp)
    }

    // --- list-aware element walking ----------------------------------------

    /// The span, in cells, of the element whose topmost cell is `top_addr`:
    /// 1 for a plain cell, `1 + n` for a LIST header with payload count `n`.
    fn span_at(&self, top_addr: usize) -> VmResult<usize> {
        let cell = self.mem.read_cell(top_addr)?;
        Ok(match cell.decode() {
            Decoded::Tagged {
                tag: Tag::List,
                value,
            } => 1 + value as usize,
            _ => 1,
        })
    }

    /// Locate the logical element `depth` cells deep from the data stack's
    /// top (0 = TOS), returning `(start_addr, span_cells)`. A plain cell
    /// has span 1; a list has span `1 + n` and counts as one element.
    pub fn element_at_depth(&self, depth: usize) -> VmResult<(usize, usize)> {
        let mut cursor = self.sp;
        let mut result = None;
        for _ in 0..=depth {
            if cursor <= Segment::Stack.base() {
                return Err(VmError::stack_underflow(depth + 1, self.render_stack()));
            }
            let span = self.span_at(cursor - CELL_SIZE)?;
            let start = cursor
                .checked_sub(span * CELL_SIZE)
                .filter(|s| *s >= Segment::Stack.base())
                .ok_or_else(|| VmError::stack_underflow(depth + 1, self.render_stack()))?;
            result = Some((start, span));
            cursor = start;
        }
        Ok(result.expect("loop runs at least once"))
    }

    /// Scan a list's payload region `[floor, top)` from `top` downward,
    /// yielding each logical element's `(start_addr, span_cells)` in
    /// top-down order (the last-pushed element first, the first-pushed
    /// element — the logical head — last).
    pub fn list_element_spans(&self, floor: usize, top: usize) -> VmResult<Vec<(usize, usize)>> {
        let mut spans = Vec::new();
        let mut cursor = top;
        while cursor > floor {
            let span = self.span_at(cursor - CELL_SIZE)?;
            let start = cursor.checked_sub(span * CELL_SIZE).ok_or_else(|| {
                VmError::runtime("corrupt list payload", self.render_stack())
            })?;
            if start < floor {
                return Err(VmError::runtime("corrupt list payload", self.render_stack()));
            }
            spans.push((start, span));
            cursor = start;
        }
        Ok(spans)
    }

    /// Copy `len_cells` cells from `src` to `dst` (non-overlapping or
    /// `dst >= src`, always the case at this crate's call sites).
    pub fn copy_cells(&mut self, src: usize, dst: usize, len_cells: usize) -> VmResult<()> {
        for i in 0..len_cells {
            let cell = self.mem.read_cell(src + i * CELL_SIZE)?;
            self.mem.write_cell(dst + i * CELL_SIZE, cell)?;
        }
        Ok(())
    }

    /// Reverse the `len_cells` cells starting at `start`, in place.
    pub fn reverse_cells(&mut self, start: usize, len_cells: usize) -> VmResult<()> {
        let mut lo = 0usize;
        let mut hi = len_cells.saturating_sub(1);
        while lo < hi {
            let a = self.mem.read_cell(start + lo * CELL_SIZE)?;
            let b = self.mem.read_cell(start + hi * CELL_SIZE)?;
            self.mem.write_cell(start + lo * CELL_SIZE, b)?;
            self.mem.write_cell(start + hi * CELL_SIZE, a)?;
            lo += 1;
            hi -= 1;
        }
        Ok(())
    }

    /// Left-rotate the cells in `[start, end)` by `k_cells`, via the
    /// three-reverses algorithm: the canonical strategy for compound-aware
    /// `swap`/`rot` that works regardless of how many cells each element
    /// spans.
    pub fn rotate_left_cells(&mut self, start: usize, end: usize, k_cells: usize) -> VmResult<()> {
        let total = (end - start) / CELL_SIZE;
        if k_cells == 0 || k_cells >= total {
            return Ok(());
        }
        self.reverse_cells(start, k_cells)?;
        self.reverse_cells(start + k_cells * CELL_SIZE, total - k_cells)?;
        self.reverse_cells(start, total)?;
        Ok(())
    }

    // --- program execution -------------------------------------------------

    /// Run the dispatch loop starting at `start_addr` until `running`
    /// clears (via `ABORT`, or `EXIT` unwinding the outermost frame) or an
    /// error unwinds the loop.
    pub fn execute(&mut self, start_addr: usize) -> VmResult<()> {
        self.ip = start_addr;
        self.running = true;
        while self.running {
            let raw_op = self.mem.read8(self.ip)?;
            self.ip += 1;
            let op = Opcode::from_u8(raw_op)?;
            if self.debug {
                tracing::trace!(opcode = ?op, ip = self.ip - 1, sp = self.sp, "dispatch");
            }
            self.step(op).map_err(|e| {
                tracing::debug!(error = %e, "vm execution error");
                e
            })?;
        }
        Ok(())
    }

    fn step(&mut self, op: Opcode) -> VmResult<()> {
        match op {
            Opcode::LiteralNumber => {
                let v = self.mem.read_f32(self.ip)?;
                self.ip += 4;
                self.push(Cell::number(v))?;
            }
            Opcode::LiteralString => {
                let addr = self.mem.read16(self.ip)?;
                self.ip += 2;
                self.push(Cell::tagged(Tag::String, addr))?;
            }
            Opcode::Branch => {
                let offset = self.mem.read_i16(self.ip)?;
                self.ip = (self.ip as i64 + 2 + offset as i64) as usize;
            }
            Opcode::BranchCall => {
                let offset = self.mem.read_i16(self.ip)?;
                let target_push = (self.ip + 2) as u16;
                self.push(Cell::tagged(Tag::Code, target_push))?;
                self.ip = (self.ip as i64 + 2 + offset as i64) as usize;
            }
            Opcode::Call => {
                let addr = self.mem.read16(self.ip)?;
                self.ip += 2;
                self.rpush(Cell::tagged(Tag::Code, self.ip as u16))?;
                self.rpush(Cell::tagged(Tag::Integer, self.bp as u16))?;
                self.bp = self.rp;
                self.ip = addr as usize;
            }
            Opcode::Eval => {
                let v = self.pop()?;
                match v.decode() {
                    Decoded::Tagged {
                        tag: Tag::Code,
                        value,
                    } => {
                        self.rpush(Cell::tagged(Tag::Code, self.ip as u16))?;
                        self.rpush(Cell::tagged(Tag::Integer, self.bp as u16))?;
                        self.bp = self.rp;
                        self.ip = value as usize;
                    }
                    Decoded::Tagged {
                        tag: Tag::Builtin,
                        value,
                    } => {
                        let builtin_op = Opcode::from_u8(value as u8)?;
                        ops::dispatch(self, builtin_op)?;
                    }
                    _ => self.push(v)?,
                }
            }
            Opcode::Exit => {
                if self.rp < Segment::RStack.base() + 2 * CELL_SIZE {
                    self.running = false;
                } else {
                    self.rp = self.bp;
                    let saved_bp = self.rpop()?;
                    self.bp = saved_bp
                        .as_tagged_value(Tag::Integer)
                        .expect("saved BP is always INTEGER-tagged") as usize;
                    let return_ip = self.rpop()?;
                    self.ip = return_ip
                        .as_tagged_value(Tag::Code)
                        .expect("return address is always CODE-tagged") as usize;
                }
            }
            Opcode::Abort => self.running = false,
            Opcode::OpenList => {
                self.rpush(Cell::tagged(Tag::Integer, self.sp as u16))?;
            }
            Opcode::CloseList => {
                let marker = self.rpop()?;
                let start = marker
                    .as_tagged_value(Tag::Integer)
                    .expect("OPEN_LIST marker is always INTEGER-tagged") as usize;
                let n = (self.sp - start) / CELL_SIZE;
                self.push(Cell::tagged(Tag::List, n as u16))?;
            }
            other => ops::dispatch(self, other)?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{ParseContext, Parser};

    fn run(src: &str) -> Vm {
        let mut vm = Vm::new();
        {
            let mut ctx = ParseContext {
                mem: &mut vm.mem,
                compiler: &mut vm.compiler,
                symbols: &mut vm.symbols,
                digest: &mut vm.digest,
            };
            let mut parser = Parser::new(src);
            parser.parse_program(&mut ctx).unwrap();
        }
        let start = vm.compiler.bcp();
        vm.execute(start).unwrap();
        vm
    }

    fn stack_numbers(vm: &Vm) -> Vec<f32> {
        let mut out = Vec::new();
        let mut addr = Segment::Stack.base();
        while addr < vm.sp {
            let cell = vm.mem.read_cell(addr).unwrap();
            out.push(cell.as_number().unwrap());
            addr += CELL_SIZE;
        }
        out
    }

    #[test]
    fn addition() {
        assert_eq!(stack_numbers(&run("5 3 +")), vec![8.0]);
    }

    #[test]
    fn subtraction() {
        assert_eq!(stack_numbers(&run("10 3 -")), vec![7.0]);
    }

    #[test]
    fn multiplication() {
        assert_eq!(stack_numbers(&run("5 3 *")), vec![15.0]);
    }

    #[test]
    fn division() {
        assert_eq!(stack_numbers(&run("15 3 /")), vec![5.0]);
    }

    #[test]
    fn drop_swap_dup() {
        assert_eq!(
            stack_numbers(&run("1 2 3 drop swap dup")),
            vec![2.0, 1.0, 1.0]
        );
    }

    #[test]
    fn code_block_eval() {
        assert_eq!(stack_numbers(&run("(30 20 *) eval")), vec![600.0]);
    }

    #[test]
    fn colon_definition_square() {
        assert_eq!(stack_numbers(&run(": square dup * ; 3 square")), vec![9.0]);
    }

    #[test]
    fn nested_colon_definitions() {
        assert_eq!(
            stack_numbers(&run(": double 2 * ; : quadruple double double ; 5 quadruple")),
            vec![20.0]
        );
    }

    #[test]
    fn list_literal_layout() {
        let vm = run("[ 1 2 3 ]");
        assert_eq!(vm.stack_depth(), 4);
        let header = vm.mem.read_cell(vm.sp - CELL_SIZE).unwrap();
        assert_eq!(header.as_tagged_value(Tag::List), Some(3));
    }

    #[test]
    fn nested_list_length_and_slots() {
        let vm = run("[ 1 [ 2 3 ] 4 ] length");
        let top = vm.mem.read_cell(vm.sp - CELL_SIZE).unwrap();
        assert_eq!(top.as_tagged_value(Tag::Integer), Some(3));

        let vm2 = run("[ 1 [ 2 3 ] 4 ] slots");
        let top2 = vm2.mem.read_cell(vm2.sp - CELL_SIZE).unwrap();
        assert_eq!(top2.as_tagged_value(Tag::Integer), Some(5));
    }

    #[test]
    fn division_by_zero_is_infinity() {
        let vm = run("5 3 0 /");
        let top = vm.mem.read_cell(vm.sp - CELL_SIZE).unwrap();
        assert_eq!(top.as_number(), Some(f32::INFINITY));
    }

    #[test]
    fn invalid_opcode_is_reported() {
        let mut vm = Vm::new();
        let addr = vm.compiler.cp();
        vm.compiler.compile8(&mut vm.mem, 0xAB).unwrap();
        let err = vm.execute(addr).unwrap_err();
        assert_eq!(err, VmError::InvalidOpcode(0xAB));
    }

    #[test]
    fn stack_underflow_reports_stack_contents() {
        let mut vm = Vm::new();
        let mut ctx = ParseContext {
            mem: &mut vm.mem,
            compiler: &mut vm.compiler,
            symbols: &mut vm.symbols,
            digest: &mut vm.digest,
        };
        let mut parser = Parser::new("5 +");
        parser.parse_program(&mut ctx).unwrap();
        let start = vm.compiler.bcp();
        let err = vm.execute(start).unwrap_err();
        match err {
            VmError::StackUnderflow { needed, stack } => {
                assert_eq!(needed, 2);
                assert!(stack.contains('5'));
            }
            other => panic!("expected StackUnderflow, got {other:?}"),
        }
    }

    #[test]
    fn data_stack_overflow_is_reported() {
        let mut vm = Vm::new();
        let capacity = tacit_types::STACK_SIZE / CELL_SIZE;
        for _ in 0..capacity {
            vm.push(Cell::number(0.0)).unwrap();
        }
        assert_eq!(vm.push(Cell::number(1.0)), Err(VmError::StackOverflow));
    }

    #[test]
    fn return_stack_overflow_is_reported() {
        let mut vm = Vm::new();
        let capacity = tacit_types::RSTACK_SIZE / CELL_SIZE;
        for _ in 0..capacity {
            vm.rpush(Cell::tagged(Tag::Integer, 0)).unwrap();
        }
        assert_eq!(
            vm.rpush(Cell::tagged(Tag::Integer, 1)),
            Err(VmError::ReturnStackOverflow)
        );
    }
}
