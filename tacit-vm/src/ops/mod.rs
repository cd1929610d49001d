//! Built-in operations registered in the symbol table, grouped by kind:
//! stack shuffling, structural list operations, arithmetic/comparison/
//! unary/transcendental, and the `print` formatter.

pub mod arith;
pub mod format;
pub mod list;
pub mod stack;

use crate::error::VmResult;
use crate::interpreter::Vm;
use tacit_asm::Opcode;

/// Invoke the built-in bound to `op`. Called both from direct dispatch in
/// [`Vm::step`](crate::interpreter::Vm) and from `EVAL` on a BUILTIN-tagged
/// cell.
pub fn dispatch(vm: &mut Vm, op: Opcode) -> VmResult<()> {
    match op {
        Opcode::Dup => stack::dup(vm),
        Opcode::Drop => stack::drop(vm),
        Opcode::Swap => stack::swap(vm),
        Opcode::Over => stack::over(vm),
        Opcode::Nip => stack::nip(vm),
        Opcode::Tuck => stack::tuck(vm),
        Opcode::Rot => stack::rot(vm),
        Opcode::RevRot => stack::revrot(vm),
        Opcode::Pick => stack::pick(vm),

        Opcode::Length => list::length(vm),
        Opcode::Slots => list::slots(vm),
        Opcode::Head => list::head(vm),
        Opcode::Tail => list::tail(vm),
        Opcode::Cons => list::cons(vm),
        Opcode::Uncons => list::uncons(vm),
        Opcode::Concat => list::concat(vm),
        Opcode::Reverse => list::reverse(vm),
        Opcode::Pack => list::pack(vm),
        Opcode::Unpack => list::unpack(vm),

        Opcode::Add => arith::add(vm),
        Opcode::Sub => arith::sub(vm),
        Opcode::Mul => arith::mul(vm),
        Opcode::Div => arith::div(vm),
        Opcode::Mod => arith::modulo(vm),
        Opcode::Min => arith::min(vm),
        Opcode::Max => arith::max(vm),

        Opcode::Eq => arith::eq(vm),
        Opcode::Lt => arith::lt(vm),
        Opcode::Le => arith::le(vm),
        Opcode::Gt => arith::gt(vm),
        Opcode::Ge => arith::ge(vm),

        Opcode::Abs => arith::abs(vm),
        Opcode::Neg => arith::neg(vm),
        Opcode::Sign => arith::sign(vm),
        Opcode::Recip => arith::recip(vm),
        Opcode::Floor => arith::floor(vm),
        Opcode::Not => arith::not(vm),

        Opcode::Pow => arith::pow(vm),
        Opcode::Exp => arith::exp(vm),
        Opcode::Ln => arith::ln(vm),
        Opcode::Log => arith::log(vm),
        Opcode::Sqrt => arith::sqrt(vm),

        Opcode::Print => format::print(vm),

        control => unreachable!("{control:?} is a control opcode, not a built-in"),
    }
}
