//! The closed, 8-bit opcode set of the tacit bytecode, its byte-exact
//! immediate-operand widths, and opcode decoding.
//!
//! A tiny, dependency-light crate that both the compiler (which emits
//! opcodes) and the interpreter (which dispatches on them) can share
//! without either depending on the other's internals.

mod opcode;

pub use opcode::{ImmediateWidth, InvalidOpcode, Opcode};

pub use tacit_types::{Cell, Decoded, Segment, Tag};
