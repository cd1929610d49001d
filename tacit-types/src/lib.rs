//! Tagged-value encoding and memory layout constants shared by the tacit
//! virtual machine's compiler and interpreter.
//!
//! This crate owns the two things every other `tacit-*` crate needs to
//! agree on bit-for-bit: the NaN-boxed [`Cell`] encoding, and the fixed
//! [`Segment`] layout of the VM's single linear memory buffer.

mod cell;
mod segment;
mod tag;

pub use cell::{Cell, Decoded};
pub use segment::{Segment, CELL_SIZE, CODE_SIZE, MEM_SIZE, RSTACK_SIZE, STACK_SIZE, STRING_SIZE};
pub use tag::Tag;
