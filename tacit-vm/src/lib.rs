//! Memory, digest, compiler, symbol table, tokenizer, parser, and
//! interpreter for the tacit concatenative virtual machine.
//!
//! The encoding primitives live one layer down (in `tacit-types`/
//! `tacit-asm`), and this crate owns everything that turns source text
//! into bytecode and bytecode into stack effects.

pub mod compiler;
pub mod digest;
pub mod error;
pub mod interpreter;
pub mod memory;
pub mod ops;
pub mod parser;
pub mod symbol;
pub mod token;

pub use compiler::Compiler;
pub use digest::Digest;
pub use error::{VmError, VmResult};
pub use interpreter::Vm;
pub use memory::Memory;
pub use parser::{ParseContext, Parser};
pub use symbol::{Action, SymbolTable};
pub use token::{Token, TokenKind, Tokenizer};

/// Parse `source` and run it to completion on a fresh [`Vm`], returning the
/// VM so the caller can inspect its final stack/output. A convenience
/// wrapper around [`Parser::parse_program`] + [`Vm::execute`] for the REPL
/// and file runner.
pub fn run_source(source: &str) -> VmResult<Vm> {
    let mut vm = Vm::new();
    {
        let mut ctx = ParseContext {
            mem: &mut vm.mem,
            compiler: &mut vm.compiler,
            symbols: &mut vm.symbols,
            digest: &mut vm.digest,
        };
        let mut parser = Parser::new(source);
        parser.parse_program(&mut ctx)?;
    }
    let start = vm.compiler.bcp();
    vm.execute(start)?;
    Ok(vm)
}

/// Parse and run `source` against an existing [`Vm`], preserving its
/// stacks, symbol table, and digest across invocations (the REPL's line-at-
/// a-time mode). On success, advances the compiler per `preserve`
/// semantics so prior definitions remain reachable.
pub fn run_line(vm: &mut Vm, source: &str) -> VmResult<()> {
    vm.compiler.reset();
    let start = vm.compiler.cp();
    {
        let mut ctx = ParseContext {
            mem: &mut vm.mem,
            compiler: &mut vm.compiler,
            symbols: &mut vm.symbols,
            digest: &mut vm.digest,
        };
        let mut parser = Parser::new(source);
        parser.parse_program(&mut ctx)?;
    }
    vm.execute(start)
}
