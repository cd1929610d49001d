//! Runtime and compile-time error kinds.
//!
//! `VmError` is the single closed error type shared by every component in
//! this crate (memory, digest, compiler, parser, interpreter, built-ins)
//! rather than giving each module its own error type.

use tacit_asm::InvalidOpcode;

/// Result alias used throughout the crate.
pub type VmResult<T> = Result<T, VmError>;

/// The closed set of error kinds this crate can raise.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum VmError {
    /// Memory or digest access outside its segment; an invalid digest
    /// reset address; an invalid `dump` range.
    #[error("range error: {0}")]
    Range(String),

    /// `add(s)` was called with a string longer than 255 bytes.
    #[error("String too long (max 255 characters)")]
    StringTooLong,

    /// `add(s)` was called with insufficient remaining digest space.
    #[error("String digest overflow")]
    StringDigestOverflow,

    /// A word token did not resolve to any known symbol.
    #[error("Unknown word: {0}")]
    UnknownWord(String),

    /// End of input reached with a colon definition still open.
    #[error("Unclosed definition for {0}")]
    UnclosedDefinition(String),

    /// End of input reached with a code block still open.
    #[error("Unclosed code block")]
    UnclosedCodeBlock,

    /// A `)` appeared with no matching open code block.
    #[error("Unexpected closing parenthesis")]
    UnexpectedClosingParenthesis,

    /// A `;` appeared with no open colon definition.
    #[error("Unexpected semicolon")]
    UnexpectedSemicolon,

    /// A `:` appeared while another definition was already open.
    #[error("Nested definitions are not allowed")]
    NestedDefinition,

    /// A `:` appeared inside a code block.
    #[error("Cannot nest definition inside code block")]
    DefinitionInsideCodeBlock,

    /// A colon definition named a word that is already bound.
    #[error("Word already defined: {0}")]
    WordAlreadyDefined(String),

    /// An operation requiring `needed` cells found fewer; `stack` renders
    /// the stack contents at the moment of failure.
    #[error("Stack underflow: needed {needed} cell(s), stack = {stack}")]
    StackUnderflow {
        /// Number of cells the operation required.
        needed: usize,
        /// Rendered stack contents at the moment of failure.
        stack: String,
    },

    /// A push would exceed the data stack segment.
    #[error("Stack overflow")]
    StackOverflow,

    /// A push would exceed the return stack segment.
    #[error("Return stack overflow")]
    ReturnStackOverflow,

    /// Dispatch encountered a byte that does not name any opcode.
    #[error("Invalid opcode: {0}")]
    InvalidOpcode(u8),

    /// A built-in raised a non-specific runtime failure; `stack` renders
    /// the stack contents at the moment of failure.
    #[error("Runtime error: {message} (stack = {stack})")]
    Runtime {
        /// Human-readable description of the failure.
        message: String,
        /// Rendered stack contents at the moment of failure.
        stack: String,
    },
}

impl From<InvalidOpcode> for VmError {
    fn from(e: InvalidOpcode) -> Self {
        VmError::InvalidOpcode(e.0)
    }
}

impl VmError {
    /// Build a [`VmError::StackUnderflow`] from a depth requirement and a
    /// rendering of the current stack.
    pub fn stack_underflow(needed: usize, stack: impl Into<String>) -> Self {
        VmError::StackUnderflow {
            needed,
            stack: stack.into(),
        }
    }

    /// Build a [`VmError::Runtime`] error carrying the stack state at
    /// failure time.
    pub fn runtime(message: impl Into<String>, stack: impl Into<String>) -> Self {
        VmError::Runtime {
            message: message.into(),
            stack: stack.into(),
        }
    }
}
