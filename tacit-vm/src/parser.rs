//! Drives the tokenizer, emits bytecode through the [`Compiler`], and
//! mutates the [`SymbolTable`] for colon definitions.
//!
//! Plain-struct, explicit-state style, matching the rest of this crate,
//! rather than a parser-combinator crate.

use crate::compiler::Compiler;
use crate::digest::Digest;
use crate::error::{VmError, VmResult};
use crate::memory::Memory;
use crate::symbol::{Action, SymbolTable};
use crate::token::{Token, TokenKind, Tokenizer};
use tacit_asm::Opcode;

/// Bundles the four pieces of VM state the parser mutates, so call sites
/// don't have to thread four separate `&mut` parameters through every
/// helper.
pub struct ParseContext<'a> {
    pub mem: &'a mut Memory,
    pub compiler: &'a mut Compiler,
    pub symbols: &'a mut SymbolTable,
    pub digest: &'a mut Digest,
}

/// A currently-open colon definition: its name and the address of the
/// reserved branch-offset slot to back-patch at `;`.
struct OpenDefinition {
    name: String,
    branch_slot: usize,
}

/// Parses one source string into bytecode, emitting through a
/// [`ParseContext`]. A fresh `Parser` is used per top-level invocation (one
/// REPL line, or the whole contents of a `load`ed file).
pub struct Parser<'src> {
    tokenizer: Tokenizer<'src>,
    current_definition: Option<OpenDefinition>,
    code_block_depth: usize,
}

impl<'src> Parser<'src> {
    /// Build a parser over `source`.
    pub fn new(source: &'src str) -> Self {
        Parser {
            tokenizer: Tokenizer::new(source),
            current_definition: None,
            code_block_depth: 0,
        }
    }

    /// Parse the whole source to completion, emitting `ABORT` at EOF.
    /// Fails with [`VmError::UnclosedDefinition`] if a colon definition was
    /// never closed.
    pub fn parse_program(&mut self, ctx: &mut ParseContext) -> VmResult<()> {
        loop {
            let token = self
                .tokenizer
                .next_token()
                .map_err(|msg| VmError::runtime(msg, "<parse>"))?;
            if matches!(token.kind, TokenKind::Eof) {
                break;
            }
            self.dispatch(token, ctx)?;
        }
        if let Some(open) = &self.current_definition {
            return Err(VmError::UnclosedDefinition(open.name.clone()));
        }
        ctx.compiler.compile8(ctx.mem, Opcode::Abort.into())?;
        Ok(())
    }

    fn next_required(&mut self) -> VmResult<Token> {
        self.tokenizer
            .next_token()
            .map_err(|msg| VmError::runtime(msg, "<parse>"))
    }

    fn dispatch(&mut self, token: Token, ctx: &mut ParseContext) -> VmResult<()> {
        match token.kind {
            TokenKind::Number(n) => {
                ctx.compiler.compile8(ctx.mem, Opcode::LiteralNumber.into())?;
                ctx.compiler.compile_f32(ctx.mem, n)?;
            }
            TokenKind::String(s) => self.emit_string_literal(ctx, &s)?,
            TokenKind::Symbol(s) => self.emit_string_literal(ctx, &s)?,
            TokenKind::Word(w) => self.emit_word(ctx, &w)?,
            TokenKind::Special(':') => self.begin_definition(ctx)?,
            TokenKind::Special(';') => self.end_definition(ctx)?,
            TokenKind::Special('(') => self.parse_code_block(ctx)?,
            TokenKind::Special(')') => return Err(VmError::UnexpectedClosingParenthesis),
            TokenKind::Special('[') => self.parse_list_literal(ctx)?,
            TokenKind::Special(']') => {
                return Err(VmError::runtime(
                    "Unexpected closing bracket",
                    "<parse>",
                ))
            }
            TokenKind::Special(c) => {
                return Err(VmError::runtime(format!("Unexpected token: {c}"), "<parse>"))
            }
            TokenKind::Eof => unreachable!("handled by caller"),
        }
        Ok(())
    }

    fn emit_string_literal(&mut self, ctx: &mut ParseContext, s: &str) -> VmResult<()> {
        let addr = ctx.digest.intern(ctx.mem, s)?;
        ctx.compiler.compile8(ctx.mem, Opcode::LiteralString.into())?;
        ctx.compiler.compile16(ctx.mem, addr as u16)?;
        Ok(())
    }

    fn emit_word(&mut self, ctx: &mut ParseContext, word: &str) -> VmResult<()> {
        match ctx.symbols.find(word) {
            Some(Action::Builtin(op)) => {
                ctx.compiler.compile8(ctx.mem, op.into())?;
            }
            Some(Action::Call(addr)) => {
                ctx.compiler.compile8(ctx.mem, Opcode::Call.into())?;
                ctx.compiler.compile16(ctx.mem, addr)?;
            }
            None => return Err(VmError::UnknownWord(word.to_string())),
        }
        Ok(())
    }

    fn begin_definition(&mut self, ctx: &mut ParseContext) -> VmResult<()> {
        if self.code_block_depth > 0 {
            return Err(VmError::DefinitionInsideCodeBlock);
        }
        if self.current_definition.is_some() {
            return Err(VmError::NestedDefinition);
        }
        let name_token = self.next_required()?;
        let name = match name_token.kind {
            TokenKind::Word(w) => w,
            TokenKind::Number(n) => n.to_string(),
            TokenKind::Eof => return Err(VmError::UnclosedDefinition(String::new())),
            other => return Err(VmError::runtime(format!("invalid definition name: {other}"), "<parse>")),
        };
        if ctx.symbols.is_defined(&name) {
            return Err(VmError::WordAlreadyDefined(name));
        }
        ctx.compiler.compile8(ctx.mem, Opcode::Branch.into())?;
        let branch_slot = ctx.compiler.reserve16(ctx.mem)?;
        let start_addr = ctx.compiler.cp();
        ctx.symbols.define(&name, Action::Call(start_addr as u16));
        ctx.compiler.set_preserve();
        self.current_definition = Some(OpenDefinition { name, branch_slot });
        Ok(())
    }

    fn end_definition(&mut self, ctx: &mut ParseContext) -> VmResult<()> {
        let open = self
            .current_definition
            .take()
            .ok_or(VmError::UnexpectedSemicolon)?;
        ctx.compiler.compile8(ctx.mem, Opcode::Exit.into())?;
        let end = ctx.compiler.cp();
        ctx.compiler.patch_branch(ctx.mem, open.branch_slot, end)?;
        Ok(())
    }

    /// `( body )` compiles to `BRANCH_CALL <slot> body EXIT`, leaving a
    /// CODE-tagged cell on the stack that must be `eval`'d to run.
    fn parse_code_block(&mut self, ctx: &mut ParseContext) -> VmResult<()> {
        ctx.compiler.enter_nesting();
        self.code_block_depth += 1;
        ctx.compiler.compile8(ctx.mem, Opcode::BranchCall.into())?;
        let branch_slot = ctx.compiler.reserve16(ctx.mem)?;
        ctx.compiler.set_preserve();

        loop {
            let token = self.next_required()?;
            match token.kind {
                TokenKind::Eof => return Err(VmError::UnclosedCodeBlock),
                TokenKind::Special(')') => break,
                _ => self.dispatch(token, ctx)?,
            }
        }

        ctx.compiler.compile8(ctx.mem, Opcode::Exit.into())?;
        let end = ctx.compiler.cp();
        ctx.compiler.patch_branch(ctx.mem, branch_slot, end)?;
        ctx.compiler.exit_nesting();
        self.code_block_depth -= 1;
        Ok(())
    }

    /// `[ items ]` — immediate-construction list literal: `OPEN_LIST items
    /// CLOSE_LIST`.
    fn parse_list_literal(&mut self, ctx: &mut ParseContext) -> VmResult<()> {
        ctx.compiler.compile8(ctx.mem, Opcode::OpenList.into())?;
        loop {
            let token = self.next_required()?;
            match token.kind {
                TokenKind::Eof => {
                    return Err(VmError::runtime("Unclosed list literal", "<parse>"))
                }
                TokenKind::Special(']') => break,
                _ => self.dispatch(token, ctx)?,
            }
        }
        ctx.compiler.compile8(ctx.mem, Opcode::CloseList.into())?;
        Ok(())
    }
}
