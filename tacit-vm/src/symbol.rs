//! The name → action map populated with built-ins at startup and extended
//! by colon definitions during parsing. New bindings shadow old ones by
//! appending rather than overwriting, so a later lookup always finds the
//! most recent definition while older bytecode that already resolved a
//! name keeps working.
//!
//! Uses the same plain, `Vec`-backed style the rest of this crate uses for
//! small closed tables (c.f. `tacit_asm::Opcode`'s manual `match` rather
//! than reaching for a `HashMap` where a handful of entries and linear
//! shadowing search suffice).

use tacit_asm::Opcode;

/// What happens when the parser resolves a WORD token to this symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Emit the opcode directly (a registered built-in).
    Builtin(Opcode),
    /// Emit `CALL addr` (a colon-defined word).
    Call(u16),
}

/// Append-only stack of `(name, action)` bindings. `define` shadows any
/// prior binding for the same name; `find` returns the most recent.
#[derive(Default)]
pub struct SymbolTable {
    entries: Vec<(String, Action)>,
}

impl SymbolTable {
    /// An empty table with no built-ins registered.
    pub fn new() -> Self {
        SymbolTable {
            entries: Vec::new(),
        }
    }

    /// A table pre-populated with every built-in opcode, under its
    /// canonical lowercase name.
    pub fn with_builtins() -> Self {
        let mut table = Self::new();
        for (name, op) in BUILTIN_NAMES {
            table.define(name, Action::Builtin(*op));
        }
        table
    }

    /// Bind `name` to `action`, shadowing any existing binding.
    pub fn define(&mut self, name: &str, action: Action) {
        self.entries.push((name.to_string(), action));
    }

    /// Look up the most recently defined binding for `name`.
    pub fn find(&self, name: &str) -> Option<Action> {
        self.entries
            .iter()
            .rev()
            .find(|(bound, _)| bound == name)
            .map(|(_, action)| *action)
    }

    /// True if `name` is currently bound.
    pub fn is_defined(&self, name: &str) -> bool {
        self.find(name).is_some()
    }
}

/// Canonical surface name for every opcode reachable as a built-in word.
const BUILTIN_NAMES: &[(&str, Opcode)] = &[
    ("dup", Opcode::Dup),
    ("drop", Opcode::Drop),
    ("swap", Opcode::Swap),
    ("over", Opcode::Over),
    ("nip", Opcode::Nip),
    ("tuck", Opcode::Tuck),
    ("rot", Opcode::Rot),
    ("revrot", Opcode::RevRot),
    ("-rot", Opcode::RevRot),
    ("pick", Opcode::Pick),
    ("length", Opcode::Length),
    ("slots", Opcode::Slots),
    ("head", Opcode::Head),
    ("tail", Opcode::Tail),
    ("cons", Opcode::Cons),
    ("uncons", Opcode::Uncons),
    ("concat", Opcode::Concat),
    ("reverse", Opcode::Reverse),
    ("pack", Opcode::Pack),
    ("unpack", Opcode::Unpack),
    ("+", Opcode::Add),
    ("-", Opcode::Sub),
    ("*", Opcode::Mul),
    ("/", Opcode::Div),
    ("mod", Opcode::Mod),
    ("min", Opcode::Min),
    ("max", Opcode::Max),
    ("eq", Opcode::Eq),
    ("lt", Opcode::Lt),
    ("le", Opcode::Le),
    ("gt", Opcode::Gt),
    ("ge", Opcode::Ge),
    ("abs", Opcode::Abs),
    ("neg", Opcode::Neg),
    ("sign", Opcode::Sign),
    ("recip", Opcode::Recip),
    ("floor", Opcode::Floor),
    ("not", Opcode::Not),
    ("pow", Opcode::Pow),
    ("exp", Opcode::Exp),
    ("ln", Opcode::Ln),
    ("log", Opcode::Log),
    ("sqrt", Opcode::Sqrt),
    ("print", Opcode::Print),
    (".", Opcode::Print),
    ("eval", Opcode::Eval),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_are_preregistered() {
        let table = SymbolTable::with_builtins();
        assert_eq!(table.find("dup"), Some(Action::Builtin(Opcode::Dup)));
        assert_eq!(table.find("+"), Some(Action::Builtin(Opcode::Add)));
        assert_eq!(table.find("nonexistent"), None);
    }

    #[test]
    fn define_shadows_prior_binding() {
        let mut table = SymbolTable::with_builtins();
        table.define("dup", Action::Call(1234));
        assert_eq!(table.find("dup"), Some(Action::Call(1234)));
    }

    #[test]
    fn is_defined_reflects_current_bindings() {
        let mut table = SymbolTable::new();
        assert!(!table.is_defined("square"));
        table.define("square", Action::Call(100));
        assert!(table.is_defined("square"));
    }
}
