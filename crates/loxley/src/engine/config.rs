//! Per-parse configuration and metrics.

use std::time::Duration;

use hashbrown::HashMap;

use crate::grammar::{Param, Symbol};

/// How candidate tokens reach the selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Semantics {
    /// The selector sees every discovered token.
    #[default]
    Paper,
    /// Tokens no waiting item can consume are hidden from the selector,
    /// so hopeless candidates cannot influence its choice.
    Modified,
}

/// How a terminal's own-grammar parse is translated into tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalMode<P> {
    /// One token per recognized output, consuming the recognized length.
    LongestMatch,
    /// Zero-length tokens on success: the terminal asserts what follows
    /// without consuming it.
    AndNext,
    /// One zero-length token carrying the given output when the sub-parse
    /// *fails*; nothing on success. Negative lookahead.
    NotNext(P),
}

/// Options for one parse: token semantics plus per-terminal parse modes.
#[derive(Debug, Clone)]
pub struct ParseConfig<P> {
    pub semantics: Semantics,
    modes: HashMap<usize, TerminalMode<P>>,
}

impl<P: Param> ParseConfig<P> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            semantics: Semantics::default(),
            modes: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_semantics(mut self, semantics: Semantics) -> Self {
        self.semantics = semantics;
        self
    }

    /// Override the parse mode of a terminal. The default for every
    /// terminal is [`TerminalMode::LongestMatch`]. Nonterminal symbols are
    /// ignored.
    #[must_use]
    pub fn with_terminal_mode(mut self, terminal: Symbol, mode: TerminalMode<P>) -> Self {
        if let Symbol::Terminal(index) = terminal {
            self.modes.insert(index, mode);
        }
        self
    }

    pub(crate) fn mode_of(&self, terminal: usize) -> Option<&TerminalMode<P>> {
        self.modes.get(&terminal)
    }
}

impl<P: Param> Default for ParseConfig<P> {
    fn default() -> Self {
        Self::new()
    }
}

/// Counters accumulated over one parse, sub-parses included.
#[derive(Debug, Clone, Default)]
pub struct ParseMetrics {
    /// Chart positions fully computed.
    pub positions: usize,
    /// Chart insertions that stuck (duplicates excluded).
    pub items: usize,
    /// Terminal keys whose tokens were discovered.
    pub keys_queried: usize,
    /// Tokens discovered across sub-parses and the lexer.
    pub tokens_found: usize,
    /// Tokens admitted by the selector.
    pub tokens_selected: usize,
    /// Recursive terminal parses run.
    pub sub_parses: usize,
    /// Wall time of the top-level parse. Not accumulated by [`merge`](Self::merge):
    /// sub-parse time is already inside the parent's clock.
    pub elapsed: Duration,
}

impl ParseMetrics {
    /// Fold a sub-parse's counters into this parse's totals.
    pub fn merge(&mut self, other: &Self) {
        self.positions += other.positions;
        self.items += other.items;
        self.keys_queried += other.keys_queried;
        self.tokens_found += other.tokens_found;
        self.tokens_selected += other.tokens_selected;
        self.sub_parses += other.sub_parses;
    }
}
