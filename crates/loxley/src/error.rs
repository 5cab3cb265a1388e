//! Construction-time errors.
//!
//! Parse failures are not errors: they are reported through
//! [`ParseResult::Failed`](crate::ParseResult). The variants here flag
//! malformed grammar descriptions and are raised by
//! [`GrammarBuilder::build`](crate::GrammarBuilder::build).

use thiserror::Error;

/// A structural defect detected while building a grammar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    #[error("rule {rule} refers to terminal {index}, but only {declared} terminals are declared")]
    TerminalOutOfRange {
        rule: usize,
        index: usize,
        declared: usize,
    },

    #[error("rule {rule} refers to nonterminal {index}, but only {declared} nonterminals are declared")]
    NonterminalOutOfRange {
        rule: usize,
        index: usize,
        declared: usize,
    },
}
