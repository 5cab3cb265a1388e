//! Reusable fixtures for tests and examples.
//!
//! Nothing here is required to use the engine; these are the small
//! concrete policies the crate's own tests lean on.

use hashbrown::HashMap;

use crate::forest::{CompletedRhs, ItemKey, ResultBuilder};
use crate::grammar::{Param, Symbol};
use crate::input::Input;
use crate::lexer::{Lexer, TerminalKey, Token};

/// Builds s-expression strings, one parenthesized group per rule instance.
///
/// Terminals render as their scanned payload when one exists, the
/// symbol's display form otherwise; a child whose construction yielded
/// nothing renders as `?`. Ambiguous keys merge into a sorted
/// `{alt|alt}` group, so assertions stay deterministic.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sexp;

impl<P: Param> ResultBuilder<P, String> for Sexp {
    fn eval_rule(
        &self,
        _input: &dyn Input,
        key: &ItemKey<P>,
        rhs: &CompletedRhs<P, String>,
    ) -> Option<String> {
        let mut out = format!("({}", key.symbol);
        for child in rhs.children() {
            out.push(' ');
            match &child.result {
                Some(result) => out.push_str(result),
                None => out.push('?'),
            }
        }
        out.push(')');
        Some(out)
    }

    fn terminal(&self, key: &ItemKey<P>, result: Option<&String>) -> Option<String> {
        Some(result.cloned().unwrap_or_else(|| key.symbol.to_string()))
    }

    fn merge(&self, _key: &ItemKey<P>, mut alternatives: Vec<String>) -> Option<String> {
        match alternatives.len() {
            0 => None,
            1 => alternatives.pop(),
            _ => {
                alternatives.sort();
                Some(format!("{{{}}}", alternatives.join("|")))
            }
        }
    }
}

/// Single-character lexer driven by per-terminal predicates.
///
/// A matching character becomes a length-1 token whose output is the input
/// parameter passed through and whose payload is the character itself.
#[derive(Default)]
pub struct CharLexer {
    classes: HashMap<usize, Box<dyn Fn(char) -> bool>>,
}

impl CharLexer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Let `terminal` match any single character accepted by `class`.
    #[must_use]
    pub fn class(mut self, terminal: Symbol, class: impl Fn(char) -> bool + 'static) -> Self {
        if let Symbol::Terminal(index) = terminal {
            self.classes.insert(index, Box::new(class));
        }
        self
    }
}

impl<P: Param> Lexer<P, String> for CharLexer {
    fn lex(
        &self,
        input: &dyn Input,
        position: usize,
        key: &TerminalKey<P>,
    ) -> Vec<Token<P, String>> {
        let Some(class) = self.classes.get(&key.terminal) else {
            return Vec::new();
        };
        match input.at(position) {
            Some(ch) if class(ch) => {
                vec![Token::with_result(1, key.input.clone(), ch.to_string())]
            }
            _ => Vec::new(),
        }
    }
}
