//! Grammar definition: symbols, rules, and the assembled [`Grammar`].
//!
//! A grammar owns its rules plus the three user policies the engine calls
//! back into: the [`Lexer`], the [`Selector`], and the
//! [`ResultBuilder`](crate::ResultBuilder). Everything else about a parse
//! is per-call configuration.

pub mod builder;
pub mod rule;
pub mod symbol;

pub use builder::GrammarBuilder;
pub use rule::{Rule, RuleEval};
pub use symbol::Symbol;

use std::fmt;
use std::hash::Hash;

use compact_str::CompactString;
use hashbrown::HashMap;

use crate::engine::{ParseConfig, ParseResult, Parser};
use crate::forest::ResultBuilder;
use crate::input::Input;
use crate::lexer::{Lexer, Selector};

/// A parameter value threaded through symbols during parsing.
///
/// Blanket-implemented; user types only need the listed bounds.
pub trait Param: Clone + Eq + Hash + fmt::Debug {}

impl<T: Clone + Eq + Hash + fmt::Debug> Param for T {}

/// A rule evaluation environment. `clone` must produce an independent
/// copy: the engine clones on every item transition because items fan out.
pub trait Env: Clone + fmt::Debug {}

impl<T: Clone + fmt::Debug> Env for T {}

/// A constructed parse result.
pub trait Value: Clone + fmt::Debug {}

impl<T: Clone + fmt::Debug> Value for T {}

/// An immutable grammar: indexed rules plus the user policies.
///
/// Built through [`GrammarBuilder`]; validated on construction.
pub struct Grammar<E, P, V> {
    rules: Vec<Rule<E, P>>,
    rules_by_lhs: HashMap<Symbol, Vec<usize>, ahash::RandomState>,
    terminals: Vec<CompactString>,
    nonterminals: Vec<CompactString>,
    lexer: Box<dyn Lexer<P, V>>,
    selector: Box<dyn Selector<P, V>>,
    results: Box<dyn ResultBuilder<P, V>>,
}

impl<E: Env, P: Param, V: Value> Grammar<E, P, V> {
    pub(crate) fn assemble(
        rules: Vec<Rule<E, P>>,
        terminals: Vec<CompactString>,
        nonterminals: Vec<CompactString>,
        lexer: Box<dyn Lexer<P, V>>,
        selector: Box<dyn Selector<P, V>>,
        results: Box<dyn ResultBuilder<P, V>>,
    ) -> Self {
        let mut rules_by_lhs: HashMap<Symbol, Vec<usize>, ahash::RandomState> =
            HashMap::with_hasher(ahash::RandomState::new());
        for (index, rule) in rules.iter().enumerate() {
            rules_by_lhs.entry(rule.lhs()).or_default().push(index);
        }
        Self {
            rules,
            rules_by_lhs,
            terminals,
            nonterminals,
            lexer,
            selector,
            results,
        }
    }

    /// The rule indices whose left-hand side is `symbol`.
    #[must_use]
    pub fn rules_of(&self, symbol: Symbol) -> &[usize] {
        self.rules_by_lhs
            .get(&symbol)
            .map_or(&[][..], Vec::as_slice)
    }

    pub(crate) fn rule(&self, index: usize) -> &Rule<E, P> {
        &self.rules[index]
    }

    pub fn rules(&self) -> impl Iterator<Item = &Rule<E, P>> {
        self.rules.iter()
    }

    #[must_use]
    pub fn terminal_count(&self) -> usize {
        self.terminals.len()
    }

    #[must_use]
    pub fn nonterminal_count(&self) -> usize {
        self.nonterminals.len()
    }

    /// The declared name of a symbol, or `"?"` for a dangling index.
    #[must_use]
    pub fn symbol_name(&self, symbol: Symbol) -> &str {
        let name = match symbol {
            Symbol::Terminal(index) => self.terminals.get(index),
            Symbol::Nonterminal(index) => self.nonterminals.get(index),
        };
        name.map_or("?", CompactString::as_str)
    }

    pub(crate) fn lexer(&self) -> &dyn Lexer<P, V> {
        self.lexer.as_ref()
    }

    pub(crate) fn selector(&self) -> &dyn Selector<P, V> {
        self.selector.as_ref()
    }

    pub(crate) fn results(&self) -> &dyn ResultBuilder<P, V> {
        self.results.as_ref()
    }

    /// Parse `symbol` from `position` with input parameter `param`.
    ///
    /// Convenience over [`Parser`]; use a `Parser` directly to read the
    /// metrics of a parse afterwards.
    pub fn parse(
        &self,
        input: &dyn Input,
        position: usize,
        symbol: Symbol,
        param: P,
        config: &ParseConfig<P>,
    ) -> ParseResult<P, V> {
        Parser::new(self, config.clone()).parse(input, position, symbol, param)
    }
}

impl<E, P, V> fmt::Debug for Grammar<E, P, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grammar")
            .field("rules", &self.rules.len())
            .field("terminals", &self.terminals.len())
            .field("nonterminals", &self.nonterminals.len())
            .finish_non_exhaustive()
    }
}

impl<E: Env, P: Param, V: Value> fmt::Display for Grammar<E, P, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, rule) in self.rules.iter().enumerate() {
            write!(f, "{index}: {}", self.quoted(rule.lhs()))?;
            write!(f, " ->")?;
            if rule.rhs().is_empty() {
                write!(f, " <empty>")?;
            }
            for &symbol in rule.rhs() {
                write!(f, " {}", self.quoted(symbol))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl<E: Env, P: Param, V: Value> Grammar<E, P, V> {
    fn quoted(&self, symbol: Symbol) -> String {
        let name = self.symbol_name(symbol);
        if symbol.is_terminal() {
            format!("'{name}'")
        } else {
            name.to_string()
        }
    }
}
