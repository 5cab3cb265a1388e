//! Grammar construction and validation.

use compact_str::CompactString;

use crate::error::GrammarError;
use crate::forest::{Discard, ResultBuilder};
use crate::grammar::{Env, Grammar, Param, Rule, Symbol, Value};
use crate::lexer::{EmptyLexer, Lexer, SelectAll, Selector};

/// Builds a [`Grammar`].
///
/// Symbols are declared first (each declaration hands back the [`Symbol`]
/// to use in rules), rules are added in order (a rule's position is its
/// index), and [`build`](Self::build) validates the whole description.
///
/// The lexer defaults to [`EmptyLexer`], the selector to [`SelectAll`],
/// and the result builder to [`Discard`].
pub struct GrammarBuilder<E, P, V> {
    terminals: Vec<CompactString>,
    nonterminals: Vec<CompactString>,
    rules: Vec<Rule<E, P>>,
    lexer: Box<dyn Lexer<P, V>>,
    selector: Box<dyn Selector<P, V>>,
    results: Box<dyn ResultBuilder<P, V>>,
}

impl<E: Env, P: Param, V: Value> GrammarBuilder<E, P, V> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            terminals: Vec::new(),
            nonterminals: Vec::new(),
            rules: Vec::new(),
            lexer: Box::new(EmptyLexer),
            selector: Box::new(SelectAll),
            results: Box::new(Discard),
        }
    }

    /// Declare a terminal.
    pub fn terminal(&mut self, name: &str) -> Symbol {
        self.terminals.push(CompactString::new(name));
        Symbol::Terminal(self.terminals.len() - 1)
    }

    /// Declare a nonterminal.
    pub fn nonterminal(&mut self, name: &str) -> Symbol {
        self.nonterminals.push(CompactString::new(name));
        Symbol::Nonterminal(self.nonterminals.len() - 1)
    }

    /// Add the rule `lhs -> rhs` with its evaluation function.
    ///
    /// A terminal `lhs` makes the terminal scannerless: the engine parses
    /// it recursively from these rules.
    #[must_use]
    pub fn rule(
        mut self,
        lhs: Symbol,
        rhs: Vec<Symbol>,
        initial_env: E,
        eval: impl Fn(&mut E, usize, &[P]) -> Option<P> + 'static,
    ) -> Self {
        self.rules.push(Rule::new(lhs, rhs, initial_env, eval));
        self
    }

    #[must_use]
    pub fn lexer(mut self, lexer: impl Lexer<P, V> + 'static) -> Self {
        self.lexer = Box::new(lexer);
        self
    }

    #[must_use]
    pub fn selector(mut self, selector: impl Selector<P, V> + 'static) -> Self {
        self.selector = Box::new(selector);
        self
    }

    #[must_use]
    pub fn results(mut self, results: impl ResultBuilder<P, V> + 'static) -> Self {
        self.results = Box::new(results);
        self
    }

    /// Validate and assemble the grammar.
    ///
    /// # Errors
    ///
    /// Returns a [`GrammarError`] when any rule refers to a symbol index
    /// outside the declared index spaces.
    pub fn build(self) -> Result<Grammar<E, P, V>, GrammarError> {
        for (index, rule) in self.rules.iter().enumerate() {
            for symbol in std::iter::once(rule.lhs()).chain(rule.rhs().iter().copied()) {
                self.check(index, symbol)?;
            }
        }
        Ok(Grammar::assemble(
            self.rules,
            self.terminals,
            self.nonterminals,
            self.lexer,
            self.selector,
            self.results,
        ))
    }

    fn check(&self, rule: usize, symbol: Symbol) -> Result<(), GrammarError> {
        match symbol {
            Symbol::Terminal(index) if index >= self.terminals.len() => {
                Err(GrammarError::TerminalOutOfRange {
                    rule,
                    index,
                    declared: self.terminals.len(),
                })
            }
            Symbol::Nonterminal(index) if index >= self.nonterminals.len() => {
                Err(GrammarError::NonterminalOutOfRange {
                    rule,
                    index,
                    declared: self.nonterminals.len(),
                })
            }
            _ => Ok(()),
        }
    }
}

impl<E: Env, P: Param, V: Value> Default for GrammarBuilder<E, P, V> {
    fn default() -> Self {
        Self::new()
    }
}
