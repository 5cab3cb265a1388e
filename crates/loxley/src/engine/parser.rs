//! The chart fixpoint and the parse driver.

use std::time::Instant;

use hashbrown::{HashMap, HashSet};

use crate::engine::chart::{Chart, Item};
use crate::engine::config::{ParseConfig, ParseMetrics};
use crate::forest;
use crate::grammar::{Env, Grammar, Param, Symbol, Value};
use crate::input::Input;
use crate::lexer::{TerminalKey, Tokens};

/// The outcome of a parse.
#[derive(Debug, Clone)]
pub enum ParseResult<P, V> {
    Success {
        /// Characters consumed from the start position.
        length: usize,
        /// One entry per recognized output parameter, each mapped to the
        /// merged result constructed for it (which may be `None`).
        results: HashMap<P, Option<V>>,
    },
    Failed {
        /// The furthest chart position reached before the parse got stuck.
        position: usize,
    },
}

impl<P, V> ParseResult<P, V> {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// The consumed length on success.
    #[must_use]
    pub const fn length(&self) -> Option<usize> {
        match self {
            Self::Success { length, .. } => Some(*length),
            Self::Failed { .. } => None,
        }
    }
}

impl<P: Param, V: PartialEq> PartialEq for ParseResult<P, V> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Self::Success {
                    length: a,
                    results: x,
                },
                Self::Success {
                    length: b,
                    results: y,
                },
            ) => a == b && x == y,
            (Self::Failed { position: a }, Self::Failed { position: b }) => a == b,
            _ => false,
        }
    }
}

/// Internal parse outcome. Keeps the recognized outputs in discovery order
/// so everything downstream of a sub-parse stays deterministic; the public
/// [`ParseResult`] map is only built at the top level.
pub(crate) enum RawParse<P, V> {
    Success {
        length: usize,
        results: Vec<(P, Option<V>)>,
    },
    Failed {
        position: usize,
    },
}

/// Runs parses against one grammar.
///
/// Holds the per-parse configuration and keeps the metrics of the most
/// recent parse. The chart itself lives only for the duration of a call.
pub struct Parser<'g, E, P, V> {
    grammar: &'g Grammar<E, P, V>,
    config: ParseConfig<P>,
    metrics: ParseMetrics,
}

impl<'g, E: Env, P: Param, V: Value> Parser<'g, E, P, V> {
    #[must_use]
    pub fn new(grammar: &'g Grammar<E, P, V>, config: ParseConfig<P>) -> Self {
        Self {
            grammar,
            config,
            metrics: ParseMetrics::default(),
        }
    }

    /// Counters of the most recent [`parse`](Self::parse) call.
    #[must_use]
    pub fn metrics(&self) -> &ParseMetrics {
        &self.metrics
    }

    /// Parse `symbol` from `position`, handing it `param` as input.
    ///
    /// A terminal `symbol` is parsed from its own rules (it joins the
    /// instance's treated-as-nonterminal set), which is how sub-parsers are
    /// spawned internally as well.
    pub fn parse(
        &mut self,
        input: &dyn Input,
        position: usize,
        symbol: Symbol,
        param: P,
    ) -> ParseResult<P, V> {
        let started = Instant::now();
        let mut treated = HashSet::new();
        if let Symbol::Terminal(index) = symbol {
            treated.insert(index);
        }
        let raw;
        let metrics;
        {
            let mut instance =
                Instance::new(self.grammar, &self.config, input, position, treated);
            raw = instance.run(symbol, param);
            metrics = instance.metrics;
        }
        self.metrics = metrics;
        self.metrics.elapsed = started.elapsed();
        match raw {
            RawParse::Success { length, results } => ParseResult::Success {
                length,
                results: results.into_iter().collect(),
            },
            RawParse::Failed { position } => ParseResult::Failed { position },
        }
    }
}

/// One parser instantiation: a chart over one input span.
///
/// Sub-parses get their own instance (fresh chart, fresh memoization)
/// sharing only the grammar, the configuration, and the input.
pub(crate) struct Instance<'a, E, P, V> {
    pub(crate) grammar: &'a Grammar<E, P, V>,
    pub(crate) config: &'a ParseConfig<P>,
    pub(crate) input: &'a dyn Input,
    pub(crate) start: usize,
    /// Terminal indices handled by predict/complete instead of scan.
    /// Grows only downward through recursion: each sub-parser adds its own
    /// initial terminal.
    pub(crate) treated: HashSet<usize>,
    pub(crate) chart: Chart<E, P, V>,
    pub(crate) metrics: ParseMetrics,
}

impl<'a, E: Env, P: Param, V: Value> Instance<'a, E, P, V> {
    pub(crate) fn new(
        grammar: &'a Grammar<E, P, V>,
        config: &'a ParseConfig<P>,
        input: &'a dyn Input,
        start: usize,
        treated: HashSet<usize>,
    ) -> Self {
        Self {
            grammar,
            config,
            input,
            start,
            treated,
            chart: Chart::new(),
            metrics: ParseMetrics::default(),
        }
    }

    pub(crate) fn run(&mut self, symbol: Symbol, param: P) -> RawParse<P, V> {
        for &rule_index in self.grammar.rules_of(symbol) {
            let seed = self
                .grammar
                .rule(rule_index)
                .initial_item(rule_index, self.start, param.clone());
            if let Some(item) = seed {
                if self.chart.insert(0, item) {
                    self.metrics.items += 1;
                }
            }
        }

        let mut position = 0;
        while position < self.chart.len() {
            self.compute_bin(position);
            self.metrics.positions += 1;
            position += 1;
        }

        // Recognition: the furthest bin holding a completed item for the
        // requested symbol and input parameter wins.
        for end in (0..self.chart.len()).rev() {
            let recognized = self.chart.bin(end).iter().any(|item| {
                let rule = self.grammar.rule(item.rule());
                rule.lhs() == symbol
                    && item.is_complete(rule)
                    && item.origin() == self.start
                    && item.input() == &param
            });
            if recognized {
                let results = {
                    let mut builder = forest::Builder::new(
                        self.grammar,
                        self.input,
                        &self.chart.bins()[..=end],
                        self.start,
                        &self.treated,
                    );
                    builder.construct(symbol, &param)
                };
                return RawParse::Success {
                    length: end,
                    results,
                };
            }
        }

        let mut position = self.start;
        for index in (0..self.chart.len()).rev() {
            if !self.chart.bin(index).is_empty() {
                position = self.start + index;
                break;
            }
        }
        RawParse::Failed { position }
    }

    /// Repeat predict, complete, and scan over bin `at` until a full pass
    /// adds nothing anywhere. Returns whether any pass changed the chart.
    pub(crate) fn pi(&mut self, at: usize, tokens: &Tokens<P, V>) -> bool {
        let mut any = false;
        loop {
            let predicted = self.predict(at);
            let completed = self.complete(at);
            let scanned = self.scan(at, tokens);
            if predicted || completed || scanned {
                any = true;
            } else {
                break;
            }
        }
        any
    }

    /// For items waiting on a symbol handled nonterminal-style, seed that
    /// symbol's rules at this position with the waiting item's parameter.
    fn predict(&mut self, at: usize) -> bool {
        let snapshot = self.chart.bin(at).snapshot();
        let mut fresh = Vec::new();
        for item in &snapshot {
            let rule = self.grammar.rule(item.rule());
            let Some(symbol) = item.next_symbol(rule) else {
                continue;
            };
            if !self.treats_as_nonterminal(symbol) {
                continue;
            }
            for &rule_index in self.grammar.rules_of(symbol) {
                let seed = self.grammar.rule(rule_index).initial_item(
                    rule_index,
                    self.start + at,
                    item.next_param().clone(),
                );
                if let Some(initial) = seed {
                    fresh.push((at, initial));
                }
            }
        }
        self.insert_all(fresh)
    }

    /// For completed items, advance the items at their origin that were
    /// waiting for the completed symbol with a matching input parameter.
    /// Nonterminal results are not carried; construction rebuilds them.
    fn complete(&mut self, at: usize) -> bool {
        let snapshot = self.chart.bin(at).snapshot();
        let mut fresh = Vec::new();
        for item in &snapshot {
            let rule = self.grammar.rule(item.rule());
            if !item.is_complete(rule) {
                continue;
            }
            let origin = item.origin() - self.start;
            for waiting in self.chart.bin(origin).iter() {
                let waiting_rule = self.grammar.rule(waiting.rule());
                if waiting.next_symbol(waiting_rule) != Some(rule.lhs()) {
                    continue;
                }
                if waiting.next_param() != item.input() {
                    continue;
                }
                let advanced = waiting_rule.next_item(
                    waiting,
                    item.output().clone(),
                    None,
                    self.start + at,
                );
                if let Some(next) = advanced {
                    fresh.push((at, next));
                }
            }
        }
        self.insert_all(fresh)
    }

    /// Advance items over the selected tokens of the terminals they wait
    /// on. The only pass that can grow the chart; zero-length tokens land
    /// back in the current bin.
    pub(crate) fn scan(&mut self, at: usize, tokens: &Tokens<P, V>) -> bool {
        let snapshot = self.chart.bin(at).snapshot();
        let mut fresh = Vec::new();
        for item in &snapshot {
            let rule = self.grammar.rule(item.rule());
            let Some(Symbol::Terminal(terminal)) = item.next_symbol(rule) else {
                continue;
            };
            if self.treated.contains(&terminal) {
                continue;
            }
            let key = TerminalKey {
                terminal,
                input: item.next_param().clone(),
            };
            for token in tokens.tokens_for(&key) {
                let advanced = rule.next_item(
                    item,
                    token.output.clone(),
                    token.result.clone(),
                    self.start + at + token.length,
                );
                if let Some(next) = advanced {
                    fresh.push((at + token.length, next));
                }
            }
        }
        self.insert_all(fresh)
    }

    pub(crate) fn treats_as_nonterminal(&self, symbol: Symbol) -> bool {
        match symbol {
            Symbol::Nonterminal(_) => true,
            Symbol::Terminal(index) => self.treated.contains(&index),
        }
    }

    fn insert_all(&mut self, items: Vec<(usize, Item<E, P, V>)>) -> bool {
        let mut added = false;
        for (at, item) in items {
            if self.chart.insert(at, item) {
                self.metrics.items += 1;
                added = true;
            }
        }
        added
    }
}
