//! Result construction over a finished chart.
//!
//! After recognition the chart is a packed forest: every completed item is
//! one way of deriving its key `(symbol, input, output, start, end)`. The
//! builder walks that forest bottom-up with an explicit work stack (the
//! nesting depth of a grammar is arbitrary, so host recursion is out),
//! memoizes per key, and hands assembly to a user [`ResultBuilder`].

use hashbrown::HashMap;

use crate::engine::chart::{Bin, Item};
use crate::grammar::{Env, Grammar, Param, Symbol, Value};
use crate::input::Input;

/// Identifies one successful parse instance: a symbol recognized over
/// `start..end` with the given input and output parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemKey<P> {
    pub symbol: Symbol,
    pub input: P,
    pub output: P,
    pub start: usize,
    pub end: usize,
}

/// One consumed right-hand symbol of a completed rule.
#[derive(Debug, Clone)]
pub struct RhsChild<P, V> {
    pub symbol: Symbol,
    pub input: P,
    pub output: P,
    pub result: Option<V>,
    pub from: usize,
    pub to: usize,
}

/// A fully consumed right-hand side, presented to
/// [`ResultBuilder::eval_rule`].
#[derive(Debug, Clone)]
pub struct CompletedRhs<P, V> {
    rule: usize,
    children: Vec<RhsChild<P, V>>,
}

impl<P, V> CompletedRhs<P, V> {
    /// The index of the rule that was completed.
    #[must_use]
    pub const fn rule(&self) -> usize {
        self.rule
    }

    #[must_use]
    pub fn children(&self) -> &[RhsChild<P, V>] {
        &self.children
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.children.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

/// Assembles user results from the chart.
///
/// All three callbacks may return `None`; a `None` simply contributes no
/// alternative upstream.
pub trait ResultBuilder<P, V> {
    /// The contribution of one completed rule instance.
    fn eval_rule(
        &self,
        input: &dyn Input,
        key: &ItemKey<P>,
        rhs: &CompletedRhs<P, V>,
    ) -> Option<V>;

    /// Lift a scanned terminal's token payload into the result domain.
    fn terminal(&self, key: &ItemKey<P>, result: Option<&V>) -> Option<V>;

    /// Fold the non-`None` alternatives for one key into a single value.
    ///
    /// `alternatives` may be empty: every derivation of the key evaluated
    /// to `None`, or a dependency cycle was cut underneath it.
    fn merge(&self, key: &ItemKey<P>, alternatives: Vec<V>) -> Option<V>;
}

/// Discards everything: every callback returns `None`.
///
/// The default result builder; parses still report recognized lengths and
/// output parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct Discard;

impl<P, V> ResultBuilder<P, V> for Discard {
    fn eval_rule(
        &self,
        _input: &dyn Input,
        _key: &ItemKey<P>,
        _rhs: &CompletedRhs<P, V>,
    ) -> Option<V> {
        None
    }

    fn terminal(&self, _key: &ItemKey<P>, _result: Option<&V>) -> Option<V> {
        None
    }

    fn merge(&self, _key: &ItemKey<P>, _alternatives: Vec<V>) -> Option<V> {
        None
    }
}

/// Pure recognition: every key constructs `()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Recognize;

impl<P> ResultBuilder<P, ()> for Recognize {
    fn eval_rule(
        &self,
        _input: &dyn Input,
        _key: &ItemKey<P>,
        _rhs: &CompletedRhs<P, ()>,
    ) -> Option<()> {
        Some(())
    }

    fn terminal(&self, _key: &ItemKey<P>, _result: Option<&()>) -> Option<()> {
        Some(())
    }

    fn merge(&self, _key: &ItemKey<P>, _alternatives: Vec<()>) -> Option<()> {
        Some(())
    }
}

enum Entry<V> {
    /// The key is on the work stack; seeing it again is a cycle.
    Computing,
    Done(Option<V>),
}

enum Task<'a, E, P, V> {
    /// Produce the merged value of a key (cache-aware).
    StartKey(ItemKey<P>),
    /// Queue the children of one derivation of a key.
    StartItem(ItemKey<P>, &'a Item<E, P, V>),
    /// Pop the children's values and evaluate the rule instance.
    FinishItem(ItemKey<P>, &'a Item<E, P, V>, usize),
    /// Pop the per-derivation values, merge, and cache.
    FinishKey(ItemKey<P>, usize),
    /// Push a ready value.
    Emit(Option<V>),
}

/// Memoized bottom-up construction over a truncated chart.
pub(crate) struct Builder<'a, E, P, V> {
    grammar: &'a Grammar<E, P, V>,
    input: &'a dyn Input,
    bins: &'a [Bin<E, P, V>],
    start: usize,
    treated: &'a hashbrown::HashSet<usize>,
    cache: HashMap<ItemKey<P>, Entry<V>>,
}

impl<'a, E: Env, P: Param, V: Value> Builder<'a, E, P, V> {
    pub(crate) fn new(
        grammar: &'a Grammar<E, P, V>,
        input: &'a dyn Input,
        bins: &'a [Bin<E, P, V>],
        start: usize,
        treated: &'a hashbrown::HashSet<usize>,
    ) -> Self {
        Self {
            grammar,
            input,
            bins,
            start,
            treated,
            cache: HashMap::new(),
        }
    }

    /// Construct one result per output parameter recognized for `symbol`
    /// over the whole chart span. Output order follows the top bin.
    pub(crate) fn construct(&mut self, symbol: Symbol, param: &P) -> Vec<(P, Option<V>)> {
        let top = self.bins.len() - 1;
        let end = self.start + top;
        let mut outputs: Vec<P> = Vec::new();
        for item in self.bins[top].iter() {
            let rule = self.grammar.rule(item.rule());
            if rule.lhs() == symbol
                && item.is_complete(rule)
                && item.origin() == self.start
                && item.input() == param
            {
                let output = item.output().clone();
                if !outputs.contains(&output) {
                    outputs.push(output);
                }
            }
        }

        let mut results = Vec::with_capacity(outputs.len());
        for output in outputs {
            let key = ItemKey {
                symbol,
                input: param.clone(),
                output: output.clone(),
                start: self.start,
                end,
            };
            let value = self.run(key);
            results.push((output, value));
        }
        results
    }

    /// Drive the work stack until the value of `root` is on top.
    fn run(&mut self, root: ItemKey<P>) -> Option<V> {
        let mut tasks: Vec<Task<'a, E, P, V>> = vec![Task::StartKey(root)];
        let mut values: Vec<Option<V>> = Vec::new();

        while let Some(task) = tasks.pop() {
            match task {
                Task::StartKey(key) => match self.cache.get(&key) {
                    Some(Entry::Done(value)) => values.push(value.clone()),
                    // Cycle: cut it by contributing nothing to this key.
                    Some(Entry::Computing) => values.push(None),
                    None => {
                        self.cache.insert(key.clone(), Entry::Computing);
                        let items = self.find_items(&key);
                        tasks.push(Task::FinishKey(key.clone(), items.len()));
                        for item in items {
                            tasks.push(Task::StartItem(key.clone(), item));
                        }
                    }
                },
                Task::StartItem(key, item) => {
                    let rule = self.grammar.rule(item.rule());
                    let arity = rule.rhs().len();
                    tasks.push(Task::FinishItem(key, item, arity));
                    // Reverse order so the leftmost child runs first.
                    for index in (0..arity).rev() {
                        let symbol = rule.rhs()[index];
                        let child = item.child(index);
                        let child_key = ItemKey {
                            symbol,
                            input: child.input.clone(),
                            output: child.output.clone(),
                            start: child.from,
                            end: child.to,
                        };
                        if self.treats_as_nonterminal(symbol) {
                            tasks.push(Task::StartKey(child_key));
                        } else {
                            let lifted =
                                self.grammar.results().terminal(&child_key, child.result);
                            tasks.push(Task::Emit(lifted));
                        }
                    }
                }
                Task::FinishItem(key, item, arity) => {
                    let rule = self.grammar.rule(item.rule());
                    let mut children = Vec::with_capacity(arity);
                    for index in (0..arity).rev() {
                        let child = item.child(index);
                        children.push(RhsChild {
                            symbol: rule.rhs()[index],
                            input: child.input.clone(),
                            output: child.output.clone(),
                            result: values.pop().flatten(),
                            from: child.from,
                            to: child.to,
                        });
                    }
                    children.reverse();
                    let completed = CompletedRhs {
                        rule: item.rule(),
                        children,
                    };
                    values.push(self.grammar.results().eval_rule(self.input, &key, &completed));
                }
                Task::FinishKey(key, count) => {
                    // Items were pushed in bin order, so the last one
                    // resolved first and its value sits deepest; popping
                    // top-first hands back bin order directly.
                    let mut alternatives = Vec::new();
                    for _ in 0..count {
                        if let Some(value) = values.pop().flatten() {
                            alternatives.push(value);
                        }
                    }
                    let merged = self.grammar.results().merge(&key, alternatives);
                    self.cache.insert(key, Entry::Done(merged.clone()));
                    values.push(merged);
                }
                Task::Emit(value) => values.push(value),
            }
        }

        values.pop().flatten()
    }

    /// Completed items deriving `key`, in bin order.
    fn find_items(&self, key: &ItemKey<P>) -> Vec<&'a Item<E, P, V>> {
        let bin = &self.bins[key.end - self.start];
        bin.iter()
            .filter(|item| {
                let rule = self.grammar.rule(item.rule());
                rule.lhs() == key.symbol
                    && item.is_complete(rule)
                    && item.origin() == key.start
                    && item.input() == &key.input
                    && item.output() == &key.output
            })
            .collect()
    }

    fn treats_as_nonterminal(&self, symbol: Symbol) -> bool {
        match symbol {
            Symbol::Nonterminal(_) => true,
            Symbol::Terminal(index) => self.treated.contains(&index),
        }
    }
}
