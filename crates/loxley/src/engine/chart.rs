//! The chart: items and bins.

use std::hash::{Hash, Hasher};

use hashbrown::HashSet;
use smallvec::SmallVec;

use crate::grammar::{Env, Param, Rule, Symbol, Value};

/// One Earley item.
///
/// `values` interleaves the parameters threaded through the rule's
/// evaluation chain: the left-hand input first, then an (input, output)
/// pair per consumed right-hand symbol, with the *next* symbol's input
/// always last while the item is incomplete. Once the dot reaches the end
/// of the rule the last entry is the left-hand output instead, so the
/// length is uniformly `2 + 2 * dot`.
///
/// `indices` holds the origin followed by the chart position reached after
/// each consumed symbol; `results` holds the scanned payload per consumed
/// symbol (`None` for nonterminals, whose results are rebuilt from the
/// chart afterwards).
#[derive(Debug, Clone)]
pub(crate) struct Item<E, P, V> {
    rule: usize,
    env: E,
    values: SmallVec<[P; 6]>,
    results: SmallVec<[Option<V>; 3]>,
    indices: SmallVec<[usize; 4]>,
}

impl<E: Env, P: Param, V: Value> Item<E, P, V> {
    pub(crate) fn new(
        rule: usize,
        env: E,
        values: SmallVec<[P; 6]>,
        results: SmallVec<[Option<V>; 3]>,
        indices: SmallVec<[usize; 4]>,
    ) -> Self {
        debug_assert_eq!(values.len(), 2 * indices.len());
        debug_assert_eq!(results.len(), indices.len() - 1);
        Self {
            rule,
            env,
            values,
            results,
            indices,
        }
    }

    pub(crate) fn rule(&self) -> usize {
        self.rule
    }

    pub(crate) fn env(&self) -> &E {
        &self.env
    }

    pub(crate) fn values(&self) -> &[P] {
        &self.values
    }

    pub(crate) fn results(&self) -> &[Option<V>] {
        &self.results
    }

    pub(crate) fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub(crate) fn dot(&self) -> usize {
        self.indices.len() - 1
    }

    /// Where this item's derivation started.
    pub(crate) fn origin(&self) -> usize {
        self.indices[0]
    }

    /// The left-hand input parameter.
    pub(crate) fn input(&self) -> &P {
        &self.values[0]
    }

    /// The input parameter handed to the symbol after the dot.
    /// Only meaningful while the item is incomplete.
    pub(crate) fn next_param(&self) -> &P {
        &self.values[self.values.len() - 1]
    }

    /// The left-hand output parameter of a completed item.
    pub(crate) fn output(&self) -> &P {
        &self.values[self.values.len() - 1]
    }

    pub(crate) fn is_complete(&self, rule: &Rule<E, P>) -> bool {
        self.dot() == rule.rhs().len()
    }

    /// The symbol after the dot, or `None` for a completed item.
    pub(crate) fn next_symbol(&self, rule: &Rule<E, P>) -> Option<Symbol> {
        rule.rhs().get(self.dot()).copied()
    }

    /// The `i`-th consumed right-hand symbol's parameters, payload, and span.
    pub(crate) fn child(&self, i: usize) -> Child<'_, P, V> {
        Child {
            input: &self.values[2 * i + 1],
            output: &self.values[2 * i + 2],
            result: self.results[i].as_ref(),
            from: self.indices[i],
            to: self.indices[i + 1],
        }
    }

    fn core(&self) -> ItemCore<P> {
        ItemCore {
            rule: self.rule,
            values: self.values.clone(),
            indices: self.indices.clone(),
        }
    }
}

/// A consumed right-hand symbol as seen from its parent item.
pub(crate) struct Child<'a, P, V> {
    pub input: &'a P,
    pub output: &'a P,
    pub result: Option<&'a V>,
    pub from: usize,
    pub to: usize,
}

// Item identity is (rule, values, indices); the environment and the stored
// results do not participate. Items differing only there collapse to one
// chart entry, which is what keeps the chart finite while alternative
// parses stay recoverable through result construction.
impl<E: Env, P: Param, V: Value> PartialEq for Item<E, P, V> {
    fn eq(&self, other: &Self) -> bool {
        self.rule == other.rule && self.values == other.values && self.indices == other.indices
    }
}

impl<E: Env, P: Param, V: Value> Eq for Item<E, P, V> {}

impl<E: Env, P: Param, V: Value> Hash for Item<E, P, V> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rule.hash(state);
        self.values.hash(state);
        self.indices.hash(state);
    }
}

/// The identity triple alone, used by bins for membership checks without
/// holding a second environment clone.
#[derive(PartialEq, Eq, Hash)]
struct ItemCore<P> {
    rule: usize,
    values: SmallVec<[P; 6]>,
    indices: SmallVec<[usize; 4]>,
}

/// The set of items whose dot sits at one chart position.
///
/// Kept in insertion order so fixpoint passes and result construction
/// iterate deterministically; membership is tracked separately under item
/// identity.
pub(crate) struct Bin<E, P, V> {
    items: Vec<Item<E, P, V>>,
    seen: HashSet<ItemCore<P>>,
}

impl<E: Env, P: Param, V: Value> Bin<E, P, V> {
    pub(crate) fn new() -> Self {
        Self {
            items: Vec::new(),
            seen: HashSet::new(),
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    /// Insert under item identity; returns whether the item was new.
    pub(crate) fn insert(&mut self, item: Item<E, P, V>) -> bool {
        if !self.seen.insert(item.core()) {
            return false;
        }
        self.items.push(item);
        true
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Item<E, P, V>> {
        self.items.iter()
    }

    /// Clone the current contents for iteration while the bin grows.
    pub(crate) fn snapshot(&self) -> Vec<Item<E, P, V>> {
        self.items.clone()
    }
}

/// Bins indexed by chart position relative to the parse's start offset.
pub(crate) struct Chart<E, P, V> {
    bins: Vec<Bin<E, P, V>>,
}

impl<E: Env, P: Param, V: Value> Chart<E, P, V> {
    pub(crate) fn new() -> Self {
        Self {
            bins: vec![Bin::new()],
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.bins.len()
    }

    pub(crate) fn bin(&self, index: usize) -> &Bin<E, P, V> {
        &self.bins[index]
    }

    pub(crate) fn bins(&self) -> &[Bin<E, P, V>] {
        &self.bins
    }

    /// Insert into the bin at `index`, growing the chart as needed.
    pub(crate) fn insert(&mut self, index: usize, item: Item<E, P, V>) -> bool {
        while self.bins.len() <= index {
            self.bins.push(Bin::new());
        }
        self.bins[index].insert(item)
    }
}
