//! Rules and their evaluation chains.

use std::fmt;

use smallvec::{smallvec, SmallVec};

use crate::engine::chart::Item;
use crate::grammar::{Env, Param, Symbol, Value};

/// The evaluation function of one rule.
///
/// Called once per stage of an item's life: stage `0` with the left-hand
/// input parameter alone, stage `d + 1` after the `d`-th right-hand symbol
/// has been consumed. The returned parameter is the input of the next
/// right-hand symbol, or the left-hand output at the final stage. Returning
/// `None` rejects the derivation branch.
pub type RuleEval<E, P> = Box<dyn Fn(&mut E, usize, &[P]) -> Option<P>>;

/// One production `lhs -> rhs[0] .. rhs[n-1]`.
///
/// The rule's position in [`Grammar::rules`](crate::Grammar) is its
/// identity. A terminal `lhs` defines a scannerless terminal: the terminal's
/// language is given by its own rules and parsed recursively.
pub struct Rule<E, P> {
    pub(crate) lhs: Symbol,
    pub(crate) rhs: Vec<Symbol>,
    pub(crate) initial_env: E,
    pub(crate) eval: RuleEval<E, P>,
}

impl<E: Env, P: Param> Rule<E, P> {
    pub(crate) fn new(
        lhs: Symbol,
        rhs: Vec<Symbol>,
        initial_env: E,
        eval: impl Fn(&mut E, usize, &[P]) -> Option<P> + 'static,
    ) -> Self {
        Self {
            lhs,
            rhs,
            initial_env,
            eval: Box::new(eval),
        }
    }

    #[must_use]
    pub fn lhs(&self) -> Symbol {
        self.lhs
    }

    #[must_use]
    pub fn rhs(&self) -> &[Symbol] {
        &self.rhs
    }

    /// Start an item for this rule at chart position `at` with left-hand
    /// input `input`. `None` if stage 0 of the evaluation chain rejects.
    pub(crate) fn initial_item<V: Value>(
        &self,
        rule: usize,
        at: usize,
        input: P,
    ) -> Option<Item<E, P, V>> {
        let mut env = self.initial_env.clone();
        let mut values: SmallVec<[P; 6]> = smallvec![input];
        let next = (self.eval)(&mut env, 0, &values)?;
        values.push(next);
        Some(Item::new(rule, env, values, SmallVec::new(), smallvec![at]))
    }

    /// Advance `item` over its next symbol, given that symbol's output
    /// parameter, its optional result, and the chart position reached.
    ///
    /// The environment is cloned so sibling derivations stay independent.
    /// `None` if the evaluation chain rejects the extended prefix.
    pub(crate) fn next_item<V: Value>(
        &self,
        item: &Item<E, P, V>,
        output: P,
        result: Option<V>,
        reached: usize,
    ) -> Option<Item<E, P, V>> {
        let mut env = item.env().clone();
        let mut values: SmallVec<[P; 6]> = item.values().iter().cloned().collect();
        values.push(output);
        let next = (self.eval)(&mut env, item.dot() + 1, &values)?;
        values.push(next);
        let mut results: SmallVec<[Option<V>; 3]> = item.results().iter().cloned().collect();
        results.push(result);
        let mut indices: SmallVec<[usize; 4]> = item.indices().iter().copied().collect();
        indices.push(reached);
        Some(Item::new(item.rule(), env, values, results, indices))
    }

    /// Would [`next_item`](Self::next_item) succeed for `output`?
    ///
    /// Trial-runs the evaluation chain on cloned state without building the
    /// successor. Used by the modified-semantics token filter.
    pub(crate) fn has_next_item<V: Value>(&self, item: &Item<E, P, V>, output: P) -> bool {
        let mut env = item.env().clone();
        let mut values: SmallVec<[P; 6]> = item.values().iter().cloned().collect();
        values.push(output);
        (self.eval)(&mut env, item.dot() + 1, &values).is_some()
    }
}

impl<E, P> fmt::Debug for Rule<E, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("lhs", &self.lhs)
            .field("rhs", &self.rhs)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sum_rule() -> Rule<(), u32> {
        // N0 -> N1 N1, threading a running sum through the chain.
        Rule::new(
            Symbol::Nonterminal(0),
            vec![Symbol::Nonterminal(1), Symbol::Nonterminal(1)],
            (),
            |_env, stage, values| match stage {
                0 => Some(values[0]),
                1 => Some(values[0] + values[2]),
                2 => Some(values[2] + values[4]),
                _ => None,
            },
        )
    }

    #[test]
    fn initial_item_runs_stage_zero() {
        let rule = sum_rule();
        let item = rule.initial_item::<String>(0, 5, 7).unwrap();
        assert_eq!(item.values(), &[7, 7]);
        assert_eq!(item.indices(), &[5]);
        assert_eq!(item.dot(), 0);
    }

    #[test]
    fn next_item_extends_every_sequence() {
        let rule = sum_rule();
        let item = rule.initial_item::<String>(0, 5, 7).unwrap();
        let item = rule.next_item(&item, 3, None, 6).unwrap();
        assert_eq!(item.values(), &[7, 7, 3, 10]);
        assert_eq!(item.indices(), &[5, 6]);
        assert_eq!(item.results(), &[None]);
        assert_eq!(item.dot(), 1);

        let item = rule.next_item(&item, 4, Some("leaf".to_string()), 8).unwrap();
        assert_eq!(item.values(), &[7, 7, 3, 10, 4, 14]);
        assert_eq!(item.indices(), &[5, 6, 8]);
        assert_eq!(item.dot(), 2);
        assert_eq!(item.output(), &14);
    }

    #[test]
    fn rejecting_eval_drops_the_branch() {
        let rule: Rule<(), u32> = Rule::new(
            Symbol::Nonterminal(0),
            vec![Symbol::Terminal(0)],
            (),
            |_env, stage, values| match stage {
                0 if values[0] > 0 => Some(values[0]),
                _ => None,
            },
        );
        assert!(rule.initial_item::<String>(0, 0, 0).is_none());
        let item = rule.initial_item::<String>(0, 0, 1).unwrap();
        assert!(rule.next_item(&item, 9, None, 1).is_none());
        assert!(!rule.has_next_item(&item, 9));
    }
}
