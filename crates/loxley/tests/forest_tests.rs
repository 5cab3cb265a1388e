//! Result construction: memoization, cycles, and builder contracts.

use std::cell::RefCell;
use std::rc::Rc;

use loxley::testing::{CharLexer, Sexp};
use loxley::{
    CompletedRhs, Discard, Grammar, GrammarBuilder, Input, ItemKey, LiteralLexer, ParseConfig,
    ParseResult, Recognize, ResultBuilder, Symbol,
};

fn pass(_env: &mut (), _stage: usize, values: &[u32]) -> Option<u32> {
    values.last().copied()
}

/// Delegates to [`Sexp`] while counting rule evaluations.
#[derive(Clone)]
struct Counting {
    evals: Rc<RefCell<usize>>,
}

impl ResultBuilder<u32, String> for Counting {
    fn eval_rule(
        &self,
        input: &dyn Input,
        key: &ItemKey<u32>,
        rhs: &CompletedRhs<u32, String>,
    ) -> Option<String> {
        *self.evals.borrow_mut() += 1;
        Sexp.eval_rule(input, key, rhs)
    }

    fn terminal(&self, key: &ItemKey<u32>, result: Option<&String>) -> Option<String> {
        Sexp.terminal(key, result)
    }

    fn merge(&self, key: &ItemKey<u32>, alternatives: Vec<String>) -> Option<String> {
        Sexp.merge(key, alternatives)
    }
}

fn doubling_grammar(evals: Rc<RefCell<usize>>) -> (Grammar<(), u32, String>, Symbol) {
    let mut builder = GrammarBuilder::new();
    let e = builder.nonterminal("e");
    let a = builder.terminal("a");
    let grammar = builder
        .rule(e, vec![e, e], (), pass)
        .rule(e, vec![a], (), pass)
        .lexer(CharLexer::new().class(a, |c| c == 'a'))
        .results(Counting { evals })
        .build()
        .unwrap();
    (grammar, e)
}

#[test]
fn construction_is_memoized_per_key() {
    let evals = Rc::new(RefCell::new(0));
    let (grammar, e) = doubling_grammar(Rc::clone(&evals));

    let result = grammar.parse(&"aaaa", 0, e, 0, &ParseConfig::new());
    assert_eq!(result.length(), Some(4));

    // One rule evaluation per (key, derivation) pair: four single-char
    // derivations, plus one split per two-char span, two per three-char
    // span, and three for the full span. Without the per-key cache the
    // count would grow with the number of parse trees instead.
    assert_eq!(*evals.borrow(), 14);
}

#[test]
fn repeated_construction_is_deterministic() {
    let evals_first = Rc::new(RefCell::new(0));
    let (grammar, e) = doubling_grammar(Rc::clone(&evals_first));
    let first = grammar.parse(&"aaa", 0, e, 0, &ParseConfig::new());

    let evals_second = Rc::new(RefCell::new(0));
    let (grammar, e) = doubling_grammar(Rc::clone(&evals_second));
    let second = grammar.parse(&"aaa", 0, e, 0, &ParseConfig::new());

    assert_eq!(first, second);
    assert_eq!(*evals_first.borrow(), *evals_second.borrow());
}

/// Propagates construction holes: a rule instance with any missing child
/// yields nothing.
struct Strict;

impl ResultBuilder<u32, String> for Strict {
    fn eval_rule(
        &self,
        _input: &dyn Input,
        _key: &ItemKey<u32>,
        rhs: &CompletedRhs<u32, String>,
    ) -> Option<String> {
        let mut out = String::from("[");
        for child in rhs.children() {
            out.push_str(child.result.as_ref()?);
        }
        out.push(']');
        Some(out)
    }

    fn terminal(&self, _key: &ItemKey<u32>, result: Option<&String>) -> Option<String> {
        result.cloned()
    }

    fn merge(&self, _key: &ItemKey<u32>, mut alternatives: Vec<String>) -> Option<String> {
        alternatives.sort();
        alternatives.into_iter().next()
    }
}

#[test]
fn cycles_degrade_to_missing_alternatives() {
    let mut builder = GrammarBuilder::new();
    let a = builder.nonterminal("a");
    let grammar = builder
        .rule(a, vec![a], (), pass)
        .rule(a, vec![], (), pass)
        .results(Strict)
        .build()
        .unwrap();

    let result = grammar.parse(&"", 0, a, 5, &ParseConfig::new());
    match result {
        ParseResult::Success { length, results } => {
            assert_eq!(length, 0);
            // The cyclic derivation contributed nothing; only the empty
            // rule's value survives the merge.
            assert_eq!(results.get(&5), Some(&Some("[]".to_string())));
        }
        ParseResult::Failed { position } => panic!("parse failed at {position}"),
    }
}

#[test]
fn discard_still_reports_recognized_outputs() {
    let mut builder: GrammarBuilder<(), u32, String> = GrammarBuilder::new();
    let s = builder.nonterminal("s");
    let a = builder.terminal("a");
    let grammar = builder
        .rule(s, vec![a], (), pass)
        .lexer(CharLexer::new().class(a, |c| c == 'a'))
        .results(Discard)
        .build()
        .unwrap();

    let result = grammar.parse(&"a", 0, s, 3, &ParseConfig::new());
    match result {
        ParseResult::Success { length, results } => {
            assert_eq!(length, 1);
            assert_eq!(results.get(&3), Some(&None));
        }
        ParseResult::Failed { position } => panic!("parse failed at {position}"),
    }
}

#[test]
fn recognize_constructs_units() {
    let mut builder = GrammarBuilder::new();
    let s = builder.nonterminal("s");
    let a = builder.terminal("a");
    let grammar = builder
        .rule(s, vec![a], (), pass)
        .lexer(LiteralLexer::new().literal(a, "a"))
        .results(Recognize)
        .build()
        .unwrap();

    let result = grammar.parse(&"a", 0, s, 3, &ParseConfig::new());
    match result {
        ParseResult::Success { length, results } => {
            assert_eq!(length, 1);
            assert_eq!(results.get(&3), Some(&Some(())));
        }
        ParseResult::Failed { position } => panic!("parse failed at {position}"),
    }
}

/// Labels each derivation by its rule and keeps only the first alternative.
struct FirstWins;

impl ResultBuilder<u32, String> for FirstWins {
    fn eval_rule(
        &self,
        _input: &dyn Input,
        _key: &ItemKey<u32>,
        rhs: &CompletedRhs<u32, String>,
    ) -> Option<String> {
        Some(format!("rule{}", rhs.rule()))
    }

    fn terminal(&self, _key: &ItemKey<u32>, result: Option<&String>) -> Option<String> {
        result.cloned()
    }

    fn merge(&self, _key: &ItemKey<u32>, alternatives: Vec<String>) -> Option<String> {
        alternatives.into_iter().next()
    }
}

#[test]
fn merge_receives_alternatives_in_bin_order() {
    // Two identical productions collapse onto one key with two completed
    // items; rule 0's item enters the bin first, so an order-sensitive
    // merge must see its value first.
    let mut builder = GrammarBuilder::new();
    let s = builder.nonterminal("s");
    let a = builder.terminal("a");
    let grammar = builder
        .rule(s, vec![a], (), pass)
        .rule(s, vec![a], (), pass)
        .lexer(CharLexer::new().class(a, |c| c == 'a'))
        .results(FirstWins)
        .build()
        .unwrap();

    let result = grammar.parse(&"a", 0, s, 0, &ParseConfig::new());
    match result {
        ParseResult::Success { length, results } => {
            assert_eq!(length, 1);
            assert_eq!(results.get(&0), Some(&Some("rule0".to_string())));
        }
        ParseResult::Failed { position } => panic!("parse failed at {position}"),
    }
}

/// Records what each completed rule instance saw.
#[derive(Clone)]
struct Observing {
    children: Rc<RefCell<Vec<(Symbol, usize, usize)>>>,
}

impl ResultBuilder<u32, String> for Observing {
    fn eval_rule(
        &self,
        input: &dyn Input,
        key: &ItemKey<u32>,
        rhs: &CompletedRhs<u32, String>,
    ) -> Option<String> {
        for child in rhs.children() {
            self.children
                .borrow_mut()
                .push((child.symbol, child.from, child.to));
        }
        Some(input.span(key.start, key.end))
    }

    fn terminal(&self, _key: &ItemKey<u32>, result: Option<&String>) -> Option<String> {
        result.cloned()
    }

    fn merge(&self, _key: &ItemKey<u32>, alternatives: Vec<String>) -> Option<String> {
        alternatives.into_iter().next()
    }
}

#[test]
fn builders_see_spans_and_children() {
    let children = Rc::new(RefCell::new(Vec::new()));
    let mut builder = GrammarBuilder::new();
    let s = builder.nonterminal("s");
    let a = builder.terminal("a");
    let b = builder.terminal("b");
    let grammar = builder
        .rule(s, vec![a, b], (), pass)
        .lexer(
            CharLexer::new()
                .class(a, |c| c == 'a')
                .class(b, |c| c == 'b'),
        )
        .results(Observing {
            children: Rc::clone(&children),
        })
        .build()
        .unwrap();

    let result = grammar.parse(&"zab", 1, s, 0, &ParseConfig::new());
    match result {
        ParseResult::Success { length, results } => {
            assert_eq!(length, 2);
            // The rule's value is the exact text it covered.
            assert_eq!(results.get(&0), Some(&Some("ab".to_string())));
        }
        ParseResult::Failed { position } => panic!("parse failed at {position}"),
    }
    assert_eq!(children.borrow().as_slice(), &[(a, 1, 2), (b, 2, 3)]);
}
