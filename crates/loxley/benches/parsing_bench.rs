use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};

use loxley::testing::{CharLexer, Sexp};
use loxley::{text, Grammar, GrammarBuilder, ParseConfig, Symbol};

fn pass(_env: &mut (), _stage: usize, values: &[u32]) -> Option<u32> {
    values.last().copied()
}

fn parens_grammar() -> (Grammar<(), u32, String>, Symbol) {
    let mut builder = GrammarBuilder::new();
    let p = builder.nonterminal("p");
    let open = builder.terminal("open");
    let close = builder.terminal("close");
    let grammar = builder
        .rule(p, vec![open, p, close, p], (), pass)
        .rule(p, vec![], (), pass)
        .lexer(
            CharLexer::new()
                .class(open, |c| c == '(')
                .class(close, |c| c == ')'),
        )
        .results(Sexp)
        .build()
        .expect("valid grammar");
    (grammar, p)
}

fn scannerless_grammar() -> (Grammar<(), u32, String>, Symbol) {
    let mut builder = GrammarBuilder::new();
    let s = builder.nonterminal("s");
    let run = builder.terminal("run");
    let a = builder.terminal("a");
    let grammar = builder
        .rule(s, vec![run], (), pass)
        .rule(run, vec![a, run], (), pass)
        .rule(run, vec![a], (), pass)
        .lexer(CharLexer::new().class(a, |c| c == 'a'))
        .results(Sexp)
        .build()
        .expect("valid grammar");
    (grammar, s)
}

fn bench_nested_parens(c: &mut Criterion) {
    let (grammar, p) = parens_grammar();
    let config = ParseConfig::new();
    for depth in [4usize, 12] {
        let source = "(".repeat(depth) + &")".repeat(depth);
        let input = text(&source);
        c.bench_function(&format!("nested_parens_{depth}"), |b| {
            b.iter(|| black_box(grammar.parse(black_box(&input), 0, p, 0, &config)));
        });
    }
}

fn bench_paren_sequence(c: &mut Criterion) {
    let (grammar, p) = parens_grammar();
    let config = ParseConfig::new();
    for pairs in [4usize, 12] {
        let source = "()".repeat(pairs);
        let input = text(&source);
        c.bench_function(&format!("paren_sequence_{pairs}"), |b| {
            b.iter(|| black_box(grammar.parse(black_box(&input), 0, p, 0, &config)));
        });
    }
}

fn bench_scannerless_run(c: &mut Criterion) {
    let (grammar, s) = scannerless_grammar();
    let config = ParseConfig::new();
    for length in [4usize, 12] {
        let source = "a".repeat(length);
        let input = text(&source);
        c.bench_function(&format!("scannerless_run_{length}"), |b| {
            b.iter(|| black_box(grammar.parse(black_box(&input), 0, s, 0, &config)));
        });
    }
}

criterion_group!(
    benches,
    bench_nested_parens,
    bench_paren_sequence,
    bench_scannerless_run
);
criterion_main!(benches);
