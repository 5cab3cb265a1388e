//! Arithmetic evaluated entirely through symbol parameters.
//!
//! Numbers are a scannerless terminal: `num` carries its own rules, so the
//! engine parses digit runs recursively and hands the enclosing grammar a
//! single token whose output parameter is the numeric value. No separate
//! tokenizer pass ever runs.

use loxley::{
    text, GrammarBuilder, Input, ParseConfig, ParseResult, Recognize, TerminalKey, Token,
};

fn main() {
    let mut builder = GrammarBuilder::new();
    let expr = builder.nonterminal("expr");
    let term = builder.nonterminal("term");
    let tail = builder.nonterminal("tail");
    let num = builder.terminal("num");
    let digit = builder.terminal("digit");
    let plus = builder.terminal("plus");
    let star = builder.terminal("star");

    let digit_index = digit.index();
    let plus_index = plus.index();
    let star_index = star.index();
    let lexer = move |input: &dyn Input, position: usize, key: &TerminalKey<i64>| -> Vec<
        Token<i64, ()>,
    > {
        let ch = input.at(position);
        if key.terminal == digit_index {
            if let Some(value) = ch.and_then(|c| c.to_digit(10)) {
                return vec![Token::new(1, i64::from(value))];
            }
        } else if key.terminal == plus_index && ch == Some('+') {
            return vec![Token::new(1, key.input)];
        } else if key.terminal == star_index && ch == Some('*') {
            return vec![Token::new(1, key.input)];
        }
        Vec::new()
    };

    let grammar = builder
        // expr -> expr '+' term, summing the two outputs.
        .rule(expr, vec![expr, plus, term], (), |_env, stage, values: &[i64]| {
            match stage {
                3 => Some(values[2] + values[6]),
                _ => Some(0),
            }
        })
        .rule(expr, vec![term], (), |_env, stage, values: &[i64]| match stage {
            1 => Some(values[2]),
            _ => Some(0),
        })
        // term -> term '*' num, multiplying.
        .rule(term, vec![term, star, num], (), |_env, stage, values: &[i64]| {
            match stage {
                3 => Some(values[2] * values[6]),
                _ => Some(0),
            }
        })
        .rule(term, vec![num], (), |_env, stage, values: &[i64]| match stage {
            1 => Some(values[2]),
            _ => Some(0),
        })
        // num -> digit tail: the first digit seeds the accumulator.
        .rule(num, vec![digit, tail], (), |_env, stage, values: &[i64]| {
            match stage {
                1 => Some(values[2]),
                2 => Some(values[4]),
                _ => Some(0),
            }
        })
        // tail -> digit tail: shift the accumulator left and add.
        .rule(tail, vec![digit, tail], (), |_env, stage, values: &[i64]| {
            match stage {
                1 => Some(values[0] * 10 + values[2]),
                2 => Some(values[4]),
                _ => Some(0),
            }
        })
        // tail -> <empty>: the accumulator is the value.
        .rule(tail, vec![], (), |_env, _stage, values: &[i64]| Some(values[0]))
        .lexer(lexer)
        .results(Recognize)
        .build()
        .expect("valid grammar");

    println!("{grammar}");

    for source in ["2+3*4", "12*3+4", "7", "10*10*10"] {
        let input = text(source);
        match grammar.parse(&input, 0, expr, 0, &ParseConfig::new()) {
            ParseResult::Success { length, results } => {
                let values: Vec<i64> = results.keys().copied().collect();
                println!("{source} (consumed {length}) = {values:?}");
            }
            ParseResult::Failed { position } => {
                println!("{source}: no expression (stuck at {position})");
            }
        }
    }
}
