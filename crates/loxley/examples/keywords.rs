//! Keyword/identifier overlap resolved by the selector.
//!
//! At one position both the `if` keyword and an identifier can match. The
//! longest-match selector admits only maximal tokens, so `iffy` lexes as
//! one identifier; on a dead-heat tie both readings survive and the parse
//! reports both outputs.

use loxley::{
    text, GrammarBuilder, Input, LongestMatch, ParseConfig, ParseResult, Recognize, TerminalKey,
    Token,
};

fn main() {
    let mut builder = GrammarBuilder::new();
    let stmt = builder.nonterminal("stmt");
    let keyword = builder.terminal("keyword");
    let ident = builder.terminal("ident");

    let keyword_index = keyword.index();
    let ident_index = ident.index();
    let lexer = move |input: &dyn Input, position: usize, key: &TerminalKey<u32>| -> Vec<
        Token<u32, ()>,
    > {
        if key.terminal == keyword_index {
            if input.at(position) == Some('i') && input.at(position + 1) == Some('f') {
                return vec![Token::new(2, key.input)];
            }
        } else if key.terminal == ident_index {
            let mut length = 0;
            while input.at(position + length).is_some_and(char::is_alphabetic) {
                length += 1;
            }
            if length > 0 {
                return vec![Token::new(length, key.input)];
            }
        }
        Vec::new()
    };

    let grammar = builder
        .rule(stmt, vec![keyword], (), |_env, stage, _values: &[u32]| {
            match stage {
                1 => Some(1),
                _ => Some(0),
            }
        })
        .rule(stmt, vec![ident], (), |_env, stage, _values: &[u32]| match stage {
            1 => Some(2),
            _ => Some(0),
        })
        .lexer(lexer)
        .selector(LongestMatch)
        .results(Recognize)
        .build()
        .expect("valid grammar");

    for source in ["iffy", "if", "42"] {
        let input = text(source);
        match grammar.parse(&input, 0, stmt, 0, &ParseConfig::new()) {
            ParseResult::Success { length, results } => {
                let mut readings: Vec<&str> = results
                    .keys()
                    .map(|&output| match output {
                        1 => "keyword",
                        _ => "identifier",
                    })
                    .collect();
                readings.sort_unstable();
                println!("{source}: consumed {length} as {readings:?}");
            }
            ParseResult::Failed { position } => {
                println!("{source}: no statement (stuck at {position})");
            }
        }
    }
}
