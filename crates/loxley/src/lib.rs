//! Parameterized local lexing over an Earley chart.
//!
//! An extension of Earley parsing where every grammar symbol carries an
//! input and an output parameter computed by per-rule evaluation
//! functions, and where lexing is *local*: tokens are discovered lazily,
//! position by position, driven by what the chart is waiting for, with a
//! user [`Selector`] arbitrating between overlapping candidates. Terminals
//! may carry rules of their own and are then parsed scannerlessly by a
//! recursive sub-parser.
//!
//! The crate is a library with no I/O of its own: the grammar, the lexer,
//! the selector, and the result builder are all user policies plugged into
//! [`GrammarBuilder`].
//!
//! # Quick start
//!
//! ```
//! use loxley::{GrammarBuilder, LiteralLexer, ParseConfig, Recognize};
//!
//! let mut builder = GrammarBuilder::new();
//! let word = builder.nonterminal("word");
//! let hi = builder.terminal("hi");
//! let grammar = builder
//!     .rule(word, vec![hi], (), |_env: &mut (), _stage, _values: &[()]| Some(()))
//!     .lexer(LiteralLexer::new().literal(hi, "hi"))
//!     .results(Recognize)
//!     .build()
//!     .expect("valid grammar");
//!
//! let result = grammar.parse(&"hi there", 0, word, (), &ParseConfig::new());
//! assert_eq!(result.length(), Some(2));
//! ```
//!
//! # Modules
//!
//! - [`grammar`]: symbols, rules, and the [`Grammar`] itself
//! - [`lexer`]: tokens, token pools, lexers, and selectors
//! - [`engine`]: the chart, the fixpoint, and the parse driver
//! - [`forest`]: result construction over a finished chart
//! - [`testing`]: fixtures shared by the crate's tests and examples

pub mod engine;
pub mod error;
pub mod forest;
pub mod grammar;
pub mod input;
pub mod lexer;
pub mod testing;

pub use engine::{ParseConfig, ParseMetrics, ParseResult, Parser, Semantics, TerminalMode};
pub use error::GrammarError;
pub use forest::{CompletedRhs, Discard, ItemKey, Recognize, ResultBuilder, RhsChild};
pub use grammar::{Env, Grammar, GrammarBuilder, Param, Rule, Symbol, Value};
pub use input::{text, Input};
pub use lexer::{
    EmptyLexer, Lexer, LiteralLexer, LongestMatch, SelectAll, Selector, TerminalKey, Token, Tokens,
};
