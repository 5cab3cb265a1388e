//! Tokens, token pools, and the lexing seam.
//!
//! Lexing here is *local*: the engine asks the lexer for tokens one
//! position and one [`TerminalKey`] at a time, driven by what the chart is
//! waiting for, and a [`Selector`](crate::Selector) arbitrates between
//! overlapping candidates. A [`Lexer`] only ever answers point queries.

pub mod selector;

pub use selector::{LongestMatch, SelectAll, Selector};

use std::fmt;
use std::hash::{Hash, Hasher};

use compact_str::CompactString;
use hashbrown::HashMap;

use crate::grammar::{Param, Symbol, Value};
use crate::input::Input;

/// What the chart is waiting for: a terminal together with the input
/// parameter the waiting item hands to it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TerminalKey<P> {
    pub terminal: usize,
    pub input: P,
}

/// One admitted match for a terminal key.
#[derive(Debug, Clone)]
pub struct Token<P, V> {
    /// Characters consumed; zero-length tokens are legal (lookahead).
    pub length: usize,
    /// The terminal's output parameter.
    pub output: P,
    /// Payload lifted into result construction, if any.
    pub result: Option<V>,
}

impl<P: Param, V> Token<P, V> {
    #[must_use]
    pub fn new(length: usize, output: P) -> Self {
        Self {
            length,
            output,
            result: None,
        }
    }

    #[must_use]
    pub fn with_result(length: usize, output: P, result: V) -> Self {
        Self {
            length,
            output,
            result: Some(result),
        }
    }
}

// Token identity is (length, output); the carried result does not
// participate, so two tokens differing only in payload collapse to one.
impl<P: Param, V> PartialEq for Token<P, V> {
    fn eq(&self, other: &Self) -> bool {
        self.length == other.length && self.output == other.output
    }
}

impl<P: Param, V> Eq for Token<P, V> {}

impl<P: Param, V> Hash for Token<P, V> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.length.hash(state);
        self.output.hash(state);
    }
}

/// A pool of tokens grouped by terminal key.
///
/// Per-key storage is a set in the sense of [`Token`] identity but keeps
/// insertion order, so iteration is deterministic. A key may be present
/// with no tokens: the engine records queried keys this way so a position
/// never asks the lexer or sub-parser for the same key twice.
pub struct Tokens<P, V> {
    map: HashMap<TerminalKey<P>, Vec<Token<P, V>>>,
}

impl<P: Param, V: Value> Tokens<P, V> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    /// True when the pool holds no tokens at all (empty keys don't count).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.values().all(Vec::is_empty)
    }

    /// Total number of tokens across all keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn contains_key(&self, key: &TerminalKey<P>) -> bool {
        self.map.contains_key(key)
    }

    #[must_use]
    pub fn contains(&self, key: &TerminalKey<P>, token: &Token<P, V>) -> bool {
        self.map.get(key).is_some_and(|set| set.contains(token))
    }

    /// The tokens recorded for `key`, in insertion order.
    #[must_use]
    pub fn tokens_for(&self, key: &TerminalKey<P>) -> &[Token<P, V>] {
        self.map.get(key).map_or(&[], Vec::as_slice)
    }

    /// Record `key` even if no token is ever inserted for it.
    pub fn ensure_key(&mut self, key: TerminalKey<P>) {
        self.map.entry(key).or_default();
    }

    /// Insert a token; returns whether it was new under token identity.
    pub fn insert(&mut self, key: TerminalKey<P>, token: Token<P, V>) -> bool {
        let set = self.map.entry(key).or_default();
        if set.contains(&token) {
            return false;
        }
        set.push(token);
        true
    }

    /// Union `other` into `self`; returns how many tokens were new.
    pub fn union(&mut self, other: Self) -> usize {
        let mut added = 0;
        for (key, set) in other.map {
            self.ensure_key(key.clone());
            for token in set {
                if self.insert(key.clone(), token) {
                    added += 1;
                }
            }
        }
        added
    }

    /// All `(key, token)` pairs in the pool.
    pub fn iter(&self) -> impl Iterator<Item = (&TerminalKey<P>, &Token<P, V>)> {
        self.map
            .iter()
            .flat_map(|(key, set)| set.iter().map(move |token| (key, token)))
    }

    /// The keys recorded in the pool, queried or not.
    pub fn keys(&self) -> impl Iterator<Item = &TerminalKey<P>> {
        self.map.keys()
    }
}

impl<P: Param, V: Value> Default for Tokens<P, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Param, V: Value> Clone for Tokens<P, V> {
    fn clone(&self) -> Self {
        Self {
            map: self.map.clone(),
        }
    }
}

impl<P: Param, V: Value> fmt::Debug for Tokens<P, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.map.iter()).finish()
    }
}

// Set equality under token identity, independent of insertion order.
impl<P: Param, V: Value> PartialEq for Tokens<P, V> {
    fn eq(&self, other: &Self) -> bool {
        if self.map.len() != other.map.len() {
            return false;
        }
        self.map.iter().all(|(key, set)| {
            other.map.get(key).is_some_and(|theirs| {
                set.len() == theirs.len() && set.iter().all(|token| theirs.contains(token))
            })
        })
    }
}

/// Point-query tokenizer: all tokens for one terminal key at one position.
///
/// Implemented by closures of the same shape, so one-off lexers don't need
/// a named type.
pub trait Lexer<P, V> {
    fn lex(&self, input: &dyn Input, position: usize, key: &TerminalKey<P>) -> Vec<Token<P, V>>;
}

impl<P, V, F> Lexer<P, V> for F
where
    F: Fn(&dyn Input, usize, &TerminalKey<P>) -> Vec<Token<P, V>>,
{
    fn lex(&self, input: &dyn Input, position: usize, key: &TerminalKey<P>) -> Vec<Token<P, V>> {
        self(input, position, key)
    }
}

/// A lexer with no tokens, for grammars whose terminals are all scannerless.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyLexer;

impl<P, V> Lexer<P, V> for EmptyLexer {
    fn lex(&self, _input: &dyn Input, _position: usize, _key: &TerminalKey<P>) -> Vec<Token<P, V>> {
        Vec::new()
    }
}

/// Matches fixed literal text per terminal.
///
/// The output parameter is the key's input parameter passed through
/// unchanged, and no result payload is attached.
#[derive(Debug, Clone, Default)]
pub struct LiteralLexer {
    literals: HashMap<usize, CompactString>,
}

impl LiteralLexer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `terminal` to `text`. Nonterminal symbols are rejected by
    /// construction elsewhere; passing one here is a no-op.
    #[must_use]
    pub fn literal(mut self, terminal: Symbol, text: &str) -> Self {
        if let Symbol::Terminal(index) = terminal {
            self.literals.insert(index, CompactString::new(text));
        }
        self
    }
}

impl<P: Param, V> Lexer<P, V> for LiteralLexer {
    fn lex(&self, input: &dyn Input, position: usize, key: &TerminalKey<P>) -> Vec<Token<P, V>> {
        let Some(literal) = self.literals.get(&key.terminal) else {
            return Vec::new();
        };
        let mut length = 0;
        for ch in literal.chars() {
            if input.at(position + length) != Some(ch) {
                return Vec::new();
            }
            length += 1;
        }
        vec![Token {
            length,
            output: key.input.clone(),
            result: None,
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::text;

    fn key(terminal: usize) -> TerminalKey<u32> {
        TerminalKey { terminal, input: 0 }
    }

    #[test]
    fn token_identity_ignores_result() {
        let a: Token<u32, String> = Token::new(2, 7);
        let b: Token<u32, String> = Token::with_result(2, 7, "payload".to_string());
        assert_eq!(a, b);

        let mut pool = Tokens::new();
        assert!(pool.insert(key(0), a));
        assert!(!pool.insert(key(0), b));
        assert_eq!(pool.len(), 1);
        // The first insertion's payload is kept.
        assert_eq!(pool.tokens_for(&key(0))[0].result, None);
    }

    #[test]
    fn empty_keys_are_recorded_but_not_counted() {
        let mut pool: Tokens<u32, String> = Tokens::new();
        pool.ensure_key(key(1));
        assert!(pool.contains_key(&key(1)));
        assert!(pool.is_empty());
        assert_eq!(pool.len(), 0);
        // The queried key is still listed even though it holds no tokens.
        assert_eq!(pool.keys().collect::<Vec<_>>(), vec![&key(1)]);
    }

    #[test]
    fn union_reports_only_new_tokens() {
        let mut pool: Tokens<u32, String> = Tokens::new();
        pool.insert(key(0), Token::new(1, 5));

        let mut other = Tokens::new();
        other.insert(key(0), Token::new(1, 5));
        other.insert(key(0), Token::new(2, 5));
        other.ensure_key(key(3));

        assert_eq!(pool.union(other), 1);
        assert_eq!(pool.len(), 2);
        assert!(pool.contains_key(&key(3)));
        assert_eq!(pool.keys().count(), 2);
    }

    #[test]
    fn pool_equality_is_order_independent() {
        let mut a: Tokens<u32, String> = Tokens::new();
        a.insert(key(0), Token::new(1, 1));
        a.insert(key(0), Token::new(2, 2));

        let mut b = Tokens::new();
        b.insert(key(0), Token::new(2, 2));
        b.insert(key(0), Token::new(1, 1));

        assert_eq!(a, b);
    }

    #[test]
    fn literal_lexer_matches_exact_text() {
        let lexer = LiteralLexer::new().literal(Symbol::Terminal(0), "if");
        let input = text("iffy");
        let tokens: Vec<Token<u32, String>> = lexer.lex(&input, 0, &key(0));
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].length, 2);
        assert_eq!(tokens[0].output, 0);

        let tokens: Vec<Token<u32, String>> = lexer.lex(&input, 1, &key(0));
        assert!(tokens.is_empty());
    }
}
