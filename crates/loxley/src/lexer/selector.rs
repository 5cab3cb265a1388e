//! Token selection policies.

use crate::grammar::{Param, Value};
use crate::lexer::Tokens;

/// Arbitrates which candidate tokens are admitted at one position.
///
/// The engine calls the selector in phases: as the chart grows, new
/// candidates surface, and the selector is consulted again with the full
/// accumulated `pool` plus everything it has `selected` so far. The return
/// value is the set of tokens to *add*; the engine unions it into the
/// selected set, so a selection can never be withdrawn in a later phase.
pub trait Selector<P, V> {
    fn select(&self, pool: &Tokens<P, V>, selected: &Tokens<P, V>) -> Tokens<P, V>;
}

impl<P, V, F> Selector<P, V> for F
where
    F: Fn(&Tokens<P, V>, &Tokens<P, V>) -> Tokens<P, V>,
{
    fn select(&self, pool: &Tokens<P, V>, selected: &Tokens<P, V>) -> Tokens<P, V> {
        self(pool, selected)
    }
}

/// Admits every candidate. The chart then tracks all tokenizations at once.
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectAll;

impl<P: Param, V: Value> Selector<P, V> for SelectAll {
    fn select(&self, pool: &Tokens<P, V>, _selected: &Tokens<P, V>) -> Tokens<P, V> {
        pool.clone()
    }
}

/// Classical lexer disambiguation: only tokens of maximal length survive.
///
/// The maximum is taken over the visible pool and the already-selected set
/// together, so a phase that surfaces longer candidates stops shorter ones
/// from being admitted, while earlier (shorter) selections simply stand.
#[derive(Debug, Clone, Copy, Default)]
pub struct LongestMatch;

impl<P: Param, V: Value> Selector<P, V> for LongestMatch {
    fn select(&self, pool: &Tokens<P, V>, selected: &Tokens<P, V>) -> Tokens<P, V> {
        let best = pool
            .iter()
            .chain(selected.iter())
            .map(|(_, token)| token.length)
            .max();
        let mut chosen = Tokens::new();
        if let Some(best) = best {
            for (key, token) in pool.iter() {
                if token.length == best {
                    chosen.insert(key.clone(), token.clone());
                }
            }
        }
        chosen
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::{TerminalKey, Token};

    fn key(terminal: usize) -> TerminalKey<u32> {
        TerminalKey { terminal, input: 0 }
    }

    #[test]
    fn select_all_returns_the_pool() {
        let mut pool: Tokens<u32, String> = Tokens::new();
        pool.insert(key(0), Token::new(1, 0));
        pool.insert(key(1), Token::new(2, 0));
        let chosen = SelectAll.select(&pool, &Tokens::new());
        assert_eq!(chosen, pool);
    }

    #[test]
    fn longest_match_keeps_only_maximal_tokens() {
        let mut pool: Tokens<u32, String> = Tokens::new();
        pool.insert(key(0), Token::new(2, 0));
        pool.insert(key(1), Token::new(4, 0));
        pool.insert(key(2), Token::new(4, 1));
        let chosen = LongestMatch.select(&pool, &Tokens::new());
        assert_eq!(chosen.len(), 2);
        assert!(chosen.contains(&key(1), &Token::new(4, 0)));
        assert!(chosen.contains(&key(2), &Token::new(4, 1)));
    }

    #[test]
    fn longer_prior_selection_suppresses_shorter_candidates() {
        let mut selected: Tokens<u32, String> = Tokens::new();
        selected.insert(key(0), Token::new(3, 0));
        let mut pool = Tokens::new();
        pool.insert(key(1), Token::new(1, 0));
        let chosen = LongestMatch.select(&pool, &selected);
        assert!(chosen.is_empty());
    }

    #[test]
    fn empty_pool_selects_nothing() {
        let pool: Tokens<u32, String> = Tokens::new();
        let chosen = LongestMatch.select(&pool, &Tokens::new());
        assert!(chosen.is_empty());
    }
}
