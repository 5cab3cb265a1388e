//! The local lexing loop: token discovery and phased selection.
//!
//! Tokens are never produced ahead of time. At each position the chart
//! itself determines which terminal keys are worth asking about; each key
//! is answered by recursively parsing the terminal from its own rules and
//! by the user lexer, and the selector arbitrates between the candidates
//! phase by phase as the chart grows.

use crate::engine::config::{Semantics, TerminalMode};
use crate::engine::parser::{Instance, RawParse};
use crate::grammar::{Env, Param, Symbol, Value};
use crate::lexer::{TerminalKey, Token, Tokens};

impl<'a, E: Env, P: Param, V: Value> Instance<'a, E, P, V> {
    /// Saturate bin `at`: interleave the chart fixpoint with token
    /// discovery and selection until chart, pool, and selection all
    /// quiesce, then scan once more with the final selection.
    ///
    /// The trailing scan is a no-op by the time the loop exits; it stays as
    /// the explicit guarantee that every selected token has been offered to
    /// the chart.
    pub(crate) fn compute_bin(&mut self, at: usize) {
        let mut pool: Tokens<P, V> = Tokens::new();
        let mut selected: Tokens<P, V> = Tokens::new();
        loop {
            let chart_changed = self.pi(at, &selected);

            let discovered = self.collect_new_tokens(at, &pool);
            let found = discovered.len();
            self.metrics.tokens_found += found;
            pool.union(discovered);

            let visible = match self.config.semantics {
                Semantics::Paper => pool.clone(),
                Semantics::Modified => self.admissible(at, &pool),
            };
            let chosen = self.grammar.selector().select(&visible, &selected);
            let newly_selected = selected.union(chosen);
            self.metrics.tokens_selected += newly_selected;

            if !chart_changed && found == 0 && newly_selected == 0 {
                break;
            }
        }
        self.scan(at, &selected);
    }

    /// Discover tokens for every terminal key the bin is waiting on that
    /// has not been queried at this position yet. Queried keys are recorded
    /// even when they produce nothing.
    fn collect_new_tokens(&mut self, at: usize, pool: &Tokens<P, V>) -> Tokens<P, V> {
        let mut keys: Vec<TerminalKey<P>> = Vec::new();
        for item in self.chart.bin(at).iter() {
            let rule = self.grammar.rule(item.rule());
            let Some(Symbol::Terminal(terminal)) = item.next_symbol(rule) else {
                continue;
            };
            if self.treated.contains(&terminal) {
                continue;
            }
            let key = TerminalKey {
                terminal,
                input: item.next_param().clone(),
            };
            if pool.contains_key(&key) || keys.contains(&key) {
                continue;
            }
            keys.push(key);
        }

        let mut discovered = Tokens::new();
        for key in keys {
            self.metrics.keys_queried += 1;
            discovered.ensure_key(key.clone());
            for token in self.terminal_tokens(at, &key) {
                discovered.insert(key.clone(), token);
            }
        }
        discovered
    }

    /// All tokens for one key: the terminal's own-grammar parse translated
    /// through its mode, then whatever the user lexer adds. On a collision
    /// of token identity the sub-parse token is kept.
    fn terminal_tokens(&mut self, at: usize, key: &TerminalKey<P>) -> Vec<Token<P, V>> {
        let mut tokens: Vec<Token<P, V>> = Vec::new();
        let sub = self.sub_parse(at, key);
        match self.config.mode_of(key.terminal) {
            None | Some(TerminalMode::LongestMatch) => {
                if let RawParse::Success { length, results } = sub {
                    for (output, result) in results {
                        tokens.push(Token {
                            length,
                            output,
                            result,
                        });
                    }
                }
            }
            Some(TerminalMode::AndNext) => {
                if let RawParse::Success { results, .. } = sub {
                    for (output, result) in results {
                        tokens.push(Token {
                            length: 0,
                            output,
                            result,
                        });
                    }
                }
            }
            Some(TerminalMode::NotNext(output)) => {
                if let RawParse::Failed { .. } = sub {
                    tokens.push(Token {
                        length: 0,
                        output: output.clone(),
                        result: None,
                    });
                }
            }
        }
        for token in self
            .grammar
            .lexer()
            .lex(self.input, self.start + at, key)
        {
            if !tokens.contains(&token) {
                tokens.push(token);
            }
        }
        tokens
    }

    /// Parse the terminal from its own rules in a fresh instance whose
    /// treated set additionally covers the terminal itself; recursion
    /// through scannerless terminals bottoms out at terminals for which
    /// only the lexer applies.
    fn sub_parse(&mut self, at: usize, key: &TerminalKey<P>) -> RawParse<P, V> {
        let mut treated = self.treated.clone();
        treated.insert(key.terminal);
        let mut child = Instance::new(
            self.grammar,
            self.config,
            self.input,
            self.start + at,
            treated,
        );
        let raw = child.run(Symbol::Terminal(key.terminal), key.input.clone());
        self.metrics.sub_parses += 1;
        self.metrics.merge(&child.metrics);
        raw
    }

    /// The modified-semantics filter: restrict the pool to tokens some
    /// waiting item in this bin actually admits under a trial evaluation.
    fn admissible(&self, at: usize, pool: &Tokens<P, V>) -> Tokens<P, V> {
        let mut visible = Tokens::new();
        for item in self.chart.bin(at).iter() {
            let rule = self.grammar.rule(item.rule());
            let Some(Symbol::Terminal(terminal)) = item.next_symbol(rule) else {
                continue;
            };
            if self.treated.contains(&terminal) {
                continue;
            }
            let key = TerminalKey {
                terminal,
                input: item.next_param().clone(),
            };
            for token in pool.tokens_for(&key) {
                if rule.has_next_item(item, token.output.clone()) {
                    visible.insert(key.clone(), token.clone());
                }
            }
        }
        visible
    }
}
