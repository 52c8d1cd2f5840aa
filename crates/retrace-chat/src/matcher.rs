// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Positional grammars over a pushback iterator
//!
//! A grammar is an ordered slice of [`Matcher`]s. [`MatchedFilter`] pulls items
//! from a [`Pushback`] iterator and yields them while they fit the grammar.
//! The first item that does not fit is handed back to the iterator, so the
//! caller can continue parsing from it.

use std::fmt;
use std::ops::Deref;

use crate::cursor::Pushback;

/// How many times a matcher must accept an item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repeat {
    /// Exactly this many times
    Times(usize),
    /// Zero or more times; the first rejected item moves on to the next matcher
    Unbounded,
}

impl Repeat {
    fn count(self) -> Option<usize> {
        match self {
            Self::Times(n) => Some(n),
            Self::Unbounded => None,
        }
    }
}

/// One position of a grammar
pub struct Matcher<T: ?Sized> {
    label: &'static str,
    predicate: fn(&T) -> bool,
    repeat: Repeat,
}

impl<T: ?Sized> Matcher<T> {
    /// Match exactly one item
    pub const fn once(label: &'static str, predicate: fn(&T) -> bool) -> Self {
        Self::times(label, 1, predicate)
    }

    /// Match exactly `n` items
    pub const fn times(label: &'static str, n: usize, predicate: fn(&T) -> bool) -> Self {
        Self {
            label,
            predicate,
            repeat: Repeat::Times(n),
        }
    }

    /// Match any number of items, including none
    pub const fn zero_or_more(label: &'static str, predicate: fn(&T) -> bool) -> Self {
        Self {
            label,
            predicate,
            repeat: Repeat::Unbounded,
        }
    }

    /// Human-readable description of what this position expects
    #[must_use]
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Repetition rule
    #[must_use]
    pub fn repeat(&self) -> Repeat {
        self.repeat
    }

    /// Test an item against the predicate
    #[must_use]
    pub fn matches(&self, item: &T) -> bool {
        (self.predicate)(item)
    }
}

impl<T: ?Sized> fmt::Debug for Matcher<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Matcher")
            .field("label", &self.label)
            .field("repeat", &self.repeat)
            .finish()
    }
}

/// An item that broke a grammar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation<E> {
    /// The offending item (it was pushed back onto the source)
    pub item: E,
    /// Label of the matcher that rejected it
    pub expected: &'static str,
    /// Index of that matcher in the grammar
    pub position: usize,
}

/// Yields items from a pushback iterator while they fit a grammar
///
/// Iteration ends when the source or the grammar is exhausted, or on the
/// first item rejected by a matcher that still requires a match. In the last
/// case [`MatchedFilter::violation`] reports the item.
pub struct MatchedFilter<'s, 'g, I, T>
where
    I: Iterator,
    T: ?Sized,
{
    source: &'s mut Pushback<I>,
    grammar: &'g [Matcher<T>],
    cursor: usize,
    remaining: Option<usize>,
    violation: Option<Violation<I::Item>>,
}

impl<'s, 'g, I, T> MatchedFilter<'s, 'g, I, T>
where
    I: Iterator,
    I::Item: Deref<Target = T> + Clone,
    T: ?Sized,
{
    /// Start matching `grammar` against `source`
    pub fn new(source: &'s mut Pushback<I>, grammar: &'g [Matcher<T>]) -> Self {
        Self {
            source,
            grammar,
            cursor: 0,
            remaining: grammar.first().and_then(|m| m.repeat.count()),
            violation: None,
        }
    }

    /// Whether an item was rejected by a matcher that required it
    #[must_use]
    pub fn is_violated(&self) -> bool {
        self.violation.is_some()
    }

    /// The rejected item, if any
    #[must_use]
    pub fn violation(&self) -> Option<&Violation<I::Item>> {
        self.violation.as_ref()
    }

    /// Consume the filter, keeping only the violation
    #[must_use]
    pub fn into_violation(self) -> Option<Violation<I::Item>> {
        self.violation
    }

    /// Whether every required matcher has been satisfied
    ///
    /// False after a violation, and also when the source ran out while a
    /// matcher still required items.
    #[must_use]
    pub fn is_satisfied(&self) -> bool {
        if self.violation.is_some() {
            return false;
        }
        let current_done = self.cursor >= self.grammar.len() || matches!(self.remaining, None | Some(0));
        current_done
            && self
                .grammar
                .iter()
                .skip(self.cursor + 1)
                .all(|m| matches!(m.repeat, Repeat::Unbounded | Repeat::Times(0)))
    }

    fn advance(&mut self) {
        self.cursor += 1;
        self.remaining = self.grammar.get(self.cursor).and_then(|m| m.repeat.count());
    }
}

impl<I, T> Iterator for MatchedFilter<'_, '_, I, T>
where
    I: Iterator,
    I::Item: Deref<Target = T> + Clone,
    T: ?Sized,
{
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        if self.violation.is_some() {
            return None;
        }
        let grammar = self.grammar;
        loop {
            let matcher = grammar.get(self.cursor)?;
            if self.remaining == Some(0) {
                self.advance();
                continue;
            }

            let item = self.source.next()?;
            if matcher.matches(&item) {
                if let Some(remaining) = self.remaining.as_mut() {
                    *remaining -= 1;
                    if *remaining == 0 {
                        self.advance();
                    }
                }
                return Some(item);
            }

            self.source.push_back(item.clone());
            if self.remaining.is_some() {
                self.violation = Some(Violation {
                    item,
                    expected: matcher.label(),
                    position: self.cursor,
                });
                return None;
            }
            self.advance();
        }
    }
}
