// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Single-pass iterator with explicit push back
//!
//! Parsers that need to look ahead pull an item, inspect it, and hand it back
//! with [`Pushback::push_back`] when it belongs to someone else.

/// An iterator adapter supporting any number of pushed back items
///
/// Pushed back items are returned LIFO before anything else is pulled from
/// the wrapped iterator. `None` means the sequence is exhausted.
pub struct Pushback<I: Iterator> {
    inner: I,
    pending: Vec<I::Item>,
    position: usize,
}

impl<I: Iterator> Pushback<I> {
    /// Wrap an iterator
    pub fn new(inner: impl IntoIterator<IntoIter = I>) -> Self {
        Self {
            inner: inner.into_iter(),
            pending: Vec::new(),
            position: 0,
        }
    }

    /// Queue `item` so it is the next value returned
    pub fn push_back(&mut self, item: I::Item) {
        self.position = self.position.saturating_sub(1);
        self.pending.push(item);
    }

    /// Number of items handed out and not pushed back
    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Number of items waiting in the push back queue
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

impl<I> Pushback<I>
where
    I: Iterator,
    I::Item: Clone,
{
    /// Look at the next item without consuming it
    pub fn peek(&mut self) -> Option<I::Item> {
        let item = self.next()?;
        self.push_back(item.clone());
        Some(item)
    }
}

impl<I: Iterator> Iterator for Pushback<I> {
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.pending.pop().or_else(|| self.inner.next())?;
        self.position += 1;
        Some(item)
    }
}
