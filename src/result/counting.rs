//! An iterator that counts ahead up to a cap.
//!
//! On construction up to `max` items are pulled from the source into a
//! buffer. If the source runs dry first the size is exact; otherwise the size
//! is reported as `-max` ("at least `max`") and the remaining items are read
//! straight from the source once the buffer is drained.

use std::collections::VecDeque;
use std::iter::{Fuse, Peekable};

use crate::error::{Result, TrawlError};

/// Iterator wrapper with a bounded eager count.
pub struct BoundedCountingIterator<I: Iterator> {
    buffer: VecDeque<I::Item>,
    source: Peekable<Fuse<I>>,
    size: i64,
    position: u64,
}

impl<I: Iterator> BoundedCountingIterator<I> {
    /// Pull up to `max` items from `source`. A cap of 0 is treated as 1.
    pub fn new(source: I, max: usize) -> Self {
        let max = max.max(1);
        let mut source = source.fuse().peekable();
        let mut buffer = VecDeque::with_capacity(max.min(1024));

        while buffer.len() < max {
            match source.next() {
                Some(item) => buffer.push_back(item),
                None => break,
            }
        }

        let count = buffer.len() as i64;
        let size = if buffer.len() == max && source.peek().is_some() {
            -count
        } else {
            count
        };

        BoundedCountingIterator {
            buffer,
            source,
            size,
            position: 0,
        }
    }

    /// Exact count, or `-max` when more items exist than were counted.
    pub fn size(&self) -> i64 {
        self.size
    }

    /// True when the cap was hit with items still remaining.
    pub fn is_capped(&self) -> bool {
        self.size < 0
    }

    /// Number of items consumed so far (returned or skipped).
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Whether another item is available.
    pub fn has_next(&mut self) -> bool {
        !self.buffer.is_empty() || self.source.peek().is_some()
    }

    /// Take the first counted-but-unread item matching `predicate` out of the
    /// buffer. The reported size is left unchanged.
    pub fn remove_buffered<P>(&mut self, predicate: P) -> Option<I::Item>
    where
        P: FnMut(&I::Item) -> bool,
    {
        let index = self.buffer.iter().position(predicate)?;
        self.buffer.remove(index)
    }

    /// Like `next`, but exhaustion is an error instead of `None`.
    pub fn try_next(&mut self) -> Result<I::Item> {
        self.next().ok_or(TrawlError::Exhausted(self.position))
    }

    /// Discard up to `n` items; returns how many were actually discarded.
    pub fn skip_ahead(&mut self, n: u64) -> u64 {
        let mut skipped = 0;
        while skipped < n && self.next().is_some() {
            skipped += 1;
        }
        skipped
    }
}

impl<I: Iterator> Iterator for BoundedCountingIterator<I> {
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        let item = match self.buffer.pop_front() {
            Some(item) => Some(item),
            None => self.source.next(),
        };
        if item.is_some() {
            self.position += 1;
        }
        item
    }
}
