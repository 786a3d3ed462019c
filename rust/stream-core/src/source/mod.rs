// rust/stream-core/src/source/mod.rs

//! Resumable data sources.
//!
//! A [`DataSource`] produces items on demand and can save and restore its
//! iteration state through a [`Tape`]. Recording a position and reloading it
//! into a fresh source of the same type makes both produce the same items
//! from then on.

mod count;

pub use count::CountDataSource;

use crate::error::Result;
use crate::tape::Tape;

/// A pull-based, resettable and resumable producer of items.
pub trait DataSource {
    type Item;

    /// Returns the next item, or `None` at the end of the sequence.
    fn next(&mut self) -> Result<Option<Self::Item>>;

    /// Rewinds to the beginning of the sequence.
    fn reset(&mut self) -> Result<()>;

    /// Appends the state needed to resume iteration to `tape`.
    fn record_position(&self, tape: &mut Tape);

    /// Restores state previously written by `record_position`.
    fn reload_position(&mut self, tape: &mut Tape) -> Result<()>;

    /// Borrows the source as an iterator of `Result` items.
    fn iter(&mut self) -> SourceIter<'_, Self>
    where
        Self: Sized,
    {
        SourceIter { source: self }
    }
}

/// Iterator adapter returned by [`DataSource::iter`].
pub struct SourceIter<'a, S> {
    source: &'a mut S,
}

impl<S: DataSource> Iterator for SourceIter<'_, S> {
    type Item = Result<S::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        self.source.next().transpose()
    }
}
