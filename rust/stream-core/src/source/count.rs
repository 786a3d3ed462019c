// rust/stream-core/src/source/count.rs

use crate::error::Result;
use crate::tape::Tape;

use super::DataSource;

/// A source yielding `start, start + 1, start + 2, ...`.
///
/// The sequence ends before `i64::MAX`, so a counter at `i64::MAX` is
/// exhausted and still records and reloads as a plain integer.
#[derive(Debug, Clone)]
pub struct CountDataSource {
    start: i64,
    counter: i64,
}

impl CountDataSource {
    pub fn new(start: i64) -> Self {
        Self {
            start,
            counter: start,
        }
    }

    /// The value the next call to `next` will produce.
    pub fn peek(&self) -> i64 {
        self.counter
    }
}

impl Default for CountDataSource {
    fn default() -> Self {
        Self::new(0)
    }
}

impl DataSource for CountDataSource {
    type Item = i64;

    fn next(&mut self) -> Result<Option<i64>> {
        let value = self.counter;
        match value.checked_add(1) {
            Some(next) => {
                self.counter = next;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    fn reset(&mut self) -> Result<()> {
        self.counter = self.start;
        Ok(())
    }

    fn record_position(&self, tape: &mut Tape) {
        tape.record(self.counter);
    }

    fn reload_position(&mut self, tape: &mut Tape) -> Result<()> {
        self.counter = tape.read::<i64>()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn take(source: &mut CountDataSource, n: usize) -> Vec<i64> {
        source.iter().take(n).map(|r| r.unwrap()).collect()
    }

    #[test]
    fn test_counts_from_start() {
        let mut source = CountDataSource::new(5);
        assert_eq!(take(&mut source, 3), vec![5, 6, 7]);
    }

    #[test]
    fn test_reset_restarts() {
        let mut source = CountDataSource::new(5);
        take(&mut source, 4);

        source.reset().unwrap();
        assert_eq!(take(&mut source, 2), vec![5, 6]);
    }

    #[test]
    fn test_record_writes_next_value() {
        let mut source = CountDataSource::new(5);
        assert_eq!(take(&mut source, 2), vec![5, 6]);

        let mut tape = Tape::new();
        source.record_position(&mut tape);

        assert_eq!(tape.read::<i64>().unwrap(), 7);
    }

    #[test]
    fn test_reload_resumes_identically() {
        let mut original = CountDataSource::new(5);
        take(&mut original, 2);

        let mut tape = Tape::new();
        original.record_position(&mut tape);

        let mut restored = CountDataSource::new(0);
        restored.reload_position(&mut tape).unwrap();

        assert_eq!(take(&mut restored, 3), vec![7, 8, 9]);
        assert_eq!(take(&mut original, 3), vec![7, 8, 9]);
    }

    #[test]
    fn test_ends_before_max() {
        let mut source = CountDataSource::new(i64::MAX - 2);
        assert_eq!(take(&mut source, 5), vec![i64::MAX - 2, i64::MAX - 1]);
        assert_eq!(source.next().unwrap(), None);
        assert_eq!(source.peek(), i64::MAX);

        let mut tape = Tape::new();
        source.record_position(&mut tape);
        let mut restored = CountDataSource::new(0);
        restored.reload_position(&mut tape).unwrap();
        assert_eq!(restored.next().unwrap(), None);

        source.reset().unwrap();
        assert_eq!(source.next().unwrap(), Some(i64::MAX - 2));
    }

    #[test]
    fn test_reload_rejects_wrong_kind() {
        let mut tape = Tape::new();
        tape.record(7_u64);

        let mut source = CountDataSource::new(0);
        assert!(source.reload_position(&mut tape).is_err());
        assert_eq!(source.peek(), 0);
    }
}
