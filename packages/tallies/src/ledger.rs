use std::fmt::{self, Display, Write};

/// The published records of an aggregator, in publication order.
///
/// Generated aggregator types wrap a `Ledger` and reduce over it. Every record published
/// since creation or the last [`clear()`][Self::clear] contributes to every reduction.
///
/// # Example
///
/// ```
/// use tallies::Ledger;
///
/// let mut ledger = Ledger::new();
/// ledger.publish(3_u64);
/// ledger.publish(5_u64);
///
/// assert_eq!(ledger.total(|value| *value), 8);
/// assert_eq!(ledger.max(|value| *value), 5);
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Ledger<R> {
    entries: Vec<R>,
}

impl<R> Ledger<R> {
    /// Creates an empty ledger.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Appends a record.
    pub fn publish(&mut self, record: R) {
        self.entries.push(record);
    }

    /// Removes every record.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// How many records have been published.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no record has been published.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The records in publication order.
    #[must_use]
    pub fn as_slice(&self) -> &[R] {
        &self.entries
    }

    /// Iterates over the records in publication order.
    pub fn iter(&self) -> impl Iterator<Item = &R> {
        self.entries.iter()
    }

    /// The wrapping sum of `field` over every record. Zero for an empty ledger.
    #[must_use]
    pub fn total(&self, field: impl Fn(&R) -> u64) -> u64 {
        self.entries
            .iter()
            .map(field)
            .fold(0, u64::wrapping_add)
    }

    /// The largest value of `field` over every record. Zero for an empty ledger.
    #[must_use]
    pub fn max(&self, field: impl Fn(&R) -> u64) -> u64 {
        self.entries.iter().map(field).max().unwrap_or_default()
    }
}

impl<R: Display> Ledger<R> {
    /// Writes one sub-report per record, each under a header with the record's ordinal.
    ///
    /// # Errors
    ///
    /// Returns any error reported by the writer.
    pub fn write_entries(&self, f: &mut impl Write) -> fmt::Result {
        for (ordinal, record) in self.entries.iter().enumerate() {
            writeln!(f, "--== Thread: {ordinal:>4} ==--")?;
            writeln!(f, "{record}")?;
        }

        Ok(())
    }
}

impl<R> Default for Ledger<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, R> IntoIterator for &'a Ledger<R> {
    type Item = &'a R;
    type IntoIter = std::slice::Iter<'a, R>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::fmt::Debug;

    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(Ledger<u64>: Send, Sync, Debug, Default, Clone);

    #[derive(Clone, Copy, Debug)]
    struct Sample {
        hits: u64,
        peak: u64,
    }

    impl Display for Sample {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            writeln!(f, "    Hits: {}", self.hits)
        }
    }

    fn ledger(samples: &[Sample]) -> Ledger<Sample> {
        let mut ledger = Ledger::new();

        for sample in samples {
            ledger.publish(*sample);
        }

        ledger
    }

    #[test]
    fn empty_ledger_reduces_to_zero() {
        let ledger = Ledger::<Sample>::new();

        assert!(ledger.is_empty());
        assert_eq!(ledger.total(|s| s.hits), 0);
        assert_eq!(ledger.max(|s| s.peak), 0);
    }

    #[test]
    fn reductions_cover_every_record() {
        let ledger = ledger(&[
            Sample { hits: 2, peak: 4 },
            Sample { hits: 1, peak: 7 },
            Sample { hits: 5, peak: 2 },
        ]);

        assert_eq!(ledger.len(), 3);
        assert_eq!(ledger.total(|s| s.hits), 8);
        assert_eq!(ledger.max(|s| s.peak), 7);
    }

    #[test]
    fn total_wraps_on_overflow() {
        let ledger = ledger(&[
            Sample {
                hits: u64::MAX,
                peak: 0,
            },
            Sample { hits: 2, peak: 0 },
        ]);

        assert_eq!(ledger.total(|s| s.hits), 1);
    }

    #[test]
    fn clear_removes_everything() {
        let mut ledger = ledger(&[Sample { hits: 1, peak: 1 }]);

        ledger.clear();

        assert!(ledger.is_empty());
        assert_eq!(ledger.total(|s| s.hits), 0);
    }

    #[test]
    fn entries_are_numbered_from_zero() {
        let ledger = ledger(&[Sample { hits: 3, peak: 0 }, Sample { hits: 4, peak: 0 }]);
        let mut output = String::new();

        ledger.write_entries(&mut output).unwrap();

        assert_eq!(
            output,
            "--== Thread:    0 ==--\n    Hits: 3\n\n--== Thread:    1 ==--\n    Hits: 4\n\n"
        );
    }

    #[test]
    fn iteration_follows_publication_order() {
        let ledger = ledger(&[Sample { hits: 9, peak: 0 }, Sample { hits: 8, peak: 0 }]);

        let hits = (&ledger).into_iter().map(|s| s.hits).collect::<Vec<_>>();

        assert_eq!(hits, [9, 8]);
        assert_eq!(ledger.iter().count(), 2);
        assert_eq!(ledger.as_slice().len(), 2);
    }
}
