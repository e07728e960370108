use crate::catalog::KernelCounts;

/// Position of one dynamic instruction: the kernel invocation it ran in and its index among the
/// counted instructions of that invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SiteIndex {
    /// Index of the row in the count log.
    pub row: usize,
    pub instruction_index: u64,
}

/// Running totals of one count column, used to map a global dynamic instruction number back to
/// the kernel invocation that executed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CumulativeCounts {
    /// `ends[i]` is the sum of the counts of rows `0..=i`.
    ends: Vec<u64>,
}

impl CumulativeCounts {
    pub fn new(counts: impl IntoIterator<Item = u64>) -> Self {
        let ends = counts
            .into_iter()
            .scan(0u64, |total, count| {
                *total += count;
                Some(*total)
            })
            .collect();
        Self { ends }
    }

    /// Running totals of column `igid` of a count log.
    #[must_use]
    pub fn for_group(rows: &[KernelCounts], igid: usize) -> Self {
        Self::new(rows.iter().map(|row| row.count(igid)))
    }

    /// Total of the counted column.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.ends.last().copied().unwrap_or(0)
    }

    /// Locate instruction number `n`, [`None`] if `n` is not below [`Self::total`].
    ///
    /// Rows with a zero count are never returned.
    #[must_use]
    pub fn locate(&self, n: u64) -> Option<SiteIndex> {
        let row = self.ends.partition_point(|&end| end <= n);
        if row == self.ends.len() {
            return None;
        }
        Some(SiteIndex {
            row,
            instruction_index: n - self.start_of(row),
        })
    }

    /// Like [`Self::locate`], but `n == total` resolves to one past the last instruction of the
    /// last non-empty row.
    ///
    /// Random-fault lists draw from `0..=total`, and the injector clamps the instruction index.
    #[must_use]
    pub fn locate_inclusive(&self, n: u64) -> Option<SiteIndex> {
        if n != self.total() || n == 0 {
            return self.locate(n);
        }
        let row = self.ends.partition_point(|&end| end < n);
        Some(SiteIndex {
            row,
            instruction_index: n - self.start_of(row),
        })
    }

    fn start_of(&self, row: usize) -> u64 {
        match row {
            0 => 0,
            row => self.ends[row - 1],
        }
    }
}
