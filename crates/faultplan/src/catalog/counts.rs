use std::io::BufRead;
use std::path::Path;

use super::{CatalogError, open, parse_field, records};

/// Dynamic instruction counts of one kernel invocation, one count per instruction group.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KernelCounts {
    pub kernel_name: String,
    pub kernel_invocation_count: u64,
    pub counts: Vec<u64>,
}

impl KernelCounts {
    /// Count for instruction group `igid`. Groups past the end of the row count as 0.
    #[must_use]
    pub fn count(&self, igid: usize) -> u64 {
        self.counts.get(igid).copied().unwrap_or(0)
    }
}

/// Parse an instruction-count log with `groups_count` count columns per row.
///
/// Each line is `kernel_name kernel_invocation_count c_0 ... c_{groups_count - 1}`.
pub fn parse_counts<R>(
    reader: R,
    origin: &Path,
    groups_count: usize,
) -> Result<Vec<KernelCounts>, CatalogError>
where
    R: BufRead,
{
    records(reader, origin)
        .map(|record| {
            let (line, content) = record?;
            let fields = content.split_whitespace().collect::<Vec<_>>();
            if fields.len() != groups_count + 2 {
                return Err(CatalogError::malformed(
                    origin,
                    line,
                    format!("expected {} fields, found {}", groups_count + 2, fields.len()),
                ));
            }

            let counts = fields[2..]
                .iter()
                .map(|value| parse_field(value, "instruction count", origin, line))
                .collect::<Result<Vec<u64>, _>>()?;

            Ok(KernelCounts {
                kernel_name: fields[0].to_owned(),
                kernel_invocation_count: parse_field(fields[1], "invocation count", origin, line)?,
                counts,
            })
        })
        .collect()
}

pub fn read_counts(path: &Path, groups_count: usize) -> Result<Vec<KernelCounts>, CatalogError> {
    parse_counts(open(path)?, path, groups_count)
}

/// Sum of the counts of group `igid` over all rows.
#[must_use]
pub fn total_count(rows: &[KernelCounts], igid: usize) -> u64 {
    rows.iter().map(|row| row.count(igid)).sum()
}
