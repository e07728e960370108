//! Readers for the per-workload logs produced by the instruction profiler.
//!
//! Both logs are plain text with one whitespace separated record per line. Blank lines and lines
//! starting with `#` are skipped.

mod counts;
mod sites;

use std::io::{self, BufRead};
use std::path::{Path, PathBuf};

pub use counts::{KernelCounts, parse_counts, read_counts, total_count};
pub use sites::{InstructionSite, parse_sites, read_sites};

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{}:{line}: {reason}", path.display())]
    Malformed {
        path: PathBuf,
        line: usize,
        reason: String,
    },
}

impl CatalogError {
    fn malformed(path: &Path, line: usize, reason: impl Into<String>) -> Self {
        Self::Malformed {
            path: path.to_path_buf(),
            line,
            reason: reason.into(),
        }
    }
}

/// Yield `(line_number, content)` for every meaningful line of `reader`.
///
/// Line numbers are 1-based.
fn records<R>(
    reader: R,
    origin: &Path,
) -> impl Iterator<Item = Result<(usize, String), CatalogError>>
where
    R: BufRead,
{
    reader
        .lines()
        .enumerate()
        .filter_map(move |(i, line)| match line {
            Err(source) => Some(Err(CatalogError::Read {
                path: origin.to_path_buf(),
                source,
            })),
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() || trimmed.starts_with('#') {
                    None
                } else {
                    Some(Ok((i + 1, trimmed.to_owned())))
                }
            }
        })
}

fn parse_field<T>(value: &str, name: &str, origin: &Path, line: usize) -> Result<T, CatalogError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|err| {
        CatalogError::malformed(origin, line, format!("invalid {name} `{value}`: {err}"))
    })
}

fn open(path: &Path) -> Result<io::BufReader<std::fs::File>, CatalogError> {
    std::fs::File::open(path)
        .map(io::BufReader::new)
        .map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })
}
