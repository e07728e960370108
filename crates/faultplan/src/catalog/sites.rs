use std::io::BufRead;
use std::path::Path;

use itertools::Itertools;

use super::{CatalogError, open, parse_field, records};

/// One static instruction of one kernel invocation, together with the number of threads that
/// executed it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InstructionSite {
    pub kernel_name: String,
    pub kernel_invocation_count: u64,
    pub instruction_index: u64,
    pub instruction_type: u32,
    pub live_thread_count: u32,
}

/// Parse a site catalog.
///
/// Each line is `kernel_name kernel_invocation_count instruction_index instruction_type
/// live_thread_count`. The order of the lines is kept.
pub fn parse_sites<R>(reader: R, origin: &Path) -> Result<Vec<InstructionSite>, CatalogError>
where
    R: BufRead,
{
    records(reader, origin)
        .map(|record| {
            let (line, content) = record?;
            let (name, invocation, index, kind, threads) = content
                .split_whitespace()
                .collect_tuple()
                .ok_or_else(|| CatalogError::malformed(origin, line, "expected 5 fields"))?;

            Ok(InstructionSite {
                kernel_name: name.to_owned(),
                kernel_invocation_count: parse_field(invocation, "invocation count", origin, line)?,
                instruction_index: parse_field(index, "instruction index", origin, line)?,
                instruction_type: parse_field(kind, "instruction type", origin, line)?,
                live_thread_count: parse_field(threads, "live thread count", origin, line)?,
            })
        })
        .collect()
}

pub fn read_sites(path: &Path) -> Result<Vec<InstructionSite>, CatalogError> {
    parse_sites(open(path)?, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Result<Vec<InstructionSite>, CatalogError> {
        parse_sites(input.as_bytes(), Path::new("sites.txt"))
    }

    #[test]
    fn keeps_order() {
        let sites = parse("b 3 10 1 32\n\na 1 0 100 0\n# comment\nb 3 11 0 7\n").unwrap();

        assert_eq!(sites.len(), 3);
        assert_eq!(sites[0].kernel_name, "b");
        assert_eq!(sites[0].kernel_invocation_count, 3);
        assert_eq!(sites[0].instruction_index, 10);
        assert_eq!(sites[1].instruction_type, 100);
        assert_eq!(sites[1].live_thread_count, 0);
        assert_eq!(sites[2].live_thread_count, 7);
    }

    #[test]
    fn wrong_field_count() {
        let err = parse("a 1 0 0\n").unwrap_err();
        assert!(matches!(err, CatalogError::Malformed { line: 1, .. }));

        let err = parse("a 1 0 0 1\na 1 0 0 1 9\n").unwrap_err();
        assert!(matches!(err, CatalogError::Malformed { line: 2, .. }));
    }

    #[test]
    fn bad_number() {
        let err = parse("a 1 0 zero 1\n").unwrap_err();
        assert!(err.to_string().contains("instruction type"));
        assert!(err.to_string().starts_with("sites.txt:1"));
    }

    #[test]
    fn empty() {
        assert!(parse("").unwrap().is_empty());
    }
}
