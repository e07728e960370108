//! Lines of an injection list.
//!
//! The field order and separators are read by the injector as is.

use std::fmt;

/// One sampled thread of one instruction site.
#[derive(Debug, Clone, PartialEq)]
pub struct InjectionRecord {
    pub kernel_name: String,
    pub kernel_invocation_count: u64,
    pub thread_index: u32,
    /// Selects the operand, in `[0, 1)`.
    pub operand_seed: f64,
    /// Selects the block, in `[0, 1)`.
    pub block_seed: f64,
    pub instruction_index: u64,
}

impl fmt::Display for InjectionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {} {}",
            self.kernel_name,
            self.kernel_invocation_count,
            self.thread_index,
            Seed(self.operand_seed),
            Seed(self.block_seed),
            self.instruction_index
        )
    }
}

/// One dynamic instruction picked from the whole count log.
#[derive(Debug, Clone, PartialEq)]
pub struct RandomFaultRecord {
    pub kernel_name: String,
    pub kernel_invocation_count: u64,
    pub instruction_index: u64,
    /// In `[0, 1)`, or in `[0, registers)` for register-file lists.
    pub operand_seed: f64,
    pub block_seed: f64,
}

impl fmt::Display for RandomFaultRecord {
    /// Every field, including the last, is followed by a space.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {} ",
            self.kernel_name,
            self.kernel_invocation_count,
            self.instruction_index,
            Seed(self.operand_seed),
            Seed(self.block_seed)
        )
    }
}

/// Shortest decimal that parses back to the same `f64`.
///
/// A fractional part is always present, and magnitudes below `1e-4` switch to scientific
/// notation with an explicitly signed exponent of at least two digits, e.g. `1.5e-05`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Seed(pub f64);

impl fmt::Display for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = self.0;
        if !value.is_finite() {
            return write!(f, "{value}");
        }

        if value != 0.0 && (value.abs() < 1e-4 || value.abs() >= 1e16) {
            let scientific = format!("{value:e}");
            let (mantissa, exponent) = scientific
                .split_once('e')
                .unwrap_or((scientific.as_str(), "0"));
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            return write!(f, "{mantissa}e{sign}{digits:0>2}");
        }

        let plain = value.to_string();
        if plain.contains('.') {
            f.write_str(&plain)
        } else {
            write!(f, "{plain}.0")
        }
    }
}
