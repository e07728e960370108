use std::collections::BTreeSet;

use crate::catalog::InstructionSite;

/// Instruction types that never receive a fault, such as bookkeeping and control
/// pseudo-instructions.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExclusionSet(BTreeSet<u32>);

impl ExclusionSet {
    /// The instruction types excluded unless configured otherwise.
    pub const DEFAULT: [u32; 3] = [100, 3, 4];

    pub fn new(types: impl IntoIterator<Item = u32>) -> Self {
        Self(types.into_iter().collect())
    }

    #[must_use]
    pub fn contains(&self, instruction_type: u32) -> bool {
        self.0.contains(&instruction_type)
    }

    /// Drop every site whose instruction type is excluded.
    ///
    /// The relative order of the remaining sites is unchanged.
    #[must_use]
    pub fn filter(&self, sites: Vec<InstructionSite>) -> Vec<InstructionSite> {
        sites
            .into_iter()
            .filter(|site| !self.contains(site.instruction_type))
            .collect()
    }
}

impl FromIterator<u32> for ExclusionSet {
    fn from_iter<T: IntoIterator<Item = u32>>(iter: T) -> Self {
        Self::new(iter)
    }
}
