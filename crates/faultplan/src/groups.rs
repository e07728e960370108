use std::collections::HashMap;

use crate::catalog::InstructionSite;

/// The instruction types belonging to each instruction group, indexed by igid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionGroups(Vec<Vec<u32>>);

impl InstructionGroups {
    pub fn new(groups: Vec<Vec<u32>>) -> Self {
        Self(groups)
    }

    #[must_use]
    pub fn into_inner(self) -> Vec<Vec<u32>> {
        self.0
    }

    /// Number of instruction groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Instruction types of group `igid`, [`None`] if the group is unknown.
    #[must_use]
    pub fn types(&self, igid: usize) -> Option<&[u32]> {
        self.0.get(igid).map(Vec::as_slice)
    }

    /// Whether `instruction_type` belongs to group `igid`. Unknown groups have no members.
    #[must_use]
    pub fn contains(&self, igid: usize, instruction_type: u32) -> bool {
        self.types(igid)
            .is_some_and(|types| types.contains(&instruction_type))
    }
}

impl Default for InstructionGroups {
    /// FP64, FP32, loads, predicate writers, no destination, others, writers of general purpose
    /// or predicate registers, writers of general purpose registers.
    fn default() -> Self {
        Self(vec![
            vec![0],
            vec![1],
            vec![2],
            vec![3],
            vec![4],
            vec![5],
            vec![0, 1, 2, 3, 5],
            vec![0, 1, 2, 5],
        ])
    }
}

/// Sites of the catalog that share a kernel invocation count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectionGroup {
    pub key: u64,
    pub sites: Vec<InstructionSite>,
}

impl InjectionGroup {
    /// Sites of this group that are members of `igid` and were executed by at least one thread.
    ///
    /// The group's order is kept.
    #[must_use]
    pub fn eligible(&self, groups: &InstructionGroups, igid: usize) -> Vec<&InstructionSite> {
        self.sites
            .iter()
            .filter(|site| {
                groups.contains(igid, site.instruction_type) && site.live_thread_count != 0
            })
            .collect()
    }
}

/// Group `sites` by their kernel invocation count.
///
/// Groups are returned in the order their key first appears and sites keep their catalog order
/// within a group.
#[must_use]
pub fn group_by_invocation(sites: Vec<InstructionSite>) -> Vec<InjectionGroup> {
    let mut positions: HashMap<u64, usize> = HashMap::new();
    let mut groups: Vec<InjectionGroup> = Vec::new();

    for site in sites {
        let key = site.kernel_invocation_count;
        let position = *positions.entry(key).or_insert_with(|| {
            groups.push(InjectionGroup {
                key,
                sites: Vec::new(),
            });
            groups.len() - 1
        });
        groups[position].sites.push(site);
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site(invocation: u64, index: u64, instruction_type: u32, threads: u32) -> InstructionSite {
        InstructionSite {
            kernel_name: format!("k{invocation}"),
            kernel_invocation_count: invocation,
            instruction_index: index,
            instruction_type,
            live_thread_count: threads,
        }
    }

    #[test]
    fn first_appearance_order() {
        let groups = group_by_invocation(vec![
            site(5, 0, 0, 1),
            site(2, 1, 0, 1),
            site(5, 2, 0, 1),
            site(9, 3, 0, 1),
            site(2, 4, 0, 1),
        ]);

        assert_eq!(groups.iter().map(|g| g.key).collect::<Vec<_>>(), vec![5, 2, 9]);
        let indices = |g: &InjectionGroup| {
            g.sites
                .iter()
                .map(|s| s.instruction_index)
                .collect::<Vec<_>>()
        };
        assert_eq!(indices(&groups[0]), vec![0, 2]);
        assert_eq!(indices(&groups[1]), vec![1, 4]);
        assert_eq!(indices(&groups[2]), vec![3]);
    }

    #[test]
    fn eligible_requires_membership_and_threads() {
        let groups = InstructionGroups::default();
        let group = InjectionGroup {
            key: 1,
            sites: vec![
                site(1, 0, 0, 32),
                site(1, 1, 3, 32),
                site(1, 2, 1, 0),
                site(1, 3, 5, 1),
            ],
        };

        let eligible = group.eligible(&groups, 7);
        assert_eq!(
            eligible
                .iter()
                .map(|s| s.instruction_index)
                .collect::<Vec<_>>(),
            vec![0, 3]
        );

        let eligible = group.eligible(&groups, 6);
        assert_eq!(eligible.len(), 3);

        assert!(group.eligible(&groups, 42).is_empty());
    }

    #[test]
    fn default_table() {
        let groups = InstructionGroups::default();
        assert_eq!(groups.len(), 8);
        assert_eq!(groups.types(6), Some([0, 1, 2, 3, 5].as_slice()));
        assert!(!groups.contains(7, 3));
    }
}
