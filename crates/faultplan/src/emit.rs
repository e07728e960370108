//! Sampling of injection sites into list records.

use std::io;
use std::ops::Range;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::catalog::KernelCounts;
use crate::config::{AppConfig, Config, ConfigError, Target};
use crate::groups::{InjectionGroup, InstructionGroups};
use crate::record::{InjectionRecord, RandomFaultRecord};
use crate::sampling::{CumulativeCounts, ThreadDraws, seed};
use crate::shard::ShardSpec;
use crate::sink::RecordSink;

#[derive(Debug, thiserror::Error)]
pub enum EmitError {
    #[error("Failed to create {}: {source}", path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to write record: {0}")]
    Sink(#[source] io::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl EmitError {
    /// Attach the destination path to a sink failure.
    #[must_use]
    pub fn at(self, path: &Path) -> Self {
        match self {
            Self::Sink(source) => Self::Write {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        }
    }
}

/// Counters of one sampled group, reported for progress only.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupReport {
    pub key: u64,
    /// Eligible sites of the whole group.
    pub eligible: usize,
    /// The part of the eligible sites owned by this shard.
    pub shard_range: Range<usize>,
    /// Mean live-thread count over all eligible sites of the group.
    pub mean_live_threads: f64,
    pub samples: usize,
}

/// Emits a fixed number of sampled threads for every eligible site in this shard's part of each
/// group.
#[derive(Debug, Clone)]
pub struct PerSiteEmitter {
    groups: InstructionGroups,
    shard: ShardSpec,
    thread_samples: usize,
}

impl PerSiteEmitter {
    pub fn new(groups: InstructionGroups, shard: ShardSpec, thread_samples: usize) -> Self {
        Self {
            groups,
            shard,
            thread_samples,
        }
    }

    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.instruction_groups(),
            config.shard,
            config.thread_samples,
        )
    }

    /// Sample every group for instruction group `igid`. Returns the number of records written.
    pub fn emit<R, S>(
        &self,
        groups: &[InjectionGroup],
        igid: usize,
        rng: &mut R,
        sink: &mut S,
    ) -> io::Result<usize>
    where
        R: rand::Rng + ?Sized,
        S: RecordSink<InjectionRecord> + ?Sized,
    {
        let mut records = 0;
        for group in groups {
            records += self.emit_group(group, igid, rng, sink)?.samples;
        }
        sink.flush()?;
        Ok(records)
    }

    pub fn emit_group<R, S>(
        &self,
        group: &InjectionGroup,
        igid: usize,
        rng: &mut R,
        sink: &mut S,
    ) -> io::Result<GroupReport>
    where
        R: rand::Rng + ?Sized,
        S: RecordSink<InjectionRecord> + ?Sized,
    {
        let eligible = group.eligible(&self.groups, igid);
        let shard_range = self.shard.range(eligible.len());

        let mean_live_threads = if eligible.is_empty() {
            0.0
        } else {
            let threads: u64 = eligible
                .iter()
                .map(|site| u64::from(site.live_thread_count))
                .sum();
            threads as f64 / eligible.len() as f64
        };

        let mut samples = 0;
        for site in &eligible[shard_range.clone()] {
            // All threads of a site are drawn before any of their seeds.
            let threads = ThreadDraws::new(site.live_thread_count, self.thread_samples, &mut *rng)
                .collect::<Vec<_>>();

            for thread_index in threads {
                let operand_seed = seed(rng);
                let block_seed = seed(rng);
                sink.accept(InjectionRecord {
                    kernel_name: site.kernel_name.clone(),
                    kernel_invocation_count: site.kernel_invocation_count,
                    thread_index,
                    operand_seed,
                    block_seed,
                    instruction_index: site.instruction_index,
                })?;
                samples += 1;
            }
        }

        info!(
            group = group.key,
            shard = self.shard.index(),
            shards = self.shard.total(),
            start = shard_range.start,
            end = shard_range.end,
            eligible = eligible.len(),
            mean_live_threads,
            samples,
            "sampled group"
        );

        Ok(GroupReport {
            key: group.key,
            eligible: eligible.len(),
            shard_range,
            mean_live_threads,
            samples,
        })
    }
}

/// Emits dynamic instructions drawn independently from the whole count log.
///
/// The same instruction may be drawn more than once.
#[derive(Debug, Clone, Copy)]
pub struct RandomFaultEmitter {
    num_injections: usize,
    rf_count_igid: usize,
}

impl RandomFaultEmitter {
    pub fn new(num_injections: usize, rf_count_igid: usize) -> Self {
        Self {
            num_injections,
            rf_count_igid,
        }
    }

    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.num_injections, config.rf_count_igid as usize)
    }

    fn column(&self, target: Target) -> usize {
        match target {
            Target::Rf => self.rf_count_igid,
            Target::Group(igid) => igid as usize,
        }
    }

    /// Write up to `num_injections` records for `target`. Nothing is written when the target's
    /// column sums to 0.
    ///
    /// Register-file lists scale the operand seed by the kernel's register count from `app`.
    pub fn emit<R, S>(
        &self,
        app: &AppConfig,
        rows: &[KernelCounts],
        target: Target,
        rng: &mut R,
        sink: &mut S,
    ) -> Result<usize, EmitError>
    where
        R: rand::Rng + ?Sized,
        S: RecordSink<RandomFaultRecord> + ?Sized,
    {
        let table = CumulativeCounts::for_group(rows, self.column(target));
        let total = table.total();
        debug!(total, num_injections = self.num_injections, "random-fault list");

        let mut remaining = self.num_injections;
        let mut records = 0;
        while remaining > 0 && total != 0 {
            remaining -= 1;

            // Inclusive of `total`, see `CumulativeCounts::locate_inclusive`.
            let n = rng.random_range(0..=total);
            let Some(site) = table.locate_inclusive(n) else {
                continue;
            };
            let row = &rows[site.row];

            let operand_seed = match target {
                Target::Rf => f64::from(app.registers(&row.kernel_name)?) * seed(rng),
                Target::Group(_) => seed(rng),
            };
            let block_seed = seed(rng);

            let record = RandomFaultRecord {
                kernel_name: row.kernel_name.clone(),
                kernel_invocation_count: row.kernel_invocation_count,
                instruction_index: site.instruction_index,
                operand_seed,
                block_seed,
            };
            debug!(remaining, total, %record, "selected");
            sink.accept(record).map_err(EmitError::Sink)?;
            records += 1;
        }

        sink.flush().map_err(EmitError::Sink)?;
        Ok(records)
    }
}
