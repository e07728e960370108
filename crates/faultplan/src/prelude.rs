pub use crate::catalog::{InstructionSite, KernelCounts};
pub use crate::config::{Config, InjectionMode, ListStrategy, Target};
pub use crate::error::Error;
pub use crate::filter::ExclusionSet;
pub use crate::groups::{InjectionGroup, InstructionGroups};
pub use crate::record::{InjectionRecord, RandomFaultRecord};
pub use crate::shard::ShardSpec;
pub use crate::sink::{LineSink, RecordSink};
