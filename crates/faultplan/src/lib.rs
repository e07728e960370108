#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![warn(clippy::must_use_candidate)]
pub mod campaign;
pub mod catalog;
pub mod config;
pub mod emit;
pub mod error;
pub mod filter;
pub mod groups;
pub mod prelude;
pub mod record;
pub mod sampling;
pub mod shard;
pub mod sink;
