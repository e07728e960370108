use std::ops::Range;

/// The given shard configuration does not describe a shard.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidShard {
    #[error("The shard total has to be non-zero")]
    ZeroTotal,
    #[error("Shard index {index} is out of range for {total} shards")]
    IndexOutOfRange { index: usize, total: usize },
}

/// One of `total` contiguous, near-equal slices of a list.
///
/// Independent processes that use the same `total` and distinct indices cover every element
/// of a list exactly once without coordinating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Deserialize)]
#[serde(try_from = "ShardFields")]
pub struct ShardSpec {
    index: usize,
    total: usize,
}

#[derive(serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct ShardFields {
    index: usize,
    total: usize,
}

impl TryFrom<ShardFields> for ShardSpec {
    type Error = InvalidShard;

    fn try_from(fields: ShardFields) -> Result<Self, Self::Error> {
        Self::new(fields.index, fields.total)
    }
}

impl Default for ShardSpec {
    /// A single shard covering everything.
    fn default() -> Self {
        Self { index: 0, total: 1 }
    }
}

impl ShardSpec {
    pub fn new(index: usize, total: usize) -> Result<Self, InvalidShard> {
        if total == 0 {
            return Err(InvalidShard::ZeroTotal);
        }
        if index >= total {
            return Err(InvalidShard::IndexOutOfRange { index, total });
        }
        Ok(Self { index, total })
    }

    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.total
    }

    /// The index range of this shard in a list of `len` elements.
    ///
    /// The first `len % total` shards hold one element more than the rest.
    #[must_use]
    pub fn range(&self, len: usize) -> Range<usize> {
        let base = len / self.total;
        let remainder = len % self.total;

        let (start, size) = if self.index < remainder {
            (self.index * (base + 1), base + 1)
        } else {
            (
                remainder * (base + 1) + (self.index - remainder) * base,
                base,
            )
        };

        start..start + size
    }

    /// The elements of `items` that belong to this shard.
    #[must_use]
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        &items[self.range(items.len())]
    }
}
