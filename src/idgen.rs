use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

use crate::error::StandoffError;
use crate::types::LayerId;

/// Number of identifiers a [`BlockIdGenerator`] reserves from its sequence per
/// round-trip. Block allocation keeps the persistent sequence cheap under load.
const DEFAULT_BLOCK_SIZE: i64 = 1024;

/// A persistent, monotonic counter backing identifier generation. Reserving a
/// block is its own, independently committed operation: identifiers handed out
/// of a reserved block are never reissued, even when the transaction that
/// consumed them rolls back (gaps are acceptable).
pub trait Sequence {
    /// Reserve `count` consecutive values and return the first of them
    fn reserve(&self, count: i64) -> Result<i64, StandoffError>;
}

/// In-memory [`Sequence`], an atomic counter. Persistent backends (a relational
/// sequence, a counter row) implement the same trait externally.
#[derive(Debug, Default)]
pub struct MemorySequence {
    next: AtomicI64,
}

impl MemorySequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(start: i64) -> Self {
        Self {
            next: AtomicI64::new(start),
        }
    }
}

impl Sequence for MemorySequence {
    fn reserve(&self, count: i64) -> Result<i64, StandoffError> {
        Ok(self.next.fetch_add(count, Ordering::SeqCst))
    }
}

// several generators may draw from one shared sequence
impl<S: Sequence + ?Sized> Sequence for &S {
    fn reserve(&self, count: i64) -> Result<i64, StandoffError> {
        (**self).reserve(count)
    }
}

/// Issues [`LayerId`]s: monotonically increasing, never reused, safe for
/// concurrent callers. Pass a generator into whatever needs identifiers instead
/// of reaching for ambient global counters.
pub trait IdentifierGenerator {
    fn next(&self) -> Result<LayerId, StandoffError>;
}

/// The standard [`IdentifierGenerator`]: draws blocks from a [`Sequence`] and
/// hands out identifiers from the current block until it is exhausted.
#[derive(Debug)]
pub struct BlockIdGenerator<S: Sequence> {
    sequence: S,
    block_size: i64,
    block: Mutex<Block>,
}

#[derive(Debug, Default)]
struct Block {
    next: i64,
    limit: i64,
}

impl<S: Sequence> BlockIdGenerator<S> {
    pub fn new(sequence: S) -> Self {
        Self {
            sequence,
            block_size: DEFAULT_BLOCK_SIZE,
            block: Mutex::new(Block::default()),
        }
    }

    pub fn with_block_size(mut self, block_size: i64) -> Self {
        assert!(block_size > 0, "block size must be positive");
        self.block_size = block_size;
        self
    }
}

impl<S: Sequence> IdentifierGenerator for BlockIdGenerator<S> {
    fn next(&self) -> Result<LayerId, StandoffError> {
        let mut block = self
            .block
            .lock()
            .expect("identifier generator lock poisoned");
        if block.next >= block.limit {
            let start = self.sequence.reserve(self.block_size)?;
            block.next = start;
            block.limit = start + self.block_size;
        }
        let id = block.next;
        block.next += 1;
        Ok(LayerId::new(id))
    }
}
