//! Work distribution for chunk rendering.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Hands each pending point chunk to exactly one worker.
///
/// Built fresh for every chunk render pass from a snapshot of the pending
/// list; its size is fixed at construction. `take` serves every chunk once
/// and never serves the same chunk twice, under any number of concurrent
/// workers.
pub struct ChunkPool {
    chunks: Vec<Arc<[f32]>>,
    next: AtomicUsize,
}

impl ChunkPool {
    pub fn new(chunks: Vec<Arc<[f32]>>) -> Self {
        Self {
            chunks,
            next: AtomicUsize::new(0),
        }
    }

    /// Number of chunks the pool was built with.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Claim the next unserved chunk, or `None` once the pool is exhausted.
    pub fn take(&self) -> Option<&[f32]> {
        let idx = self.next.fetch_add(1, Ordering::Relaxed);
        self.chunks.get(idx).map(|chunk| chunk.as_ref())
    }
}
