use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use lru::LruCache;
use tokio::sync::OnceCell;

use super::RangeReader;
use crate::error::IoError;

/// Default block size: 256KB
pub const DEFAULT_BLOCK_SIZE: usize = 256 * 1024;

/// Default cache capacity in number of blocks.
pub const DEFAULT_CACHE_CAPACITY: usize = 100;

type BlockSlot = Arc<OnceCell<Bytes>>;

/// Block-based caching layer that wraps any RangeReader.
///
/// Opening an ND2 file and fetching its sections means many small reads
/// (16-byte chunk headers, then payloads) near the end of the file. Against
/// S3 each of those would be a request; the block cache turns them into a
/// few large ones.
///
/// Each block lives in an LRU slot holding a `OnceCell`, so concurrent reads
/// of a block that is not cached yet share a single fetch.
pub struct BlockCache<R> {
    inner: Arc<R>,
    block_size: usize,
    blocks: Mutex<LruCache<u64, BlockSlot>>,
}

impl<R: RangeReader> BlockCache<R> {
    /// Create a new BlockCache with default block size (256KB) and capacity (100 blocks).
    pub fn new(inner: R) -> Self {
        Self::with_capacity(inner, DEFAULT_BLOCK_SIZE, DEFAULT_CACHE_CAPACITY)
    }

    /// Create a new BlockCache with custom block size and capacity.
    ///
    /// A zero capacity is treated as one block.
    pub fn with_capacity(inner: R, block_size: usize, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Arc::new(inner),
            block_size: block_size.max(1),
            blocks: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Get a reference to the wrapped reader.
    pub fn inner(&self) -> &R {
        &self.inner
    }

    fn slot(&self, block_idx: u64) -> BlockSlot {
        let mut blocks = self
            .blocks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        blocks
            .get_or_insert(block_idx, || Arc::new(OnceCell::new()))
            .clone()
    }

    async fn get_block(&self, block_idx: u64) -> Result<Bytes, IoError> {
        let slot = self.slot(block_idx);
        slot.get_or_try_init(|| self.fetch_block(block_idx))
            .await
            .cloned()
    }

    async fn fetch_block(&self, block_idx: u64) -> Result<Bytes, IoError> {
        let offset = block_idx * self.block_size as u64;
        let size = self.inner.size();

        // The last block may be short
        let remaining = size.saturating_sub(offset);
        if remaining == 0 {
            return Err(IoError::RangeOutOfBounds {
                offset,
                requested: self.block_size as u64,
                size,
            });
        }

        let len = remaining.min(self.block_size as u64) as usize;
        self.inner.read_exact_at(offset, len).await
    }
}

#[async_trait]
impl<R: RangeReader + 'static> RangeReader for BlockCache<R> {
    async fn read_exact_at(&self, offset: u64, len: usize) -> Result<Bytes, IoError> {
        let size = self.inner.size();
        if offset.checked_add(len as u64).map_or(true, |end| end > size) {
            return Err(IoError::RangeOutOfBounds {
                offset,
                requested: len as u64,
                size,
            });
        }

        if len == 0 {
            return Ok(Bytes::new());
        }

        let block_size = self.block_size as u64;
        let first = offset / block_size;
        let last = (offset + len as u64 - 1) / block_size;

        if first == last {
            let block = self.get_block(first).await?;
            let start = (offset % block_size) as usize;
            return Ok(block.slice(start..start + len));
        }

        let mut out = BytesMut::with_capacity(len);
        let mut cursor = offset;
        for block_idx in first..=last {
            let block = self.get_block(block_idx).await?;
            let start = (cursor % block_size) as usize;
            let take = (block.len() - start).min(len - out.len());
            out.extend_from_slice(&block[start..start + take]);
            cursor += take as u64;
        }

        Ok(out.freeze())
    }

    fn size(&self) -> u64 {
        self.inner.size()
    }

    fn identifier(&self) -> &str {
        self.inner.identifier()
    }
}
