use std::fmt::{Display, Formatter};
use std::path::Path;
use std::sync::{Arc, Mutex};

use log::{debug, info, trace, warn};

use super::replacer::{new_replacer, Candidate, LsnReplacer, Replacer};
use super::slot::Buffer;
use super::table::BlockTable;
use super::{FrameId, PageFormatter, TxnId};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::storage::wal::LogManager;
use crate::storage::{new_disk, BlockId, Disk};

/// A buffer slot together with the number of callers holding it.
struct Frame {
    buffer: Arc<Buffer>,
    pins: usize,
}

/// The buffer pool is responsible for moving blocks back and forth between
/// main memory and disk, it allows the rest of the system to work on more
/// data than fits in memory.
///
/// The buffer pool's operations are transparent to its callers. A caller
/// asks for a block by its identity and does not know whether the block is
/// already in memory or has to be read from disk.
struct BufferPool {
    disk: Arc<dyn Disk>,
    /// the write-ahead log, forced before a dirty page is written back.
    log: Arc<dyn LogManager>,
    /// array of buffer slots, the array index is the FrameId.
    frames: Vec<Frame>,
    /// block table for finding the frame caching a block.
    table: BlockTable,
    /// Replacer to choose an unpinned frame on a miss.
    replacer: Box<dyn Replacer>,
    /// number of frames with zero pins.
    num_available: usize,
}

impl BufferPool {
    fn new(
        disk: Arc<dyn Disk>,
        log: Arc<dyn LogManager>,
        pool_size: usize,
        replacer: Box<dyn Replacer>,
    ) -> Self {
        let block_size = disk.block_size();
        let frames = (0..pool_size)
            .map(|i| Frame { buffer: Arc::new(Buffer::new(i, block_size)), pins: 0 })
            .collect();
        let table = BlockTable::new(pool_size);
        BufferPool { disk, log, frames, table, replacer, num_available: pool_size }
    }

    /// Pin a buffer to the given block.
    ///
    /// If a frame already caches the block it is reused. Otherwise the
    /// replacer picks an unpinned frame, its page is written back if dirty,
    /// and the block is read into it. Return Error::NoAvailableBuffer if every
    /// frame is pinned.
    ///
    /// A failed read leaves the victim frame, the block table and all pin
    /// counts as they were.
    fn pin(&mut self, block: &BlockId) -> Result<Arc<Buffer>> {
        if let Some(frame_id) = self.table.get(block) {
            trace!("buffer hit for block {} in frame {}", block, frame_id);
            return Ok(self.pin_frame(frame_id));
        }

        let frame_id = self.victim()?;
        let buffer = Arc::clone(&self.frames[frame_id].buffer);
        let mut guard = buffer.write()?;
        let prev_block = guard.block().cloned();
        guard.assign_to_block(block.clone(), self.disk.as_ref(), self.log.as_ref())?;
        drop(guard);

        debug!("frame {} replaced {:?} with block {}", frame_id, prev_block, block);
        self.relink(prev_block, block.clone(), frame_id);
        Ok(self.pin_frame(frame_id))
    }

    /// Append a new block to the file, format it and pin a buffer to it.
    ///
    /// The block does not exist before the call, so a frame is always
    /// taken from the replacer. Return Error::NoAvailableBuffer without
    /// allocating the block if every frame is pinned.
    fn pin_new(&mut self, file_name: &str, fmt: &dyn PageFormatter) -> Result<Arc<Buffer>> {
        let frame_id = self.victim()?;
        let buffer = Arc::clone(&self.frames[frame_id].buffer);
        let mut guard = buffer.write()?;
        let prev_block = guard.block().cloned();
        let block = guard.assign_to_new(file_name, fmt, self.disk.as_ref(), self.log.as_ref())?;
        drop(guard);

        debug!("frame {} replaced {:?} with new block {}", frame_id, prev_block, block);
        self.relink(prev_block, block, frame_id);
        Ok(self.pin_frame(frame_id))
    }

    /// Unpin the buffer. The frame becomes available for replacement once
    /// its pin count drops to zero.
    ///
    /// Return Error::InvalidUnpin if the buffer is not pinned, nothing is
    /// changed in that case.
    fn unpin(&mut self, buffer: &Buffer) -> Result<()> {
        let frame_id = self.frame_of(buffer)?;
        let frame = &mut self.frames[frame_id];
        if frame.pins == 0 {
            warn!("unpin of frame {} which is not pinned", frame_id);
            return Err(Error::InvalidUnpin(format!("buffer {} is not pinned", frame_id)));
        }
        frame.pins -= 1;
        if frame.pins == 0 {
            self.num_available += 1;
        }
        Ok(())
    }

    /// Write back every page modified by the transaction. Pin counts and
    /// the block table are not touched.
    fn flush_all(&self, txn: TxnId) -> Result<()> {
        let mut flushed = 0;
        for frame in &self.frames {
            // only frames modified by txn are write latched
            if !frame.buffer.read()?.is_modified_by(txn) {
                continue;
            }
            let mut guard = frame.buffer.write()?;
            if guard.is_modified_by(txn) {
                guard.flush(self.disk.as_ref(), self.log.as_ref())?;
                flushed += 1;
            }
        }
        debug!("flushed {} buffers modified by transaction {}", flushed, txn);
        Ok(())
    }

    /// Find a frame to reuse. Only unpinned frames are inspected, pinned
    /// ones may be latched by their holders.
    fn victim(&self) -> Result<FrameId> {
        if self.num_available == 0 {
            return Err(Error::NoAvailableBuffer);
        }
        let mut candidates = Vec::with_capacity(self.frames.len());
        for (frame_id, frame) in self.frames.iter().enumerate() {
            if frame.pins > 0 {
                candidates.push(Candidate::pinned(frame_id));
                continue;
            }
            let guard = frame.buffer.read()?;
            candidates.push(Candidate {
                frame_id,
                pinned: false,
                modified: guard.is_modified(),
                lsn: guard.lsn(),
            });
        }
        self.replacer.victim(&candidates).ok_or(Error::NoAvailableBuffer)
    }

    /// Point the block table at the frame's new block, dropping the entry of
    /// the block it held before.
    fn relink(&mut self, prev_block: Option<BlockId>, block: BlockId, frame_id: FrameId) {
        if let Some(prev) = prev_block {
            self.table.remove_if(&prev, frame_id);
        }
        self.table.insert(block, frame_id);
    }

    fn pin_frame(&mut self, frame_id: FrameId) -> Arc<Buffer> {
        let frame = &mut self.frames[frame_id];
        if frame.pins == 0 {
            self.num_available -= 1;
        }
        frame.pins += 1;
        Arc::clone(&frame.buffer)
    }

    fn frame_of(&self, buffer: &Buffer) -> Result<FrameId> {
        let frame_id = buffer.id();
        match self.frames.get(frame_id) {
            Some(frame) if std::ptr::eq(Arc::as_ptr(&frame.buffer), buffer) => Ok(frame_id),
            _ => Err(Error::Value(format!("buffer {} does not belong to this pool", frame_id))),
        }
    }

    fn statistics(&self) -> Result<Vec<BufferStats>> {
        let mut stats = Vec::with_capacity(self.frames.len());
        for (id, frame) in self.frames.iter().enumerate() {
            let guard = frame.buffer.read()?;
            stats.push(BufferStats {
                id,
                block: guard.block().cloned(),
                pins: frame.pins,
                reads: guard.reads(),
                writes: guard.writes(),
                modified_by: guard.modifying_txn(),
            });
        }
        Ok(stats)
    }
}

/// Per-buffer diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct BufferStats {
    pub id: FrameId,
    pub block: Option<BlockId>,
    pub pins: usize,
    pub reads: u64,
    pub writes: u64,
    pub modified_by: Option<TxnId>,
}

impl Display for BufferStats {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "buffer {}: ", self.id)?;
        match &self.block {
            Some(block) => write!(f, "block {}", block)?,
            None => write!(f, "unassigned")?,
        }
        write!(f, ", pins {}, read {} times, written {} times", self.pins, self.reads, self.writes)?;
        match self.modified_by {
            Some(txn) => write!(f, ", modified by transaction {}", txn),
            None => write!(f, ", clean"),
        }
    }
}

/// Buffer pool manager wraps the buffer pool with a mutex for concurrent
/// access, all the heavy lifting happens in the buffer pool.
///
/// A buffer returned by `pin` or `pin_new` stays valid until the matching
/// `unpin`. Callers latch its contents through the buffer's `RwLock` and must
/// release the latch before calling back into the manager.
pub struct BufferPoolManager {
    /// hold the actual buffer pool protected by a mutex latch.
    inner: Arc<Mutex<BufferPool>>,
    pool_size: usize,
}

impl BufferPoolManager {
    /// Create a pool of `pool_size` buffers using the LSN-aware replacer.
    pub fn new(disk: Arc<dyn Disk>, log: Arc<dyn LogManager>, pool_size: usize) -> Result<Self> {
        Self::with_replacer(disk, log, pool_size, Box::new(LsnReplacer))
    }

    pub fn with_replacer(
        disk: Arc<dyn Disk>,
        log: Arc<dyn LogManager>,
        pool_size: usize,
        replacer: Box<dyn Replacer>,
    ) -> Result<Self> {
        if pool_size == 0 {
            return Err(Error::Value("buffer pool size must be positive".to_string()));
        }
        if disk.block_size() == 0 {
            return Err(Error::Value("block size must be positive".to_string()));
        }
        info!("buffer pool with {} buffers of {} bytes, {:?}", pool_size, disk.block_size(), replacer);
        let inner = BufferPool::new(disk, log, pool_size, replacer);
        Ok(BufferPoolManager { inner: Arc::new(Mutex::new(inner)), pool_size })
    }

    /// Build the disk and the pool described by the configuration.
    pub fn from_config(cfg: &Config, log: Arc<dyn LogManager>) -> Result<Self> {
        let disk = new_disk(cfg.disk_type, Path::new(&cfg.data_dir), cfg.block_size)?;
        Self::with_replacer(disk, log, cfg.num_buffers, new_replacer(cfg.replacer))
    }

    /// Pin a buffer to the block, reading it from disk if it is not cached.
    pub fn pin(&self, block: &BlockId) -> Result<Arc<Buffer>> {
        let mut inner = self.inner.lock()?;
        inner.pin(block)
    }

    /// Allocate a new block at the end of the file and pin a buffer to it.
    pub fn pin_new(&self, file_name: &str, fmt: &dyn PageFormatter) -> Result<Arc<Buffer>> {
        let mut inner = self.inner.lock()?;
        inner.pin_new(file_name, fmt)
    }

    pub fn unpin(&self, buffer: &Buffer) -> Result<()> {
        let mut inner = self.inner.lock()?;
        inner.unpin(buffer)
    }

    /// Write back the buffers modified by the transaction.
    pub fn flush_all(&self, txn: TxnId) -> Result<()> {
        let inner = self.inner.lock()?;
        inner.flush_all(txn)
    }

    /// Number of unpinned buffers.
    pub fn available(&self) -> Result<usize> {
        Ok(self.inner.lock()?.num_available)
    }

    pub fn contains_mapping(&self, block: &BlockId) -> Result<bool> {
        Ok(self.inner.lock()?.table.contains(block))
    }

    /// Forget the block table entry of a block that is no longer validly
    /// cached. The buffer itself is left as is.
    pub fn remove_from_map(&self, block: &BlockId) -> Result<()> {
        let mut inner = self.inner.lock()?;
        if let Some(frame_id) = inner.table.remove(block) {
            debug!("unmapped block {} from frame {}", block, frame_id);
        }
        Ok(())
    }

    pub fn clear_map(&self) -> Result<()> {
        let mut inner = self.inner.lock()?;
        debug!("unmapped all {} blocks", inner.table.len());
        inner.table.clear();
        Ok(())
    }

    /// Pin count of a buffer of this pool.
    pub fn pins(&self, buffer: &Buffer) -> Result<usize> {
        let inner = self.inner.lock()?;
        let frame_id = inner.frame_of(buffer)?;
        Ok(inner.frames[frame_id].pins)
    }

    pub fn statistics(&self) -> Result<Vec<BufferStats>> {
        self.inner.lock()?.statistics()
    }

    pub fn size(&self) -> usize {
        self.pool_size
    }
}
