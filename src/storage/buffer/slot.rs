use std::ops::Deref;
use std::sync::RwLock;

use super::{FrameId, PageFormatter, TxnId};
use crate::error::Result;
use crate::storage::wal::{LogManager, Lsn};
use crate::storage::{BlockId, Disk, Page};

/// The page held by a buffer together with the metadata the pool needs
/// to decide whether and how it can be replaced.
///
/// Callers may read and write the page and record modifications with
/// `set_modified`. The block a buffer is assigned to only changes through
/// the buffer pool manager.
#[derive(Debug)]
pub struct BufferData {
    page: Page,
    block: Option<BlockId>,
    /// transaction that last modified the page and has not been flushed yet.
    modified_by: Option<TxnId>,
    /// LSN of the most recent modification, None if the page has not been
    /// modified since it was loaded.
    lsn: Option<Lsn>,
    reads: u64,
    writes: u64,
}

impl BufferData {
    fn new(block_size: usize) -> Self {
        Self { page: Page::new(block_size), block: None, modified_by: None, lsn: None, reads: 0, writes: 0 }
    }

    pub fn contents(&self) -> &Page {
        &self.page
    }

    pub fn contents_mut(&mut self) -> &mut Page {
        &mut self.page
    }

    pub fn block(&self) -> Option<&BlockId> {
        self.block.as_ref()
    }

    /// Record that `txn` modified the page with the log record at `lsn`.
    pub fn set_modified(&mut self, txn: TxnId, lsn: Lsn) {
        self.modified_by = Some(txn);
        self.lsn = Some(lsn);
    }

    pub fn modifying_txn(&self) -> Option<TxnId> {
        self.modified_by
    }

    pub fn lsn(&self) -> Option<Lsn> {
        self.lsn
    }

    pub fn is_modified(&self) -> bool {
        self.modified_by.is_some()
    }

    pub fn is_modified_by(&self, txn: TxnId) -> bool {
        self.modified_by == Some(txn)
    }

    /// Number of times a block was read from disk into this buffer.
    pub fn reads(&self) -> u64 {
        self.reads
    }

    /// Number of times this buffer was written to disk.
    pub fn writes(&self) -> u64 {
        self.writes
    }

    /// Write the page back if it is dirty, forcing the log up to the
    /// page's LSN first.
    pub(super) fn flush(&mut self, disk: &dyn Disk, log: &dyn LogManager) -> Result<()> {
        if self.modified_by.is_none() {
            return Ok(());
        }
        if let Some(lsn) = self.lsn {
            log.flush(lsn)?;
        }
        if let Some(block) = &self.block {
            disk.write(block, &self.page)?;
            self.writes += 1;
        }
        self.modified_by = None;
        Ok(())
    }

    /// Reassign the buffer to `block`, reading its contents from disk.
    ///
    /// On failure the buffer keeps its previous block and contents.
    pub(super) fn assign_to_block(
        &mut self,
        block: BlockId,
        disk: &dyn Disk,
        log: &dyn LogManager,
    ) -> Result<()> {
        self.flush(disk, log)?;
        let mut page = Page::new(self.page.size());
        disk.read(&block, &mut page)?;
        self.reset(block, page);
        self.reads += 1;
        Ok(())
    }

    /// Reassign the buffer to a block freshly appended to `file_name`,
    /// initialized by the formatter.
    pub(super) fn assign_to_new(
        &mut self,
        file_name: &str,
        fmt: &dyn PageFormatter,
        disk: &dyn Disk,
        log: &dyn LogManager,
    ) -> Result<BlockId> {
        self.flush(disk, log)?;
        let mut page = Page::new(self.page.size());
        fmt.format(&mut page);
        let block = disk.append(file_name)?;
        disk.write(&block, &page)?;
        self.writes += 1;
        self.reset(block.clone(), page);
        Ok(block)
    }

    fn reset(&mut self, block: BlockId, page: Page) {
        self.page = page;
        self.block = Some(block);
        self.modified_by = None;
        self.lsn = None;
    }
}

/// A buffer slot of the pool. The handle is shared with callers while the
/// buffer is pinned, the contents are protected by a per-buffer latch.
#[derive(Debug)]
pub struct Buffer {
    id: FrameId,
    inner: RwLock<BufferData>,
}

impl Buffer {
    pub(super) fn new(id: FrameId, block_size: usize) -> Self {
        Buffer { id, inner: RwLock::new(BufferData::new(block_size)) }
    }

    /// Index of the slot this buffer occupies in its pool.
    pub fn id(&self) -> FrameId {
        self.id
    }
}

impl Deref for Buffer {
    type Target = RwLock<BufferData>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
