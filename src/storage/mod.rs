use std::fmt::Debug;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use crate::error::{Error, Result};

pub mod block;
pub mod buffer;
pub mod file;
pub mod memory;
pub mod page;
pub mod wal;

pub use block::BlockId;
pub use page::Page;

/// Block-level access to named files. Every file is a sequence of
/// `block_size()` sized blocks addressed by their ordinal number.
///
/// The Disk trait is designed as `trait object` compatible so the buffer
/// pool can hold it as `Arc<dyn Disk>` and be shared across threads.
pub trait Disk: Debug + Send + Sync {
    /// Reads the block's bytes into the page. A block that has never been
    /// written reads back as zeros.
    fn read(&self, block: &BlockId, page: &mut Page) -> Result<()>;

    /// Writes the page's bytes to the block, growing the file if needed.
    fn write(&self, block: &BlockId, page: &Page) -> Result<()>;

    /// Extends the file by one zeroed block and returns its identity.
    fn append(&self, file_name: &str) -> Result<BlockId>;

    /// Number of blocks in the file, zero if it does not exist yet.
    fn length(&self, file_name: &str) -> Result<u64>;

    fn block_size(&self) -> usize;
}

#[derive(Copy, Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiskType {
    Memory,
    File,
}

pub fn new_disk(typ: DiskType, dir: &Path, block_size: usize) -> Result<Arc<dyn Disk>> {
    match typ {
        DiskType::Memory => Ok(Arc::new(memory::MemoryDisk::new(block_size))),
        DiskType::File => Ok(Arc::new(file::FileDisk::new(dir, block_size)?)),
    }
}

/// Byte offset of the block in its file. Fails if the end of the block is
/// not addressable with a u64 offset.
pub(crate) fn block_offset(block: &BlockId, block_size: usize) -> Result<u64> {
    let size = block_size as u64;
    block
        .number()
        .checked_add(1)
        .and_then(|end| end.checked_mul(size))
        .map(|end| end - size)
        .ok_or_else(|| Error::Value(format!("block {} is out of addressable range", block)))
}
