use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use super::{block_offset, BlockId, Disk, Page};
use crate::error::{Error, Result};

/// A disk kept entirely in memory. Each file maps block numbers to block
/// contents, blocks never written are holes that read back as zeros.
#[derive(Debug)]
pub struct MemoryDisk {
    block_size: usize,
    files: Mutex<HashMap<String, BTreeMap<u64, Vec<u8>>>>,
}

impl MemoryDisk {
    pub fn new(block_size: usize) -> MemoryDisk {
        MemoryDisk { block_size, files: Mutex::new(HashMap::new()) }
    }

    fn check_page(&self, page: &Page) -> Result<()> {
        if page.size() != self.block_size {
            return Err(Error::Value(format!(
                "page size {} does not match block size {}",
                page.size(),
                self.block_size
            )));
        }
        Ok(())
    }
}

/// One past the highest block number written, holes included.
fn file_length(file: &BTreeMap<u64, Vec<u8>>) -> u64 {
    file.last_key_value().map_or(0, |(n, _)| n + 1)
}

impl Disk for MemoryDisk {
    fn read(&self, block: &BlockId, page: &mut Page) -> Result<()> {
        self.check_page(page)?;
        block_offset(block, self.block_size)?;
        let files = self.files.lock()?;
        let data = files.get(block.file_name()).and_then(|f| f.get(&block.number()));
        match data {
            Some(data) => page.contents_mut().copy_from_slice(data),
            None => page.clear(),
        }
        Ok(())
    }

    fn write(&self, block: &BlockId, page: &Page) -> Result<()> {
        self.check_page(page)?;
        block_offset(block, self.block_size)?;
        let mut files = self.files.lock()?;
        let file = files.entry(block.file_name().to_string()).or_default();
        file.insert(block.number(), page.contents().to_vec());
        Ok(())
    }

    fn append(&self, file_name: &str) -> Result<BlockId> {
        let mut files = self.files.lock()?;
        let file = files.entry(file_name.to_string()).or_default();
        let block = BlockId::new(file_name, file_length(file));
        block_offset(&block, self.block_size)?;
        file.insert(block.number(), vec![0; self.block_size]);
        Ok(block)
    }

    fn length(&self, file_name: &str) -> Result<u64> {
        let files = self.files.lock()?;
        Ok(files.get(file_name).map_or(0, file_length))
    }

    fn block_size(&self) -> usize {
        self.block_size
    }
}
