use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::{block_offset, BlockId, Disk, Page};
use crate::error::{Error, Result};

/// A disk backed by one OS file per file name under `dir`. Block `n` lives
/// at byte offset `n * block_size`.
#[derive(Debug)]
pub struct FileDisk {
    dir: PathBuf,
    block_size: usize,
    opened_files: Mutex<HashMap<String, File>>,
}

impl FileDisk {
    pub fn new(dir: &Path, block_size: usize) -> Result<Self> {
        if block_size == 0 {
            return Err(Error::Value("block size must be positive".to_string()));
        }
        if !dir.exists() {
            fs::create_dir_all(dir)?;
        }
        Ok(FileDisk { dir: dir.to_path_buf(), block_size, opened_files: Mutex::new(HashMap::new()) })
    }

    fn with_file<T>(&self, file_name: &str, f: impl FnOnce(&mut File) -> Result<T>) -> Result<T> {
        let mut files = self.opened_files.lock()?;
        let file = match files.entry(file_name.to_string()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let file = OpenOptions::new()
                    .create(true)
                    .truncate(false)
                    .read(true)
                    .write(true)
                    .open(self.dir.join(file_name))?;
                entry.insert(file)
            }
        };
        f(file)
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

impl Disk for FileDisk {
    fn read(&self, block: &BlockId, page: &mut Page) -> Result<()> {
        self.check_page(page)?;
        let offset = block_offset(block, self.block_size)?;
        self.with_file(block.file_name(), |file| {
            let len = file.metadata()?.len();
            if offset >= len {
                page.clear();
                return Ok(());
            }
            file.seek(SeekFrom::Start(offset))?;
            file.read_exact(page.contents_mut())?;
            Ok(())
        })
    }

    fn write(&self, block: &BlockId, page: &Page) -> Result<()> {
        self.check_page(page)?;
        let offset = block_offset(block, self.block_size)?;
        self.with_file(block.file_name(), |file| {
            file.seek(SeekFrom::Start(offset))?;
            file.write_all(page.contents())?;
            Ok(())
        })
    }

    fn append(&self, file_name: &str) -> Result<BlockId> {
        let block_size = self.block_size;
        self.with_file(file_name, |file| {
            let block = BlockId::new(file_name, file.metadata()?.len() / block_size as u64);
            file.seek(SeekFrom::Start(block_offset(&block, block_size)?))?;
            file.write_all(&vec![0; block_size])?;
            Ok(block)
        })
    }

    fn length(&self, file_name: &str) -> Result<u64> {
        let block_size = self.block_size as u64;
        self.with_file(file_name, |file| Ok(file.metadata()?.len() / block_size))
    }

    fn block_size(&self) -> usize {
        self.block_size
    }
}
