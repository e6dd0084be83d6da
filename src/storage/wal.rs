use std::fmt::Debug;
use std::sync::Mutex;

use crate::error::Result;

/// Log sequence number. The first appended record gets 1, so 0 means
/// "nothing durable yet".
pub type Lsn = u64;

/// The write-ahead log as seen from the buffer pool: a modified page may
/// only be written back once the log is durable up to the page's LSN.
pub trait LogManager: Debug + Send + Sync {
    /// Appends a record and returns its LSN. LSNs are strictly increasing.
    fn append(&self, record: &[u8]) -> Result<Lsn>;

    /// Makes every record up to and including `lsn` durable.
    fn flush(&self, lsn: Lsn) -> Result<()>;

    /// The highest LSN known to be durable.
    fn flushed_lsn(&self) -> Result<Lsn>;
}

#[derive(Debug, Default)]
struct MemoryLogState {
    records: Vec<Vec<u8>>,
    flushed: Lsn,
}

/// A log kept in memory. Flushing only advances the durable watermark.
#[derive(Debug, Default)]
pub struct MemoryLog {
    inner: Mutex<MemoryLogState>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the record stored at `lsn`, if any.
    pub fn record(&self, lsn: Lsn) -> Result<Option<Vec<u8>>> {
        let inner = self.inner.lock()?;
        let idx = match lsn.checked_sub(1).and_then(|idx| usize::try_from(idx).ok()) {
            Some(idx) => idx,
            None => return Ok(None),
        };
        Ok(inner.records.get(idx).cloned())
    }
}

impl LogManager for MemoryLog {
    fn append(&self, record: &[u8]) -> Result<Lsn> {
        let mut inner = self.inner.lock()?;
        inner.records.push(record.to_vec());
        Ok(inner.records.len() as Lsn)
    }

    fn flush(&self, lsn: Lsn) -> Result<()> {
        let mut inner = self.inner.lock()?;
        let last = inner.records.len() as Lsn;
        inner.flushed = inner.flushed.max(lsn.min(last));
        Ok(())
    }

    fn flushed_lsn(&self) -> Result<Lsn> {
        Ok(self.inner.lock()?.flushed)
    }
}
