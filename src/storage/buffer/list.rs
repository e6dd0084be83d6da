use std::collections::HashMap;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use log::debug;

use super::{Buffer, BufferPoolManager, PageFormatter};
use crate::error::{Error, Result};
use crate::storage::BlockId;

const RETRY_INTERVAL: Duration = Duration::from_millis(10);

/// The buffers pinned by one transaction.
///
/// The buffer pool fails right away when every buffer is pinned. The list
/// keeps retrying for up to `timeout` before giving up, so a transaction
/// can wait for others to release their buffers.
pub struct BufferList {
    bpm: Arc<BufferPoolManager>,
    buffers: HashMap<BlockId, Arc<Buffer>>,
    /// one entry per pin held, a block pinned twice shows up twice.
    pins: Vec<BlockId>,
    timeout: Duration,
}

impl BufferList {
    pub fn new(bpm: Arc<BufferPoolManager>, timeout: Duration) -> Self {
        BufferList { bpm, buffers: HashMap::new(), pins: vec![], timeout }
    }

    pub fn get_buffer(&self, block: &BlockId) -> Option<&Arc<Buffer>> {
        self.buffers.get(block)
    }

    pub fn pin(&mut self, block: &BlockId) -> Result<Arc<Buffer>> {
        let buffer = self.wait_for(|bpm| bpm.pin(block))?;
        self.buffers.insert(block.clone(), Arc::clone(&buffer));
        self.pins.push(block.clone());
        Ok(buffer)
    }

    pub fn pin_new(&mut self, file_name: &str, fmt: &dyn PageFormatter) -> Result<Arc<Buffer>> {
        let buffer = self.wait_for(|bpm| bpm.pin_new(file_name, fmt))?;
        let block = buffer.read()?.block().cloned();
        let block = match block {
            Some(block) => block,
            None => {
                self.bpm.unpin(&buffer)?;
                return Err(Error::Internal("new buffer has no block assigned".to_string()));
            }
        };
        self.buffers.insert(block.clone(), Arc::clone(&buffer));
        self.pins.push(block);
        Ok(buffer)
    }

    /// Release one pin on the block.
    pub fn unpin(&mut self, block: &BlockId) -> Result<()> {
        let pos = self
            .pins
            .iter()
            .position(|b| b == block)
            .ok_or_else(|| Error::Value(format!("block {} is not pinned by this list", block)))?;
        if let Some(buffer) = self.buffers.get(block) {
            self.bpm.unpin(buffer)?;
        }
        self.pins.remove(pos);
        if !self.pins.contains(block) {
            self.buffers.remove(block);
        }
        Ok(())
    }

    /// Release every pin held by the list, most recent first. On failure
    /// the pins not yet released stay recorded.
    pub fn unpin_all(&mut self) -> Result<()> {
        while let Some(block) = self.pins.last().cloned() {
            if let Some(buffer) = self.buffers.get(&block) {
                self.bpm.unpin(buffer)?;
            }
            self.pins.pop();
            if !self.pins.contains(&block) {
                self.buffers.remove(&block);
            }
        }
        Ok(())
    }

    fn wait_for<F>(&self, f: F) -> Result<Arc<Buffer>>
    where
        F: Fn(&BufferPoolManager) -> Result<Arc<Buffer>>,
    {
        let deadline = Instant::now() + self.timeout;
        loop {
            match f(&self.bpm) {
                Err(Error::NoAvailableBuffer) => {
                    let now = Instant::now();
                    if now >= deadline {
                        debug!("gave up waiting for a buffer after {:?}", self.timeout);
                        return Err(Error::NoAvailableBuffer);
                    }
                    thread::sleep(RETRY_INTERVAL.min(deadline - now));
                }
                res => return res,
            }
        }
    }
}
