use std::collections::HashMap;

use super::FrameId;
use crate::storage::BlockId;

/// Maps each cached block to the frame holding it. An entry exists only
/// while that frame caches the block.
#[derive(Debug, Default)]
pub(super) struct BlockTable {
    entries: HashMap<BlockId, FrameId>,
}

impl BlockTable {
    pub(super) fn new(capacity: usize) -> Self {
        BlockTable { entries: HashMap::with_capacity(capacity) }
    }

    pub(super) fn get(&self, block: &BlockId) -> Option<FrameId> {
        self.entries.get(block).copied()
    }

    pub(super) fn contains(&self, block: &BlockId) -> bool {
        self.entries.contains_key(block)
    }

    pub(super) fn insert(&mut self, block: BlockId, frame_id: FrameId) -> Option<FrameId> {
        self.entries.insert(block, frame_id)
    }

    pub(super) fn remove(&mut self, block: &BlockId) -> Option<FrameId> {
        self.entries.remove(block)
    }

    /// Unlink `block` only if it still points at `frame_id`.
    pub(super) fn remove_if(&mut self, block: &BlockId, frame_id: FrameId) -> bool {
        if self.get(block) != Some(frame_id) {
            return false;
        }
        self.entries.remove(block);
        true
    }

    pub(super) fn clear(&mut self) {
        self.entries.clear()
    }

    pub(super) fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub(super) fn iter(&self) -> impl Iterator<Item = (&BlockId, FrameId)> {
        self.entries.iter().map(|(block, &frame_id)| (block, frame_id))
    }
}
