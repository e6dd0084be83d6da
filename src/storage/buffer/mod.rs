//! The buffer pool: a fixed set of in-memory buffers caching disk blocks.
//!
//! Every access to a block goes through `BufferPoolManager::pin` (or
//! `pin_new` for a block that does not exist yet) and ends with `unpin`.
//! A pinned buffer is never replaced. `BufferList` keeps track of the pins
//! held by one transaction and retries pins while the pool is exhausted.

mod bufferpool;
mod list;
mod replacer;
mod slot;
mod table;

pub use bufferpool::{BufferPoolManager, BufferStats};
pub use list::BufferList;
pub use replacer::{new_replacer, Candidate, LsnReplacer, NaiveReplacer, Replacer, ReplacerType};
pub use slot::{Buffer, BufferData};

use crate::storage::Page;

/// Index of a buffer slot in the pool, in range `[0, pool_size)`.
pub type FrameId = usize;

/// Transaction id as recorded on modified buffers.
pub type TxnId = u64;

/// Initializes the contents of a freshly allocated block.
pub trait PageFormatter {
    fn format(&self, page: &mut Page);
}

impl<F> PageFormatter for F
where
    F: Fn(&mut Page),
{
    fn format(&self, page: &mut Page) {
        self(page)
    }
}
