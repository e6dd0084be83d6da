use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Identity of one fixed-size block of a named file, by ordinal position.
///
/// The pair is used as-is as the key of the buffer pool's block table, so
/// `("ab", 12)` and `("ab1", 2)` never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId {
    file_name: String,
    number: u64,
}

impl BlockId {
    pub fn new(file_name: impl Into<String>, number: u64) -> Self {
        BlockId { file_name: file_name.into(), number }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn number(&self) -> u64 {
        self.number
    }
}

impl Display for BlockId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[file {}, block {}]", self.file_name, self.number)
    }
}
