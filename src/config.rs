use serde::Deserialize;

use crate::error::Result;
use crate::storage::buffer::ReplacerType;
use crate::storage::DiskType;

#[derive(Debug, PartialEq, Deserialize)]
pub struct Config {
    pub log_level: String,

    /// Directory holding the block files when `disk_type` is `file`.
    pub data_dir: String,
    pub block_size: usize,
    pub disk_type: DiskType,

    pub num_buffers: usize,
    pub replacer: ReplacerType,

    /// How long a `BufferList` keeps retrying a pin on an exhausted pool.
    pub pin_timeout_ms: u64,
}

impl Config {
    pub fn new(file: &str) -> Result<Config> {
        let mut cfg = config::Config::builder()
            .set_default("log_level", "info")?
            .set_default("data_dir", "data")?
            .set_default("block_size", 4096)?
            .set_default("disk_type", "memory")?
            .set_default("num_buffers", 8)?
            .set_default("replacer", "lsn")?
            .set_default("pin_timeout_ms", 10_000)?;
        if !file.is_empty() {
            cfg = cfg.add_source(config::File::with_name(file))
        }
        cfg = cfg.add_source(config::Environment::with_prefix("BLOCKBUF"));
        Ok(cfg.build()?.try_deserialize()?)
    }
}
