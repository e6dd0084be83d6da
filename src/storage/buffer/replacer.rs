use std::fmt::Debug;

use serde::Deserialize;

use super::FrameId;
use crate::storage::wal::Lsn;

/// What the replacer gets to see of one frame when choosing a victim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub frame_id: FrameId,
    pub pinned: bool,
    pub modified: bool,
    /// LSN of the last modification, None if never modified since loaded.
    pub lsn: Option<Lsn>,
}

impl Candidate {
    pub fn pinned(frame_id: FrameId) -> Self {
        Candidate { frame_id, pinned: true, modified: false, lsn: None }
    }
}

/// Replacer picks the frame to reuse when the buffer pool misses.
pub trait Replacer: Debug + Send + Sync {
    /// Choose a victim among the given frames, listed in frame order. Pinned
    /// frames must never be chosen.
    ///
    /// Return None if every frame is pinned.
    fn victim(&self, candidates: &[Candidate]) -> Option<FrameId>;
}

/// LsnReplacer prefers frames that are cheap and safe to reuse.
///
/// 1. the first unpinned frame that was never modified since it was loaded,
///    nothing has to be written back.
/// 2. otherwise the unpinned dirty frame with the smallest LSN, its log
///    records are the most likely to be durable already.
/// 3. otherwise the last unpinned frame in scan order, e.g. a frame that was
///    modified and has been flushed since.
#[derive(Debug, Default, Clone, Copy)]
pub struct LsnReplacer;

impl Replacer for LsnReplacer {
    fn victim(&self, candidates: &[Candidate]) -> Option<FrameId> {
        let mut oldest: Option<(Lsn, FrameId)> = None;
        let mut last_unpinned = None;
        for c in candidates.iter().filter(|c| !c.pinned) {
            let lsn = match c.lsn {
                None => return Some(c.frame_id),
                Some(lsn) => lsn,
            };
            if c.modified && oldest.map_or(true, |(min, _)| lsn < min) {
                oldest = Some((lsn, c.frame_id));
            }
            last_unpinned = Some(c.frame_id);
        }
        oldest.map(|(_, frame_id)| frame_id).or(last_unpinned)
    }
}

/// NaiveReplacer takes the first unpinned frame.
#[derive(Debug, Default, Clone, Copy)]
pub struct NaiveReplacer;

impl Replacer for NaiveReplacer {
    fn victim(&self, candidates: &[Candidate]) -> Option<FrameId> {
        candidates.iter().find(|c| !c.pinned).map(|c| c.frame_id)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplacerType {
    Lsn,
    Naive,
}

pub fn new_replacer(typ: ReplacerType) -> Box<dyn Replacer> {
    match typ {
        ReplacerType::Lsn => Box::new(LsnReplacer),
        ReplacerType::Naive => Box::new(NaiveReplacer),
    }
}
