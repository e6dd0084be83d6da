use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use blockbuf::error::{Error, Result};
use blockbuf::storage::buffer::{BufferList, BufferPoolManager, TxnId};
use blockbuf::storage::memory::MemoryDisk;
use blockbuf::storage::wal::{LogManager, MemoryLog};
use blockbuf::storage::{BlockId, Disk, Page};
use log::info;
use rand::Rng;

const BLOCK_SIZE: usize = 64;
const FILE_NAME: &str = "counters";

/// Pins random blocks and increments the counter stored in them, returns
/// the number of increments done.
fn increment_randomly(
    bpm: Arc<BufferPoolManager>,
    log: Arc<MemoryLog>,
    txn: TxnId,
    ops: usize,
    blocks: u64,
) -> Result<u64> {
    let mut list = BufferList::new(bpm.clone(), Duration::from_secs(10));
    let mut rng = rand::thread_rng();
    let mut increments = 0;
    for _ in 0..ops {
        let block = BlockId::new(FILE_NAME, rng.gen_range(0..blocks));
        let buffer = list.pin(&block)?;
        if rng.gen_bool(0.5) {
            let lsn = log.append(format!("{} +1 by {}", block, txn).as_bytes())?;
            let mut guard = buffer.write()?;
            let n = guard.contents().get_int(0)?;
            guard.contents_mut().set_int(0, n + 1)?;
            guard.set_modified(txn, lsn);
            increments += 1;
        }
        list.unpin(&block)?;
    }
    list.unpin_all()?;
    bpm.flush_all(txn)?;
    Ok(increments)
}

#[test]
fn test_concurrent_increments() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    let disk = Arc::new(MemoryDisk::new(BLOCK_SIZE));
    let log = Arc::new(MemoryLog::new());
    let bpm = Arc::new(BufferPoolManager::new(disk.clone(), log.clone(), 4)?);
    let (threads, ops, blocks) = (8, 300, 16);

    let workers = (1..=threads)
        .map(|txn| {
            let bpm = bpm.clone();
            let log = log.clone();
            thread::spawn(move || increment_randomly(bpm, log, txn, ops, blocks))
        })
        .collect::<Vec<_>>();
    let mut total = 0;
    for worker in workers {
        total += worker.join().map_err(|_| Error::Internal("worker panicked".to_string()))??;
    }
    info!("{} increments by {} workers", total, threads);

    // every pin was released and no block is cached twice
    assert_eq!(bpm.size(), bpm.available()?);
    let stats = bpm.statistics()?;
    let mut cached = HashSet::new();
    for s in &stats {
        assert_eq!(0, s.pins);
        if let Some(block) = &s.block {
            assert!(cached.insert(block.clone()), "block {} cached twice", block);
            assert!(bpm.contains_mapping(block)?);
        }
    }

    // every transaction flushed its work, so disk has all increments
    let mut on_disk = 0;
    let mut page = Page::new(BLOCK_SIZE);
    for n in 0..blocks {
        disk.read(&BlockId::new(FILE_NAME, n), &mut page)?;
        on_disk += page.get_int(0)? as u64;
    }
    assert_eq!(total, on_disk);

    // and the pool agrees with it
    let mut in_pool = 0;
    for n in 0..blocks {
        let buffer = bpm.pin(&BlockId::new(FILE_NAME, n))?;
        in_pool += buffer.read()?.contents().get_int(0)? as u64;
        bpm.unpin(&buffer)?;
    }
    assert_eq!(total, in_pool);
    assert!(log.flushed_lsn()? > 0 || total == 0);
    Ok(())
}

#[test]
fn test_concurrent_exhaustion_is_recoverable() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    let disk = Arc::new(MemoryDisk::new(BLOCK_SIZE));
    let log = Arc::new(MemoryLog::new());
    let bpm = Arc::new(BufferPoolManager::new(disk, log, 2)?);

    let b0 = bpm.pin(&BlockId::new(FILE_NAME, 0))?;
    let b1 = bpm.pin(&BlockId::new(FILE_NAME, 1))?;

    // every pin of an uncached block fails right away while the pool is full
    let failures = (0..4)
        .map(|n| {
            let bpm = bpm.clone();
            thread::spawn(move || bpm.pin(&BlockId::new(FILE_NAME, 10 + n)).map(|_| ()))
        })
        .collect::<Vec<_>>();
    for failure in failures {
        let res = failure.join().map_err(|_| Error::Internal("pinner panicked".to_string()))?;
        assert_eq!(Err(Error::NoAvailableBuffer), res);
    }
    assert_eq!(0, bpm.available()?);

    bpm.unpin(&b0)?;
    bpm.unpin(&b1)?;
    let b10 = bpm.pin(&BlockId::new(FILE_NAME, 10))?;
    assert_eq!(1, bpm.available()?);
    bpm.unpin(&b10)?;
    Ok(())
}
