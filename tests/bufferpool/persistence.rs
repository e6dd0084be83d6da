use std::sync::Arc;

use blockbuf::config::Config;
use blockbuf::error::Result;
use blockbuf::storage::buffer::{BufferPoolManager, ReplacerType};
use blockbuf::storage::file::FileDisk;
use blockbuf::storage::wal::{LogManager, MemoryLog};
use blockbuf::storage::{BlockId, Disk, DiskType, Page};

fn file_config(dir: &tempfile::TempDir) -> Config {
    Config {
        log_level: "debug".to_string(),
        data_dir: dir.path().to_string_lossy().to_string(),
        block_size: 128,
        disk_type: DiskType::File,
        num_buffers: 2,
        replacer: ReplacerType::Lsn,
        pin_timeout_ms: 100,
    }
}

#[test]
fn test_file_backed_pool_persists() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = tempfile::tempdir()?;
    let cfg = file_config(&dir);

    {
        let log = Arc::new(MemoryLog::new());
        let bpm = BufferPoolManager::from_config(&cfg, log.clone())?;
        for i in 0..5 {
            let fmt = move |page: &mut Page| {
                let _ = page.set_int(0, i);
            };
            let buffer = bpm.pin_new("rows", &fmt)?;
            {
                let mut guard = buffer.write()?;
                assert_eq!(Some(&BlockId::new("rows", i as u64)), guard.block());
                guard.contents_mut().set_string(4, &format!("row {}", i))?;
                let lsn = log.append(format!("insert row {}", i).as_bytes())?;
                guard.set_modified(1, lsn);
            }
            bpm.unpin(&buffer)?;
        }
        bpm.flush_all(1)?;
        assert_eq!(5, log.flushed_lsn()?);
    }

    let disk = FileDisk::new(dir.path(), 128)?;
    assert_eq!(5, disk.length("rows")?);

    // a fresh pool over the same directory sees every row
    let bpm = BufferPoolManager::from_config(&cfg, Arc::new(MemoryLog::new()))?;
    for i in 0..5 {
        let buffer = bpm.pin(&BlockId::new("rows", i))?;
        {
            let guard = buffer.read()?;
            assert_eq!(i as i32, guard.contents().get_int(0)?);
            assert_eq!(format!("row {}", i), guard.contents().get_string(4)?);
            assert_eq!(None, guard.lsn());
        }
        bpm.unpin(&buffer)?;
    }
    Ok(())
}

#[test]
fn test_unflushed_changes_stay_in_memory() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = tempfile::tempdir()?;
    let cfg = file_config(&dir);

    let log = Arc::new(MemoryLog::new());
    let bpm = BufferPoolManager::from_config(&cfg, log.clone())?;
    let block = BlockId::new("rows", 0);
    let buffer = bpm.pin(&block)?;
    {
        let mut guard = buffer.write()?;
        guard.contents_mut().set_int(0, 42)?;
        guard.set_modified(7, log.append(b"set 42")?);
    }
    bpm.unpin(&buffer)?;

    // the dirty page has not reached the disk yet
    let disk = FileDisk::new(dir.path(), 128)?;
    let mut page = Page::new(128);
    disk.read(&block, &mut page)?;
    assert_eq!(0, page.get_int(0)?);
    assert_eq!(0, log.flushed_lsn()?);

    // flushing another transaction does not write it either
    bpm.flush_all(8)?;
    disk.read(&block, &mut page)?;
    assert_eq!(0, page.get_int(0)?);

    bpm.flush_all(7)?;
    disk.read(&block, &mut page)?;
    assert_eq!(42, page.get_int(0)?);
    assert_eq!(1, log.flushed_lsn()?);
    Ok(())
}
