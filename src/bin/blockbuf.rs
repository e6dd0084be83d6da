use std::sync::Arc;
use std::thread;
use std::time::Duration;

use blockbuf::config::Config;
use blockbuf::error::{Error, Result};
use blockbuf::storage::buffer::{BufferList, BufferPoolManager, TxnId};
use blockbuf::storage::wal::{LogManager, MemoryLog};
use blockbuf::storage::BlockId;
use log::info;
use rand::Rng;

const FILE_NAME: &str = "blockbuf.dat";

/// Random pin/modify/unpin workload of one transaction.
fn run_worker(
    bpm: Arc<BufferPoolManager>,
    log: Arc<MemoryLog>,
    txn: TxnId,
    ops: usize,
    blocks: u64,
    timeout: Duration,
) -> Result<()> {
    let mut list = BufferList::new(bpm.clone(), timeout);
    let mut rng = rand::thread_rng();
    for _ in 0..ops {
        let block = BlockId::new(FILE_NAME, rng.gen_range(0..blocks));
        let buffer = list.pin(&block)?;
        if rng.gen_bool(0.3) {
            let lsn = log.append(format!("txn {} increments {}", txn, block).as_bytes())?;
            let mut guard = buffer.write()?;
            let n = guard.contents().get_int(0)?;
            guard.contents_mut().set_int(0, n + 1)?;
            guard.set_modified(txn, lsn);
        }
        list.unpin(&block)?;
    }
    list.unpin_all()?;
    bpm.flush_all(txn)
}

fn main() -> Result<()> {
    let args = clap::command!()
        .arg(
            clap::Arg::new("config")
                .short('c')
                .long("config")
                .help("Configuration file path for the buffer pool")
                .default_value(""),
        )
        .arg(
            clap::Arg::new("ops")
                .short('n')
                .long("ops")
                .help("Number of pins per worker")
                .value_parser(clap::value_parser!(usize))
                .default_value("1000"),
        )
        .arg(
            clap::Arg::new("threads")
                .short('t')
                .long("threads")
                .help("Number of concurrent workers")
                .value_parser(clap::value_parser!(u64))
                .default_value("4"),
        )
        .arg(
            clap::Arg::new("blocks")
                .short('b')
                .long("blocks")
                .help("Number of distinct blocks touched by the workload")
                .value_parser(clap::value_parser!(u64))
                .default_value("32"),
        )
        .get_matches();
    let file = args.get_one::<String>("config").map(String::as_str).unwrap_or_default();
    let ops = args.get_one::<usize>("ops").copied().unwrap_or(1000);
    let threads = args.get_one::<u64>("threads").copied().unwrap_or(4);
    let blocks = args.get_one::<u64>("blocks").copied().unwrap_or(32).max(1);

    let cfg = Config::new(file)?;
    env_logger::Builder::new().parse_filters(&cfg.log_level).init();

    let log = Arc::new(MemoryLog::new());
    let bpm = Arc::new(BufferPoolManager::from_config(&cfg, log.clone())?);
    let timeout = Duration::from_millis(cfg.pin_timeout_ms);
    info!("running {} workers with {} pins each over {} blocks", threads, ops, blocks);

    let workers = (1..=threads)
        .map(|txn| {
            let bpm = bpm.clone();
            let log = log.clone();
            thread::spawn(move || run_worker(bpm, log, txn, ops, blocks, timeout))
        })
        .collect::<Vec<_>>();
    for worker in workers {
        worker.join().map_err(|_| Error::Internal("worker panicked".to_string()))??;
    }

    info!("log durable up to lsn {}", log.flushed_lsn()?);
    for stats in bpm.statistics()? {
        println!("{}", stats);
    }
    Ok(())
}
