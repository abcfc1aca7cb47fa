//! Demo driver for the timestamp chain VM.
//!
//! Boots a chain, proposes payloads, and plays the consensus engine's role
//! by building and accepting every block in order.
//!
//! # Usage
//! ```text
//! timechain [OPTIONS]
//! ```
//!
//! # Options
//! - `--db <path>`: RocksDB directory (runs in memory when omitted)
//! - `--genesis <hex>`: genesis payload, at most 32 bytes
//! - `--propose <hex>`: payload to propose, zero-padded to 32 bytes (repeatable)

use std::env;
use std::process;
use timechain::core::block::DATA_LEN;
use timechain::storage::memdb::MemDb;
use timechain::storage::rocksdb::RocksDb;
use timechain::storage::Database;
use timechain::types::id::{Id, ShortId};
use timechain::vm::{Context, EngineMessage, EngineNotifier, TimestampVm, VmError};
use tokio::sync::mpsc::Receiver;
use tracing_subscriber::EnvFilter;

struct Args {
    db_path: Option<String>,
    genesis: Vec<u8>,
    proposals: Vec<[u8; DATA_LEN]>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(message) => {
            eprintln!("{}", message);
            process::exit(1);
        }
    };

    let ctx = Context::new(
        1,
        Id::sha256(b"timechain-demo"),
        ShortId::from_slice(&Id::sha256(b"timechain-demo-node").as_slice()[..20])
            .expect("20-byte slice"),
    );
    let (notifier, rx) = EngineNotifier::channel();

    let result = match &args.db_path {
        Some(path) => match RocksDb::open(path) {
            Ok(db) => boot(ctx, db, &args, notifier, rx).await,
            Err(err) => {
                eprintln!("opening database failed: {}", err);
                process::exit(1);
            }
        },
        None => boot(ctx, MemDb::new(), &args, notifier, rx).await,
    };

    if let Err(err) = result {
        eprintln!("node exited with error: {}", err);
        process::exit(1);
    }
}

async fn boot<D: Database>(
    ctx: Context,
    db: D,
    args: &Args,
    notifier: EngineNotifier,
    rx: Receiver<EngineMessage>,
) -> Result<(), VmError> {
    let vm = TimestampVm::initialize(ctx, db, &args.genesis, notifier)?;
    drive(vm, rx, &args.proposals).await
}

/// Plays the engine: waits on the doorbell and decides every built block.
async fn drive<D: Database>(
    mut vm: TimestampVm<D>,
    mut rx: Receiver<EngineMessage>,
    proposals: &[[u8; DATA_LEN]],
) -> Result<(), VmError> {
    for data in proposals {
        vm.propose_block(*data);
    }

    while vm.mempool_len() > 0 {
        if rx.recv().await.is_none() {
            break;
        }
        loop {
            match vm.build_block() {
                Ok(block) => {
                    vm.verify_block(&block)?;
                    vm.set_preference(block.id())?;
                    vm.accept(block.id())?;
                    println!("accepted {} on {}", block.id(), block.parent_id());
                }
                Err(VmError::NoPendingBlocks) => break,
                Err(err) => return Err(err),
            }
        }
    }

    println!("tip {}", vm.last_accepted());
    vm.shutdown()
}

fn parse_args() -> Result<Args, String> {
    let argv: Vec<String> = env::args().collect();
    let mut args = Args {
        db_path: None,
        genesis: Vec::new(),
        proposals: Vec::new(),
    };

    let mut i = 1;
    while i < argv.len() {
        match argv[i].as_str() {
            "--db" => {
                i += 1;
                let path = argv.get(i).ok_or("--db requires an argument")?;
                args.db_path = Some(path.clone());
            }
            "--genesis" => {
                i += 1;
                let raw = argv.get(i).ok_or("--genesis requires an argument")?;
                let bytes = decode_hex(raw)?;
                if bytes.len() > DATA_LEN {
                    return Err(format!(
                        "--genesis accepts at most {} bytes, got {}",
                        DATA_LEN,
                        bytes.len()
                    ));
                }
                args.genesis = bytes;
            }
            "--propose" => {
                i += 1;
                let raw = argv.get(i).ok_or("--propose requires an argument")?;
                let bytes = decode_hex(raw)?;
                if bytes.len() > DATA_LEN {
                    return Err(format!(
                        "--propose accepts at most {} bytes, got {}",
                        DATA_LEN,
                        bytes.len()
                    ));
                }
                let mut data = [0u8; DATA_LEN];
                data[..bytes.len()].copy_from_slice(&bytes);
                args.proposals.push(data);
            }
            "--help" | "-h" => {
                print_usage(&argv[0]);
                process::exit(0);
            }
            other => return Err(format!("unknown argument: {}", other)),
        }
        i += 1;
    }

    Ok(args)
}

fn decode_hex(raw: &str) -> Result<Vec<u8>, String> {
    let raw = raw.strip_prefix("0x").unwrap_or(raw);
    hex::decode(raw).map_err(|err| format!("invalid hex {:?}: {}", raw, err))
}

fn print_usage(binary: &str) {
    eprintln!("Usage: {} [OPTIONS]", binary);
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <path>       RocksDB directory (runs in memory when omitted)");
    eprintln!("  --genesis <hex>   Genesis payload, at most 32 bytes");
    eprintln!("  --propose <hex>   Payload to propose, zero-padded to 32 bytes (repeatable)");
    eprintln!("  -h, --help        Show this help");
}
