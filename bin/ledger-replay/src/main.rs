use std::{fs, io::Write, path::Path};

use args::Args;
use errors::{ConfigError, InitError};
use ledger_common::{env::parse_env_or, logging};
use ledger_config::Config;
use ledger_exec::{build_item_workers, process_block, BlockOutput, ProcessorRegistry};
use ledger_ops::Operation;
use ledger_primitives::prelude::*;
use ledger_state::prelude::*;
use serde::{de::DeserializeOwned, Deserialize};
use tracing::*;

mod args;
mod errors;

/// Env var overriding `exec.item_workers` after all other overrides.
const ITEM_WORKERS_ENVVAR: &str = "LEDGER_ITEM_WORKERS";

/// A block as read from disk.
#[derive(Debug, Deserialize)]
struct BlockFile {
    height: Height,
    operations: Vec<Operation>,
}

fn main() -> anyhow::Result<()> {
    let args: Args = argh::from_env();
    if let Err(e) = main_inner(args) {
        eprintln!("FATAL ERROR: {e}");
        return Err(e);
    }

    Ok(())
}

fn main_inner(args: Args) -> anyhow::Result<()> {
    let config = get_config(&args)?;
    init_logging(&config);

    let genesis: Vec<State> = load_json(&args.genesis)?;
    let block: BlockFile = load_json(&args.block)?;
    info!(
        states = genesis.len(),
        ops = block.operations.len(),
        height = block.height,
        "loaded block"
    );

    let n_workers = parse_env_or(ITEM_WORKERS_ENVVAR, config.exec.item_workers);
    let workers = build_item_workers(n_workers)?;
    let accessor = MemStateAccessor::from_states(genesis);
    let registry = ProcessorRegistry::with_defaults()?;

    let out = process_block(
        block.height,
        &block.operations,
        &accessor,
        &config.params,
        &registry,
        workers.as_ref(),
    )?;

    write_output(&out)?;
    logging::finalize();
    Ok(())
}

/// Reads the config toml and applies the command line overrides on top.
fn get_config(args: &Args) -> Result<Config, InitError> {
    let raw = fs::read_to_string(&args.config)
        .map_err(|e| InitError::Read(args.config.clone(), e))?;
    let mut value = toml::from_str::<toml::Value>(&raw)?;
    let table = value.as_table_mut().ok_or(ConfigError::NotTable)?;

    for o in args.get_overrides() {
        let (path, val) = args::parse_override(&o)?;
        args::apply_override(&path, val, table)?;
    }

    Ok(value.try_into()?)
}

fn init_logging(config: &Config) {
    let mut lconfig = logging::LoggerConfig::with_base_name(&config.logging.whoami);
    if let Some(filter) = &config.logging.filter {
        lconfig.set_filter(filter.clone());
    }
    logging::init(lconfig);
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, InitError> {
    let raw = fs::read_to_string(path).map_err(|e| InitError::Read(path.to_path_buf(), e))?;
    serde_json::from_str(&raw).map_err(|e| InitError::Json(path.to_path_buf(), e))
}

fn write_output(out: &BlockOutput) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, out)?;
    writeln!(stdout)?;
    Ok(())
}
