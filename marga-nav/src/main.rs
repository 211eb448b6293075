//! MargaNav - command-line entry point
//!
//! ```bash
//! # Stream commands on stdin, events on stdout
//! marga-nav serve < commands.jsonl
//!
//! # One-shot world export, optionally as a simulated mission
//! marga-nav --config marga.toml batch world.json --simulate
//!
//! # Summarise the state a recorded event log ends in
//! marga-nav replay events.jsonl
//! ```
//!
//! Logs go to stderr so stdout carries only the event stream.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use marga_map::CancelToken;
use marga_nav::events::{JsonLinesWriter, read_event_log};
use marga_nav::protocol::WorldExport;
use marga_nav::signal::setup_shutdown_handler;
use marga_nav::threads::{LINE_QUEUE_CAPACITY, run_session, spawn_reader};
use marga_nav::{EventEmitter, MargaConfig, Result, Session, replay};

#[derive(Parser)]
#[command(name = "marga-nav", version)]
#[command(about = "Plan mine-avoiding paths and stream them as JSON-lines events")]
struct Cli {
    /// TOML configuration file (default: ./marga.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    mode: Option<Mode>,
}

#[derive(Subcommand)]
enum Mode {
    /// Read commands from stdin until end of input (default)
    Serve,
    /// Plan once from a world export file
    Batch {
        /// World export JSON
        file: PathBuf,
        /// Treat mines as hidden and fly a simulated mission
        #[arg(long)]
        simulate: bool,
    },
    /// Rebuild the final state of a recorded event log and print it as JSON
    Replay {
        /// JSON-lines event log
        file: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<bool> {
    let config = MargaConfig::load_or_default(cli.config.as_deref())?;
    init_logging(&config);

    info!("MargaNav v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Planner: max_expansions={} halo={:.2} (weight {:.1}), sensor range {:.2}",
        config.planner.max_expansions,
        config.planner.halo_distance,
        config.planner.halo_weight,
        config.mission.sensor_range
    );

    match cli.mode.unwrap_or(Mode::Serve) {
        Mode::Serve => {
            let (mut session, shutdown) = open_session(config)?;
            let (lines, _reader) = spawn_reader(BufReader::new(io::stdin()), LINE_QUEUE_CAPACITY)?;
            let handled = run_session(&mut session, &lines, &shutdown);
            info!("Session ended after {} commands", handled);
            Ok(true)
        }
        Mode::Batch { file, simulate } => {
            info!("Batch run from {:?} (simulate: {})", file, simulate);
            let export = WorldExport::load(&file)?;
            let (mut session, _shutdown) = open_session(config)?;
            Ok(session.run_export(&export, simulate))
        }
        Mode::Replay { file } => replay_log(&file),
    }
}

/// Session streaming events to stdout, cancelled by Ctrl-C
fn open_session(config: MargaConfig) -> Result<(Session, CancelToken)> {
    let shutdown = setup_shutdown_handler()?;
    let emitter = EventEmitter::new().with_listener(Box::new(JsonLinesWriter::new(io::stdout())));
    let mut session = Session::new(config, emitter).with_cancel_token(shutdown.clone());
    session.announce();
    Ok((session, shutdown))
}

fn replay_log(file: &Path) -> Result<bool> {
    let events = read_event_log(BufReader::new(File::open(file)?))?;
    let state = replay(&events)?;
    info!("Replayed {} events from {:?}", events.len(), file);
    println!("{}", state.summary());
    Ok(state.errors == 0)
}

fn init_logging(config: &MargaConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}
