use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

mod cmd;

#[derive(Parser)]
#[command(name = "cadence")]
#[command(version, about = "Multi-phase task orchestration engine")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Journal file backing the context store.
    #[arg(long, global = true, default_value = "cadence.jsonl")]
    pub journal: PathBuf,

    /// Emit logs as JSON.
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Also write logs to a daily-rolling file in this directory.
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show recorded runs, or one run in detail
    Status {
        /// Run id to inspect
        #[arg(short, long)]
        run: Option<Uuid>,
    },
    /// Show the version history of a context store key
    History {
        /// Logical key, e.g. decisionLog/auth-oauth
        key: String,
    },
    /// Show gate evaluation history for a run
    Gates {
        #[arg(short, long)]
        run: Uuid,
        /// Only show evaluations of this gate
        #[arg(long)]
        gate: Option<String>,
    },
    /// Validate a blueprint file
    Check {
        /// Path to the blueprint JSON
        blueprint: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_tracing(&cli);

    match &cli.command {
        Commands::Status { run } => cmd::status::run(&cli.journal, *run),
        Commands::History { key } => cmd::history::run(&cli.journal, key),
        Commands::Gates { run, gate } => cmd::gates::run(&cli.journal, *run, gate.as_deref()),
        Commands::Check { blueprint } => cmd::check::run(blueprint),
    }
}

fn init_tracing(cli: &Cli) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if cli.verbose { "debug" } else { "info" }));

    match &cli.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "cadence.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let builder = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false);
            if cli.log_json {
                builder.json().init();
            } else {
                builder.init();
            }
            Some(guard)
        }
        None => {
            let builder = tracing_subscriber::fmt().with_env_filter(filter);
            if cli.log_json {
                builder.json().init();
            } else {
                builder.init();
            }
            None
        }
    }
}
