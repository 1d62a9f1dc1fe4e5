//! skiproot CLI - build authenticated skip lists, issue rank proofs and verify them offline.

use clap::{Parser, Subcommand};
use log::LevelFilter;

mod commands;
mod output;

use commands::{bench, build, prove, verify, ListArgs};
use skiproot_core::VerifyMode;

#[derive(Parser)]
#[command(name = "skiproot")]
#[command(about = "Authenticated skip list roots, rank proofs and offline verification")]
struct Cli {
    /// Raise log verbosity (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a list and print its root and shape
    Build {
        #[command(flatten)]
        list: ListArgs,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Build a list and print the membership proof for one rank
    Prove {
        #[command(flatten)]
        list: ListArgs,
        /// 1-based rank of the element to prove
        #[arg(long)]
        rank: u64,
        /// Write the proof here instead of stdout
        #[arg(long)]
        output: Option<String>,
    },
    /// Verify a proof file against a root
    Verify {
        /// Proof file (or stdin if not provided)
        proof: Option<String>,
        /// Expected root, lowercase hex
        #[arg(long)]
        root: String,
        /// Verification mode: chained (leaf to root) or replay (terminal bytes only)
        #[arg(long, default_value = "chained")]
        mode: VerifyMode,
        /// Exit with error code if the proof is invalid
        #[arg(long)]
        strict: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Prove and verify every rank of a sampled list and report costs
    Bench {
        #[command(flatten)]
        list: ListArgs,
        /// Verification mode used for every rank
        #[arg(long, default_value = "replay")]
        mode: VerifyMode,
        /// Emit the summary as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let env = env_logger::Env::default().default_filter_or(level.as_str());
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .try_init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Build { list, json } => build::run(list, json),
        Commands::Prove { list, rank, output } => prove::run(list, rank, output),
        Commands::Verify {
            proof,
            root,
            mode,
            strict,
            json,
        } => verify::run(proof, root, mode, strict, json),
        Commands::Bench { list, mode, json } => bench::run(list, mode, json),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
