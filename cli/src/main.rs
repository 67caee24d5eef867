use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod util;

use commands::navigate::Direction;
use commands::snapshot::SnapshotCommands;

#[derive(Parser)]
#[command(
    name = "armora",
    version,
    about = "Armora CLI: score protection questionnaires and walk the progressive assessment flow"
)]
struct Cli {
    /// Print compact JSON instead of pretty-printed
    #[arg(long, global = true)]
    raw: bool,

    /// Snapshot store file (defaults to <config dir>/armora/assessments.json)
    #[arg(long, env = "ARMORA_STORE_PATH", global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score responses and resolve the assessment path
    Assess {
        /// Responses JSON file keyed by step (use '-' for stdin)
        #[arg(long, short = 'f')]
        responses: Option<String>,
    },
    /// Score explicitly chosen risk factors
    AssessManual {
        /// Catalog factor id (repeatable, e.g. --factor celebrity --factor daily)
        #[arg(long = "factor")]
        factors: Vec<String>,
        /// Probability override (1-5)
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
        probability: Option<u8>,
        /// Impact override (1-5)
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
        impact: Option<u8>,
    },
    /// List the steps the questionnaire presents for these responses
    Steps {
        /// Responses JSON file keyed by step (use '-' for stdin)
        #[arg(long, short = 'f')]
        responses: Option<String>,
        /// User type for the progress count
        #[arg(long, default_value = "individual")]
        user_type: String,
    },
    /// Step after the current one
    Next {
        /// Current step id (e.g. "2.5" or "step2_5")
        #[arg(long)]
        current: String,
        /// Responses JSON file keyed by step (use '-' for stdin)
        #[arg(long, short = 'f')]
        responses: Option<String>,
    },
    /// Step before the current one
    Previous {
        /// Current step id (e.g. "2.5" or "step2_5")
        #[arg(long)]
        current: String,
        /// Responses JSON file keyed by step (use '-' for stdin)
        #[arg(long, short = 'f')]
        responses: Option<String>,
    },
    /// Validate an answer for a step (exit 1 when invalid)
    Validate {
        /// Step id (e.g. "6.5")
        #[arg(long)]
        step: String,
        /// Answer as JSON, or a bare word for a single choice
        #[arg(long)]
        value: Option<String>,
        /// Responses JSON file keyed by step (use '-' for stdin)
        #[arg(long, short = 'f')]
        responses: Option<String>,
    },
    /// Saved assessment snapshots
    Snapshot {
        #[command(subcommand)]
        command: SnapshotCommands,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "armora=info,armora_core=info".into());
    let json = std::env::var("ARMORA_LOG_JSON").is_ok_and(|v| v == "true");

    // stdout carries command output, logs go to stderr
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn main() {
    let _ = dotenvy::dotenv();
    init_tracing();
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if !e.use_stderr() => e.exit(),
        Err(e) => {
            let _ = e.print();
            std::process::exit(util::EXIT_USAGE);
        }
    };
    let raw = cli.raw;

    let code = match cli.command {
        Commands::Assess { responses } => commands::assess::run(responses.as_deref(), raw),
        Commands::AssessManual {
            factors,
            probability,
            impact,
        } => commands::assess::run_manual(&factors, probability, impact, raw),
        Commands::Steps {
            responses,
            user_type,
        } => commands::steps::run(responses.as_deref(), &user_type, raw),
        Commands::Next { current, responses } => {
            commands::navigate::run(Direction::Next, &current, responses.as_deref(), raw)
        }
        Commands::Previous { current, responses } => {
            commands::navigate::run(Direction::Previous, &current, responses.as_deref(), raw)
        }
        Commands::Validate {
            step,
            value,
            responses,
        } => commands::validate::run(&step, value.as_deref(), responses.as_deref(), raw),
        Commands::Snapshot { command } => {
            commands::snapshot::run(cli.store.as_deref(), command, raw)
        }
    };

    std::process::exit(code);
}
