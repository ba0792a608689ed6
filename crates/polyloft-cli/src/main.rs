//! Polyloft command-line interface
//!
//! `polyloft run <file>`, `polyloft eval <code>` and `polyloft repl`.
//! Diagnostics go to stderr through `tracing`; program output goes to stdout.

mod commands;

use clap::{Args, Parser, Subcommand};
use polyloft_engine::{EvalOptions, SelectPolicy};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "polyloft")]
#[command(about = "Polyloft scripting language runtime", long_about = None)]
#[command(version)]
struct Cli {
    #[command(flatten)]
    runtime: RuntimeFlags,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct RuntimeFlags {
    /// Maximum call depth before evaluation fails
    #[arg(long, global = true)]
    max_depth: Option<usize>,

    /// Pick uniformly among ready `select` cases instead of the first declared
    #[arg(long, global = true)]
    random_select: bool,

    /// Log engine events at debug level
    #[arg(short, long, global = true)]
    verbose: bool,
}

impl RuntimeFlags {
    fn options(&self) -> EvalOptions {
        let mut options = EvalOptions::default();
        if let Some(depth) = self.max_depth {
            options = options.with_max_call_depth(depth);
        }
        if self.random_select {
            options = options.with_select_policy(SelectPolicy::Random);
        }
        options
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run a Polyloft file
    Run {
        /// Input file
        file: String,
    },

    /// Evaluate inline source and print the result
    Eval {
        /// Source code
        code: String,
    },

    /// Start interactive REPL
    Repl,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.runtime.verbose);
    let options = cli.runtime.options();

    match cli.command {
        Commands::Run { file } => commands::run::execute(&file, options),
        Commands::Eval { code } => commands::eval::execute(&code, options),
        Commands::Repl => commands::repl::execute(options),
    }
}

/// `POLYLOFT_LOG` sets the filter; `--verbose` overrides it with `debug`.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("POLYLOFT_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
