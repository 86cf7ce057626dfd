//! Arbor CLI entry point.
//!
//! The pipeline is stateful and in-memory, so both subcommands hold the core
//! for the life of the invocation: `repl` keeps one alive across a stdin
//! session, `process` activates and runs a single command.

use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use arbor::config::PolicySet;
use arbor::{Core, Result};

/// Arbor - stateful command-filtering pipeline
#[derive(Parser)]
#[command(name = "arbor")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Options shared by both subcommands.
#[derive(Args)]
struct CoreOptions {
    /// Seed the random source for reproducible runs
    #[arg(long)]
    seed: Option<u64>,
    /// Open the external-data gate
    #[arg(long)]
    allow_external: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive session: plain lines are processed, `:`-directives manage
    /// the core (`:genesis`, `:operate`, `:status`, `:fetch`, `:prune`,
    /// `:quit`)
    Repl {
        #[command(flatten)]
        core: CoreOptions,
    },

    /// Activate and process a single command
    Process {
        /// Genesis key phrase
        #[arg(long)]
        genesis: Option<String>,
        /// Operational key phrase
        #[arg(long)]
        operational: Option<String>,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        #[command(flatten)]
        core: CoreOptions,
        /// The command text
        command: Vec<String>,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("arbor error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Repl { core } => run_repl(&core),
        Commands::Process {
            genesis,
            operational,
            json,
            core,
            command,
        } => run_process(
            genesis.as_deref(),
            operational.as_deref(),
            json,
            &core,
            &command.join(" "),
        ),
    }
}

fn build_core(options: &CoreOptions) -> Result<Core> {
    let policy = PolicySet::builtin();
    let mut core = match options.seed {
        Some(seed) => Core::seeded(policy, seed)?,
        None => Core::new(policy)?,
    };
    core.set_external_access(options.allow_external);
    Ok(core)
}

fn run_repl(options: &CoreOptions) -> Result<ExitCode> {
    let mut core = build_core(options)?;
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        write!(stdout, "arbor> ")?;
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();

        if line.is_empty() {
            continue;
        }
        match line.split_once(' ').unwrap_or((line, "")) {
            (":quit", _) => break,
            (":status", _) => print!("{}", core.status().format_text()),
            (":genesis", phrase) => {
                let engaged = core.activate_genesis(phrase.trim());
                println!("genesis lock: {}", if engaged { "engaged" } else { "refused" });
            }
            (":operate", phrase) => {
                let engaged = core.activate_operational(phrase.trim());
                println!(
                    "operational lock: {}",
                    if engaged { "engaged" } else { "refused" }
                );
            }
            (":fetch", query) => println!("{}", core.fetch_external(query.trim())),
            (":prune", threshold) => match threshold.trim().parse::<f64>() {
                Ok(threshold) => {
                    println!("pruned {} suggestions", core.prune_garden(threshold));
                }
                Err(_) => println!("usage: :prune <threshold>"),
            },
            _ => println!("{}", core.process(line)),
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn run_process(
    genesis: Option<&str>,
    operational: Option<&str>,
    json: bool,
    options: &CoreOptions,
    command: &str,
) -> Result<ExitCode> {
    let mut core = build_core(options)?;

    if let Some(phrase) = genesis {
        core.activate_genesis(phrase);
    }
    if let Some(phrase) = operational {
        core.activate_operational(phrase);
    }

    let outcome = core.process_outcome(command);
    let refused = outcome.is_refusal();
    let response = outcome.to_string();

    if json {
        let payload = serde_json::json!({
            "response": response,
            "refused": refused,
            "status": core.status(),
        });
        println!("{}", serde_json::to_string_pretty(&payload).unwrap_or_default());
    } else {
        println!("{response}");
    }

    Ok(if refused {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
