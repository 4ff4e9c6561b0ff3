//! League Draw CLI
//!
//! Runs full league-phase draws, verifies saved states and prints rosters.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use draw_cli::{format_fixtures, load_config, load_roster, run_draw, verify_state, write_report, RunOptions};

#[derive(Parser)]
#[command(name = "league_draw")]
#[command(about = "League-phase draw: 36 teams, 4 pots, 8 opponents each", long_about = None)]
struct Cli {
    /// Debug logging (overridden by RUST_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a complete draw
    Run {
        /// Roster JSON file (embedded 2024/25 roster when omitted)
        #[arg(long)]
        roster: Option<PathBuf>,

        /// Seed for a reproducible draw
        #[arg(long)]
        seed: Option<u64>,

        /// Draw config JSON file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Try search candidates in id order
        #[arg(long, default_value = "false")]
        no_shuffle: bool,

        /// Write the draw report as JSON
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Check a saved draw state
    Verify {
        /// Dashed state string, e.g. "0-12-0-20"
        #[arg(long)]
        state: String,

        /// Roster JSON file (embedded 2024/25 roster when omitted)
        #[arg(long)]
        roster: Option<PathBuf>,
    },

    /// Print the roster by pot
    Roster {
        #[arg(long)]
        roster: Option<PathBuf>,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Run { roster, seed, config, no_shuffle, out } => {
            let label = roster
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "embedded".to_string());
            let roster = load_roster(roster.as_deref())?;
            let config = load_config(config.as_deref(), &RunOptions { seed, no_shuffle })?;

            let (session, report) = run_draw(roster, config, &label)?;
            for line in format_fixtures(&session) {
                println!("{}", line);
            }
            println!("\nSeed:  {}", report.result.seed.map_or("-".to_string(), |s| s.to_string()));
            println!("State: {}", report.result.state);

            if let Some(path) = out {
                write_report(&path, &report)?;
                println!("Report saved to: {}", path.display());
            }
        }

        Commands::Verify { state, roster } => {
            let roster = load_roster(roster.as_deref())?;
            let report = verify_state(&roster, &state)?;
            println!("Fixtures: {}", report.fixtures);
            println!("Complete: {}", report.complete);
            match report.violation {
                None => println!("Valid"),
                Some(violation) => anyhow::bail!("Invalid state: {}", violation),
            }
        }

        Commands::Roster { roster } => {
            let roster = load_roster(roster.as_deref())?;
            println!("{} teams from {} countries", roster.len(), roster.country_count());
            for pot in 0..draw_core::POT_COUNT {
                println!("Pot {}", pot + 1);
                for id in roster.pot_members(pot) {
                    let team = roster.team(id);
                    println!("  {:>2}  {} ({})", id.0, team.name, team.country_label);
                }
            }
        }
    }

    Ok(())
}
