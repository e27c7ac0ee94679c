mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::compare::CompareArgs;
use commands::metrics::MetricsArgs;
use commands::projection::ProjectArgs;
use commands::sensitivity::SensitivityArgs;

/// Property-investment viability analysis
#[derive(Parser)]
#[command(
    name = "ladrillo",
    version,
    about = "Property-investment viability analysis",
    long_about = "A CLI for evaluating residential property investments with decimal \
                  precision. Computes purchase and financing metrics, projects the \
                  mortgage and cashflow month by month, stresses the assumptions \
                  under named scenarios, and compares studies side by side."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute viability metrics for a study
    Metrics(MetricsArgs),
    /// Project the loan and cashflow month by month
    Project(ProjectArgs),
    /// Stress a study under named scenarios
    Sensitivity(SensitivityArgs),
    /// Compare computed studies side by side
    Compare(CompareArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Metrics(args) => commands::metrics::run_metrics(args),
        Commands::Project(args) => commands::projection::run_project(args),
        Commands::Sensitivity(args) => commands::sensitivity::run_sensitivity(args),
        Commands::Compare(args) => commands::compare::run_compare(args),
        Commands::Version => {
            println!("ladrillo {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
