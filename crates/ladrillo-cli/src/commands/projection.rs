use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use ladrillo_core::projection::{self, ProjectionOptions};
use ladrillo_core::study::StudyInput;

use crate::input;

/// Arguments for the month-by-month projection
#[derive(Args)]
pub struct ProjectArgs {
    /// Path to JSON study file
    #[arg(long)]
    pub input: Option<String>,

    /// Projection horizon in years, clamped to 1-30 (default 10)
    #[arg(long)]
    pub years: Option<u32>,

    /// Annual property appreciation rate (default 0.03)
    #[arg(long)]
    pub appreciation: Option<Decimal>,
}

pub fn run_project(args: ProjectArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let study: StudyInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(study) = input::stdin::read_stdin()? {
        study
    } else {
        return Err("--input <file.json> or stdin required for a projection".into());
    };

    let mut options = ProjectionOptions::default();
    if let Some(years) = args.years {
        options.years = years;
    }
    if let Some(rate) = args.appreciation {
        options.annual_appreciation = rate;
    }

    let result = projection::project_study(&study, &options)?;
    Ok(serde_json::to_value(result)?)
}
