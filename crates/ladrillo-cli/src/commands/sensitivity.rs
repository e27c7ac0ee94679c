use clap::Args;
use serde_json::Value;
use std::collections::BTreeMap;

use ladrillo_core::sensitivity::{self, ScenarioShift};
use ladrillo_core::study::StudyInput;

use crate::input;

/// Arguments for scenario stress-testing
#[derive(Args)]
pub struct SensitivityArgs {
    /// Path to JSON study file
    #[arg(long)]
    pub input: Option<String>,

    /// Path to a JSON map of named scenario shifts; omit to run the
    /// standard stress set
    #[arg(long)]
    pub scenarios: Option<String>,
}

pub fn run_sensitivity(args: SensitivityArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let study: StudyInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(study) = input::stdin::read_stdin()? {
        study
    } else {
        return Err("--input <file.json> or stdin required for sensitivity analysis".into());
    };

    let custom: Option<BTreeMap<String, ScenarioShift>> = args
        .scenarios
        .as_deref()
        .map(input::file::read_json)
        .transpose()?;

    let result = sensitivity::analyze_sensitivity(&study, custom.as_ref())?;
    Ok(serde_json::to_value(result)?)
}
