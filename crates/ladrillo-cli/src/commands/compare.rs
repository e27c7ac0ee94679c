use clap::Args;
use serde::Deserialize;
use serde_json::Value;

use ladrillo_core::comparison::{self, ComparandStudy, ComparisonInput, ComparisonOptions};
use ladrillo_core::metrics;
use ladrillo_core::study::StudyInput;

use crate::input;

/// Arguments for cross-study comparison
#[derive(Args)]
pub struct CompareArgs {
    /// Path to a JSON file with the studies to compare
    #[arg(long)]
    pub input: Option<String>,

    /// Upper bound on the number of studies (default 10)
    #[arg(long)]
    pub max_studies: Option<usize>,
}

/// On-disk shape of a comparison request: raw studies keyed by id. Their
/// metrics are computed here before the comparison runs.
#[derive(Deserialize)]
struct CompareSpec {
    studies: Vec<CompareEntry>,
}

#[derive(Deserialize)]
struct CompareEntry {
    study_id: String,
    study: StudyInput,
}

pub fn run_compare(args: CompareArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let spec: CompareSpec = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(spec) = input::stdin::read_stdin()? {
        spec
    } else {
        return Err("--input <file.json> or stdin required for a comparison".into());
    };

    // Per-study computation warnings would otherwise vanish; carry them
    // into the comparison envelope tagged with the study id
    let mut carried_warnings: Vec<String> = Vec::new();
    let mut studies = Vec::with_capacity(spec.studies.len());
    for entry in spec.studies {
        let computed = metrics::compute_study_metrics(&entry.study)?;
        for warning in computed.warnings {
            carried_warnings.push(format!("[{}] {}", entry.study_id, warning));
        }
        studies.push(ComparandStudy {
            study_id: entry.study_id,
            metrics: computed.result,
        });
    }

    let options = ComparisonOptions {
        max_studies: args.max_studies.unwrap_or(comparison::DEFAULT_MAX_STUDIES),
    };

    let result = comparison::compare_studies(&ComparisonInput { studies }, &options)?;

    let mut value = serde_json::to_value(result)?;
    if let Some(Value::Array(warnings)) = value.get_mut("warnings") {
        for warning in carried_warnings {
            warnings.push(Value::String(warning));
        }
    }
    Ok(value)
}
