use napi::Result as NapiResult;
use napi_derive::napi;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

#[napi]
pub fn study_metrics(input_json: String) -> NapiResult<String> {
    let input: ladrillo_core::study::StudyInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = ladrillo_core::metrics::compute_study_metrics(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Projection
// ---------------------------------------------------------------------------

#[derive(serde::Deserialize)]
struct ProjectionBindingInput {
    #[serde(flatten)]
    study: ladrillo_core::study::StudyInput,
    #[serde(default)]
    options: ladrillo_core::projection::ProjectionOptions,
}

#[napi]
pub fn project_study(input_json: String) -> NapiResult<String> {
    let binding_input: ProjectionBindingInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        ladrillo_core::projection::project_study(&binding_input.study, &binding_input.options)
            .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Sensitivity
// ---------------------------------------------------------------------------

#[derive(serde::Deserialize)]
struct SensitivityBindingInput {
    #[serde(flatten)]
    study: ladrillo_core::study::StudyInput,
    #[serde(default)]
    scenarios:
        Option<std::collections::BTreeMap<String, ladrillo_core::sensitivity::ScenarioShift>>,
}

#[napi]
pub fn sensitivity_analysis(input_json: String) -> NapiResult<String> {
    let binding_input: SensitivityBindingInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = ladrillo_core::sensitivity::analyze_sensitivity(
        &binding_input.study,
        binding_input.scenarios.as_ref(),
    )
    .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Comparison
// ---------------------------------------------------------------------------

#[derive(serde::Deserialize)]
struct CompareBindingEntry {
    study_id: String,
    study: ladrillo_core::study::StudyInput,
}

#[derive(serde::Deserialize)]
struct CompareBindingInput {
    studies: Vec<CompareBindingEntry>,
    #[serde(default)]
    max_studies: Option<usize>,
}

#[napi]
pub fn compare_studies(input_json: String) -> NapiResult<String> {
    let binding_input: CompareBindingInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;

    let mut studies = Vec::with_capacity(binding_input.studies.len());
    for entry in binding_input.studies {
        let computed =
            ladrillo_core::metrics::compute_study_metrics(&entry.study).map_err(to_napi_error)?;
        studies.push(ladrillo_core::comparison::ComparandStudy {
            study_id: entry.study_id,
            metrics: computed.result,
        });
    }

    let options = ladrillo_core::comparison::ComparisonOptions {
        max_studies: binding_input
            .max_studies
            .unwrap_or(ladrillo_core::comparison::DEFAULT_MAX_STUDIES),
    };

    let output = ladrillo_core::comparison::compare_studies(
        &ladrillo_core::comparison::ComparisonInput { studies },
        &options,
    )
    .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
