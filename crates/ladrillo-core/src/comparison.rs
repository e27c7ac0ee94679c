use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::LadrilloError;
use crate::metrics::StudyMetrics;
use crate::risk::RiskLevel;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::LadrilloResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Default cap on how many studies one comparison may hold. The cap itself
/// is calling-layer policy; the engine only enforces what it is handed.
pub const DEFAULT_MAX_STUDIES: usize = 10;

/// A computed study entering a comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparandStudy {
    pub study_id: String,
    pub metrics: StudyMetrics,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonInput {
    pub studies: Vec<ComparandStudy>,
}

/// Comparison policy knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonOptions {
    pub max_studies: usize,
}

impl Default for ComparisonOptions {
    fn default() -> Self {
        Self {
            max_studies: DEFAULT_MAX_STUDIES,
        }
    }
}

/// One study's headline figures, in input order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub study_id: String,
    pub monthly_net_cashflow: Money,
    pub net_annual_return: Rate,
    pub total_annual_return: Rate,
    pub down_payment: Money,
    pub loan_to_value: Rate,
    pub risk_level: RiskLevel,
    pub is_favorable: bool,
}

/// Study ids winning each dimension. Ties resolve to the earliest entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Winners {
    pub best_monthly_cashflow: String,
    pub best_net_annual_return: String,
    pub best_total_annual_return: String,
    pub lowest_risk: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub rows: Vec<ComparisonRow>,
    pub winners: Winners,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Compare computed studies side by side and name the winners.
///
/// Needs at least two studies and refuses more than `options.max_studies`.
/// Rows keep the input order; winner scans use strict comparisons, so the
/// earliest entry keeps a tie.
pub fn compare_studies(
    input: &ComparisonInput,
    options: &ComparisonOptions,
) -> LadrilloResult<ComputationOutput<ComparisonReport>> {
    let start = Instant::now();
    let warnings: Vec<String> = Vec::new();

    if input.studies.len() < 2 {
        return Err(LadrilloError::InsufficientData(
            "Comparison requires at least 2 computed studies".into(),
        ));
    }

    if input.studies.len() > options.max_studies {
        return Err(LadrilloError::InvalidInput {
            field: "studies".into(),
            reason: format!(
                "{} studies exceed the cap of {}",
                input.studies.len(),
                options.max_studies
            ),
        });
    }

    let rows: Vec<ComparisonRow> = input
        .studies
        .iter()
        .map(|s| ComparisonRow {
            study_id: s.study_id.clone(),
            monthly_net_cashflow: s.metrics.monthly_net_cashflow,
            net_annual_return: s.metrics.net_annual_return,
            total_annual_return: s.metrics.total_annual_return,
            down_payment: s.metrics.down_payment,
            loan_to_value: s.metrics.loan_to_value,
            risk_level: s.metrics.risk.level,
            is_favorable: s.metrics.is_favorable,
        })
        .collect();

    let winners = Winners {
        best_monthly_cashflow: best_by(&input.studies, |m| m.monthly_net_cashflow),
        best_net_annual_return: best_by(&input.studies, |m| m.net_annual_return),
        best_total_annual_return: best_by(&input.studies, |m| m.total_annual_return),
        lowest_risk: lowest_risk(&input.studies),
    };

    let report = ComparisonReport { rows, winners };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Cross-Study Comparison",
        &serde_json::json!({
            "study_ids": input.studies.iter().map(|s| s.study_id.clone()).collect::<Vec<_>>(),
            "max_studies": options.max_studies,
        }),
        warnings,
        elapsed,
        report,
    ))
}

// ---------------------------------------------------------------------------
// Winner scans
// ---------------------------------------------------------------------------

/// Id of the study with the strictly highest reading of `metric`.
fn best_by(studies: &[ComparandStudy], metric: impl Fn(&StudyMetrics) -> Decimal) -> String {
    let mut best = &studies[0];
    for candidate in &studies[1..] {
        if metric(&candidate.metrics) > metric(&best.metrics) {
            best = candidate;
        }
    }
    best.study_id.clone()
}

/// Id of the study with the strictly lowest risk grade. Scores inside the
/// same grade do not break ties; input order does.
fn lowest_risk(studies: &[ComparandStudy]) -> String {
    let mut best = &studies[0];
    for candidate in &studies[1..] {
        if candidate.metrics.risk.level < best.metrics.risk.level {
            best = candidate;
        }
    }
    best.study_id.clone()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
