//! Named-scenario sensitivity analysis.
//!
//! Perturbs a study's assumptions scenario by scenario and reports how the
//! headline metrics move against the base case. Rent-driven shifts use a
//! deliberate linear scaling of the base metrics; shifts that touch the
//! financing rate or the cost base re-run the full calculator on a perturbed
//! copy of the study.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;

use crate::metrics::{derive_metrics, StudyMetrics};
use crate::risk::RiskScorecard;
use crate::study::{advise_on_degenerate_inputs, StudyInput};
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::LadrilloResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A named perturbation of the study's assumptions. Unset fields leave the
/// base untouched; set fields compose.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScenarioShift {
    /// Relative rent change (-0.10 means rent drops 10%)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rent_pct: Option<Decimal>,
    /// Absolute change to the annual financing rate (0.01 means +1pp)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_delta: Option<Rate>,
    /// Multiplier on the maintenance reserve (2 means doubled)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maintenance_factor: Option<Decimal>,
    /// Months of the year lost to vacancy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vacancy_months: Option<u32>,
}

impl ScenarioShift {
    /// Shifts that only move the rent side qualify for the linear shortcut;
    /// anything touching the rate or the cost base has to reprice.
    fn is_rent_only(&self) -> bool {
        self.rate_delta.is_none() && self.maintenance_factor.is_none()
    }
}

/// Deviations of a scenario from the base case (scenario minus base).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioChanges {
    pub net_annual_return: Rate,
    pub monthly_net_cashflow: Money,
    pub total_annual_return: Rate,
}

/// Headline metrics under one scenario, with the movement against base.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioOutcome {
    pub net_annual_return: Rate,
    pub monthly_net_cashflow: Money,
    pub total_annual_return: Rate,
    pub changes: ScenarioChanges,
}

/// Base metrics plus every scenario outcome, keyed by scenario name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityReport {
    pub base_scenario: StudyMetrics,
    pub scenarios: BTreeMap<String, ScenarioOutcome>,
}

// ---------------------------------------------------------------------------
// Standard scenario set
// ---------------------------------------------------------------------------

/// The engine's standard stress set: rent moves of ±5% and ±10%, rate rises
/// of +1pp and +2pp, a doubled maintenance reserve, and the study's vacancy
/// stress (clamped to one or two months).
pub fn standard_scenarios(input: &StudyInput) -> BTreeMap<String, ScenarioShift> {
    let mut scenarios = BTreeMap::new();

    for (name, pct) in [
        ("rent_minus_10pct", dec!(-0.10)),
        ("rent_minus_5pct", dec!(-0.05)),
        ("rent_plus_5pct", dec!(0.05)),
        ("rent_plus_10pct", dec!(0.10)),
    ] {
        scenarios.insert(
            name.to_string(),
            ScenarioShift {
                rent_pct: Some(pct),
                ..ScenarioShift::default()
            },
        );
    }

    for (name, delta) in [("rate_plus_1pp", dec!(0.01)), ("rate_plus_2pp", dec!(0.02))] {
        scenarios.insert(
            name.to_string(),
            ScenarioShift {
                rate_delta: Some(delta),
                ..ScenarioShift::default()
            },
        );
    }

    scenarios.insert(
        "maintenance_x2".to_string(),
        ScenarioShift {
            maintenance_factor: Some(dec!(2)),
            ..ScenarioShift::default()
        },
    );

    let vacancy = input.stress_vacancy_months.clamp(1, 2);
    scenarios.insert(
        format!("vacancy_{vacancy}m"),
        ScenarioShift {
            vacancy_months: Some(vacancy),
            ..ScenarioShift::default()
        },
    );

    scenarios
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Evaluate the study under each named scenario.
///
/// Passing `None` runs the standard set derived from the study. The base
/// study is never mutated; report iteration order follows the map's key
/// order, so identical inputs produce identical reports.
pub fn analyze_sensitivity(
    input: &StudyInput,
    scenarios: Option<&BTreeMap<String, ScenarioShift>>,
) -> LadrilloResult<ComputationOutput<SensitivityReport>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    let scorecard = RiskScorecard::default();

    advise_on_degenerate_inputs(input, &mut warnings);
    let base = derive_metrics(input, &scorecard, &mut warnings);

    let standard;
    let scenarios = match scenarios {
        Some(named) => named,
        None => {
            standard = standard_scenarios(input);
            &standard
        }
    };

    let mut outcomes = BTreeMap::new();
    for (name, shift) in scenarios {
        let outcome = if shift.is_rent_only() {
            scale_linearly(&base, input.monthly_rent, shift, name, &mut warnings)
        } else {
            reprice(input, &base, &scorecard, shift, name, &mut warnings)
        };
        outcomes.insert(name.clone(), outcome);
    }

    let report = SensitivityReport {
        base_scenario: base,
        scenarios: outcomes,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Named-Scenario Sensitivity Analysis",
        &serde_json::json!({
            "study": input,
            "scenarios": scenarios,
        }),
        warnings,
        elapsed,
        report,
    ))
}

// ---------------------------------------------------------------------------
// Evaluation paths
// ---------------------------------------------------------------------------

/// The deliberate cheap path for rent-side scenarios: scale the base metrics
/// by the rent ratio instead of re-running the calculator. With no base rent
/// there is no ratio and the outcome reads 0; a cut past -100% floors the
/// ratio at 0 with a warning rather than flipping metric signs.
fn scale_linearly(
    base: &StudyMetrics,
    base_rent: Money,
    shift: &ScenarioShift,
    name: &str,
    warnings: &mut Vec<String>,
) -> ScenarioOutcome {
    let ratio = if base_rent <= Decimal::ZERO {
        Decimal::ZERO
    } else {
        let ratio = rent_ratio(shift);
        if ratio < Decimal::ZERO {
            warnings.push(format!(
                "[{name}] Rent shift is below -100% — collected rent floors at 0"
            ));
            Decimal::ZERO
        } else {
            ratio
        }
    };

    outcome_against_base(
        base,
        base.net_annual_return * ratio,
        base.monthly_net_cashflow * ratio,
        base.total_annual_return * ratio,
    )
}

fn rent_ratio(shift: &ScenarioShift) -> Decimal {
    let mut ratio = Decimal::ONE;
    if let Some(pct) = shift.rent_pct {
        ratio *= Decimal::ONE + pct;
    }
    if let Some(months) = shift.vacancy_months {
        let vacant = Decimal::from(months.min(12));
        ratio *= (dec!(12) - vacant) / dec!(12);
    }
    ratio
}

/// Full calculator re-run on a perturbed copy of the study, so a rate shift
/// genuinely reprices the annuity payment.
fn reprice(
    input: &StudyInput,
    base: &StudyMetrics,
    scorecard: &RiskScorecard,
    shift: &ScenarioShift,
    name: &str,
    warnings: &mut Vec<String>,
) -> ScenarioOutcome {
    let mut perturbed = input.clone();

    if let Some(pct) = shift.rent_pct {
        perturbed.monthly_rent *= Decimal::ONE + pct;
    }
    if let Some(months) = shift.vacancy_months {
        let vacant = Decimal::from(months.min(12));
        perturbed.monthly_rent *= (dec!(12) - vacant) / dec!(12);
    }
    if let Some(delta) = shift.rate_delta {
        perturbed.interest_rate += delta;
        // The reference index is quoted in percent units; shift the whole
        // curve so variable-rate studies move with the scenario too.
        if let Some(vector) = perturbed.reference_rate_vector.as_mut() {
            for entry in vector.iter_mut() {
                *entry += delta * dec!(100);
            }
        }
    }
    if let Some(factor) = shift.maintenance_factor {
        perturbed.maintenance_rate *= factor;
    }

    let mut scenario_warnings = Vec::new();
    let metrics = derive_metrics(&perturbed, scorecard, &mut scenario_warnings);
    for warning in scenario_warnings {
        warnings.push(format!("[{name}] {warning}"));
    }

    outcome_against_base(
        base,
        metrics.net_annual_return,
        metrics.monthly_net_cashflow,
        metrics.total_annual_return,
    )
}

fn outcome_against_base(
    base: &StudyMetrics,
    net_annual_return: Rate,
    monthly_net_cashflow: Money,
    total_annual_return: Rate,
) -> ScenarioOutcome {
    ScenarioOutcome {
        net_annual_return,
        monthly_net_cashflow,
        total_annual_return,
        changes: ScenarioChanges {
            net_annual_return: net_annual_return - base.net_annual_return,
            monthly_net_cashflow: monthly_net_cashflow - base.monthly_net_cashflow,
            total_annual_return: total_annual_return - base.total_annual_return,
        },
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
