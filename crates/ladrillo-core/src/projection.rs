//! Month-by-month amortization and cashflow projection.
//!
//! Simulates the joint evolution of the loan, the property value, and the
//! rental cashflow over a bounded horizon. The loan ledger advances in
//! cent-quantized steps so the principal column telescopes exactly to the
//! amortized amount.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::metrics::{monthly_annuity_payment, monthly_operating_expenses, total_acquisition_cost};
use crate::study::{advise_on_degenerate_inputs, resolve_initial_annual_rate, RateType, StudyInput};
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::LadrilloResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Default projection horizon in years.
pub const DEFAULT_PROJECTION_YEARS: u32 = 10;

/// Requested horizons outside this range are clamped, not rejected.
pub const MIN_PROJECTION_YEARS: u32 = 1;
pub const MAX_PROJECTION_YEARS: u32 = 30;

/// Default property appreciation per year, compounded monthly. A deliberate
/// simplification: no market feed backs this number.
pub const DEFAULT_ANNUAL_APPRECIATION: Decimal = dec!(0.03);

/// Decimal places for currency and ratio fields on emitted records.
const CURRENCY_DP: u32 = 2;
const RATIO_DP: u32 = 4;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Knobs for a projection run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionOptions {
    /// Horizon in years, clamped to [1, 30]
    #[serde(default = "default_years")]
    pub years: u32,
    /// Annual appreciation applied to the property value
    #[serde(default = "default_appreciation")]
    pub annual_appreciation: Rate,
}

fn default_years() -> u32 {
    DEFAULT_PROJECTION_YEARS
}

fn default_appreciation() -> Rate {
    DEFAULT_ANNUAL_APPRECIATION
}

impl Default for ProjectionOptions {
    fn default() -> Self {
        Self {
            years: DEFAULT_PROJECTION_YEARS,
            annual_appreciation: DEFAULT_ANNUAL_APPRECIATION,
        }
    }
}

/// One month of the projection. Currency fields carry 2 decimal places,
/// ratios 4.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionRecord {
    /// Projection year, starting at 1
    pub year: u32,
    /// Month within the year, 1 to 12
    pub month: u32,
    /// Loan balance after this month's payment
    pub outstanding_loan_balance: Money,
    /// Down payment plus all principal repaid so far
    pub accumulated_equity: Money,
    /// Appreciated market value of the property
    pub property_value: Money,
    /// Rent charged this month (steps once per year)
    pub monthly_rent: Money,
    /// Interest portion of this month's payment
    pub monthly_interest: Money,
    /// Principal portion of this month's payment
    pub monthly_principal: Money,
    /// Fixed operating costs this month
    pub monthly_expenses: Money,
    /// Rent minus debt service minus expenses
    pub monthly_net_cashflow: Money,
    /// Running total of monthly net cashflows
    pub accumulated_cashflow: Money,
    /// This month's cashflow annualised over the down payment
    pub annual_return: Rate,
    /// Cashflow plus principal annualised over the down payment
    pub total_return_with_equity: Rate,
    /// Loan balance over current property value
    pub current_ltv: Rate,
}

/// Horizon-level aggregates over the full schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionSummary {
    pub final_property_value: Money,
    pub final_loan_balance: Money,
    /// Absolute month index (1-based) in which the loan was retired, if it
    /// happened within the horizon
    pub payoff_month: Option<u32>,
    pub total_interest_paid: Money,
    pub total_principal_paid: Money,
    pub total_net_cashflow: Money,
    pub final_accumulated_equity: Money,
    pub final_ltv: Rate,
}

/// Complete projection output: the monthly schedule plus its aggregates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationProjection {
    pub records: Vec<ProjectionRecord>,
    pub summary: ProjectionSummary,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Project the study month by month over the requested horizon.
///
/// The schedule spans exactly `years * 12` records ordered by (year, month).
/// The scheduled payment is fixed at origination; variable-rate studies are
/// priced off the initial fixing and never reprice (a multi-entry reference
/// vector earns a warning to that effect).
pub fn project_study(
    input: &StudyInput,
    options: &ProjectionOptions,
) -> LadrilloResult<ComputationOutput<AmortizationProjection>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    advise_on_degenerate_inputs(input, &mut warnings);

    let years = clamp_years(options.years, &mut warnings);

    if input.rate_type == RateType::Variable
        && input
            .reference_rate_vector
            .as_ref()
            .is_some_and(|v| v.len() > 1)
    {
        warnings.push(
            "Reference-rate vector has entries beyond the initial fixing — repricing is not \
             modeled; the projection holds the initial payment for the whole horizon"
                .into(),
        );
    }

    let annual_rate = resolve_initial_annual_rate(input, &mut warnings);
    let monthly_rate = annual_rate / dec!(12);
    let loan_term_months = input.loan_term_years.saturating_mul(12);

    // Once quantized to cents the payment is held fixed, so the interest
    // and principal columns add back to it exactly.
    let scheduled_payment =
        monthly_annuity_payment(input.loan_amount, annual_rate, input.loan_term_years)
            .round_dp(CURRENCY_DP);

    let monthly_expenses = monthly_operating_expenses(input).round_dp(CURRENCY_DP);

    let down_payment = total_acquisition_cost(input) - input.loan_amount;
    if down_payment <= Decimal::ZERO {
        warnings.push(
            "Down payment is not positive — per-record return columns read 0 and should be \
             treated as undefined"
                .into(),
        );
    }

    let monthly_appreciation = options.annual_appreciation / dec!(12);
    let rent_growth = Decimal::ONE + input.annual_rent_growth;

    // --- Ledger state ---
    let initial_balance = input.loan_amount.max(Decimal::ZERO).round_dp(CURRENCY_DP);
    let mut balance = initial_balance;
    let mut accumulated_equity = down_payment.max(Decimal::ZERO).round_dp(CURRENCY_DP);
    let mut accumulated_cashflow = Decimal::ZERO;
    let mut property_value = input.purchase_price.max(Decimal::ZERO);
    let mut current_rent = input.monthly_rent;

    let mut total_interest = Decimal::ZERO;
    let mut total_principal = Decimal::ZERO;
    let mut payoff_month: Option<u32> = None;

    let mut records = Vec::with_capacity((years * 12) as usize);

    for year in 1..=years {
        if year > 1 {
            current_rent *= rent_growth;
        }
        let rent = current_rent.round_dp(CURRENCY_DP);

        for month in 1..=12u32 {
            let absolute_month = (year - 1) * 12 + month;

            let (interest, principal) = if balance > Decimal::ZERO && loan_term_months > 0 {
                let interest = (balance * monthly_rate).round_dp(CURRENCY_DP);
                let principal = if absolute_month == loan_term_months {
                    // Final scheduled month settles whatever rounding left open
                    balance
                } else {
                    (scheduled_payment - interest).clamp(Decimal::ZERO, balance)
                };
                (interest, principal)
            } else {
                (Decimal::ZERO, Decimal::ZERO)
            };

            balance -= principal;

            if principal > Decimal::ZERO && balance.is_zero() && payoff_month.is_none() {
                payoff_month = Some(absolute_month);
            }

            property_value *= Decimal::ONE + monthly_appreciation;

            // Actual debt service this month, not the scheduled payment:
            // the payoff month pays less and later months pay nothing.
            let cashflow = rent - interest - principal - monthly_expenses;

            accumulated_equity += principal;
            accumulated_cashflow += cashflow;
            total_interest += interest;
            total_principal += principal;

            let current_ltv = if property_value <= Decimal::ZERO {
                Decimal::ZERO
            } else {
                (balance / property_value).round_dp(RATIO_DP)
            };

            let (annual_return, total_return_with_equity) = if down_payment <= Decimal::ZERO {
                (Decimal::ZERO, Decimal::ZERO)
            } else {
                (
                    (cashflow * dec!(12) / down_payment).round_dp(RATIO_DP),
                    ((cashflow + principal) * dec!(12) / down_payment).round_dp(RATIO_DP),
                )
            };

            records.push(ProjectionRecord {
                year,
                month,
                outstanding_loan_balance: balance,
                accumulated_equity,
                property_value: property_value.round_dp(CURRENCY_DP),
                monthly_rent: rent,
                monthly_interest: interest,
                monthly_principal: principal,
                monthly_expenses,
                monthly_net_cashflow: cashflow,
                accumulated_cashflow,
                annual_return,
                total_return_with_equity,
                current_ltv,
            });
        }
    }

    let final_ltv = records.last().map(|r| r.current_ltv).unwrap_or_default();

    let summary = ProjectionSummary {
        final_property_value: property_value.round_dp(CURRENCY_DP),
        final_loan_balance: balance,
        payoff_month,
        total_interest_paid: total_interest,
        total_principal_paid: total_principal,
        total_net_cashflow: accumulated_cashflow,
        final_accumulated_equity: accumulated_equity,
        final_ltv,
    };

    let output = AmortizationProjection { records, summary };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Month-by-Month Amortization and Cashflow Projection",
        &serde_json::json!({
            "study": input,
            "options": options,
        }),
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Horizon policy
// ---------------------------------------------------------------------------

fn clamp_years(requested: u32, warnings: &mut Vec<String>) -> u32 {
    let clamped = requested.clamp(MIN_PROJECTION_YEARS, MAX_PROJECTION_YEARS);
    if clamped != requested {
        warnings.push(format!(
            "Projection horizon of {requested} years clamped to {clamped} \
             (supported range {MIN_PROJECTION_YEARS}-{MAX_PROJECTION_YEARS})"
        ));
    }
    clamped
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::study::RateType;
    use rust_decimal_macros::dec;

    fn sample_study() -> StudyInput {
        StudyInput {
            purchase_price: dec!(200000),
            purchase_tax_rate: dec!(0.11),
            renovation_cost: Decimal::ZERO,
            commission: Decimal::ZERO,
            loan_amount: dec!(160000),
            rate_type: RateType::Fixed,
            interest_rate: dec!(0.03),
            loan_term_years: 25,
            rate_spread: Decimal::ZERO,
            reference_rate_vector: None,
            monthly_rent: dec!(1000),
            annual_rent_growth: dec!(0.02),
            community_fees: Decimal::ZERO,
            property_tax_ibi: dec!(400),
            life_insurance: Decimal::ZERO,
            home_insurance: dec!(300),
            management_fees: Decimal::ZERO,
            maintenance_rate: dec!(0.01),
            stress_vacancy_months: 1,
        }
    }

    #[test]
    fn test_ten_year_projection_has_120_ordered_records() {
        let result = project_study(&sample_study(), &ProjectionOptions::default()).unwrap();
        let records = &result.result.records;

        assert_eq!(records.len(), 120);
        for (i, r) in records.iter().enumerate() {
            assert_eq!(r.year, (i as u32) / 12 + 1);
            assert_eq!(r.month, (i as u32) % 12 + 1);
        }
    }

    #[test]
    fn test_balance_monotone_and_never_negative() {
        let result = project_study(&sample_study(), &ProjectionOptions::default()).unwrap();
        let records = &result.result.records;

        let mut previous = dec!(160000);
        for r in records {
            assert!(r.outstanding_loan_balance <= previous);
            assert!(r.outstanding_loan_balance >= Decimal::ZERO);
            previous = r.outstanding_loan_balance;
        }
    }

    #[test]
    fn test_equity_non_decreasing_and_value_growing() {
        let result = project_study(&sample_study(), &ProjectionOptions::default()).unwrap();
        let records = &result.result.records;

        let mut equity = records[0].accumulated_equity;
        let mut value = dec!(200000);
        for r in &records[1..] {
            assert!(r.accumulated_equity >= equity);
            equity = r.accumulated_equity;
        }
        for r in records {
            assert!(r.property_value > value);
            value = r.property_value;
        }
    }

    #[test]
    fn test_interest_plus_principal_equals_payment() {
        let result = project_study(&sample_study(), &ProjectionOptions::default()).unwrap();
        let records = &result.result.records;

        // 758.7381... quantized to the fixed scheduled payment
        let payment = dec!(758.74);
        for r in records {
            assert_eq!(
                r.monthly_interest + r.monthly_principal,
                payment,
                "month {}/{} split does not add back",
                r.year,
                r.month
            );
        }
    }

    #[test]
    fn test_principal_conservation_is_exact() {
        let result = project_study(&sample_study(), &ProjectionOptions::default()).unwrap();
        let out = &result.result;

        let total: Decimal = out.records.iter().map(|r| r.monthly_principal).sum();
        assert_eq!(total, dec!(160000) - out.summary.final_loan_balance);
        assert_eq!(total, out.summary.total_principal_paid);
    }

    #[test]
    fn test_accumulated_equity_seeds_at_down_payment() {
        let result = project_study(&sample_study(), &ProjectionOptions::default()).unwrap();
        let first = &result.result.records[0];

        // 62000 down plus the first month's principal
        assert_eq!(
            first.accumulated_equity,
            dec!(62000) + first.monthly_principal
        );
    }

    #[test]
    fn test_rent_steps_once_per_year() {
        let result = project_study(&sample_study(), &ProjectionOptions::default()).unwrap();
        let records = &result.result.records;

        // Flat within a year
        for pair in records[..12].windows(2) {
            assert_eq!(pair[0].monthly_rent, pair[1].monthly_rent);
        }
        assert_eq!(records[0].monthly_rent, dec!(1000));
        // 2% step into year 2, compounding into year 3
        assert_eq!(records[12].monthly_rent, dec!(1020));
        assert_eq!(records[24].monthly_rent, dec!(1040.40));
    }

    #[test]
    fn test_appreciation_compounds_monthly() {
        let result = project_study(&sample_study(), &ProjectionOptions::default()).unwrap();
        let first = &result.result.records[0];

        // 200000 * (1 + 0.03/12) = 200500
        assert_eq!(first.property_value, dec!(200500));
    }

    #[test]
    fn test_loan_retires_within_a_long_horizon() {
        let mut input = sample_study();
        input.loan_term_years = 10;

        let options = ProjectionOptions {
            years: 15,
            ..ProjectionOptions::default()
        };
        let result = project_study(&input, &options).unwrap();
        let out = &result.result;

        let payoff = out.summary.payoff_month.expect("loan should retire");
        assert!(payoff <= 120, "payoff month was {payoff}");
        assert_eq!(out.summary.final_loan_balance, Decimal::ZERO);

        // After payoff the debt columns go quiet and cashflow improves
        let after = &out.records[payoff as usize];
        assert_eq!(after.monthly_interest, Decimal::ZERO);
        assert_eq!(after.monthly_principal, Decimal::ZERO);
        assert!(after.monthly_net_cashflow > out.records[0].monthly_net_cashflow);
    }

    #[test]
    fn test_horizon_clamps_and_warns() {
        let options = ProjectionOptions {
            years: 45,
            ..ProjectionOptions::default()
        };
        let result = project_study(&sample_study(), &options).unwrap();

        assert_eq!(result.result.records.len(), 360);
        assert!(result.warnings.iter().any(|w| w.contains("clamped to 30")));

        let zero = ProjectionOptions {
            years: 0,
            ..ProjectionOptions::default()
        };
        let result = project_study(&sample_study(), &zero).unwrap();
        assert_eq!(result.result.records.len(), 12);
        assert!(result.warnings.iter().any(|w| w.contains("clamped to 1")));
    }

    #[test]
    fn test_multi_entry_vector_warns_about_repricing() {
        let mut input = sample_study();
        input.rate_type = RateType::Variable;
        input.rate_spread = dec!(0.01);
        input.reference_rate_vector = Some(vec![dec!(3.65), dec!(3.80), dec!(3.95)]);

        let result = project_study(&input, &ProjectionOptions::default()).unwrap();

        assert!(result
            .warnings
            .iter()
            .any(|w| w.contains("repricing is not modeled")));
    }

    #[test]
    fn test_unfinanced_study_has_quiet_debt_columns() {
        let mut input = sample_study();
        input.loan_amount = Decimal::ZERO;

        let result = project_study(&input, &ProjectionOptions::default()).unwrap();
        let out = &result.result;

        for r in &out.records {
            assert_eq!(r.outstanding_loan_balance, Decimal::ZERO);
            assert_eq!(r.monthly_interest, Decimal::ZERO);
            assert_eq!(r.monthly_principal, Decimal::ZERO);
        }
        assert_eq!(out.summary.payoff_month, None);
        assert_eq!(out.summary.total_interest_paid, Decimal::ZERO);
    }

    #[test]
    fn test_summary_totals_match_schedule() {
        let result = project_study(&sample_study(), &ProjectionOptions::default()).unwrap();
        let out = &result.result;

        let interest: Decimal = out.records.iter().map(|r| r.monthly_interest).sum();
        let cashflow: Decimal = out.records.iter().map(|r| r.monthly_net_cashflow).sum();
        let last = out.records.last().unwrap();

        assert_eq!(out.summary.total_interest_paid, interest);
        assert_eq!(out.summary.total_net_cashflow, cashflow);
        assert_eq!(out.summary.final_loan_balance, last.outstanding_loan_balance);
        assert_eq!(out.summary.final_accumulated_equity, last.accumulated_equity);
        assert_eq!(out.summary.final_property_value, last.property_value);
        assert_eq!(out.summary.final_ltv, last.current_ltv);
    }

    #[test]
    fn test_current_ltv_declines() {
        let result = project_study(&sample_study(), &ProjectionOptions::default()).unwrap();
        let records = &result.result.records;

        // Balance falls while value grows, so leverage can only improve
        for pair in records.windows(2) {
            assert!(pair[1].current_ltv <= pair[0].current_ltv);
        }
    }

    #[test]
    fn test_projection_is_deterministic() {
        let input = sample_study();
        let a = project_study(&input, &ProjectionOptions::default()).unwrap();
        let b = project_study(&input, &ProjectionOptions::default()).unwrap();

        assert_eq!(a.result, b.result);
    }
}
