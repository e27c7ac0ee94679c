use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::risk::{RiskAssessment, RiskFactorInputs, RiskScorecard};
use crate::study::{advise_on_degenerate_inputs, resolve_initial_annual_rate, StudyInput};
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::LadrilloResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A study is only called favorable when its cash-on-cash return clears
/// this floor and the monthly cashflow is strictly positive.
pub const FAVORABLE_RETURN_FLOOR: Decimal = dec!(0.05);

/// Point-in-time viability metrics derived from a study's assumptions.
///
/// Fully regenerable from the `StudyInput`; nothing here is stateful.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyMetrics {
    /// Transfer tax and other acquisition levies
    pub purchase_costs: Money,
    /// Price plus purchase costs, renovation, and commission
    pub total_purchase_price: Money,
    /// Equity the buyer must bring: total cost minus the loan
    pub down_payment: Money,
    /// Loan over total purchase price (0 when the total is not positive)
    pub loan_to_value: Rate,
    /// Fixed monthly annuity payment on the loan
    pub monthly_mortgage_payment: Money,
    /// Fixed operating costs per month, including the maintenance reserve
    pub monthly_expenses: Money,
    /// Rent minus mortgage payment minus expenses
    pub monthly_net_cashflow: Money,
    /// Monthly net cashflow annualised
    pub annual_net_cashflow: Money,
    /// Minimum rent that covers mortgage payment plus expenses
    pub break_even_rent: Money,
    /// Cash-on-cash: annual net cashflow over down payment
    pub net_annual_return: Rate,
    /// Cashflow plus first-year principal build-up, over down payment
    pub total_annual_return: Rate,
    /// Scorecard verdict with the per-factor breakdown
    pub risk: RiskAssessment,
    /// Strictly positive cashflow and return above the favorable floor
    pub is_favorable: bool,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Compute the point-in-time viability metrics for a study under the
/// default risk scorecard.
///
/// Total for any well-typed input: degenerate denominators yield defined
/// zeros, and financially nonsensical assumptions are reported through the
/// warnings channel instead of failing.
pub fn compute_study_metrics(
    input: &StudyInput,
) -> LadrilloResult<ComputationOutput<StudyMetrics>> {
    compute_study_metrics_with(input, &RiskScorecard::default())
}

/// Same as [`compute_study_metrics`] but grading risk with a caller-supplied
/// scorecard.
pub fn compute_study_metrics_with(
    input: &StudyInput,
    scorecard: &RiskScorecard,
) -> LadrilloResult<ComputationOutput<StudyMetrics>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    advise_on_degenerate_inputs(input, &mut warnings);
    let metrics = derive_metrics(input, scorecard, &mut warnings);

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Property Investment Viability Metrics",
        input,
        warnings,
        elapsed,
        metrics,
    ))
}

// ---------------------------------------------------------------------------
// Core derivation
// ---------------------------------------------------------------------------

/// The envelope-free calculation shared with the projector and the
/// sensitivity analyzer.
pub(crate) fn derive_metrics(
    input: &StudyInput,
    scorecard: &RiskScorecard,
    warnings: &mut Vec<String>,
) -> StudyMetrics {
    let purchase_costs = input.purchase_price * input.purchase_tax_rate;
    let total_purchase_price = total_acquisition_cost(input);
    let down_payment = total_purchase_price - input.loan_amount;

    let loan_to_value = if total_purchase_price <= Decimal::ZERO {
        warnings.push(
            "Total purchase price is not positive — LTV reads 0 and should be treated as undefined"
                .into(),
        );
        Decimal::ZERO
    } else {
        input.loan_amount / total_purchase_price
    };

    if loan_to_value > dec!(0.80) {
        warnings.push(format!(
            "LTV of {:.1}% exceeds 80% — high leverage",
            loan_to_value * dec!(100)
        ));
    }

    let annual_rate = resolve_initial_annual_rate(input, warnings);
    let monthly_mortgage_payment =
        monthly_annuity_payment(input.loan_amount, annual_rate, input.loan_term_years);

    let monthly_expenses = monthly_operating_expenses(input);

    let monthly_net_cashflow = input.monthly_rent - monthly_mortgage_payment - monthly_expenses;
    let annual_net_cashflow = monthly_net_cashflow * dec!(12);

    let break_even_rent = monthly_mortgage_payment + monthly_expenses;

    // First-month principal approximates the year's equity build-up:
    // payment minus interest on the full principal.
    let first_month_interest = input.loan_amount * annual_rate / dec!(12);
    let monthly_equity_increase = monthly_mortgage_payment - first_month_interest;

    let (net_annual_return, total_annual_return) = if down_payment <= Decimal::ZERO {
        warnings.push(
            "Down payment is not positive — return metrics read 0 and should be treated as undefined"
                .into(),
        );
        (Decimal::ZERO, Decimal::ZERO)
    } else {
        (
            annual_net_cashflow / down_payment,
            (annual_net_cashflow + monthly_equity_increase * dec!(12)) / down_payment,
        )
    };

    let risk = scorecard.classify(&RiskFactorInputs {
        net_annual_return,
        monthly_net_cashflow,
        loan_to_value,
        monthly_rent: input.monthly_rent,
        break_even_rent,
    });

    let is_favorable =
        net_annual_return > FAVORABLE_RETURN_FLOOR && monthly_net_cashflow > Decimal::ZERO;

    StudyMetrics {
        purchase_costs,
        total_purchase_price,
        down_payment,
        loan_to_value,
        monthly_mortgage_payment,
        monthly_expenses,
        monthly_net_cashflow,
        annual_net_cashflow,
        break_even_rent,
        net_annual_return,
        total_annual_return,
        risk,
        is_favorable,
    }
}

/// Price plus purchase costs, renovation, and commission.
pub(crate) fn total_acquisition_cost(input: &StudyInput) -> Money {
    let purchase_costs = input.purchase_price * input.purchase_tax_rate;
    input.purchase_price + purchase_costs + input.renovation_cost + input.commission
}

/// Fixed operating costs per month: community fees, IBI, insurances,
/// management, and the maintenance reserve as a fraction of price.
pub(crate) fn monthly_operating_expenses(input: &StudyInput) -> Money {
    let annual = input.community_fees
        + input.property_tax_ibi
        + input.life_insurance
        + input.home_insurance
        + input.management_fees
        + input.maintenance_rate * input.purchase_price;
    annual / dec!(12)
}

// ---------------------------------------------------------------------------
// Mortgage helper
// ---------------------------------------------------------------------------

/// Standard fixed annuity payment: P * r(1+r)^n / ((1+r)^n - 1), with r the
/// monthly rate and n the term in months.
///
/// Total function: a zero rate amortises straight-line (P / n), a zero term
/// yields 0 rather than dividing by zero, and a term long enough to overflow
/// the compounding factor settles on the interest-only perpetuity P * r,
/// which is what the formula rounds to at this precision.
pub fn monthly_annuity_payment(principal: Money, annual_rate: Rate, term_years: u32) -> Money {
    let total_months = u64::from(term_years) * 12;
    if total_months == 0 {
        return Decimal::ZERO;
    }

    let monthly_rate = annual_rate / dec!(12);
    if monthly_rate.is_zero() {
        // Interest-free: straight-line amortisation
        return principal / Decimal::from(total_months);
    }

    // (1 + r)^n via iterative multiplication
    let mut compound = Decimal::ONE;
    for _ in 0..total_months {
        compound = match compound.checked_mul(Decimal::ONE + monthly_rate) {
            Some(next) => next,
            // Past Decimal range, (1+r)^n / ((1+r)^n - 1) is 1 to the last
            // representable digit
            None => return principal * monthly_rate,
        };
    }

    let denominator = compound - Decimal::ONE;
    if denominator.is_zero() {
        return Decimal::ZERO;
    }

    principal * monthly_rate * compound / denominator
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::study::RateType;
    use rust_decimal_macros::dec;

    /// Standard test study: 200k flat, 80% financed at 3% over 25 years
    fn sample_study() -> StudyInput {
        StudyInput {
            purchase_price: dec!(200000),
            purchase_tax_rate: dec!(0.11), // 11% transfer tax
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
            maintenance_rate: dec!(0.01), // 2000/yr on a 200k flat
            stress_vacancy_months: 1,
        }
    }

    #[test]
    fn test_acquisition_costs() {
        let result = compute_study_metrics(&sample_study()).unwrap();
        let m = &result.result;

        // 200000 * 0.11 = 22000
        assert_eq!(m.purchase_costs, dec!(22000));
        // 200000 + 22000 = 222000
        assert_eq!(m.total_purchase_price, dec!(222000));
        // 222000 - 160000 = 62000
        assert_eq!(m.down_payment, dec!(62000));
    }

    #[test]
    fn test_loan_to_value() {
        let result = compute_study_metrics(&sample_study()).unwrap();

        // 160000 / 222000 = 0.7207...
        let ltv = result.result.loan_to_value;
        assert!((ltv - dec!(0.7207)).abs() < dec!(0.0001));
    }

    #[test]
    fn test_annuity_payment_against_known_value() {
        let result = compute_study_metrics(&sample_study()).unwrap();

        // 160000 at r = 0.0025, n = 300: P*r*(1+r)^n / ((1+r)^n - 1) = 758.74
        let payment = result.result.monthly_mortgage_payment;
        assert!(
            (payment - dec!(758.74)).abs() < dec!(0.01),
            "payment was {payment}"
        );
    }

    #[test]
    fn test_expenses_and_cashflow() {
        let result = compute_study_metrics(&sample_study()).unwrap();
        let m = &result.result;

        // (400 + 300 + 0.01 * 200000) / 12 = 2700 / 12 = 225
        assert_eq!(m.monthly_expenses, dec!(225));

        // 1000 - 758.74 - 225 = 16.26
        assert!((m.monthly_net_cashflow - dec!(16.26)).abs() < dec!(0.01));
        assert_eq!(m.annual_net_cashflow, m.monthly_net_cashflow * dec!(12));

        // Break-even is the rent that zeroes the cashflow
        assert_eq!(
            m.break_even_rent,
            m.monthly_mortgage_payment + m.monthly_expenses
        );
    }

    #[test]
    fn test_return_metrics() {
        let result = compute_study_metrics(&sample_study()).unwrap();
        let m = &result.result;

        // 12 * 16.26 / 62000 = 0.0031
        assert!((m.net_annual_return - dec!(0.0031)).abs() < dec!(0.0001));

        // Payment cancels against equity build-up:
        // 12 * (1000 - 225 - 400) / 62000 = 4500 / 62000 = 0.0726
        assert!((m.total_annual_return - dec!(0.0726)).abs() < dec!(0.0001));
    }

    #[test]
    fn test_sample_study_grades_high_risk_and_unfavorable() {
        let result = compute_study_metrics(&sample_study()).unwrap();
        let m = &result.result;

        // Thin cashflow (1), weak return (2), thin buffer (2) = 5 points
        assert_eq!(m.risk.score, 5);
        assert_eq!(m.risk.level, crate::risk::RiskLevel::High);
        assert!(!m.is_favorable);
    }

    #[test]
    fn test_zero_rate_amortises_straight_line() {
        assert_eq!(
            monthly_annuity_payment(dec!(120000), Decimal::ZERO, 10),
            dec!(1000)
        );
    }

    #[test]
    fn test_zero_term_yields_zero_payment() {
        assert_eq!(
            monthly_annuity_payment(dec!(120000), dec!(0.03), 0),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_zero_loan_yields_zero_payment() {
        assert_eq!(
            monthly_annuity_payment(Decimal::ZERO, dec!(0.03), 25),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_extreme_term_settles_on_interest_only() {
        // Long enough for (1 + r)^n to leave Decimal range; the payment
        // converges on P * r = 160000 * 0.0025
        assert_eq!(
            monthly_annuity_payment(dec!(160000), dec!(0.03), 2500),
            dec!(400)
        );
        assert_eq!(
            monthly_annuity_payment(dec!(160000), dec!(0.03), u32::MAX),
            dec!(400)
        );
    }

    #[test]
    fn test_favorability_floor_is_strict() {
        // No loan: down payment is the whole 24000; rent 100 with no costs
        // gives exactly 1200/24000 = 0.05 cash-on-cash
        let input = StudyInput {
            purchase_price: dec!(20000),
            purchase_tax_rate: dec!(0.2),
            renovation_cost: Decimal::ZERO,
            commission: Decimal::ZERO,
            loan_amount: Decimal::ZERO,
            rate_type: RateType::Fixed,
            interest_rate: dec!(0.03),
            loan_term_years: 25,
            rate_spread: Decimal::ZERO,
            reference_rate_vector: None,
            monthly_rent: dec!(100),
            annual_rent_growth: Decimal::ZERO,
            community_fees: Decimal::ZERO,
            property_tax_ibi: Decimal::ZERO,
            life_insurance: Decimal::ZERO,
            home_insurance: Decimal::ZERO,
            management_fees: Decimal::ZERO,
            maintenance_rate: Decimal::ZERO,
            stress_vacancy_months: 1,
        };

        let result = compute_study_metrics(&input).unwrap();
        let m = &result.result;

        assert_eq!(m.net_annual_return, dec!(0.05));
        assert!(m.monthly_net_cashflow > Decimal::ZERO);
        assert!(!m.is_favorable, "exactly 5% must not count as favorable");
    }

    #[test]
    fn test_variable_rate_study_reprices_payment() {
        let mut input = sample_study();
        input.rate_type = RateType::Variable;
        input.rate_spread = dec!(0.01);
        input.reference_rate_vector = Some(vec![dec!(3.65)]);

        let result = compute_study_metrics(&input).unwrap();

        // 4.65% costs more than 3%: 160000 over 25y comes to ~904/mo
        let payment = result.result.monthly_mortgage_payment;
        assert!(payment > dec!(890) && payment < dec!(920), "payment was {payment}");
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_variable_rate_fallback_warns() {
        let mut input = sample_study();
        input.rate_type = RateType::Variable;
        input.reference_rate_vector = None;

        let result = compute_study_metrics(&input).unwrap();

        // Falls back to the 3% static rate and says so
        assert!((result.result.monthly_mortgage_payment - dec!(758.74)).abs() < dec!(0.01));
        assert!(result.warnings.iter().any(|w| w.contains("falling back")));
    }

    #[test]
    fn test_overfinanced_study_guards_returns() {
        let mut input = sample_study();
        input.loan_amount = dec!(250000); // above the 222000 all-in cost

        let result = compute_study_metrics(&input).unwrap();
        let m = &result.result;

        assert!(m.down_payment < Decimal::ZERO);
        assert_eq!(m.net_annual_return, Decimal::ZERO);
        assert_eq!(m.total_annual_return, Decimal::ZERO);
        assert!(result
            .warnings
            .iter()
            .any(|w| w.contains("Down payment is not positive")));
    }

    #[test]
    fn test_zero_price_study_stays_defined() {
        let input = StudyInput {
            purchase_price: Decimal::ZERO,
            purchase_tax_rate: Decimal::ZERO,
            renovation_cost: Decimal::ZERO,
            commission: Decimal::ZERO,
            loan_amount: Decimal::ZERO,
            rate_type: RateType::Fixed,
            interest_rate: Decimal::ZERO,
            loan_term_years: 0,
            rate_spread: Decimal::ZERO,
            reference_rate_vector: None,
            monthly_rent: Decimal::ZERO,
            annual_rent_growth: Decimal::ZERO,
            community_fees: Decimal::ZERO,
            property_tax_ibi: Decimal::ZERO,
            life_insurance: Decimal::ZERO,
            home_insurance: Decimal::ZERO,
            management_fees: Decimal::ZERO,
            maintenance_rate: Decimal::ZERO,
            stress_vacancy_months: 1,
        };

        let result = compute_study_metrics(&input).unwrap();
        let m = &result.result;

        assert_eq!(m.loan_to_value, Decimal::ZERO);
        assert_eq!(m.monthly_mortgage_payment, Decimal::ZERO);
        assert_eq!(m.net_annual_return, Decimal::ZERO);
        assert!(!result.warnings.is_empty());
    }

    #[test]
    fn test_metrics_envelope_carries_metadata() {
        let result = compute_study_metrics(&sample_study()).unwrap();

        assert_eq!(result.methodology, "Property Investment Viability Metrics");
        assert_eq!(result.metadata.precision, "rust_decimal_128bit");
        assert!(result.assumptions.get("purchase_price").is_some());
    }

    #[test]
    fn test_determinism() {
        let input = sample_study();
        let a = compute_study_metrics(&input).unwrap();
        let b = compute_study_metrics(&input).unwrap();

        assert_eq!(a.result, b.result);
        assert_eq!(a.warnings, b.warnings);
    }
}
