use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{Money, Rate};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Financing regime of the study's mortgage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateType {
    /// Contractual rate fixed at origination
    #[default]
    Fixed,
    /// Priced off a published reference index plus a spread
    Variable,
}

/// Caller-supplied assumptions for a property investment study.
///
/// Immutable once handed to the engine; every derived figure is regenerable
/// from this struct alone. Currency fields are non-negative decimals,
/// percentages are fractions (0.11 = 11%) except where noted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudyInput {
    /// Agreed purchase price of the property
    pub purchase_price: Money,
    /// Transfer tax and other acquisition levies as a fraction of price
    pub purchase_tax_rate: Rate,
    /// Renovation budget added to the all-in acquisition cost
    #[serde(default)]
    pub renovation_cost: Money,
    /// Agency or broker commission
    #[serde(default)]
    pub commission: Money,
    /// Mortgage principal at origination
    pub loan_amount: Money,
    /// Fixed or variable financing
    #[serde(default)]
    pub rate_type: RateType,
    /// Static annual interest rate; also the fallback for variable-rate
    /// studies whose reference vector is unusable
    pub interest_rate: Rate,
    /// Mortgage term in years
    pub loan_term_years: u32,
    /// Margin over the reference index for variable-rate studies
    #[serde(default)]
    pub rate_spread: Rate,
    /// Published index values in percent units (3.65 means 3.65%); only the
    /// first entry prices the study
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_rate_vector: Option<Vec<Decimal>>,
    /// Asking rent per month
    pub monthly_rent: Money,
    /// Annual rent growth rate applied once per projection year
    #[serde(default)]
    pub annual_rent_growth: Rate,
    /// Community / homeowner association fees per year
    #[serde(default)]
    pub community_fees: Money,
    /// IBI municipal property tax per year
    #[serde(default)]
    pub property_tax_ibi: Money,
    /// Lender-required life insurance premium per year
    #[serde(default)]
    pub life_insurance: Money,
    /// Home insurance premium per year
    #[serde(default)]
    pub home_insurance: Money,
    /// Rental management fees per year
    #[serde(default)]
    pub management_fees: Money,
    /// Maintenance reserve as a fraction of purchase price per year
    #[serde(default)]
    pub maintenance_rate: Rate,
    /// Vacancy months assumed by the standard stress scenario
    #[serde(default = "default_stress_vacancy_months")]
    pub stress_vacancy_months: u32,
}

fn default_stress_vacancy_months() -> u32 {
    1
}

// ---------------------------------------------------------------------------
// Rate resolution
// ---------------------------------------------------------------------------

/// Reference-index entries outside this band (percent units) are treated as
/// feed corruption rather than market data.
const REFERENCE_RATE_BOUND_PCT: Decimal = dec!(100);

/// Effective initial annual rate for the study's loan.
///
/// Fixed-rate studies use `interest_rate` as-is. Variable-rate studies price
/// off the first reference-vector entry (percent units) plus the contractual
/// spread; a missing, empty, or out-of-band vector falls back to the static
/// rate, and the substitution is reported through `warnings` so callers can
/// surface it.
pub fn resolve_initial_annual_rate(input: &StudyInput, warnings: &mut Vec<String>) -> Rate {
    if input.rate_type == RateType::Fixed {
        return input.interest_rate;
    }

    match input.reference_rate_vector.as_deref() {
        Some([first, ..]) if first.abs() <= REFERENCE_RATE_BOUND_PCT => {
            first / dec!(100) + input.rate_spread
        }
        Some([first, ..]) => {
            warnings.push(format!(
                "Reference-rate vector entry {first} is outside ±100% — falling back to the static rate of {}",
                input.interest_rate
            ));
            input.interest_rate
        }
        _ => {
            warnings.push(format!(
                "Reference-rate vector is missing for a variable-rate study — falling back to the static rate of {}",
                input.interest_rate
            ));
            input.interest_rate
        }
    }
}

/// Advisory checks on the raw study assumptions. Nothing here errors; the
/// engine stays total and flags what looks financially nonsensical.
pub(crate) fn advise_on_degenerate_inputs(input: &StudyInput, warnings: &mut Vec<String>) {
    for (field, value) in [
        ("purchase_price", input.purchase_price),
        ("loan_amount", input.loan_amount),
        ("renovation_cost", input.renovation_cost),
        ("commission", input.commission),
        ("monthly_rent", input.monthly_rent),
    ] {
        if value < Decimal::ZERO {
            warnings.push(format!(
                "{field} is negative — results stay defined but should be read as diagnostic"
            ));
        }
    }

    if input.monthly_rent.is_zero() {
        warnings.push("Monthly rent is zero — rent-driven metrics read 0".into());
    }

    if input.loan_term_years == 0 {
        warnings.push("Loan term is zero years — mortgage payment reads 0".into());
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
