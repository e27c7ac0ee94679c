use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{Money, Rate};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Qualitative risk grade for a study. Ordered: Low < Medium < High.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
        };
        write!(f, "{label}")
    }
}

/// One graded factor with its contribution to the total score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactorScore {
    pub name: String,
    pub value: Decimal,
    pub points: u8,
    pub note: String,
}

/// Scorecard verdict: the grade, the raw points behind it, and the
/// per-factor breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub level: RiskLevel,
    pub score: u8,
    pub factors: Vec<RiskFactorScore>,
}

/// The numeric readings the scorecard grades. Decoupled from the metrics
/// structs so the table can be exercised and tuned on its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskFactorInputs {
    pub net_annual_return: Rate,
    pub monthly_net_cashflow: Money,
    pub loan_to_value: Rate,
    pub monthly_rent: Money,
    pub break_even_rent: Money,
}

/// Replaceable risk policy: four factors, each worth 0, 1, or 2 points.
///
/// The default thresholds grade a study HIGH at 5+ points and MEDIUM at 3+;
/// construct a custom table to tune policy without touching any of the
/// calculators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskScorecard {
    /// Net annual return below `severe` scores 2 points, below `soft` 1
    pub return_severe: Rate,
    pub return_soft: Rate,
    /// Monthly net cashflow below `severe` scores 2 points, below `soft` 1
    pub cashflow_severe: Money,
    pub cashflow_soft: Money,
    /// Loan-to-value above `severe` scores 2 points, above `soft` 1
    pub ltv_severe: Rate,
    pub ltv_soft: Rate,
    /// Rent buffer (rent − break-even) / rent below `severe` scores 2
    /// points, below `soft` 1
    pub buffer_severe: Rate,
    pub buffer_soft: Rate,
    /// Total points at or above which the grade is High / Medium
    pub high_floor: u8,
    pub medium_floor: u8,
}

impl Default for RiskScorecard {
    fn default() -> Self {
        Self {
            return_severe: dec!(0.04),
            return_soft: dec!(0.06),
            cashflow_severe: Decimal::ZERO,
            cashflow_soft: dec!(100),
            ltv_severe: dec!(0.85),
            ltv_soft: dec!(0.75),
            buffer_severe: dec!(0.10),
            buffer_soft: dec!(0.20),
            high_floor: 5,
            medium_floor: 3,
        }
    }
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

impl RiskScorecard {
    /// Grade the four factors and total them into a risk level.
    pub fn classify(&self, inputs: &RiskFactorInputs) -> RiskAssessment {
        let mut factors = Vec::with_capacity(4);

        factors.push(score_below(
            "net_annual_return",
            inputs.net_annual_return,
            self.return_severe,
            self.return_soft,
        ));

        factors.push(score_below(
            "monthly_net_cashflow",
            inputs.monthly_net_cashflow,
            self.cashflow_severe,
            self.cashflow_soft,
        ));

        factors.push(score_above(
            "loan_to_value",
            inputs.loan_to_value,
            self.ltv_severe,
            self.ltv_soft,
        ));

        // Buffer is the fraction of rent that survives the fixed outgoings;
        // no rent means no buffer at all.
        let buffer = if inputs.monthly_rent <= Decimal::ZERO {
            Decimal::ZERO
        } else {
            (inputs.monthly_rent - inputs.break_even_rent) / inputs.monthly_rent
        };
        factors.push(score_below(
            "rent_buffer",
            buffer,
            self.buffer_severe,
            self.buffer_soft,
        ));

        let score: u8 = factors.iter().map(|f| f.points).sum();
        let level = if score >= self.high_floor {
            RiskLevel::High
        } else if score >= self.medium_floor {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        };

        RiskAssessment {
            level,
            score,
            factors,
        }
    }
}

/// Factor where lower readings are worse (returns, cashflow, buffer).
fn score_below(name: &str, value: Decimal, severe: Decimal, soft: Decimal) -> RiskFactorScore {
    let (points, note) = if value < severe {
        (2, format!("{name} {value:.4} below severe floor {severe}"))
    } else if value < soft {
        (1, format!("{name} {value:.4} below comfort floor {soft}"))
    } else {
        (0, format!("{name} {value:.4} clears {soft}"))
    };

    RiskFactorScore {
        name: name.to_string(),
        value,
        points,
        note,
    }
}

/// Factor where higher readings are worse (leverage).
fn score_above(name: &str, value: Decimal, severe: Decimal, soft: Decimal) -> RiskFactorScore {
    let (points, note) = if value > severe {
        (2, format!("{name} {value:.4} above severe ceiling {severe}"))
    } else if value > soft {
        (1, format!("{name} {value:.4} above comfort ceiling {soft}"))
    } else {
        (0, format!("{name} {value:.4} within {soft}"))
    };

    RiskFactorScore {
        name: name.to_string(),
        value,
        points,
        note,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
