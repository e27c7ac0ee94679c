use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::Value;

use ladrillo_core::metrics;
use ladrillo_core::study::{RateType, StudyInput};

use crate::input;

/// Arguments for the viability metrics calculation
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct MetricsArgs {
    /// Path to JSON study file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Agreed purchase price
    #[arg(long)]
    pub purchase_price: Option<Decimal>,

    /// Transfer tax rate as a fraction of price (0.11 = 11%)
    #[arg(long)]
    pub purchase_tax_rate: Option<Decimal>,

    /// Renovation budget
    #[arg(long)]
    pub renovation_cost: Option<Decimal>,

    /// Agency or broker commission
    #[arg(long)]
    pub commission: Option<Decimal>,

    /// Mortgage principal
    #[arg(long)]
    pub loan_amount: Option<Decimal>,

    /// Fixed or variable financing
    #[arg(long, value_enum, default_value = "fixed")]
    pub rate_type: RateTypeArg,

    /// Annual interest rate as a fraction (0.03 = 3%)
    #[arg(long)]
    pub interest_rate: Option<Decimal>,

    /// Mortgage term in years
    #[arg(long)]
    pub loan_term_years: Option<u32>,

    /// Spread over the reference index for variable financing
    #[arg(long)]
    pub rate_spread: Option<Decimal>,

    /// Comma-separated reference index values in percent units
    /// (e.g. "3.65,3.80")
    #[arg(long)]
    pub reference_rates: Option<String>,

    /// Asking rent per month
    #[arg(long)]
    pub monthly_rent: Option<Decimal>,

    /// Annual rent growth rate
    #[arg(long)]
    pub annual_rent_growth: Option<Decimal>,

    /// Community fees per year
    #[arg(long)]
    pub community_fees: Option<Decimal>,

    /// IBI municipal property tax per year
    #[arg(long, alias = "ibi")]
    pub property_tax_ibi: Option<Decimal>,

    /// Life insurance premium per year
    #[arg(long)]
    pub life_insurance: Option<Decimal>,

    /// Home insurance premium per year
    #[arg(long)]
    pub home_insurance: Option<Decimal>,

    /// Rental management fees per year
    #[arg(long)]
    pub management_fees: Option<Decimal>,

    /// Maintenance reserve as a fraction of price per year
    #[arg(long)]
    pub maintenance_rate: Option<Decimal>,

    /// Vacancy months assumed by the standard stress scenario
    #[arg(long)]
    pub stress_vacancy_months: Option<u32>,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum RateTypeArg {
    Fixed,
    Variable,
}

impl From<RateTypeArg> for RateType {
    fn from(arg: RateTypeArg) -> Self {
        match arg {
            RateTypeArg::Fixed => RateType::Fixed,
            RateTypeArg::Variable => RateType::Variable,
        }
    }
}

fn parse_rate_vector(spec: &str) -> Result<Vec<Decimal>, Box<dyn std::error::Error>> {
    spec.split(',')
        .map(|entry| {
            entry
                .trim()
                .parse::<Decimal>()
                .map_err(|e| format!("Bad reference rate '{}': {}", entry.trim(), e).into())
        })
        .collect()
}

pub fn run_metrics(args: MetricsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let study: StudyInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(study) = input::stdin::read_stdin()? {
        study
    } else {
        StudyInput {
            purchase_price: args
                .purchase_price
                .ok_or("--purchase-price is required (or provide --input)")?,
            purchase_tax_rate: args
                .purchase_tax_rate
                .ok_or("--purchase-tax-rate is required (or provide --input)")?,
            renovation_cost: args.renovation_cost.unwrap_or_default(),
            commission: args.commission.unwrap_or_default(),
            loan_amount: args
                .loan_amount
                .ok_or("--loan-amount is required (or provide --input)")?,
            rate_type: args.rate_type.into(),
            interest_rate: args
                .interest_rate
                .ok_or("--interest-rate is required (or provide --input)")?,
            loan_term_years: args
                .loan_term_years
                .ok_or("--loan-term-years is required (or provide --input)")?,
            rate_spread: args.rate_spread.unwrap_or_default(),
            reference_rate_vector: args
                .reference_rates
                .as_deref()
                .map(parse_rate_vector)
                .transpose()?,
            monthly_rent: args
                .monthly_rent
                .ok_or("--monthly-rent is required (or provide --input)")?,
            annual_rent_growth: args.annual_rent_growth.unwrap_or_default(),
            community_fees: args.community_fees.unwrap_or_default(),
            property_tax_ibi: args.property_tax_ibi.unwrap_or_default(),
            life_insurance: args.life_insurance.unwrap_or_default(),
            home_insurance: args.home_insurance.unwrap_or_default(),
            management_fees: args.management_fees.unwrap_or_default(),
            maintenance_rate: args.maintenance_rate.unwrap_or_default(),
            stress_vacancy_months: args.stress_vacancy_months.unwrap_or(1),
        }
    };

    let result = metrics::compute_study_metrics(&study)?;
    Ok(serde_json::to_value(result)?)
}
