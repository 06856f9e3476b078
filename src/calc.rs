//! Investment calculators
//!
//! The two formulas behind the interactive yield and profit sliders. Pure
//! arithmetic over caller-supplied scalars; degenerate divisors produce a
//! zeroed breakdown instead of NaN so the UI can render "0%" while the user
//! is still typing.

use serde::{Deserialize, Serialize};

/// Nights assumed per year for annualized figures
const NIGHTS_PER_YEAR: f64 = 365.0;
/// Nights assumed per month for the monthly profit view
const NIGHTS_PER_MONTH: f64 = 30.0;

/// Inputs for the annualized yield calculator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YieldInputs {
    /// Total purchase price of the unit
    pub purchase_price: f64,
    /// Average daily rate (ADR) charged per night
    pub nightly_rate: f64,
    /// Expected occupancy, 0.0..=1.0
    pub occupancy: f64,
    /// Management fee as a share of gross revenue, 0.0..=1.0
    pub management_fee: f64,
    /// Fixed monthly running costs (utilities, HOA, insurance)
    pub monthly_costs: f64,
}

/// Breakdown returned by the yield calculator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct YieldBreakdown {
    pub gross_annual: f64,
    pub net_annual: f64,
    /// Net yield as a percentage of the purchase price
    pub yield_pct: f64,
}

/// Inputs for the monthly net profit calculator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfitInputs {
    /// Apartment surface in square meters
    pub area_sqm: f64,
    /// Achievable nightly rate per square meter
    pub rate_per_sqm: f64,
    /// Expected occupancy, 0.0..=1.0
    pub occupancy: f64,
    /// Management fee as a share of gross revenue, 0.0..=1.0
    pub management_fee: f64,
    /// Monthly running costs
    pub monthly_costs: f64,
}

/// Breakdown returned by the profit calculator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfitBreakdown {
    pub gross_monthly: f64,
    pub net_monthly: f64,
}

/// Annualized net yield from purchase price, ADR, occupancy and fees
pub fn annual_yield(inputs: &YieldInputs) -> YieldBreakdown {
    if inputs.purchase_price <= 0.0 {
        return YieldBreakdown::default();
    }

    let gross_annual = inputs.nightly_rate * NIGHTS_PER_YEAR * inputs.occupancy.clamp(0.0, 1.0);
    let net_annual = gross_annual * (1.0 - inputs.management_fee.clamp(0.0, 1.0))
        - 12.0 * inputs.monthly_costs;
    let yield_pct = net_annual / inputs.purchase_price * 100.0;

    YieldBreakdown {
        gross_annual,
        net_annual,
        yield_pct,
    }
}

/// Monthly net profit from area, occupancy and costs
pub fn monthly_profit(inputs: &ProfitInputs) -> ProfitBreakdown {
    if inputs.area_sqm <= 0.0 {
        return ProfitBreakdown::default();
    }

    let gross_monthly = inputs.area_sqm
        * inputs.rate_per_sqm
        * NIGHTS_PER_MONTH
        * inputs.occupancy.clamp(0.0, 1.0);
    let net_monthly =
        gross_monthly * (1.0 - inputs.management_fee.clamp(0.0, 1.0)) - inputs.monthly_costs;

    ProfitBreakdown {
        gross_monthly,
        net_monthly,
    }
}
