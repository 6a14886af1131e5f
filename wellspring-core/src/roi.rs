//! Savings calculator behind the ROI panel.
//!
//! Call deflection assumes 30% of calls move to self-service; paper bill
//! reduction assumes 25% of bills move to e-billing.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::RoiDefaults;

pub const CALL_DEFLECTION_RATE: f64 = 0.30;
pub const PAPER_BILL_SHIFT_RATE: f64 = 0.25;

/// Calculator inputs. Unset fields fall back to the configured defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoiInputs {
    pub monthly_call_volume: Option<f64>,
    pub avg_cost_per_call: Option<f64>,
    pub annual_paper_bill_volume: Option<f64>,
    pub cost_per_paper_bill: Option<f64>,
}

/// Annual savings, rounded to whole currency units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RoiSavings {
    pub call_deflection: i64,
    pub paper_bill_reduction: i64,
    pub total: i64,
}

#[derive(Error, Debug, PartialEq)]
pub enum RoiError {
    #[error("{field} must be a non-negative number")]
    InvalidInput { field: &'static str },
}

fn resolve(value: Option<f64>, default: f64, field: &'static str) -> Result<f64, RoiError> {
    let v = value.unwrap_or(default);
    if !v.is_finite() || v < 0.0 {
        return Err(RoiError::InvalidInput { field });
    }
    Ok(v)
}

pub fn calculate_savings(inputs: &RoiInputs, defaults: &RoiDefaults) -> Result<RoiSavings, RoiError> {
    let calls = resolve(inputs.monthly_call_volume, defaults.monthly_call_volume, "monthly_call_volume")?;
    let cost_per_call = resolve(inputs.avg_cost_per_call, defaults.avg_cost_per_call, "avg_cost_per_call")?;
    let bills = resolve(
        inputs.annual_paper_bill_volume,
        defaults.annual_paper_bill_volume,
        "annual_paper_bill_volume",
    )?;
    let cost_per_bill = resolve(inputs.cost_per_paper_bill, defaults.cost_per_paper_bill, "cost_per_paper_bill")?;

    let call_deflection = calls * 12.0 * cost_per_call * CALL_DEFLECTION_RATE;
    let paper_bill_reduction = bills * cost_per_bill * PAPER_BILL_SHIFT_RATE;

    Ok(RoiSavings {
        call_deflection: call_deflection.round() as i64,
        paper_bill_reduction: paper_bill_reduction.round() as i64,
        total: (call_deflection + paper_bill_reduction).round() as i64,
    })
}
