//! Closed-form time-value-of-money helpers
//!
//! Used to cross-check the year-by-year accumulation model and to derive
//! headline metrics (sustainable income) from phase results.

/// Conventional safe withdrawal rate (the "4% rule")
pub const SAFE_WITHDRAWAL_RATE: f64 = 0.04;

/// Future value of a lump sum compounded monthly at `annual_rate / 12`
///
/// FV = PV × (1 + r)^n with r the monthly rate and n the number of months
pub fn future_value_lump_sum(principal: f64, annual_rate: f64, years: u32) -> f64 {
    let monthly_rate = annual_rate / 12.0;
    principal * (1.0 + monthly_rate).powi((years * 12) as i32)
}

/// Below this monthly rate the annuity factors use their Taylor expansion
const SMALL_MONTHLY_RATE: f64 = 1e-9;

/// Future value of monthly payments made at the end of each month
///
/// FV = PMT × ((1 + r)^n − 1) / r, or PMT × n when r = 0
pub fn future_value_annuity(monthly_payment: f64, annual_rate: f64, years: u32) -> f64 {
    let months = years * 12;
    let monthly_rate = annual_rate / 12.0;
    monthly_payment * annuity_factor(monthly_rate, months)
}

/// ((1 + r)^n − 1) / r, accurate for rates arbitrarily close to zero
///
/// `1.0 + r` rounds to `1.0` for |r| below about 1e-16, so the difference is
/// taken through `ln_1p`/`exp_m1` and tiny rates use the series
/// n + C(n,2)·r + C(n,3)·r².
fn annuity_factor(monthly_rate: f64, months: u32) -> f64 {
    let n = months as f64;
    if monthly_rate.abs() < SMALL_MONTHLY_RATE {
        let c2 = n * (n - 1.0) / 2.0;
        let c3 = c2 * (n - 2.0) / 3.0;
        return n + c2 * monthly_rate + c3 * monthly_rate * monthly_rate;
    }
    (n * monthly_rate.ln_1p()).exp_m1() / monthly_rate
}

/// Future value of monthly payments made at the start of each month (annuity due)
///
/// This is the timing the accumulation phase uses for contributions.
pub fn future_value_annuity_due(monthly_payment: f64, annual_rate: f64, years: u32) -> f64 {
    future_value_annuity(monthly_payment, annual_rate, years) * (1.0 + annual_rate / 12.0)
}

/// Annual amount that can be withdrawn from `balance` under the 4% rule
pub fn safe_annual_withdrawal(balance: f64) -> f64 {
    balance.max(0.0) * SAFE_WITHDRAWAL_RATE
}

/// Sum of (1 + r)^k for k = 1..=12 with r the monthly rate
///
/// Growth multiplier for one year of start-of-month contributions.
pub(crate) fn annuity_due_year_factor(monthly_rate: f64) -> f64 {
    if monthly_rate.abs() < SMALL_MONTHLY_RATE {
        // 12 + 78·r + 286·r², the expansion of the sum itself
        return 12.0 + 78.0 * monthly_rate + 286.0 * monthly_rate * monthly_rate;
    }
    (1.0 + monthly_rate) * annuity_factor(monthly_rate, 12)
}
