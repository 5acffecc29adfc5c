//! Financial state threaded between phases and per-year snapshots

use serde::{Deserialize, Serialize};

/// Financial position at a phase boundary
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FinancialState {
    /// Attained age in whole years
    pub age: u32,

    /// Portfolio balance, never negative
    pub portfolio_value: f64,

    /// All money paid into the portfolio so far (personal + employer + continued)
    pub cumulative_contributions: f64,

    /// All money taken out of the portfolio so far
    pub cumulative_withdrawals: f64,
}

impl FinancialState {
    /// Fresh state with no contribution or withdrawal history
    pub fn new(age: u32, portfolio_value: f64) -> Self {
        Self {
            age,
            portfolio_value: portfolio_value.max(0.0),
            cumulative_contributions: 0.0,
            cumulative_withdrawals: 0.0,
        }
    }

    pub fn is_depleted(&self) -> bool {
        self.portfolio_value <= 0.0
    }
}

/// One year of a phase trajectory
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YearSnapshot {
    /// Year within the phase (1-indexed)
    pub year: u32,

    /// Age during this year
    pub age: u32,

    /// Annual return applied this year
    pub annual_return: f64,

    /// Balance at the start of the year
    pub starting_balance: f64,

    /// Investment growth credited this year
    pub growth: f64,

    /// Money paid into the portfolio this year
    pub contributions: f64,

    /// Outside income received this year (Social Security, pension, part-time work)
    pub income: f64,

    /// Spending that had to be funded this year (after income offsets)
    pub withdrawal_need: f64,

    /// Amount actually withdrawn from the portfolio
    pub withdrawal: f64,

    /// Part of the withdrawal need the portfolio could not cover
    pub shortfall: f64,

    /// Balance at the end of the year, never negative
    pub ending_balance: f64,
}

impl YearSnapshot {
    pub(crate) fn new(year: u32, age: u32, annual_return: f64, starting_balance: f64) -> Self {
        Self {
            year,
            age,
            annual_return,
            starting_balance,
            growth: 0.0,
            contributions: 0.0,
            income: 0.0,
            withdrawal_need: 0.0,
            withdrawal: 0.0,
            shortfall: 0.0,
            ending_balance: starting_balance,
        }
    }
}
