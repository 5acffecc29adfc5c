//! Explicit per-year market inputs for a phase

use crate::error::{PlanError, Result};

/// Externally supplied annual rates covering exactly one phase
///
/// `inflation[k]` is the rate that carries costs from year `k` into year `k + 1`,
/// so the final entry of a phase is never applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarketPath<'a> {
    pub returns: &'a [f64],
    pub inflation: Option<&'a [f64]>,
}

impl<'a> MarketPath<'a> {
    pub fn new(returns: &'a [f64]) -> Self {
        Self { returns, inflation: None }
    }

    pub fn with_inflation(returns: &'a [f64], inflation: &'a [f64]) -> Self {
        Self {
            returns,
            inflation: Some(inflation),
        }
    }
}

/// Resolves the return and inflation rate for each year of a phase
#[derive(Debug, Clone, Copy)]
pub(crate) struct YearRates<'a> {
    expected_return: f64,
    inflation_rate: f64,
    market: Option<MarketPath<'a>>,
}

impl<'a> YearRates<'a> {
    pub(crate) fn new(
        years: u32,
        expected_return: f64,
        inflation_rate: f64,
        market: Option<MarketPath<'a>>,
    ) -> Result<Self> {
        if let Some(path) = market {
            let expected = years as usize;
            if path.returns.len() != expected {
                return Err(PlanError::SequenceLength {
                    expected,
                    actual: path.returns.len(),
                });
            }
            if let Some(inflation) = path.inflation {
                if inflation.len() != expected {
                    return Err(PlanError::SequenceLength {
                        expected,
                        actual: inflation.len(),
                    });
                }
            }
        }

        Ok(Self {
            expected_return,
            inflation_rate,
            market,
        })
    }

    /// Return applied in year `idx` (0-indexed)
    pub(crate) fn annual_return(&self, idx: u32) -> f64 {
        match self.market {
            Some(path) => path.returns[idx as usize],
            None => self.expected_return,
        }
    }

    /// Inflation that moves costs from year `idx` to year `idx + 1`
    pub(crate) fn inflation(&self, idx: u32) -> f64 {
        match self.market.and_then(|path| path.inflation) {
            Some(inflation) => inflation[idx as usize],
            None => self.inflation_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_rates_without_market() {
        let rates = YearRates::new(3, 0.06, 0.02, None).unwrap();
        assert_eq!(rates.annual_return(2), 0.06);
        assert_eq!(rates.inflation(0), 0.02);
    }

    #[test]
    fn test_market_overrides_expected_rates() {
        let returns = [0.1, -0.2];
        let inflation = [0.04, 0.05];
        let rates = YearRates::new(2, 0.06, 0.02, Some(MarketPath::with_inflation(&returns, &inflation))).unwrap();
        assert_eq!(rates.annual_return(1), -0.2);
        assert_eq!(rates.inflation(1), 0.05);

        // Returns only: inflation falls back to the phase assumption
        let rates = YearRates::new(2, 0.06, 0.02, Some(MarketPath::new(&returns))).unwrap();
        assert_eq!(rates.inflation(0), 0.02);
    }

    #[test]
    fn test_length_mismatch() {
        let returns = [0.1, 0.1, 0.1];
        let err = YearRates::new(2, 0.06, 0.02, Some(MarketPath::new(&returns))).unwrap_err();
        assert_eq!(err, PlanError::SequenceLength { expected: 2, actual: 3 });

        let inflation = [0.1];
        let err = YearRates::new(3, 0.06, 0.02, Some(MarketPath::with_inflation(&returns, &inflation))).unwrap_err();
        assert_eq!(err, PlanError::SequenceLength { expected: 3, actual: 1 });
    }
}
