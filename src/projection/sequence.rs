//! Pre-generated annual rates covering a whole plan horizon

use serde::{Deserialize, Serialize};

use crate::phases::MarketPath;

/// Annual returns (and optionally inflation) for every year of a plan, in order
///
/// Phase `i` consumes the sub-sequence that follows the years of phases `0..i`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnSequence {
    pub returns: Vec<f64>,
    #[serde(default)]
    pub inflation: Option<Vec<f64>>,
}

impl ReturnSequence {
    pub fn new(returns: Vec<f64>) -> Self {
        Self { returns, inflation: None }
    }

    pub fn with_inflation(returns: Vec<f64>, inflation: Vec<f64>) -> Self {
        Self {
            returns,
            inflation: Some(inflation),
        }
    }

    /// Same return every year
    pub fn constant(rate: f64, years: usize) -> Self {
        Self::new(vec![rate; years])
    }

    pub fn len(&self) -> usize {
        self.returns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.returns.is_empty()
    }

    /// Slice covering `len` years starting at year `offset`; caller checks bounds
    pub(crate) fn window(&self, offset: usize, len: usize) -> MarketPath<'_> {
        let range = offset..offset + len;
        MarketPath {
            returns: &self.returns[range.clone()],
            inflation: self.inflation.as_deref().map(|inflation| &inflation[range]),
        }
    }
}
