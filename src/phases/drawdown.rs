//! Shared growth / withdrawal / clamp step for the retirement phases

use super::state::YearSnapshot;

/// Running balance of a withdrawal phase
///
/// Invariants: the balance is never negative, and once the phase has depleted
/// the balance earns no return for the rest of the phase.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Drawdown {
    balance: f64,
    depleted_in_year: Option<u32>,
}

impl Drawdown {
    pub(crate) fn new(balance: f64) -> Self {
        Self {
            balance: balance.max(0.0),
            depleted_in_year: None,
        }
    }

    pub(crate) fn balance(&self) -> f64 {
        self.balance
    }

    /// First year (1-indexed within the phase) the balance hit zero
    pub(crate) fn depleted_in_year(&self) -> Option<u32> {
        self.depleted_in_year
    }

    /// Apply one year: growth on the opening balance, then `inflow`, then `need`
    ///
    /// Uses `snap.annual_return` and fills the growth, withdrawal, shortfall and
    /// ending balance fields of `snap`.
    pub(crate) fn step(&mut self, snap: &mut YearSnapshot, inflow: f64, need: f64) {
        let growth = if self.depleted_in_year.is_some() {
            0.0
        } else {
            self.balance * snap.annual_return
        };

        // A -100% year can at worst wipe out the balance
        let available = (self.balance + growth).max(0.0) + inflow;
        let withdrawal = need.min(available);
        let ending = (available - withdrawal).max(0.0);

        if self.depleted_in_year.is_none() && need > 0.0 && ending <= 0.0 {
            self.depleted_in_year = Some(snap.year);
        }

        snap.growth = growth;
        snap.withdrawal_need = need;
        snap.withdrawal = withdrawal;
        snap.shortfall = need - withdrawal;
        snap.ending_balance = ending;
        self.balance = ending;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_withdrawal_records_shortfall() {
        let mut drawdown = Drawdown::new(1_000.0);
        let mut snap = YearSnapshot::new(1, 70, 0.0, 1_000.0);
        drawdown.step(&mut snap, 0.0, 1_500.0);

        assert_eq!(snap.withdrawal, 1_000.0);
        assert_eq!(snap.shortfall, 500.0);
        assert_eq!(snap.ending_balance, 0.0);
        assert_eq!(drawdown.depleted_in_year(), Some(1));
    }

    #[test]
    fn test_no_growth_after_depletion() {
        let mut drawdown = Drawdown::new(100.0);
        let mut year1 = YearSnapshot::new(1, 70, 0.10, 100.0);
        drawdown.step(&mut year1, 0.0, 500.0);
        assert_eq!(drawdown.balance(), 0.0);

        // Inflows after depletion are credited but earn nothing
        let mut year2 = YearSnapshot::new(2, 71, 0.10, 0.0);
        drawdown.step(&mut year2, 1_000.0, 0.0);
        let mut year3 = YearSnapshot::new(3, 72, 0.10, drawdown.balance());
        drawdown.step(&mut year3, 0.0, 0.0);

        assert_eq!(year3.growth, 0.0);
        assert_eq!(drawdown.balance(), 1_000.0);
        assert_eq!(drawdown.depleted_in_year(), Some(1));
    }

    #[test]
    fn test_total_loss_clamps_to_zero() {
        let mut drawdown = Drawdown::new(50_000.0);
        let mut snap = YearSnapshot::new(1, 70, -1.0, 50_000.0);
        drawdown.step(&mut snap, 0.0, 10_000.0);

        assert_eq!(snap.growth, -50_000.0);
        assert_eq!(snap.ending_balance, 0.0);
        assert_eq!(snap.shortfall, 10_000.0);
    }

    #[test]
    fn test_zero_need_never_flags_depletion() {
        let mut drawdown = Drawdown::new(0.0);
        let mut snap = YearSnapshot::new(1, 70, 0.05, 0.0);
        drawdown.step(&mut snap, 0.0, 0.0);
        assert_eq!(drawdown.depleted_in_year(), None);
    }
}
