/// Native balance of one account at one point in time.
///
/// Keyed by `account` (the address the balance was fetched for); a snapshot
/// is only ever exposed while that account is still the connected one.
#[derive(Clone, Debug, PartialEq)]
pub struct BalanceSnapshot {
    pub account: String,
    pub amount: String,
    pub symbol: String,
    pub fetched_at: f64,
}

impl BalanceSnapshot {
    /// Check whether this snapshot belongs to the given address.
    pub fn is_for(&self, address: &str) -> bool {
        self.account == address
    }

    /// Display form: `amount symbol`.
    pub fn display(&self) -> String {
        format!("{} {}", self.amount, self.symbol)
    }
}
