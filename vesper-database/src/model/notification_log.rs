/// Per-status ledger counts over a time window.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LedgerActivity {
    pub scheduled: u64,
    pub sent: u64,
    pub cancelled: u64,
}

impl LedgerActivity {
    pub fn total(&self) -> u64 {
        self.scheduled + self.sent + self.cancelled
    }
}
