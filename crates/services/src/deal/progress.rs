/// Aggregated view of today's deal, useful for status displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DealProgress {
    /// Cards in the pool matching the current criteria.
    pub matching: usize,
    /// Of those, completed today.
    pub completed_today: usize,
    /// Matching cards still drawable today.
    pub remaining: usize,
    pub all_done: bool,
}
