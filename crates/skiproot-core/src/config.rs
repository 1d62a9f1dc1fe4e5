//! Construction options for [`AuthSkipList`](crate::AuthSkipList).

/// How ranks and labels are refreshed after an insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecomputeStrategy {
    /// Reset and recompute every rank and label (default).
    #[default]
    Full,
    /// Patch ranks along the insertion path and rehash only the prefix of
    /// each level up to the inserted tower. Yields the same root as `Full`.
    Incremental,
}

/// Options for an authenticated skip list.
#[derive(Debug, Clone)]
pub struct SkipListConfig {
    /// Highest level index; the list has `max_level + 1` levels (default: 5).
    pub max_level: usize,
    /// Rank/label refresh strategy (default: full recompute).
    pub recompute: RecomputeStrategy,
}

impl SkipListConfig {
    /// Default options with the given maximum level.
    pub fn with_max_level(max_level: usize) -> Self {
        Self {
            max_level,
            ..Self::default()
        }
    }
}

impl Default for SkipListConfig {
    fn default() -> Self {
        Self {
            max_level: 5,
            recompute: RecomputeStrategy::Full,
        }
    }
}
