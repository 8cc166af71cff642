use std::collections::HashMap;

/// Non-automated occupant counts per (guild, voice channel).
///
/// Counts are never persisted; the engine rebuilds them from gateway cache
/// state at startup. Automated members are filtered out before this tracker
/// is ever consulted.
#[derive(Debug, Default)]
pub struct OccupancyTracker {
    counts: HashMap<(u64, u64), u64>,
}

impl OccupancyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one presence change and return `(previous, new)` counts in a
    /// single mutation, so the caller classifies the transition without a
    /// second read.
    pub fn record(&mut self, guild_id: u64, channel_id: u64, present: bool) -> (u64, u64) {
        let entry = self.counts.entry((guild_id, channel_id)).or_insert(0);
        let previous = *entry;

        if present {
            *entry += 1;
        } else {
            *entry = entry.saturating_sub(1);
        }

        let current = *entry;
        if current == 0 {
            self.counts.remove(&(guild_id, channel_id));
        }

        (previous, current)
    }

    pub fn count(&self, guild_id: u64, channel_id: u64) -> u64 {
        self.counts.get(&(guild_id, channel_id)).copied().unwrap_or(0)
    }

    /// Drop all counts for a guild ahead of a presence re-seed.
    pub fn clear_guild(&mut self, guild_id: u64) {
        self.counts.retain(|(guild, _), _| *guild != guild_id);
    }
}

#[cfg(test)]
mod tests {
    use super::OccupancyTracker;

    #[test]
    fn returns_previous_and_new_counts() {
        let mut tracker = OccupancyTracker::new();
        assert_eq!(tracker.record(1, 10, true), (0, 1));
        assert_eq!(tracker.record(1, 10, true), (1, 2));
        assert_eq!(tracker.record(1, 10, false), (2, 1));
        assert_eq!(tracker.record(1, 10, false), (1, 0));
    }

    #[test]
    fn channels_are_independent() {
        let mut tracker = OccupancyTracker::new();
        tracker.record(1, 10, true);
        assert_eq!(tracker.record(1, 11, true), (0, 1));
        assert_eq!(tracker.count(1, 10), 1);
        assert_eq!(tracker.count(2, 10), 0);
    }

    #[test]
    fn leave_from_empty_channel_stays_at_zero() {
        let mut tracker = OccupancyTracker::new();
        assert_eq!(tracker.record(1, 10, false), (0, 0));
        assert_eq!(tracker.count(1, 10), 0);
    }

    #[test]
    fn clear_guild_resets_only_that_guild() {
        let mut tracker = OccupancyTracker::new();
        tracker.record(1, 10, true);
        tracker.record(2, 20, true);
        tracker.clear_guild(1);
        assert_eq!(tracker.count(1, 10), 0);
        assert_eq!(tracker.count(2, 20), 1);
    }
}
