//! Best runs of this process
//!
//! A short ranked list of finished sessions, shown on the game-over screen.
//! It lives as long as the [`GameState`](crate::sim::GameState) that owns it
//! and is never written to disk.

use serde::{Deserialize, Serialize};

/// Ranked runs kept
pub const MAX_HIGH_SCORES: usize = 10;

/// One finished session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRecord {
    pub score: i64,
    pub level: u32,
    /// Running ticks the session lasted
    pub ticks: u64,
}

/// Runs ordered best first; equal scores keep arrival order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HighScores {
    runs: Vec<RunRecord>,
}

impl HighScores {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rank a finished run, returning its 1-based place if it made the table
    ///
    /// Runs that scored nothing are not ranked.
    pub fn record(&mut self, run: RunRecord) -> Option<usize> {
        if run.score <= 0 {
            return None;
        }
        let place = self.runs.partition_point(|r| r.score >= run.score);
        if place >= MAX_HIGH_SCORES {
            return None;
        }
        self.runs.insert(place, run);
        self.runs.truncate(MAX_HIGH_SCORES);
        Some(place + 1)
    }

    pub fn runs(&self) -> &[RunRecord] {
        &self.runs
    }

    pub fn best(&self) -> Option<&RunRecord> {
        self.runs.first()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn run(score: i64) -> RunRecord {
        RunRecord {
            score,
            level: 1,
            ticks: 600,
        }
    }

    #[test]
    fn test_places_are_best_first() {
        let mut table = HighScores::new();
        assert_eq!(table.record(run(100)), Some(1));
        assert_eq!(table.record(run(300)), Some(1));
        assert_eq!(table.record(run(200)), Some(2));

        let scores: Vec<i64> = table.runs().iter().map(|r| r.score).collect();
        assert_eq!(scores, vec![300, 200, 100]);
        assert_eq!(table.best().map(|r| r.score), Some(300));
    }

    #[test]
    fn test_ties_rank_after_earlier_runs() {
        let mut table = HighScores::new();
        table.record(RunRecord { ticks: 1, ..run(50) });
        assert_eq!(table.record(RunRecord { ticks: 2, ..run(50) }), Some(2));
        assert_eq!(table.runs()[0].ticks, 1);
    }

    #[test]
    fn test_scoreless_runs_not_ranked() {
        let mut table = HighScores::new();
        assert_eq!(table.record(run(0)), None);
        assert_eq!(table.record(run(-40)), None);
        assert!(table.is_empty());
    }

    #[test]
    fn test_full_table_drops_the_worst() {
        let mut table = HighScores::new();
        for score in (1..=10).map(|s| s * 10) {
            table.record(run(score));
        }
        assert_eq!(table.record(run(10)), None);
        assert_eq!(table.record(run(15)), Some(10));
        assert_eq!(table.runs().len(), MAX_HIGH_SCORES);
        assert_eq!(table.runs().last().map(|r| r.score), Some(15));
    }

    proptest! {
        #[test]
        fn prop_table_sorted_and_capped(scores in prop::collection::vec(-100i64..1000, 0..40)) {
            let mut table = HighScores::new();
            for score in scores {
                table.record(run(score));
            }
            prop_assert!(table.runs().len() <= MAX_HIGH_SCORES);
            prop_assert!(table.runs().windows(2).all(|w| w[0].score >= w[1].score));
            prop_assert!(table.runs().iter().all(|r| r.score > 0));
        }
    }
}
