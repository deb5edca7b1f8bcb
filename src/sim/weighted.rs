//! Weighted random choice over a closed set

use std::fmt;

use rand::Rng;

/// Cumulative weight table
///
/// Picks walk the entries in declaration order and return the first whose
/// cumulative weight reaches the draw. Zero-weight entries can never win.
#[derive(Debug, Clone)]
pub struct WeightedTable<T> {
    entries: Vec<(T, u32)>,
    total: u32,
}

impl<T: Copy> WeightedTable<T> {
    pub fn new(entries: impl IntoIterator<Item = (T, u32)>) -> Result<Self, WeightError> {
        let entries: Vec<(T, u32)> = entries.into_iter().collect();
        if entries.is_empty() {
            return Err(WeightError::Empty);
        }
        let total = entries
            .iter()
            .try_fold(0u32, |acc, &(_, w)| acc.checked_add(w))
            .ok_or(WeightError::Overflow)?;
        if total == 0 {
            return Err(WeightError::ZeroTotal);
        }
        Ok(Self { entries, total })
    }

    /// Sum of all weights
    pub fn total(&self) -> u32 {
        self.total
    }

    /// Resolve a draw in `1..=total`
    ///
    /// # Panics
    /// If `draw` is outside `1..=total`.
    pub fn pick(&self, draw: u32) -> T {
        assert!(
            (1..=self.total).contains(&draw),
            "weighted draw {draw} outside 1..={}",
            self.total
        );
        let mut cumulative = 0;
        for &(item, weight) in &self.entries {
            cumulative += weight;
            if draw <= cumulative {
                return item;
            }
        }
        unreachable!("cumulative weight always reaches total")
    }

    /// Draw uniformly from `1..=total` and resolve it
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> T {
        self.pick(rng.random_range(1..=self.total))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightError {
    Empty,
    ZeroTotal,
    Overflow,
}

impl fmt::Display for WeightError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeightError::Empty => write!(f, "weight table has no entries"),
            WeightError::ZeroTotal => write!(f, "weights sum to zero"),
            WeightError::Overflow => write!(f, "weights overflow u32"),
        }
    }
}

impl std::error::Error for WeightError {}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn abc() -> WeightedTable<char> {
        WeightedTable::new([('a', 60), ('b', 25), ('c', 0), ('d', 15)]).unwrap()
    }

    #[test]
    fn test_pick_boundaries() {
        let table = abc();
        assert_eq!(table.total(), 100);
        assert_eq!(table.pick(1), 'a');
        assert_eq!(table.pick(60), 'a');
        assert_eq!(table.pick(61), 'b');
        assert_eq!(table.pick(85), 'b');
        // Zero weight entry is skipped
        assert_eq!(table.pick(86), 'd');
        assert_eq!(table.pick(100), 'd');
    }

    #[test]
    #[should_panic]
    fn test_pick_zero_draw_panics() {
        abc().pick(0);
    }

    #[test]
    #[should_panic]
    fn test_pick_past_total_panics() {
        abc().pick(101);
    }

    #[test]
    fn test_construction_errors() {
        assert_eq!(
            WeightedTable::<u8>::new([]).unwrap_err(),
            WeightError::Empty
        );
        assert_eq!(
            WeightedTable::new([(1u8, 0), (2, 0)]).unwrap_err(),
            WeightError::ZeroTotal
        );
        assert_eq!(
            WeightedTable::new([(1u8, u32::MAX), (2, 1)]).unwrap_err(),
            WeightError::Overflow
        );
    }

    proptest! {
        #[test]
        fn prop_pick_never_returns_zero_weight(draw in 1u32..=100) {
            prop_assert_ne!(abc().pick(draw), 'c');
        }
    }
}
