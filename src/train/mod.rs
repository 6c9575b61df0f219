//! Training records and the stochastic training machinery.

pub(crate) mod optimizer;
pub(crate) mod scheduler;

use serde::{Deserialize, Serialize};

/// Which side of the context the center word was on in the source text.
///
/// For the asymmetric KL energy this selects which operand of each pair
/// plays the "from" distribution P in `-KL(P || Q)`: `Left` keeps the stored
/// operand order, `Right` swaps it. The symmetric IP energy ignores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// The center word is the left operand (flag 0 in the row encoding).
    Left,
    /// The center word is the right operand (flag 1 in the row encoding).
    Right,
}

impl Direction {
    /// The integer flag used in the five-column row encoding.
    #[inline]
    pub fn flag(&self) -> u32 {
        match self {
            Direction::Left => 0,
            Direction::Right => 1,
        }
    }

    /// Parses the integer flag of the row encoding.
    pub fn from_flag(flag: u32) -> Option<Self> {
        match flag {
            0 => Some(Direction::Left),
            1 => Some(Direction::Right),
            _ => None,
        }
    }
}

/// One training example: a positive pair observed in text and a negative
/// pair obtained by replacing the positive pair's context word with a
/// randomly drawn word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingRecord {
    /// First word of the positive pair.
    pub pos_a: u32,
    /// Second word of the positive pair.
    pub pos_b: u32,
    /// First word of the negative pair.
    pub neg_a: u32,
    /// Second word of the negative pair.
    pub neg_b: u32,
    /// Orientation of the center word relative to the context.
    pub direction: Direction,
}

impl TrainingRecord {
    /// Creates a record from its five components.
    pub fn new(pos_a: u32, pos_b: u32, neg_a: u32, neg_b: u32, direction: Direction) -> Self {
        Self {
            pos_a,
            pos_b,
            neg_a,
            neg_b,
            direction,
        }
    }

    /// The five-column unsigned-integer row encoding
    /// `(pos_a, pos_b, neg_a, neg_b, flag)`.
    pub fn to_row(&self) -> [u32; 5] {
        [
            self.pos_a,
            self.pos_b,
            self.neg_a,
            self.neg_b,
            self.direction.flag(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_flags() {
        assert_eq!(Direction::Left.flag(), 0);
        assert_eq!(Direction::Right.flag(), 1);
        assert_eq!(Direction::from_flag(0), Some(Direction::Left));
        assert_eq!(Direction::from_flag(1), Some(Direction::Right));
        assert_eq!(Direction::from_flag(2), None);
    }

    #[test]
    fn test_row_encoding() {
        let record = TrainingRecord::new(1, 2, 1, 7, Direction::Right);
        assert_eq!(record.to_row(), [1, 2, 1, 7, 1]);
    }
}
