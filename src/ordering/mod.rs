//! Ordering rules for sibling sequences.
//!
//! Claims within an investigation and counterarguments within a claim hold
//! dense 0-based positions. The only reorder primitive is a single-step
//! promote/demote: a transposition with the adjacent sibling, which leaves
//! every other position untouched. Storage applies these rules inside write
//! transactions after re-reading current positions, so a stale client read
//! can never drive the swap.

use serde::{Deserialize, Serialize};

/// Reorder direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Toward position 0.
    Up,
    /// Toward the end of the sequence.
    Down,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Up => write!(f, "up"),
            Direction::Down => write!(f, "down"),
        }
    }
}

impl std::str::FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            _ => Err(format!("Unknown direction: {}", s)),
        }
    }
}

/// Result of a move request as applied by storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MoveResult {
    /// The entity's position after the request.
    pub position: i64,
    /// False when the entity was already at the boundary and nothing changed.
    pub moved: bool,
}

/// Outcome of a move request, computed against current positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Swap with the sibling at the returned position.
    SwapWith(i64),
    /// The entity is already at the boundary; positions are unchanged.
    AtBoundary,
}

/// Decide what a single-step move does for an entity at `position` in a
/// sequence of `len` siblings.
pub fn plan_move(position: i64, len: i64, direction: Direction) -> MoveOutcome {
    match direction {
        Direction::Up if position > 0 => MoveOutcome::SwapWith(position - 1),
        Direction::Down if position < len - 1 => MoveOutcome::SwapWith(position + 1),
        _ => MoveOutcome::AtBoundary,
    }
}

/// Whether a position multiset is exactly {0, ..., n-1}.
pub fn is_contiguous(positions: &[i64]) -> bool {
    let mut sorted = positions.to_vec();
    sorted.sort_unstable();
    sorted.iter().enumerate().all(|(i, &p)| p == i as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_move_up() {
        assert_eq!(plan_move(2, 4, Direction::Up), MoveOutcome::SwapWith(1));
    }

    #[test]
    fn test_plan_move_down() {
        assert_eq!(plan_move(2, 4, Direction::Down), MoveOutcome::SwapWith(3));
    }

    #[test]
    fn test_first_cannot_move_up() {
        assert_eq!(plan_move(0, 4, Direction::Up), MoveOutcome::AtBoundary);
    }

    #[test]
    fn test_last_cannot_move_down() {
        assert_eq!(plan_move(3, 4, Direction::Down), MoveOutcome::AtBoundary);
    }

    #[test]
    fn test_singleton_is_both_boundaries() {
        assert_eq!(plan_move(0, 1, Direction::Up), MoveOutcome::AtBoundary);
        assert_eq!(plan_move(0, 1, Direction::Down), MoveOutcome::AtBoundary);
    }

    #[test]
    fn test_move_round_trip_restores_position() {
        // up then down is identity for any non-first element
        for len in 2..6 {
            for pos in 1..len {
                let MoveOutcome::SwapWith(up) = plan_move(pos, len, Direction::Up) else {
                    panic!("non-first element must move up");
                };
                assert_eq!(plan_move(up, len, Direction::Down), MoveOutcome::SwapWith(pos));
            }
        }
    }

    #[test]
    fn test_is_contiguous() {
        assert!(is_contiguous(&[]));
        assert!(is_contiguous(&[0]));
        assert!(is_contiguous(&[2, 0, 1]));
        assert!(!is_contiguous(&[0, 2]));
        assert!(!is_contiguous(&[0, 1, 1]));
        assert!(!is_contiguous(&[1, 2, 3]));
    }

    #[test]
    fn test_direction_round_trip() {
        assert_eq!("up".parse::<Direction>().unwrap(), Direction::Up);
        assert_eq!(Direction::Down.to_string(), "down");
        assert!("sideways".parse::<Direction>().is_err());
    }
}
