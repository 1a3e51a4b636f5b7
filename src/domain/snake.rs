/// Snakes: the per-agent value records owned by a `WorldState`.
///
/// A `SnakeState` is never mutated once it sits in a snapshot; the
/// transition engine builds a fresh value for every snake every tick.

use std::collections::{BTreeMap, VecDeque};

use super::geometry::{Direction, Position};

pub type SnakeId = usize;

/// One desired direction per snake id. Ordered so logs and tests see a
/// stable iteration order.
pub type Decisions = BTreeMap<SnakeId, Direction>;

/// Score awarded per food item.
pub const FOOD_SCORE: u32 = 10;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SnakeState {
    pub id: SnakeId,
    /// Head first, tail last. Order is physical body order.
    pub body: VecDeque<Position>,
    pub direction: Direction,
    pub alive: bool,
    pub score: u32,
    pub kills: u32,
}

impl SnakeState {
    pub fn new(id: SnakeId, body: impl IntoIterator<Item = Position>, direction: Direction) -> Self {
        SnakeState {
            id,
            body: body.into_iter().collect(),
            direction,
            alive: true,
            score: 0,
            kills: 0,
        }
    }

    /// Segments are never empty for a constructed snake; a degenerate
    /// body reports the origin rather than panicking.
    pub fn head(&self) -> Position {
        self.body.front().copied().unwrap_or(Position::new(0, 0))
    }

    pub fn tail(&self) -> Option<Position> {
        self.body.back().copied()
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    /// Is `pos` one of this snake's segments other than the head?
    pub fn body_contains_excluding_head(&self, pos: Position) -> bool {
        self.body.iter().skip(1).any(|&seg| seg == pos)
    }
}

/// Starting definition for a snake, supplied by the spawn collaborator.
#[derive(Clone, Debug)]
pub struct SnakeSpawn {
    pub id: SnakeId,
    pub body: Vec<Position>,
    pub direction: Direction,
}

impl SnakeSpawn {
    pub fn into_state(self) -> SnakeState {
        SnakeState::new(self.id, self.body, self.direction)
    }
}
