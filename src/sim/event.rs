/// Events emitted during a simulation step.
/// The presentation layer consumes these for the event log and sound;
/// the engines themselves never read them back.

use std::fmt;

use crate::domain::geometry::Position;
use crate::domain::snake::SnakeId;

/// Why a snake died. Carried as the event payload.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DeathCause {
    Wall,
    SelfCollision,
    /// Lost (or tied) a head-to-head contest. `winner` is the sole
    /// survivor, if any.
    HeadToHead { winner: Option<SnakeId> },
    /// Ran into another snake's body.
    Body { owner: SnakeId },
}

impl DeathCause {
    pub fn killer(self) -> Option<SnakeId> {
        match self {
            DeathCause::HeadToHead { winner } => winner,
            DeathCause::Body { owner } => Some(owner),
            DeathCause::Wall | DeathCause::SelfCollision => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    FoodConsumed { snake: SnakeId, at: Position },
    SnakeDied { snake: SnakeId, at: Position, cause: DeathCause },
}

impl GameEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            GameEvent::FoodConsumed { .. } => "food_consumed",
            GameEvent::SnakeDied { .. } => "snake_died",
        }
    }

    pub fn snake_id(&self) -> Option<SnakeId> {
        match self {
            GameEvent::FoodConsumed { snake, .. } | GameEvent::SnakeDied { snake, .. } => Some(*snake),
        }
    }

    pub fn position(&self) -> Option<Position> {
        match self {
            GameEvent::FoodConsumed { at, .. } | GameEvent::SnakeDied { at, .. } => Some(*at),
        }
    }
}

impl fmt::Display for GameEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameEvent::FoodConsumed { snake, at } => write!(f, "snake {snake} ate at {at}"),
            GameEvent::SnakeDied { snake, at, cause } => {
                let why = match cause {
                    DeathCause::Wall => "hit the wall".to_string(),
                    DeathCause::SelfCollision => "bit itself".to_string(),
                    DeathCause::HeadToHead { winner: Some(w) } => format!("lost head-on to snake {w}"),
                    DeathCause::HeadToHead { winner: None } => "died in a head-on tie".to_string(),
                    DeathCause::Body { owner } => format!("crashed into snake {owner}"),
                };
                write!(f, "snake {snake} {why} at {at}")
            }
        }
    }
}
