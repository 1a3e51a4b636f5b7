/// Named behaviour strategies.
///
/// A closed enum mapped onto plain functions. Every strategy receives a
/// non-empty option list in `Direction::ALL` order and must return one of
/// those options; ties always go to the earliest option.

use std::fmt;

use crate::sim::world::WorldState;
use super::ai::Ctx;
use super::geometry::{Direction, Position};
use super::snake::{SnakeId, SnakeState};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum Personality {
    Aggressive,
    Defensive,
    #[default]
    Balanced,
}

pub type StrategyFn = fn(&Ctx<'_>, &SnakeState, &[Direction]) -> Direction;

impl Personality {
    pub const ALL: [Personality; 3] = [Personality::Aggressive, Personality::Defensive, Personality::Balanced];

    /// Case-insensitive; anything unrecognised is Balanced.
    pub fn from_name(name: &str) -> Personality {
        match name.trim().to_ascii_lowercase().as_str() {
            "aggressive" => Personality::Aggressive,
            "defensive" => Personality::Defensive,
            _ => Personality::Balanced,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Personality::Aggressive => "aggressive",
            Personality::Defensive => "defensive",
            Personality::Balanced => "balanced",
        }
    }

    pub fn strategy(self) -> StrategyFn {
        match self {
            Personality::Aggressive => aggressive,
            Personality::Defensive => defensive,
            Personality::Balanced => balanced,
        }
    }
}

impl fmt::Display for Personality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ── Strategies ──

/// Nearest food by path length, else the roomiest move.
pub fn balanced(ctx: &Ctx<'_>, snake: &SnakeState, options: &[Direction]) -> Direction {
    let head = snake.head();
    if let Some(food) = nearest(head, ctx.state.food.iter().copied()) {
        if let Some(dir) = ctx.choose_toward(snake, options, food) {
            return dir;
        }
    }
    ctx.roomiest(snake, options)
}

/// Hunt the nearest living rival head; Balanced when that leads nowhere.
pub fn aggressive(ctx: &Ctx<'_>, snake: &SnakeState, options: &[Direction]) -> Direction {
    let head = snake.head();
    if let Some(prey) = nearest(head, rival_heads(ctx.state, snake.id)) {
        if let Some(dir) = ctx.choose_toward(snake, options, prey) {
            return dir;
        }
    }
    balanced(ctx, snake, options)
}

/// Room first, distance from rivals second: `2 * space + rival distance`.
pub fn defensive(ctx: &Ctx<'_>, snake: &SnakeState, options: &[Direction]) -> Direction {
    let head = snake.head();
    let mut best: Option<(Direction, usize)> = None;

    for &dir in options {
        let next = head + dir;
        let threat = nearest(next, rival_heads(ctx.state, snake.id))
            .map_or(0, |rival| next.distance_to(rival));
        let score = 2 * ctx.space_after(snake, dir) + threat;
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((dir, score));
        }
    }

    match best {
        Some((dir, _)) => dir,
        None => balanced(ctx, snake, options),
    }
}

// ── Helpers ──

fn rival_heads(state: &WorldState, me: SnakeId) -> impl Iterator<Item = Position> + '_ {
    state.alive_snakes()
        .filter(move |s| s.id != me)
        .map(|s| s.head())
}

/// Closest target by Manhattan distance; the first one wins a tie.
fn nearest(from: Position, targets: impl Iterator<Item = Position>) -> Option<Position> {
    targets.min_by_key(|t| from.distance_to(*t))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_and_unknown_is_balanced() {
        for p in Personality::ALL {
            assert_eq!(Personality::from_name(p.name()), p);
        }
        assert_eq!(Personality::from_name("  AGGRESSIVE "), Personality::Aggressive);
        assert_eq!(Personality::from_name("berserk"), Personality::Balanced);
        assert_eq!(Personality::from_name(""), Personality::Balanced);
    }

    #[test]
    fn nearest_prefers_first_on_tie() {
        let from = Position::new(5, 5);
        let targets = [Position::new(5, 3), Position::new(3, 5), Position::new(9, 9)];
        assert_eq!(nearest(from, targets.into_iter()), Some(Position::new(5, 3)));
        assert_eq!(nearest(from, std::iter::empty()), None);
    }
}
