/// The transition engine: advances the world by one tick.
///
/// Processing order (every snake finishes a phase before any snake
/// enters the next one):
///   1. Movement + food consumption
///   2. Wall / self collision
///   3. Head-to-head collision
///   4. Head-into-body collision
///   5. Finalize (fold death flags and kill credits into new values)
///   6. Food respawn
///
/// The input snapshot is read-only. Kill credits are accumulated in an
/// id → count map during phases 3-4 and applied once in phase 5, so no
/// already-built `SnakeState` is patched in place.
///
/// Nothing here fails: unknown ids in `decisions` are ignored, and
/// deaths, ties and full elimination are ordinary outcomes.

use std::collections::{BTreeSet, HashMap};

use rand::Rng;

use crate::domain::geometry::{Direction, Position};
use crate::domain::snake::{Decisions, SnakeId, SnakeState, FOOD_SCORE};
use super::event::{DeathCause, GameEvent};
use super::world::{is_interior, spawn_food, WorldState};

/// A new snapshot plus the events produced while computing it, in order.
#[derive(Clone, Debug)]
pub struct TickResult {
    pub state: WorldState,
    pub events: Vec<GameEvent>,
}

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn advance<R: Rng + ?Sized>(
    state: &WorldState,
    decisions: &Decisions,
    rng: &mut R,
    desired_food: usize,
) -> TickResult {
    let mut events: Vec<GameEvent> = Vec::new();
    let mut food = state.food.clone();

    let moved = resolve_movement(state, decisions, &mut food, &mut events);

    // Parallel to `moved`: survives every collision phase so far?
    let mut alive: Vec<bool> = moved.iter().map(|s| s.alive).collect();
    let mut kill_credits: HashMap<SnakeId, u32> = HashMap::new();

    resolve_walls_and_self(state, &moved, &mut alive, &mut events);
    resolve_head_to_head(&moved, &mut alive, &mut kill_credits, &mut events);
    resolve_body_hits(&moved, &mut alive, &mut kill_credits, &mut events);

    let snakes = finalize(moved, &alive, &kill_credits);
    let food = respawn_food(state, &snakes, food, desired_food, rng);

    TickResult {
        state: WorldState::new(snakes, food, state.width, state.height, state.frame + 1),
        events,
    }
}

/// The direction a snake will actually take: its decision, unless the
/// decision is missing or would reverse it into its own neck.
pub fn effective_direction(snake: &SnakeState, decisions: &Decisions) -> Direction {
    match decisions.get(&snake.id) {
        Some(&dir) if dir != snake.direction.opposite() => dir,
        _ => snake.direction,
    }
}

// ══════════════════════════════════════════════════════════════
// Phase 1: Movement
// ══════════════════════════════════════════════════════════════

fn resolve_movement(
    state: &WorldState,
    decisions: &Decisions,
    food: &mut BTreeSet<Position>,
    events: &mut Vec<GameEvent>,
) -> Vec<SnakeState> {
    let mut moved = Vec::with_capacity(state.snakes.len());

    for snake in &state.snakes {
        if !snake.alive {
            // Corpse: still drawn, never part of occupancy.
            moved.push(snake.clone());
            continue;
        }

        let direction = effective_direction(snake, decisions);
        let new_head = snake.head() + direction;

        let mut body = snake.body.clone();
        body.push_front(new_head);

        let ate = food.remove(&new_head);
        if ate {
            events.push(GameEvent::FoodConsumed { snake: snake.id, at: new_head });
        } else {
            body.pop_back();
        }

        moved.push(SnakeState {
            id: snake.id,
            body,
            direction,
            alive: true,
            score: snake.score + if ate { FOOD_SCORE } else { 0 },
            kills: snake.kills,
        });
    }

    moved
}

// ══════════════════════════════════════════════════════════════
// Phase 2: Wall / self
// ══════════════════════════════════════════════════════════════

fn resolve_walls_and_self(
    state: &WorldState,
    moved: &[SnakeState],
    alive: &mut [bool],
    events: &mut Vec<GameEvent>,
) {
    for (i, snake) in moved.iter().enumerate() {
        if !alive[i] { continue; }
        let head = snake.head();

        let cause = if !is_interior(head, state.width, state.height) {
            Some(DeathCause::Wall)
        } else if snake.body_contains_excluding_head(head) {
            // Includes a segment that stayed put because the snake just grew.
            Some(DeathCause::SelfCollision)
        } else {
            None
        };

        if let Some(cause) = cause {
            alive[i] = false;
            events.push(GameEvent::SnakeDied { snake: snake.id, at: head, cause });
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Phase 3: Head-to-head
// ══════════════════════════════════════════════════════════════

fn resolve_head_to_head(
    moved: &[SnakeState],
    alive: &mut [bool],
    kill_credits: &mut HashMap<SnakeId, u32>,
    events: &mut Vec<GameEvent>,
) {
    // Groups in first-seen order so event order follows snake order.
    let mut groups: Vec<(Position, Vec<usize>)> = Vec::new();
    for (i, snake) in moved.iter().enumerate() {
        if !alive[i] { continue; }
        let head = snake.head();
        match groups.iter_mut().find(|(at, _)| *at == head) {
            Some((_, members)) => members.push(i),
            None => groups.push((head, vec![i])),
        }
    }

    for (at, members) in groups.iter().filter(|(_, m)| m.len() > 1) {
        let best = members.iter().map(|&i| moved[i].len()).max().unwrap_or(0);
        let leaders: Vec<usize> = members.iter()
            .copied()
            .filter(|&i| moved[i].len() == best)
            .collect();
        let winner = match leaders.as_slice() {
            [only] => Some(moved[*only].id),
            _ => None,
        };

        for &i in members {
            let id = moved[i].id;
            if Some(id) == winner { continue; }
            alive[i] = false;
            kill(id, *at, DeathCause::HeadToHead { winner }, kill_credits, events);
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Phase 4: Head into another body
// ══════════════════════════════════════════════════════════════

fn resolve_body_hits(
    moved: &[SnakeState],
    alive: &mut [bool],
    kill_credits: &mut HashMap<SnakeId, u32>,
    events: &mut Vec<GameEvent>,
) {
    // Non-head segments of survivors, built once before any check so a
    // snake dying here still blocks the others this tick.
    let mut segments: HashMap<Position, SnakeId> = HashMap::new();
    for (i, snake) in moved.iter().enumerate() {
        if !alive[i] { continue; }
        for &seg in snake.body.iter().skip(1) {
            segments.entry(seg).or_insert(snake.id);
        }
    }

    for (i, snake) in moved.iter().enumerate() {
        if !alive[i] { continue; }
        let head = snake.head();
        let owner = match segments.get(&head) {
            Some(&owner) if owner != snake.id => owner,
            _ => continue,
        };
        alive[i] = false;
        kill(snake.id, head, DeathCause::Body { owner }, kill_credits, events);
    }
}

/// Record a collision death and credit whoever caused it.
fn kill(
    snake: SnakeId,
    at: Position,
    cause: DeathCause,
    kill_credits: &mut HashMap<SnakeId, u32>,
    events: &mut Vec<GameEvent>,
) {
    if let Some(killer) = cause.killer() {
        *kill_credits.entry(killer).or_insert(0) += 1;
    }
    events.push(GameEvent::SnakeDied { snake, at, cause });
}

// ══════════════════════════════════════════════════════════════
// Phase 5-6: Finalize, respawn
// ══════════════════════════════════════════════════════════════

fn finalize(
    moved: Vec<SnakeState>,
    alive: &[bool],
    kill_credits: &HashMap<SnakeId, u32>,
) -> Vec<SnakeState> {
    moved.into_iter()
        .zip(alive.iter().copied())
        .map(|(snake, survived)| SnakeState {
            alive: snake.alive && survived,
            kills: snake.kills + kill_credits.get(&snake.id).copied().unwrap_or(0),
            ..snake
        })
        .collect()
}

fn respawn_food<R: Rng + ?Sized>(
    state: &WorldState,
    snakes: &[SnakeState],
    food: BTreeSet<Position>,
    desired_food: usize,
    rng: &mut R,
) -> BTreeSet<Position> {
    if food.len() >= desired_food {
        return food;
    }
    let shortfall = desired_food - food.len();
    spawn_food(state.width, state.height, snakes, food, shortfall, rng)
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
