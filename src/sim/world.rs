/// WorldState: the immutable snapshot of a running match.
///
/// ## Derived occupancy
///
/// `occupied` maps every segment of every *alive* snake to its owner.
/// It is never patched: every constructor rebuilds it from `snakes`, so
/// the snapshot always satisfies
///
/// ```text
/// occupied.keys() == ⋃ { alive.body }
/// ```
///
/// ## Walls
///
/// Border cells (x == 0, y == 0, x == width-1, y == height-1) are walls.
/// The playable interior is `1..width-1` × `1..height-1`.

use std::collections::{BTreeSet, HashMap};

use rand::seq::SliceRandom;
use rand::Rng;

use crate::domain::geometry::Position;
use crate::domain::snake::{SnakeId, SnakeSpawn, SnakeState};

#[derive(Clone, Debug)]
pub struct WorldState {
    /// Stable order: spawn order.
    pub snakes: Vec<SnakeState>,
    pub food: BTreeSet<Position>,
    occupied: HashMap<Position, SnakeId>,
    pub width: i32,
    pub height: i32,
    pub frame: u64,
}

// ── Construction ──

impl WorldState {
    pub fn new(
        snakes: Vec<SnakeState>,
        food: BTreeSet<Position>,
        width: i32,
        height: i32,
        frame: u64,
    ) -> Self {
        let occupied = build_occupancy(&snakes);
        WorldState { snakes, food, occupied, width, height, frame }
    }

    /// Starting snapshot for a match: spawns as given, `initial_food`
    /// items scattered over free interior cells.
    pub fn initial<R: Rng + ?Sized>(
        width: i32,
        height: i32,
        spawns: Vec<SnakeSpawn>,
        initial_food: usize,
        rng: &mut R,
    ) -> Self {
        let snakes: Vec<SnakeState> = spawns.into_iter().map(SnakeSpawn::into_state).collect();
        let food = spawn_food(width, height, &snakes, BTreeSet::new(), initial_food, rng);
        WorldState::new(snakes, food, width, height, 0)
    }
}

// ── Queries ──

impl WorldState {
    /// Inside the playable interior (walls excluded)?
    #[inline]
    pub fn is_within_bounds(&self, pos: Position) -> bool {
        is_interior(pos, self.width, self.height)
    }

    #[inline]
    pub fn occupant(&self, pos: Position) -> Option<SnakeId> {
        self.occupied.get(&pos).copied()
    }

    pub fn occupied_cells(&self) -> usize {
        self.occupied.len()
    }

    pub fn find_snake(&self, id: SnakeId) -> Option<&SnakeState> {
        self.snakes.iter().find(|s| s.id == id)
    }

    pub fn alive_snakes(&self) -> impl Iterator<Item = &SnakeState> {
        self.snakes.iter().filter(|s| s.alive)
    }

    pub fn alive_count(&self) -> usize {
        self.alive_snakes().count()
    }
}

#[inline]
pub(crate) fn is_interior(pos: Position, width: i32, height: i32) -> bool {
    pos.x > 0 && pos.x < width - 1 && pos.y > 0 && pos.y < height - 1
}

fn build_occupancy(snakes: &[SnakeState]) -> HashMap<Position, SnakeId> {
    let mut occupied = HashMap::with_capacity(snakes.iter().map(|s| s.len()).sum());
    for snake in snakes.iter().filter(|s| s.alive) {
        for &seg in &snake.body {
            occupied.insert(seg, snake.id);
        }
    }
    occupied
}

/// Top up `existing` with up to `count` new items on interior cells free
/// of alive bodies and existing food. Best-effort: stops when the board
/// runs out of free cells.
///
/// Candidate cells are enumerated in a fixed order before shuffling, so
/// the result depends only on the rng state.
pub(crate) fn spawn_food<R: Rng + ?Sized>(
    width: i32,
    height: i32,
    snakes: &[SnakeState],
    existing: BTreeSet<Position>,
    count: usize,
    rng: &mut R,
) -> BTreeSet<Position> {
    let blocked: BTreeSet<Position> = snakes.iter()
        .filter(|s| s.alive)
        .flat_map(|s| s.body.iter().copied())
        .chain(existing.iter().copied())
        .collect();

    let mut available: Vec<Position> = (1..width - 1)
        .flat_map(|x| (1..height - 1).map(move |y| Position::new(x, y)))
        .filter(|p| !blocked.contains(p))
        .collect();
    available.shuffle(rng);

    let mut food = existing;
    for _ in 0..count {
        match available.pop() {
            Some(p) => { food.insert(p); }
            None => break,
        }
    }
    food
}
