/// Match runner: sequences the decision and transition engines.
///
/// One `Match::step` is one frame:
///   1. Controller decides for every alive snake.
///   2. Manual overrides (keyboard / gamepad) replace those decisions.
///   3. The transition engine produces the next snapshot.
///
/// Every snapshot lands in a bounded `History`, and registered listeners
/// see each `TickResult` before the runner keeps it.
///
/// Pacing lives with the caller; `SpeedRamp` only tracks the interval.

use std::collections::VecDeque;
use std::time::Duration;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::config::{GameConfig, SpeedConfig};
use crate::domain::ai::Controller;
use crate::domain::snake::{Decisions, SnakeId, SnakeState};
use super::event::GameEvent;
use super::spawn::{default_spawns, SnakeProfile};
use super::step::{advance, TickResult};
use super::world::WorldState;

/// Snapshots kept for rewinding.
pub const HISTORY_CAPACITY: usize = 256;

/// Called with every tick, in registration order.
pub type TickListener = Box<dyn FnMut(&TickResult)>;

pub struct Match {
    state: WorldState,
    rng: ChaCha8Rng,
    controller: Controller,
    profiles: Vec<SnakeProfile>,
    desired_food: usize,
    max_rounds: u64,
    history: History,
    listeners: Vec<TickListener>,
}

impl Match {
    pub fn new(config: &GameConfig, profiles: Vec<SnakeProfile>) -> Self {
        let arena = &config.arena;
        let mut rng = ChaCha8Rng::seed_from_u64(arena.seed);
        let spawns = default_spawns(arena.width, arena.height, profiles.len());
        let state = WorldState::initial(arena.width, arena.height, spawns, arena.food_count, &mut rng);
        let controller = Controller::new(
            profiles.iter().map(|p| (p.id, p.personality)),
            config.ai.engine(),
        );

        info!(
            width = arena.width,
            height = arena.height,
            snakes = profiles.len(),
            food = arena.food_count,
            seed = arena.seed,
            "match start"
        );

        let mut history = History::new(HISTORY_CAPACITY);
        history.record(&state);

        Match {
            state,
            rng,
            controller,
            profiles,
            desired_food: arena.food_count,
            max_rounds: arena.max_rounds,
            history,
            listeners: Vec::new(),
        }
    }

    pub fn state(&self) -> &WorldState {
        &self.state
    }

    pub fn profiles(&self) -> &[SnakeProfile] {
        &self.profiles
    }

    pub fn profile(&self, id: SnakeId) -> Option<&SnakeProfile> {
        self.profiles.iter().find(|p| p.id == id)
    }

    pub fn max_rounds(&self) -> u64 {
        self.max_rounds
    }

    /// Advance one frame. Overrides for dead or unknown snakes are dropped.
    pub fn step(&mut self, overrides: &Decisions) -> Vec<GameEvent> {
        let mut decisions = self.controller.decide(&self.state);
        for (&id, &dir) in overrides {
            if self.state.find_snake(id).is_some_and(|s| s.alive) {
                decisions.insert(id, dir);
            }
        }

        let tick = advance(&self.state, &decisions, &mut self.rng, self.desired_food);
        for listener in &mut self.listeners {
            listener(&tick);
        }
        let TickResult { state, events } = tick;
        self.history.record(&state);
        self.state = state;

        let frame = self.state.frame;
        for event in &events {
            let (kind, snake, at) = (event.kind(), event.snake_id(), event.position());
            match event {
                GameEvent::SnakeDied { .. } => info!(frame, kind, ?snake, ?at, "{event}"),
                GameEvent::FoodConsumed { .. } => debug!(frame, kind, ?snake, ?at, "{event}"),
            }
        }
        if self.is_over() {
            info!(
                frame = self.state.frame,
                alive = self.state.alive_count(),
                occupied = self.state.occupied_cells(),
                winner = ?self.winner().map(|s| s.id),
                "match over"
            );
        }

        events
    }

    pub fn add_listener(&mut self, listener: impl FnMut(&TickResult) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Go back `steps` frames. The food and the rng are not rolled back,
    /// so play resumes from the old board with fresh draws.
    /// Returns false, changing nothing, when the history is too short.
    pub fn rewind(&mut self, steps: usize) -> bool {
        if steps == 0 { return false; }
        // The newest snapshot is the current state.
        let Some(past) = self.history.rewind(steps + 1) else { return false };
        info!(from = self.state.frame, to = past.frame, "rewind");
        self.history.record(&past);
        self.state = past;
        true
    }

    /// At most one snake left, or the frame limit reached.
    pub fn is_over(&self) -> bool {
        self.state.alive_count() <= 1 || self.state.frame >= self.max_rounds
    }

    /// The sole survivor, if exactly one snake is alive.
    pub fn winner(&self) -> Option<&SnakeState> {
        let mut alive = self.state.alive_snakes();
        match (alive.next(), alive.next()) {
            (Some(only), None) => Some(only),
            _ => None,
        }
    }

    /// Snakes ordered best first: alive before dead, then score, then kills.
    /// Equal records keep spawn order.
    pub fn standings(&self) -> Vec<&SnakeState> {
        let mut list: Vec<&SnakeState> = self.state.snakes.iter().collect();
        list.sort_by(|a, b| {
            b.alive.cmp(&a.alive)
                .then(b.score.cmp(&a.score))
                .then(b.kills.cmp(&a.kills))
        });
        list
    }
}

// ── History ──

/// Bounded, oldest-first list of snapshots.
#[derive(Clone, Debug)]
pub struct History {
    snapshots: VecDeque<WorldState>,
    capacity: usize,
}

impl History {
    pub fn new(capacity: usize) -> Self {
        History { snapshots: VecDeque::with_capacity(capacity.min(HISTORY_CAPACITY)), capacity }
    }

    /// Drops the oldest snapshot once over capacity.
    pub fn record(&mut self, state: &WorldState) {
        if self.capacity == 0 { return; }
        self.snapshots.push_back(state.clone());
        while self.snapshots.len() > self.capacity {
            self.snapshots.pop_front();
        }
    }

    /// Remove the newest `steps` snapshots and return the last one
    /// removed. `None`, removing nothing, when `steps` is zero or more
    /// than what is held.
    pub fn rewind(&mut self, steps: usize) -> Option<WorldState> {
        if steps == 0 || steps > self.snapshots.len() {
            return None;
        }
        let mut last = None;
        for _ in 0..steps {
            last = self.snapshots.pop_back();
        }
        last
    }

    pub fn snapshots(&self) -> impl Iterator<Item = &WorldState> {
        self.snapshots.iter()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }
}

// ── Speed ramp ──

/// Progressive tick-interval reduction with a floor.
#[derive(Clone, Debug)]
pub struct SpeedRamp {
    enabled: bool,
    every: u64,
    step: Duration,
    floor: Duration,
    current: Duration,
    since_last: u64,
}

impl SpeedRamp {
    pub fn new(speed: &SpeedConfig) -> Self {
        SpeedRamp {
            enabled: speed.ramp_enabled,
            every: speed.ramp_interval,
            step: Duration::from_millis(speed.ramp_step_ms),
            floor: Duration::from_millis(speed.min_tick_rate_ms),
            current: Duration::from_millis(speed.tick_rate_ms),
            since_last: 0,
        }
    }

    pub fn interval(&self) -> Duration {
        self.current
    }

    /// Count one simulated frame. Returns the new interval when it changed.
    pub fn on_frame(&mut self, frame: u64) -> Option<Duration> {
        if !self.enabled { return None; }

        self.since_last += 1;
        if self.since_last < self.every { return None; }
        self.since_last = 0;

        let previous = self.current;
        let next = self.current.saturating_sub(self.step);
        if next >= self.floor {
            self.current = next;
        } else if self.current > self.floor {
            self.current = self.floor;
        } else {
            return None;
        }

        info!(
            frame,
            from_ms = previous.as_millis() as u64,
            to_ms = self.current.as_millis() as u64,
            capped = self.current == self.floor,
            "speed ramp"
        );
        Some(self.current)
    }
}
