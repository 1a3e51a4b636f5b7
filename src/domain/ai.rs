/// Snake AI: one decision per alive snake per tick.
///
/// Two stages:
///   1. **Safety**: enumerate moves that cannot kill on the spot
///      (in bounds, unoccupied or own tail, no reversal into the neck).
///      When nothing is safe, retry permissively; when that is empty too,
///      keep the current heading.
///   2. **Strategy**: hand the surviving options to the snake's
///      personality (see `strategy.rs`).
///
/// Reads the snapshot only. Holds no state between ticks.

use std::collections::{BTreeMap, HashSet, VecDeque};

use tracing::debug;

use crate::sim::world::WorldState;
use super::geometry::{Direction, Position};
use super::pathfinding::find_path;
use super::snake::{Decisions, SnakeId, SnakeState};
use super::strategy::Personality;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AiConfig {
    /// Paths longer than this are ignored outright.
    pub max_path_length: usize,
    /// Flood fill stops after counting this many cells.
    pub space_search_limit: usize,
}

impl Default for AiConfig {
    fn default() -> Self {
        AiConfig { max_path_length: 64, space_search_limit: 18 }
    }
}

pub struct Controller {
    personalities: BTreeMap<SnakeId, Personality>,
    config: AiConfig,
}

impl Controller {
    pub fn new(personalities: impl IntoIterator<Item = (SnakeId, Personality)>, config: AiConfig) -> Self {
        Controller { personalities: personalities.into_iter().collect(), config }
    }

    /// Snakes without an assigned personality play Balanced.
    pub fn personality(&self, id: SnakeId) -> Personality {
        self.personalities.get(&id).copied().unwrap_or_default()
    }

    pub fn decide(&self, state: &WorldState) -> Decisions {
        let ctx = Ctx { state, config: &self.config };
        state.alive_snakes()
            .map(|snake| (snake.id, self.decide_for(&ctx, snake)))
            .collect()
    }

    fn decide_for(&self, ctx: &Ctx<'_>, snake: &SnakeState) -> Direction {
        let mut options = ctx.safe_directions(snake);
        if options.is_empty() {
            options = ctx.permissive_directions(snake);
        }
        if options.is_empty() {
            debug!(snake = snake.id, dir = ?snake.direction, "boxed in, holding course");
            return snake.direction;
        }

        let personality = self.personality(snake.id);
        let dir = (personality.strategy())(ctx, snake, &options);
        debug!(
            snake = snake.id,
            %personality,
            options = options.len(),
            dir = ?dir,
            "decision"
        );
        dir
    }
}

/// Read-only view shared by the strategies for one tick.
pub struct Ctx<'a> {
    pub state: &'a WorldState,
    pub config: &'a AiConfig,
}

// ── Safety ──

impl<'a> Ctx<'a> {
    /// Free, or (with `allow_tail`) the snake's own tail cell.
    fn is_cell_safe(&self, snake: &SnakeState, pos: Position, allow_tail: bool) -> bool {
        match self.state.occupant(pos) {
            None => true,
            Some(id) if id == snake.id => allow_tail && snake.tail() == Some(pos),
            Some(_) => false,
        }
    }

    pub fn safe_directions(&self, snake: &SnakeState) -> Vec<Direction> {
        let head = snake.head();
        Direction::ALL.into_iter()
            .filter(|&d| snake.len() <= 1 || d != snake.direction.opposite())
            .filter(|&d| {
                let next = head + d;
                self.state.is_within_bounds(next) && self.is_cell_safe(snake, next, true)
            })
            .collect()
    }

    /// Reversal allowed, but no tail leniency.
    pub fn permissive_directions(&self, snake: &SnakeState) -> Vec<Direction> {
        let head = snake.head();
        Direction::ALL.into_iter()
            .filter(|&d| {
                let next = head + d;
                self.state.is_within_bounds(next) && self.is_cell_safe(snake, next, false)
            })
            .collect()
    }
}

// ── Targeting ──

impl<'a> Ctx<'a> {
    /// Best option toward `target`, or `None` if no option makes progress.
    ///
    /// Options with a path (no longer than `max_path_length`) rank by path
    /// length and always beat options without one. Options without a path
    /// only count if they strictly close the Manhattan gap, and rank by
    /// the distance left.
    pub fn choose_toward(
        &self,
        snake: &SnakeState,
        options: &[Direction],
        target: Position,
    ) -> Option<Direction> {
        let head = snake.head();
        let here = head.distance_to(target);
        // (tier, score): tier 0 has a path, tier 1 only gets closer.
        let mut best: Option<(Direction, (u8, usize))> = None;

        for &dir in options {
            let next = head + dir;
            let key = match find_path(self.state, snake.id, next, target) {
                Some(path) if path.len() <= self.config.max_path_length => (0, path.len()),
                Some(_) => continue,
                None => {
                    let left = next.distance_to(target);
                    if left >= here { continue; }
                    (1, left)
                }
            };
            if best.map_or(true, |(_, k)| key < k) {
                best = Some((dir, key));
            }
        }

        best.map(|(dir, _)| dir)
    }
}

// ── Space heuristic ──

impl<'a> Ctx<'a> {
    /// Bounded BFS from the cell `dir` leads to. The snake's own body is
    /// an obstacle; the count stops at `space_search_limit`.
    pub fn space_after(&self, snake: &SnakeState, dir: Direction) -> usize {
        let start = snake.head() + dir;
        let limit = self.config.space_search_limit;

        let mut visited: HashSet<Position> = snake.body.iter().copied().collect();
        visited.insert(start);
        let mut queue: VecDeque<Position> = VecDeque::with_capacity(limit * 2);
        queue.push_back(start);

        let mut count = 0;
        while count < limit {
            let Some(current) = queue.pop_front() else { break };
            count += 1;
            for next in current.neighbors() {
                if visited.contains(&next) { continue; }
                if !self.state.is_within_bounds(next) { continue; }
                if !self.is_cell_safe(snake, next, true) { continue; }
                visited.insert(next);
                queue.push_back(next);
            }
        }
        count
    }

    /// Option with the most room; first one wins a tie.
    pub fn roomiest(&self, snake: &SnakeState, options: &[Direction]) -> Direction {
        let mut best: Option<(Direction, usize)> = None;
        for &dir in options {
            let space = self.space_after(snake, dir);
            if best.map_or(true, |(_, s)| space > s) {
                best = Some((dir, space));
            }
        }
        best.map_or(snake.direction, |(dir, _)| dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn p(x: i32, y: i32) -> Position {
        Position::new(x, y)
    }

    fn snake(id: SnakeId, cells: &[(i32, i32)], dir: Direction) -> SnakeState {
        SnakeState::new(id, cells.iter().map(|&(x, y)| p(x, y)), dir)
    }

    fn world(snakes: Vec<SnakeState>, food: &[(i32, i32)], size: i32) -> WorldState {
        let food: BTreeSet<Position> = food.iter().map(|&(x, y)| p(x, y)).collect();
        WorldState::new(snakes, food, size, size, 0)
    }

    fn controller(personalities: &[(SnakeId, Personality)], config: AiConfig) -> Controller {
        Controller::new(personalities.iter().copied(), config)
    }

    fn balanced() -> Controller {
        controller(&[], AiConfig::default())
    }

    fn capped(max_path_length: usize) -> AiConfig {
        AiConfig { max_path_length, ..AiConfig::default() }
    }

    // ── Balanced ──

    #[test]
    fn heads_for_food() {
        let w = world(vec![snake(0, &[(4, 4)], Direction::Right)], &[(7, 4)], 12);
        assert_eq!(balanced().decide(&w)[&0], Direction::Right);
    }

    #[test]
    fn keeps_straight_toward_food_ahead() {
        let w = world(vec![snake(0, &[(2, 2)], Direction::Right)], &[(5, 2)], 12);
        assert_eq!(balanced().decide(&w)[&0], Direction::Right);
    }

    #[test]
    fn never_steps_into_wall() {
        // Food sits on the wall itself: still not worth dying for.
        let w = world(vec![snake(0, &[(5, 1)], Direction::Up)], &[(5, 0)], 12);
        assert_ne!(balanced().decide(&w)[&0], Direction::Up);
    }

    #[test]
    fn prefers_open_space_without_food() {
        let me = snake(0, &[(5, 5)], Direction::Right);
        let blocker = snake(1, &[(6, 5), (7, 5), (7, 6)], Direction::Left);
        let w = world(vec![me, blocker], &[], 12);
        let dir = balanced().decide(&w)[&0];
        assert!(matches!(dir, Direction::Up | Direction::Down | Direction::Left));
    }

    #[test]
    fn overlong_paths_are_ignored() {
        let w = world(vec![snake(0, &[(1, 1)], Direction::Right)], &[(4, 1)], 10);
        let c = controller(&[], capped(0));
        // No path qualifies; flood fill ties and Down comes first.
        assert_eq!(c.decide(&w)[&0], Direction::Down);
    }

    #[test]
    fn no_path_option_must_close_distance() {
        // Food walled off by a rival: the no-path tier still steers closer.
        let me = snake(0, &[(2, 5)], Direction::Right);
        let column: Vec<(i32, i32)> = (1..=10).map(|y| (5, y)).collect();
        let wall = snake(1, &column, Direction::Up);
        let w = world(vec![me, wall], &[(8, 5)], 12);
        assert_eq!(balanced().decide(&w)[&0], Direction::Right);
    }

    #[test]
    fn any_path_beats_a_closer_dead_end() {
        // Right enters a sealed cell two steps from the food; Up and Down
        // need six-step detours around the rival but do reach it.
        let me = snake(0, &[(5, 5), (4, 5), (3, 5)], Direction::Right);
        let cup = snake(1, &[(6, 4), (7, 4), (7, 5), (7, 6), (6, 6)], Direction::Left);
        let w = world(vec![me.clone(), cup], &[(8, 5)], 12);
        let config = AiConfig::default();
        let ctx = Ctx { state: &w, config: &config };

        assert_eq!(find_path(&w, 0, p(6, 5), p(8, 5)), None);
        assert_eq!(find_path(&w, 0, p(5, 4), p(8, 5)).map(|path| path.len()), Some(6));
        assert_eq!(
            ctx.choose_toward(&me, &[Direction::Up, Direction::Down, Direction::Right], p(8, 5)),
            Some(Direction::Up),
        );
        assert_eq!(balanced().decide(&w)[&0], Direction::Up);
    }

    // ── Aggressive ──

    #[test]
    fn aggressive_hunts_rival_head() {
        let hunter = snake(0, &[(2, 2)], Direction::Right);
        let rival = snake(1, &[(5, 2), (6, 2)], Direction::Left);
        let w = world(vec![hunter, rival], &[(2, 1)], 12);
        let c = controller(
            &[(0, Personality::Aggressive), (1, Personality::Defensive)],
            AiConfig::default(),
        );
        assert_eq!(c.decide(&w)[&0], Direction::Right);
    }

    #[test]
    fn aggressive_falls_back_to_balanced() {
        let hunter = snake(0, &[(1, 1)], Direction::Right);
        let rival = snake(1, &[(6, 1)], Direction::Left);
        let w = world(vec![hunter, rival], &[], 10);
        let c = controller(
            &[(0, Personality::Aggressive), (1, Personality::Defensive)],
            capped(0),
        );
        assert_eq!(c.decide(&w)[&0], Direction::Down);
    }

    #[test]
    fn aggressive_ignores_dead_snakes() {
        let hunter = snake(0, &[(5, 5)], Direction::Right);
        let mut corpse = snake(1, &[(5, 3)], Direction::Down);
        corpse.alive = false;
        let prey = snake(2, &[(5, 9)], Direction::Up);
        let w = world(vec![hunter, corpse, prey], &[], 12);
        let c = controller(&[(0, Personality::Aggressive)], AiConfig::default());
        assert_eq!(c.decide(&w)[&0], Direction::Down);
    }

    // ── Defensive ──

    #[test]
    fn defensive_keeps_away_from_rival() {
        let me = snake(0, &[(4, 4)], Direction::Right);
        let rival = snake(1, &[(4, 2)], Direction::Down);
        let w = world(vec![me, rival], &[(4, 3)], 12);
        let c = controller(
            &[(0, Personality::Defensive), (1, Personality::Aggressive)],
            AiConfig::default(),
        );
        assert_eq!(c.decide(&w)[&0], Direction::Down);
    }

    #[test]
    fn defensive_values_room_over_distance() {
        // Down leads into a two-cell pocket far from the rival; Right is
        // open but two cells from the rival head: 2*2+4 < 2*18+2.
        let me = snake(0, &[(1, 1)], Direction::Right);
        let fence = snake(
            1,
            &[(1, 9), (1, 8), (1, 7), (1, 6), (1, 5), (1, 4), (2, 4), (2, 3), (2, 2)],
            Direction::Down,
        );
        let rival = snake(2, &[(4, 1)], Direction::Left);
        let w = world(vec![me.clone(), fence, rival], &[], 12);
        let config = AiConfig::default();
        let ctx = Ctx { state: &w, config: &config };

        assert_eq!(ctx.safe_directions(&me), vec![Direction::Down, Direction::Right]);
        assert_eq!(ctx.space_after(&me, Direction::Down), 2);
        assert_eq!(ctx.space_after(&me, Direction::Right), 18);

        let c = controller(&[(0, Personality::Defensive)], AiConfig::default());
        assert_eq!(c.decide(&w)[&0], Direction::Right);
    }

    // ── Safety ──

    #[test]
    fn boxed_in_snake_still_gets_a_direction() {
        let me = snake(0, &[(3, 3), (3, 4), (2, 3), (2, 4)], Direction::Right);
        let walls = snake(1, &[(4, 3), (4, 2), (3, 2), (2, 2)], Direction::Left);
        let w = world(vec![me.clone(), walls], &[], 12);

        let ctx = Ctx { state: &w, config: &AiConfig::default() };
        assert!(ctx.safe_directions(&me).is_empty());
        assert!(ctx.permissive_directions(&me).is_empty());
        assert_eq!(balanced().decide(&w)[&0], Direction::Right);
    }

    #[test]
    fn own_tail_counts_as_escape() {
        // Only way out of the pocket is into the vacating tail.
        let me = snake(0, &[(2, 2), (3, 2), (3, 3), (2, 3)], Direction::Left);
        let rival = snake(1, &[(1, 2), (1, 1), (2, 1)], Direction::Up);
        let w = world(vec![me.clone(), rival], &[], 12);

        let ctx = Ctx { state: &w, config: &AiConfig::default() };
        assert_eq!(ctx.safe_directions(&me), vec![Direction::Down]);
        assert!(ctx.permissive_directions(&me).is_empty());
        assert_eq!(balanced().decide(&w)[&0], Direction::Down);
    }

    #[test]
    fn single_segment_may_reverse() {
        let me = snake(0, &[(5, 5)], Direction::Right);
        let w = world(vec![me.clone()], &[], 12);
        let ctx = Ctx { state: &w, config: &AiConfig::default() };
        assert_eq!(ctx.safe_directions(&me).len(), 4);
    }

    #[test]
    fn only_alive_snakes_get_decisions() {
        let mut dead = snake(1, &[(8, 8)], Direction::Up);
        dead.alive = false;
        let w = world(vec![snake(0, &[(4, 4)], Direction::Up), dead], &[], 12);
        let d = balanced().decide(&w);
        assert!(d.contains_key(&0));
        assert!(!d.contains_key(&1));
    }

    #[test]
    fn flood_fill_is_capped() {
        let me = snake(0, &[(5, 5)], Direction::Right);
        let w = world(vec![me.clone()], &[], 20);
        let config = AiConfig { space_search_limit: 7, ..AiConfig::default() };
        let ctx = Ctx { state: &w, config: &config };
        assert_eq!(ctx.space_after(&me, Direction::Up), 7);
    }

    #[test]
    fn flood_fill_counts_small_pockets() {
        // The 2x2 top-left corner is sealed by our own body and a rival.
        let me = snake(0, &[(3, 2), (3, 1)], Direction::Down);
        let rival = snake(1, &[(1, 3), (2, 3), (3, 3)], Direction::Right);
        let w = world(vec![me.clone(), rival], &[], 12);
        let ctx = Ctx { state: &w, config: &AiConfig::default() };
        assert_eq!(ctx.space_after(&me, Direction::Left), 4);
        assert_eq!(ctx.space_after(&me, Direction::Right), 18);
        assert_eq!(ctx.roomiest(&me, &[Direction::Left, Direction::Right]), Direction::Right);
    }
}
