/// A* over a world snapshot's free cells.
///
/// Walkable cells: interior cells that are unoccupied, the goal itself
/// (even if a snake sits on it), or the requester's own current tail
/// (it vacates on the same move). Manhattan distance is the heuristic.
///
/// Ties in the open set are broken by insertion order, and neighbours
/// are expanded in `Direction::ALL` order, so the result is fully
/// deterministic for a given snapshot.
///
/// There is no node budget; callers cap the *length* of what comes back.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use crate::sim::world::WorldState;
use super::geometry::Position;
use super::snake::SnakeId;

/// Path from `start` to `goal`, excluding `start` and including `goal`.
/// `Some(vec![])` when `start == goal`; `None` when unreachable.
pub fn find_path(
    state: &WorldState,
    requester: SnakeId,
    start: Position,
    goal: Position,
) -> Option<Vec<Position>> {
    if start == goal {
        return Some(Vec::new());
    }

    let own_tail = state.find_snake(requester).and_then(|s| s.tail());
    let walkable = |pos: Position| -> bool {
        if pos == goal { return true; }
        if !state.is_within_bounds(pos) { return false; }
        match state.occupant(pos) {
            None => true,
            Some(id) => id == requester && Some(pos) == own_tail,
        }
    };

    // (f, insertion seq, g, pos)
    let mut open: BinaryHeap<Reverse<(usize, u64, usize, Position)>> = BinaryHeap::new();
    let mut seq: u64 = 0;
    open.push(Reverse((start.distance_to(goal), seq, 0, start)));

    let mut came_from: HashMap<Position, Position> = HashMap::new();
    let mut g_score: HashMap<Position, usize> = HashMap::new();
    g_score.insert(start, 0);
    let mut closed: HashSet<Position> = HashSet::new();

    while let Some(Reverse((_, _, g, current))) = open.pop() {
        if !closed.insert(current) { continue; }
        if current == goal {
            return Some(reconstruct(&came_from, current));
        }

        for next in current.neighbors() {
            if !walkable(next) { continue; }
            let tentative = g + 1;
            if g_score.get(&next).map_or(true, |&known| tentative < known) {
                came_from.insert(next, current);
                g_score.insert(next, tentative);
                seq += 1;
                open.push(Reverse((tentative + next.distance_to(goal), seq, tentative, next)));
            }
        }
    }

    None
}

fn reconstruct(came_from: &HashMap<Position, Position>, mut current: Position) -> Vec<Position> {
    let mut path = vec![current];
    while let Some(&prev) = came_from.get(&current) {
        path.push(prev);
        current = prev;
    }
    // Drop the start cell, then flip to start→goal order.
    path.pop();
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use crate::domain::geometry::Direction;
    use crate::domain::snake::SnakeState;

    fn p(x: i32, y: i32) -> Position {
        Position::new(x, y)
    }

    fn snake(id: SnakeId, cells: &[(i32, i32)]) -> SnakeState {
        SnakeState::new(id, cells.iter().map(|&(x, y)| p(x, y)), Direction::Right)
    }

    fn world(snakes: Vec<SnakeState>) -> WorldState {
        WorldState::new(snakes, BTreeSet::new(), 12, 12, 0)
    }

    fn assert_contiguous(start: Position, path: &[Position]) {
        let mut prev = start;
        for &step in path {
            assert_eq!(prev.distance_to(step), 1, "gap between {prev} and {step}");
            prev = step;
        }
    }

    #[test]
    fn straight_line() {
        let w = world(vec![snake(0, &[(2, 2)])]);
        let path = find_path(&w, 0, p(2, 2), p(6, 2)).expect("reachable");
        assert_eq!(path, vec![p(3, 2), p(4, 2), p(5, 2), p(6, 2)]);
    }

    #[test]
    fn start_equals_goal_is_empty() {
        let w = world(vec![snake(0, &[(2, 2)])]);
        assert_eq!(find_path(&w, 0, p(2, 2), p(2, 2)), Some(vec![]));
    }

    #[test]
    fn routes_around_obstacle() {
        let wall = [(4, 2), (4, 3), (4, 4)];
        let w = world(vec![snake(0, &[(2, 3)]), snake(1, &wall)]);
        let path = find_path(&w, 0, p(2, 3), p(6, 3)).expect("reachable");

        assert_eq!(path.last(), Some(&p(6, 3)));
        assert_contiguous(p(2, 3), &path);
        for (x, y) in wall {
            assert!(!path.contains(&p(x, y)));
        }
        // Shortest detour: over or under the three-cell wall.
        assert_eq!(path.len(), 8);
    }

    #[test]
    fn enclosed_start_is_unreachable() {
        let cage = snake(1, &[(3, 3), (3, 4), (4, 4), (5, 4), (5, 3), (4, 2)]);
        let w = world(vec![snake(0, &[(4, 3)]), cage]);
        assert_eq!(find_path(&w, 0, p(4, 3), p(6, 3)), None);
    }

    #[test]
    fn may_cross_own_tail() {
        let me = snake(0, &[(2, 2), (1, 2), (1, 3), (2, 3)]);
        let w = world(vec![me]);
        let path = find_path(&w, 0, p(2, 2), p(1, 3)).expect("reachable");
        assert!(path.contains(&p(1, 3)));
        assert_contiguous(p(2, 2), &path);
    }

    #[test]
    fn rival_tail_is_not_walkable() {
        // Snake 1 fills column 5 except its tail at (5,10); only the
        // requester's own tail gets leniency.
        let column: Vec<(i32, i32)> = (1..=10).map(|y| (5, y)).collect();
        let w = world(vec![snake(0, &[(2, 5)]), snake(1, &column)]);
        assert_eq!(find_path(&w, 0, p(2, 5), p(8, 5)), None);
    }

    #[test]
    fn occupied_goal_is_enterable() {
        let w = world(vec![snake(0, &[(2, 2)]), snake(1, &[(5, 2), (6, 2)])]);
        let path = find_path(&w, 0, p(2, 2), p(5, 2)).expect("reachable");
        assert_eq!(path, vec![p(3, 2), p(4, 2), p(5, 2)]);
    }

    #[test]
    fn never_leaves_the_interior() {
        let w = world(vec![snake(0, &[(1, 1)])]);
        let path = find_path(&w, 0, p(1, 1), p(10, 10)).expect("reachable");
        assert_eq!(path.len(), 18);
        assert!(path.iter().all(|&c| w.is_within_bounds(c)));
    }
}
