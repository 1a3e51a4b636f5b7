/// Match setup: where snakes start and who they are.
///
/// Spawns are derived from the grid size so any valid arena gets the
/// same layout: two snakes facing each other across the middle row, two
/// more facing each other down the middle column.

use crate::config::AiLevel;
use crate::domain::geometry::{Direction, Position};
use crate::domain::snake::{SnakeId, SnakeSpawn};
use crate::domain::strategy::Personality;

pub const MAX_SNAKES: usize = 4;

const GLYPHS: [char; MAX_SNAKES] = ['█', '▓', '▒', '░'];

/// Presentation identity of a snake.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SnakeProfile {
    pub id: SnakeId,
    pub personality: Personality,
    pub glyph: char,
}

/// Up to four single-segment spawns, in id order.
pub fn default_spawns(width: i32, height: i32, count: usize) -> Vec<SnakeSpawn> {
    let slots = [
        (Position::new(width / 4, height / 2), Direction::Right),
        (Position::new(width - 1 - width / 4, height / 2), Direction::Left),
        (Position::new(width / 2, height / 4), Direction::Down),
        (Position::new(width / 2, height - 1 - height / 4), Direction::Up),
    ];

    slots.into_iter()
        .take(count.min(MAX_SNAKES))
        .enumerate()
        .map(|(id, (head, direction))| SnakeSpawn { id, body: vec![head], direction })
        .collect()
}

/// Personalities come from the configured names (missing → Balanced),
/// then the AI level may override all of them at once.
pub fn build_profiles(count: usize, personalities: &[String], ai_level: AiLevel) -> Vec<SnakeProfile> {
    (0..count.min(MAX_SNAKES))
        .map(|id| {
            let configured = personalities.get(id)
                .map(|name| Personality::from_name(name))
                .unwrap_or_default();
            SnakeProfile {
                id,
                personality: ai_level.apply(configured),
                glyph: GLYPHS[id],
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn spawns_sit_inside_and_apart() {
        let spawns = default_spawns(60, 20, 4);
        assert_eq!(spawns.len(), 4);
        assert_eq!(spawns[0].body, vec![Position::new(15, 10)]);
        assert_eq!(spawns[1].body, vec![Position::new(44, 10)]);
        assert_eq!(spawns[2].body, vec![Position::new(30, 5)]);
        assert_eq!(spawns[3].body, vec![Position::new(30, 14)]);

        for s in &spawns {
            let p = s.body[0];
            assert!(p.x > 0 && p.x < 59 && p.y > 0 && p.y < 19);
        }
    }

    #[test]
    fn smallest_grid_still_fits() {
        let spawns = default_spawns(10, 10, 4);
        let heads: Vec<Position> = spawns.iter().map(|s| s.body[0]).collect();
        for (i, a) in heads.iter().enumerate() {
            assert!(a.x > 0 && a.x < 9 && a.y > 0 && a.y < 9);
            for b in &heads[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn count_is_capped() {
        assert_eq!(default_spawns(40, 20, 9).len(), MAX_SNAKES);
        assert_eq!(default_spawns(40, 20, 2).len(), 2);
        assert_eq!(default_spawns(40, 20, 2)[1].direction, Direction::Left);
    }

    #[test]
    fn profiles_follow_config_then_level() {
        let list = names(&["aggressive", "defensive", "balanced"]);

        let normal = build_profiles(4, &list, AiLevel::Normal);
        let kinds: Vec<Personality> = normal.iter().map(|p| p.personality).collect();
        assert_eq!(kinds, vec![
            Personality::Aggressive,
            Personality::Defensive,
            Personality::Balanced,
            Personality::Balanced,
        ]);
        assert_eq!(normal[1].glyph, '▓');

        let easy = build_profiles(3, &list, AiLevel::Easy);
        assert!(easy.iter().all(|p| p.personality == Personality::Defensive));

        let hard = build_profiles(3, &list, AiLevel::Hard);
        assert!(hard.iter().all(|p| p.personality == Personality::Aggressive));
    }
}
