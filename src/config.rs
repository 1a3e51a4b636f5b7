/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD, or the
/// XDG data dir). A missing file or missing keys fall back to defaults;
/// a file that exists but cannot be read or parsed is an error, and so
/// is any value `validate` rejects. All of this happens before the
/// first frame.
///
/// Layering, lowest to highest: defaults → config.toml → difficulty
/// preset → explicit command-line flags.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::domain::ai::AiConfig;
use crate::domain::strategy::Personality;
use crate::sim::spawn::MAX_SNAKES;

pub const MIN_GRID: i32 = 10;
pub const MAX_GRID: i32 = 200;
pub const MAX_FOOD: usize = 50;

// ── Errors ──

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("grid {width}x{height} out of range (each side 10..=200)")]
    GridSize { width: i32, height: i32 },
    #[error("food count {count} out of range (1..={max} for this grid)")]
    FoodCount { count: usize, max: usize },
    #[error("max rounds must be positive")]
    MaxRounds,
    #[error("tick rate must be positive")]
    TickRate,
    #[error("minimum tick rate {min} ms must be positive and no more than the tick rate ({tick} ms)")]
    MinTickRate { min: u64, tick: u64 },
    #[error("snake count {0} out of range (1..=4)")]
    SnakeCount(usize),
}

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub arena: ArenaConfig,
    pub speed: SpeedConfig,
    pub ai: AiSettings,
    pub gamepad: GamepadConfig,
}

#[derive(Clone, Debug)]
pub struct ArenaConfig {
    pub width: i32,
    pub height: i32,
    /// Initial food, and the count respawn tops up to.
    pub food_count: usize,
    pub max_rounds: u64,
    pub seed: u64,
    pub snake_count: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpeedConfig {
    pub tick_rate_ms: u64,
    pub ramp_enabled: bool,
    pub ramp_interval: u64,      // frames between speed-ups
    pub ramp_step_ms: u64,
    pub min_tick_rate_ms: u64,   // speed cap
}

#[derive(Clone, Debug)]
pub struct AiSettings {
    pub max_path_length: usize,
    pub space_search_limit: usize,
    /// Per-snake personality names, by id. Unknown names play Balanced.
    pub personalities: Vec<String>,
}

impl AiSettings {
    pub fn engine(&self) -> AiConfig {
        AiConfig {
            max_path_length: self.max_path_length,
            space_search_limit: self.space_search_limit,
        }
    }
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub pause: Vec<String>,
    pub quit: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    arena: TomlArena,
    #[serde(default)]
    speed: TomlSpeed,
    #[serde(default)]
    ai: TomlAi,
    #[serde(default)]
    gamepad: TomlGamepad,
}

#[derive(Deserialize, Debug)]
struct TomlArena {
    #[serde(default = "default_width")]
    width: i32,
    #[serde(default = "default_height")]
    height: i32,
    #[serde(default = "default_food_count")]
    food_count: usize,
    #[serde(default = "default_max_rounds")]
    max_rounds: u64,
    #[serde(default = "default_seed")]
    seed: u64,
    #[serde(default = "default_snake_count")]
    snake_count: usize,
}

#[derive(Deserialize, Debug)]
struct TomlSpeed {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
    #[serde(default)]
    ramp_enabled: bool,
    #[serde(default = "default_ramp_interval")]
    ramp_interval: u64,
    #[serde(default = "default_ramp_step")]
    ramp_step_ms: u64,
    #[serde(default = "default_min_tick_rate")]
    min_tick_rate_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlAi {
    #[serde(default = "default_max_path_length")]
    max_path_length: usize,
    #[serde(default = "default_space_search_limit")]
    space_search_limit: usize,
    #[serde(default = "default_personalities")]
    personalities: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_pause")]
    pause: Vec<String>,
    #[serde(default = "default_quit")]
    quit: Vec<String>,
}

// ── Defaults ──

fn default_width() -> i32 { 60 }
fn default_height() -> i32 { 20 }
fn default_food_count() -> usize { 5 }
fn default_max_rounds() -> u64 { 800 }
fn default_seed() -> u64 { 1337 }
fn default_snake_count() -> usize { 3 }

fn default_tick_rate() -> u64 { 120 }
fn default_ramp_interval() -> u64 { 100 }
fn default_ramp_step() -> u64 { 10 }
fn default_min_tick_rate() -> u64 { 30 }

fn default_max_path_length() -> usize { 64 }
fn default_space_search_limit() -> usize { 18 }
fn default_personalities() -> Vec<String> {
    Personality::ALL.iter().map(|p| p.name().to_string()).collect()
}

fn default_pause() -> Vec<String> { vec!["Start".into()] }
fn default_quit() -> Vec<String> { vec!["Select".into()] }

impl Default for TomlArena {
    fn default() -> Self {
        TomlArena {
            width: default_width(),
            height: default_height(),
            food_count: default_food_count(),
            max_rounds: default_max_rounds(),
            seed: default_seed(),
            snake_count: default_snake_count(),
        }
    }
}

impl Default for TomlSpeed {
    fn default() -> Self {
        TomlSpeed {
            tick_rate_ms: default_tick_rate(),
            ramp_enabled: false,
            ramp_interval: default_ramp_interval(),
            ramp_step_ms: default_ramp_step(),
            min_tick_rate_ms: default_min_tick_rate(),
        }
    }
}

impl Default for TomlAi {
    fn default() -> Self {
        TomlAi {
            max_path_length: default_max_path_length(),
            space_search_limit: default_space_search_limit(),
            personalities: default_personalities(),
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            pause: default_pause(),
            quit: default_quit(),
        }
    }
}

impl From<TomlConfig> for GameConfig {
    fn from(t: TomlConfig) -> Self {
        GameConfig {
            arena: ArenaConfig {
                width: t.arena.width,
                height: t.arena.height,
                food_count: t.arena.food_count,
                max_rounds: t.arena.max_rounds,
                seed: t.arena.seed,
                snake_count: t.arena.snake_count,
            },
            speed: SpeedConfig {
                tick_rate_ms: t.speed.tick_rate_ms,
                ramp_enabled: t.speed.ramp_enabled,
                ramp_interval: t.speed.ramp_interval,
                ramp_step_ms: t.speed.ramp_step_ms,
                min_tick_rate_ms: t.speed.min_tick_rate_ms,
            },
            ai: AiSettings {
                max_path_length: t.ai.max_path_length,
                space_search_limit: t.ai.space_search_limit,
                personalities: t.ai.personalities,
            },
            gamepad: GamepadConfig {
                pause: t.gamepad.pause,
                quit: t.gamepad.quit,
            },
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        TomlConfig::default().into()
    }
}

// ── Presets ──

/// Bundled arena/speed settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Difficulty {
    Easy,
    Normal,
    Hard,
    Extreme,
    /// Leave the configuration untouched.
    #[default]
    Custom,
}

/// Personality override applied to every snake.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum AiLevel {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl AiLevel {
    pub fn apply(self, configured: Personality) -> Personality {
        match self {
            AiLevel::Easy => Personality::Defensive,
            AiLevel::Normal => configured,
            AiLevel::Hard => Personality::Aggressive,
        }
    }
}

struct Preset {
    width: i32,
    height: i32,
    food: usize,
    tick_ms: u64,
    max_rounds: u64,
    /// (interval frames, step ms, floor ms)
    ramp: Option<(u64, u64, u64)>,
}

impl Difficulty {
    fn preset(self) -> Option<Preset> {
        let p = match self {
            Difficulty::Easy => Preset { width: 40, height: 20, food: 8, tick_ms: 150, max_rounds: 600, ramp: None },
            Difficulty::Normal => Preset { width: 60, height: 20, food: 5, tick_ms: 120, max_rounds: 800, ramp: None },
            Difficulty::Hard => Preset { width: 80, height: 30, food: 4, tick_ms: 100, max_rounds: 1000, ramp: Some((150, 10, 40)) },
            Difficulty::Extreme => Preset { width: 100, height: 40, food: 3, tick_ms: 80, max_rounds: 1500, ramp: Some((100, 15, 20)) },
            Difficulty::Custom => return None,
        };
        Some(p)
    }
}

/// Explicit command-line values. `None` leaves the setting alone.
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub seed: Option<u64>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub food_count: Option<usize>,
    pub max_rounds: Option<u64>,
    pub tick_ms: Option<u64>,
    pub speed_ramp: bool,
}

// ── Loading & layering ──

impl GameConfig {
    /// Load config from `explicit` if given, else search for `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory,
    /// (3) ~/.local/share/snake-arena.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(p) => Some(p.to_path_buf()),
            None => candidate_dirs().into_iter()
                .map(|d| d.join("config.toml"))
                .find(|p| p.exists()),
        };
        match path {
            Some(path) => Self::from_file(&path),
            None => Ok(GameConfig::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        Self::from_toml_str(&text)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str::<TomlConfig>(text).map(GameConfig::from)
    }

    pub fn apply_difficulty(&mut self, difficulty: Difficulty) {
        let Some(p) = difficulty.preset() else { return };
        self.arena.width = p.width;
        self.arena.height = p.height;
        self.arena.food_count = p.food;
        self.arena.max_rounds = p.max_rounds;
        self.speed.tick_rate_ms = p.tick_ms;
        if let Some((interval, step, floor)) = p.ramp {
            self.speed.ramp_enabled = true;
            self.speed.ramp_interval = interval;
            self.speed.ramp_step_ms = step;
            self.speed.min_tick_rate_ms = floor;
        }
    }

    pub fn apply_overrides(&mut self, o: &Overrides) {
        if let Some(v) = o.seed { self.arena.seed = v; }
        if let Some(v) = o.width { self.arena.width = v; }
        if let Some(v) = o.height { self.arena.height = v; }
        if let Some(v) = o.food_count { self.arena.food_count = v; }
        if let Some(v) = o.max_rounds { self.arena.max_rounds = v; }
        if let Some(v) = o.tick_ms { self.speed.tick_rate_ms = v; }
        if o.speed_ramp { self.speed.ramp_enabled = true; }
    }

    /// Largest food count this grid accepts.
    pub fn max_food(&self) -> usize {
        let interior = ((self.arena.width - 2).max(0) * (self.arena.height - 2).max(0)) as usize;
        // Strictly less than half the interior.
        MAX_FOOD.min(interior.div_ceil(2).saturating_sub(1))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let a = &self.arena;
        let grid = MIN_GRID..=MAX_GRID;
        if !grid.contains(&a.width) || !grid.contains(&a.height) {
            return Err(ConfigError::GridSize { width: a.width, height: a.height });
        }
        let max = self.max_food();
        if a.food_count == 0 || a.food_count > max {
            return Err(ConfigError::FoodCount { count: a.food_count, max });
        }
        if a.max_rounds == 0 {
            return Err(ConfigError::MaxRounds);
        }
        let s = &self.speed;
        if s.tick_rate_ms == 0 {
            return Err(ConfigError::TickRate);
        }
        if s.min_tick_rate_ms == 0 || s.min_tick_rate_ms > s.tick_rate_ms {
            return Err(ConfigError::MinTickRate { min: s.min_tick_rate_ms, tick: s.tick_rate_ms });
        }
        if !(1..=MAX_SNAKES).contains(&a.snake_count) {
            return Err(ConfigError::SnakeCount(a.snake_count));
        }
        Ok(())
    }
}

/// Candidate directories to search: exe dir + CWD + XDG data dir (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    // 3. XDG data home (~/.local/share/snake-arena)
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/snake-arena");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    dirs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sized(width: i32, height: i32, food: usize) -> GameConfig {
        let mut c = GameConfig::default();
        c.arena.width = width;
        c.arena.height = height;
        c.arena.food_count = food;
        c
    }

    #[test]
    fn defaults_are_valid() {
        let c = GameConfig::default();
        assert_eq!((c.arena.width, c.arena.height), (60, 20));
        assert_eq!(c.arena.food_count, 5);
        assert_eq!(c.arena.max_rounds, 800);
        assert_eq!(c.arena.seed, 1337);
        assert_eq!(c.speed.tick_rate_ms, 120);
        assert_eq!(c.ai.engine(), AiConfig::default());
        assert_eq!(c.ai.personalities, vec!["aggressive", "defensive", "balanced"]);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn accepts_reasonable_grid() {
        let mut c = sized(20, 15, 10);
        c.arena.max_rounds = 50;
        assert!(c.validate().is_ok());
    }

    #[test]
    fn rejects_small_grids() {
        assert!(matches!(sized(5, 12, 5).validate(), Err(ConfigError::GridSize { .. })));
        assert!(matches!(sized(12, 5, 5).validate(), Err(ConfigError::GridSize { .. })));
        assert!(matches!(sized(201, 20, 5).validate(), Err(ConfigError::GridSize { .. })));
    }

    #[test]
    fn rejects_excess_food() {
        assert!(matches!(sized(12, 12, 100).validate(), Err(ConfigError::FoodCount { .. })));
        assert!(matches!(sized(12, 12, 0).validate(), Err(ConfigError::FoodCount { .. })));
        // 10x10 interior: 50 would be exactly half.
        assert!(matches!(sized(12, 12, 50).validate(), Err(ConfigError::FoodCount { .. })));
        assert!(sized(12, 12, 49).validate().is_ok());
        // Large grids still cap at MAX_FOOD.
        assert!(matches!(sized(200, 200, 51).validate(), Err(ConfigError::FoodCount { .. })));
    }

    #[test]
    fn rejects_zero_tick_and_rounds() {
        let mut c = GameConfig::default();
        c.speed.tick_rate_ms = 0;
        assert!(matches!(c.validate(), Err(ConfigError::TickRate)));

        let mut c = GameConfig::default();
        c.arena.max_rounds = 0;
        assert!(matches!(c.validate(), Err(ConfigError::MaxRounds)));

        let mut c = GameConfig::default();
        c.speed.min_tick_rate_ms = 200;
        assert!(matches!(c.validate(), Err(ConfigError::MinTickRate { .. })));
    }

    #[test]
    fn rejects_bad_snake_count() {
        let mut c = GameConfig::default();
        c.arena.snake_count = 0;
        assert!(matches!(c.validate(), Err(ConfigError::SnakeCount(0))));
        c.arena.snake_count = 5;
        assert!(matches!(c.validate(), Err(ConfigError::SnakeCount(5))));
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let c = GameConfig::from_toml_str(
            "[arena]\nwidth = 30\n\n[ai]\npersonalities = [\"defensive\"]\n",
        ).expect("parses");
        assert_eq!(c.arena.width, 30);
        assert_eq!(c.arena.height, 20);
        assert_eq!(c.ai.personalities, vec!["defensive"]);
        assert_eq!(c.ai.max_path_length, 64);
        assert_eq!(c.gamepad.pause, vec!["Start"]);
    }

    #[test]
    fn malformed_toml_is_an_error() {
        assert!(GameConfig::from_toml_str("[arena\nwidth = ").is_err());
        assert!(GameConfig::from_toml_str("[arena]\nwidth = \"wide\"").is_err());
    }

    #[test]
    fn missing_explicit_file_is_a_read_error() {
        let err = GameConfig::load(Some(Path::new("/nonexistent/snake-arena.toml")))
            .expect_err("must fail");
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn presets_then_flags() {
        let mut c = GameConfig::default();
        c.apply_difficulty(Difficulty::Hard);
        assert_eq!((c.arena.width, c.arena.height), (80, 30));
        assert_eq!(c.speed, SpeedConfig {
            tick_rate_ms: 100,
            ramp_enabled: true,
            ramp_interval: 150,
            ramp_step_ms: 10,
            min_tick_rate_ms: 40,
        });

        c.apply_overrides(&Overrides { width: Some(50), seed: Some(9), ..Overrides::default() });
        assert_eq!(c.arena.width, 50);
        assert_eq!(c.arena.height, 30);
        assert_eq!(c.arena.seed, 9);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn custom_difficulty_changes_nothing() {
        let mut c = GameConfig::default();
        c.arena.width = 33;
        c.apply_difficulty(Difficulty::Custom);
        assert_eq!(c.arena.width, 33);
        assert!(!c.speed.ramp_enabled);
    }

    #[test]
    fn every_preset_validates() {
        for d in [Difficulty::Easy, Difficulty::Normal, Difficulty::Hard, Difficulty::Extreme] {
            let mut c = GameConfig::default();
            c.apply_difficulty(d);
            assert!(c.validate().is_ok(), "{d:?}");
        }
    }

    #[test]
    fn ai_level_overrides_personality() {
        assert_eq!(AiLevel::Easy.apply(Personality::Aggressive), Personality::Defensive);
        assert_eq!(AiLevel::Normal.apply(Personality::Aggressive), Personality::Aggressive);
        assert_eq!(AiLevel::Hard.apply(Personality::Balanced), Personality::Aggressive);
    }
}
