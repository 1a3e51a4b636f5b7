/// Entry point, command line and game loop.

mod config;
mod domain;
mod error;
mod sim;
mod ui;

use std::cell::RefCell;
use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::{AiLevel, Difficulty, GameConfig, Overrides};
use domain::geometry::Direction;
use domain::snake::{Decisions, SnakeId};
use error::ArenaError;
use sim::runner::{Match, SpeedRamp};
use sim::spawn::build_profiles;
use ui::gamepad::GamepadState;
use ui::input::InputState;
use ui::renderer::{EventLog, Renderer, View, LOG_LINES};
use ui::sound::{cues_for, SoundEngine};

const FRAME_SLEEP: Duration = Duration::from_millis(5);

/// The snake steered from the keyboard or gamepad in interactive mode.
const PLAYER: SnakeId = 0;

#[derive(Parser, Debug)]
#[command(name = "snake-arena", about = "Autonomous snakes competing for food and survival", version)]
struct Args {
    /// Config file; skips the usual search for config.toml.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    #[arg(long)]
    seed: Option<u64>,

    /// Grid width including the wall border.
    #[arg(long)]
    width: Option<i32>,

    /// Grid height including the wall border.
    #[arg(long)]
    height: Option<i32>,

    #[arg(long)]
    food_count: Option<usize>,

    #[arg(long)]
    max_rounds: Option<u64>,

    /// Frame interval in milliseconds.
    #[arg(long, value_name = "MS")]
    tick_ms: Option<u64>,

    #[arg(long, value_enum, default_value_t = Difficulty::Custom)]
    difficulty: Difficulty,

    #[arg(long, value_enum, default_value_t = AiLevel::Normal)]
    ai_level: AiLevel,

    /// Shorten the frame interval as the match goes on.
    #[arg(long)]
    speed_ramp: bool,

    /// Steer snake 0 with the keyboard or a gamepad.
    #[arg(long, conflicts_with = "headless")]
    interactive: bool,

    /// No terminal UI: run the match to completion and print a summary.
    #[arg(long)]
    headless: bool,

    /// Log filter used when RUST_LOG is unset.
    #[arg(long, default_value = "info")]
    log_level: String,

    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            seed: self.seed,
            width: self.width,
            height: self.height,
            food_count: self.food_count,
            max_rounds: self.max_rounds,
            tick_ms: self.tick_ms,
            speed_ramp: self.speed_ramp,
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("snake-arena: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), ArenaError> {
    init_logging(args)?;

    let mut config = GameConfig::load(args.config.as_deref())?;
    config.apply_difficulty(args.difficulty);
    config.apply_overrides(&args.overrides());
    config.validate()?;

    let profiles = build_profiles(config.arena.snake_count, &config.ai.personalities, args.ai_level);
    let mut game = Match::new(&config, profiles);

    if args.headless {
        while !game.is_over() {
            game.step(&Decisions::new());
        }
        print_summary(&game);
        return Ok(());
    }

    let mut renderer = Renderer::new();
    renderer.init()?;

    let sound = SoundEngine::new();
    let result = game_loop(&mut game, &mut renderer, sound.as_ref(), &config, args.interactive);

    // Restore the terminal even when the loop failed.
    let cleanup = renderer.cleanup();
    result?;
    cleanup?;

    print_summary(&game);
    Ok(())
}

/// `RUST_LOG` wins over `--log-level`. Terminal mode without a log file
/// installs nothing, since stdout belongs to the renderer.
fn init_logging(args: &Args) -> Result<(), ArenaError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    if let Some(path) = &args.log_file {
        let file = File::create(path).map_err(|source| ArenaError::LogFile {
            path: path.display().to_string(),
            source,
        })?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    } else if args.headless {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
    Ok(())
}

fn game_loop(
    game: &mut Match,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
    interactive: bool,
) -> Result<(), ArenaError> {
    let mut kb = InputState::new();
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);
    if gp.connected {
        info!("gamepad connected");
    }

    let mut ramp = SpeedRamp::new(&config.speed);
    let log = Rc::new(RefCell::new(EventLog::new(LOG_LINES)));
    let sink = Rc::clone(&log);
    game.add_listener(move |tick| sink.borrow_mut().record(tick.state.frame, &tick.events));
    let mut last_tick = Instant::now();
    let mut paused = false;

    // Held until the next tick so a quick tap between frames isn't lost.
    let mut pending_steer: Option<Direction> = None;

    loop {
        kb.drain_events();
        gp.update();

        if kb.quit_requested() || gp.quit_pressed() {
            break;
        }
        if kb.pause_toggled() {
            paused = !paused;
        }
        if gp.pause_pressed() {
            paused = !paused;
        }

        if paused && kb.rewind_requested() {
            game.rewind(1);
        }

        if interactive {
            if let Some(dir) = kb.steer().or_else(|| gp.steer()) {
                pending_steer = Some(dir);
            }
        }

        if !paused && !game.is_over() && last_tick.elapsed() >= ramp.interval() {
            let overrides = if interactive {
                player_decision(game, pending_steer.take())
            } else {
                Decisions::new()
            };
            let events = game.step(&overrides);
            let sped_up = ramp.on_frame(game.state().frame).is_some();

            if let Some(sfx) = sound {
                for cue in cues_for(&events, sped_up, game.is_over()) {
                    sfx.play_cue(cue);
                }
            }
            last_tick = Instant::now();
        }

        let log = log.borrow();
        let view = View {
            state: game.state(),
            profiles: game.profiles(),
            log: &log,
            interval: ramp.interval(),
            max_rounds: game.max_rounds(),
            paused,
            finished: game.is_over().then(|| game.winner().map(|s| s.id)),
            interactive,
        };
        renderer.render(&view)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

/// The player's snake keeps its heading unless a new one was pressed.
fn player_decision(game: &Match, steer: Option<Direction>) -> Decisions {
    let mut decisions = Decisions::new();
    if let Some(snake) = game.state().find_snake(PLAYER).filter(|s| s.alive) {
        decisions.insert(PLAYER, steer.unwrap_or(snake.direction));
    }
    decisions
}

fn print_summary(game: &Match) {
    let state = game.state();
    println!();
    match game.winner() {
        Some(w) => {
            let personality = game.profile(w.id).map_or("?", |p| p.personality.name());
            println!("Winner: snake {} ({personality}) after {} frames", w.id, state.frame);
        }
        None if state.alive_count() == 0 => println!("No survivors after {} frames", state.frame),
        None => println!("Frame limit reached with {} snakes alive", state.alive_count()),
    }
    for (rank, s) in game.standings().iter().enumerate() {
        let personality = game.profile(s.id).map_or("?", |p| p.personality.name());
        println!(
            "  {}. snake {} {:<10} {}  score {:>4}  length {:>3}  kills {}",
            rank + 1,
            s.id,
            personality,
            if s.alive { "alive" } else { "dead " },
            s.score,
            s.len(),
            s.kills,
        );
    }
}
