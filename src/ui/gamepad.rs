/// Gamepad input tracker using gilrs.
///
/// Button mapping is loaded from config.toml via `load_button_config()`.
/// Default mapping:
///   D-pad / Left Stick    →  Steer snake 0
///   Start                 →  Pause
///   Select                →  Quit
///
/// Without the `gamepad` feature this compiles to an always-disconnected
/// stub with the same API.

#[cfg(feature = "gamepad")]
use gilrs::{Axis, Button, EventType, Gilrs};

use crate::config::GamepadConfig;
use crate::domain::geometry::Direction;

#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
const STICK_DEADZONE: f32 = 0.25;

/// Logical button identifiers (one per physical button).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Btn {
    A,       // South
    B,       // East
    X,       // West
    Y,       // North
    L1,
    R1,
    Start,
    Select,
}

const BTN_COUNT: usize = 8;

impl Btn {
    fn from_name(s: &str) -> Option<Btn> {
        match s.to_uppercase().as_str() {
            "A" | "SOUTH"  => Some(Btn::A),
            "B" | "EAST"   => Some(Btn::B),
            "X" | "WEST"   => Some(Btn::X),
            "Y" | "NORTH"  => Some(Btn::Y),
            "L1" | "LB" | "LEFTTRIGGER"  => Some(Btn::L1),
            "R1" | "RB" | "RIGHTTRIGGER" => Some(Btn::R1),
            "START" => Some(Btn::Start),
            "SELECT" | "BACK" => Some(Btn::Select),
            _ => None,
        }
    }

    #[cfg(feature = "gamepad")]
    fn from_gilrs(btn: Button) -> Option<Btn> {
        match btn {
            Button::South        => Some(Btn::A),
            Button::East         => Some(Btn::B),
            Button::West         => Some(Btn::X),
            Button::North        => Some(Btn::Y),
            Button::LeftTrigger  => Some(Btn::L1),
            Button::RightTrigger => Some(Btn::R1),
            Button::Start        => Some(Btn::Start),
            Button::Select       => Some(Btn::Select),
            _ => None,
        }
    }
}

/// Action-to-button mapping (loaded from config).
#[derive(Debug, PartialEq)]
struct ActionMap {
    pause: Vec<Btn>,
    quit: Vec<Btn>,
}

impl Default for ActionMap {
    fn default() -> Self {
        ActionMap {
            pause: vec![Btn::Start],
            quit: vec![Btn::Select],
        }
    }
}

pub struct GamepadState {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,

    /// Edge flags, cleared every `update()`.
    pressed: [bool; BTN_COUNT],

    /// Latest D-pad press since the last `update()`.
    dpad_pressed: Option<Direction>,
    /// Stick direction past the deadzone, and the one from last frame.
    stick: Option<Direction>,
    stick_prev: Option<Direction>,
    #[cfg(feature = "gamepad")]
    stick_x: f32,
    #[cfg(feature = "gamepad")]
    stick_y: f32,

    action_map: ActionMap,

    pub connected: bool,
}

impl GamepadState {
    pub fn new() -> Self {
        #[cfg(feature = "gamepad")]
        let (gilrs_opt, connected) = match Gilrs::new() {
            Ok(g) => {
                let has_pad = g.gamepads().next().is_some();
                (Some(g), has_pad)
            }
            Err(e) => {
                tracing::warn!("gamepad support unavailable: {e}");
                (None, false)
            }
        };
        #[cfg(not(feature = "gamepad"))]
        let connected = false;

        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs: gilrs_opt,
            pressed: [false; BTN_COUNT],
            dpad_pressed: None,
            stick: None,
            stick_prev: None,
            #[cfg(feature = "gamepad")]
            stick_x: 0.0,
            #[cfg(feature = "gamepad")]
            stick_y: 0.0,
            action_map: ActionMap::default(),
            connected,
        }
    }

    /// Load button mapping from config. Lists with no recognised names
    /// keep the default.
    pub fn load_button_config(&mut self, cfg: &GamepadConfig) {
        fn parse_list(names: &[String]) -> Vec<Btn> {
            names.iter().filter_map(|s| Btn::from_name(s)).collect()
        }
        let pause = parse_list(&cfg.pause);
        if !pause.is_empty() { self.action_map.pause = pause; }
        let quit = parse_list(&cfg.quit);
        if !quit.is_empty() { self.action_map.quit = quit; }
    }

    pub fn update(&mut self) {
        self.pressed = [false; BTN_COUNT];
        self.dpad_pressed = None;
        self.stick_prev = self.stick;

        #[cfg(feature = "gamepad")]
        self.poll_gilrs();
    }

    #[cfg(feature = "gamepad")]
    fn poll_gilrs(&mut self) {
        let gilrs = match &mut self.gilrs {
            Some(g) => g,
            None => return,
        };

        let events: Vec<_> = std::iter::from_fn(|| gilrs.next_event()).collect();

        for event in events {
            match event.event {
                EventType::ButtonPressed(btn, _) => {
                    self.connected = true;
                    self.press(btn);
                }
                EventType::AxisChanged(axis, value, _) => {
                    self.connected = true;
                    match axis {
                        Axis::LeftStickX => self.stick_x = value,
                        Axis::LeftStickY => self.stick_y = value,
                        _ => {}
                    }
                }
                EventType::Connected => { self.connected = true; }
                EventType::Disconnected => {
                    self.connected = false;
                    self.stick_x = 0.0;
                    self.stick_y = 0.0;
                }
                _ => {}
            }
        }

        self.stick = stick_direction(self.stick_x, self.stick_y);
    }

    #[cfg(feature = "gamepad")]
    fn press(&mut self, gilrs_btn: Button) {
        let dir = match gilrs_btn {
            Button::DPadUp    => Some(Direction::Up),
            Button::DPadDown  => Some(Direction::Down),
            Button::DPadLeft  => Some(Direction::Left),
            Button::DPadRight => Some(Direction::Right),
            _ => None,
        };
        if let Some(d) = dir {
            self.dpad_pressed = Some(d);
            return;
        }
        if let Some(btn) = Btn::from_gilrs(gilrs_btn) {
            self.pressed[btn as usize] = true;
        }
    }

    // ── Action queries (config-driven) ──

    fn any_pressed(&self, btns: &[Btn]) -> bool {
        btns.iter().any(|&b| self.pressed[b as usize])
    }

    pub fn pause_pressed(&self) -> bool {
        self.any_pressed(&self.action_map.pause)
    }

    pub fn quit_pressed(&self) -> bool {
        self.any_pressed(&self.action_map.quit)
    }

    /// D-pad press this frame, else a stick that just crossed the deadzone.
    pub fn steer(&self) -> Option<Direction> {
        self.dpad_pressed.or_else(|| {
            if self.stick != self.stick_prev { self.stick } else { None }
        })
    }
}

/// Dominant stick axis past the deadzone. gilrs reports +Y as up.
#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
fn stick_direction(x: f32, y: f32) -> Option<Direction> {
    if x.abs() < STICK_DEADZONE && y.abs() < STICK_DEADZONE {
        return None;
    }
    if x.abs() >= y.abs() {
        Some(if x < 0.0 { Direction::Left } else { Direction::Right })
    } else {
        Some(if y > 0.0 { Direction::Up } else { Direction::Down })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn button_names() {
        assert_eq!(Btn::from_name("start"), Some(Btn::Start));
        assert_eq!(Btn::from_name("Back"), Some(Btn::Select));
        assert_eq!(Btn::from_name("south"), Some(Btn::A));
        assert_eq!(Btn::from_name("turbo"), None);
    }

    #[test]
    fn config_overrides_mapping_unless_empty() {
        let mut pad = GamepadState::new();
        pad.load_button_config(&GamepadConfig {
            pause: vec!["A".into(), "bogus".into()],
            quit: vec!["nothing".into()],
        });
        assert_eq!(pad.action_map.pause, vec![Btn::A]);
        assert_eq!(pad.action_map.quit, vec![Btn::Select]);
    }

    #[test]
    fn pressed_flags_drive_actions() {
        let mut pad = GamepadState::new();
        pad.pressed[Btn::Start as usize] = true;
        assert!(pad.pause_pressed());
        assert!(!pad.quit_pressed());
    }

    #[test]
    fn stick_uses_dominant_axis() {
        assert_eq!(stick_direction(0.1, 0.1), None);
        assert_eq!(stick_direction(-0.9, 0.3), Some(Direction::Left));
        assert_eq!(stick_direction(0.2, 0.8), Some(Direction::Up));
        assert_eq!(stick_direction(0.2, -0.8), Some(Direction::Down));
    }

    #[test]
    fn stick_steers_only_on_change() {
        let mut pad = GamepadState::new();
        pad.stick = Some(Direction::Right);
        pad.stick_prev = None;
        assert_eq!(pad.steer(), Some(Direction::Right));
        pad.stick_prev = Some(Direction::Right);
        assert_eq!(pad.steer(), None);
        pad.dpad_pressed = Some(Direction::Up);
        assert_eq!(pad.steer(), Some(Direction::Up));
    }
}
