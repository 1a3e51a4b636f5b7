/// Keyboard input.
///
/// Drains every pending crossterm event once per frame and turns key
/// presses into `Command`s. Steering is edge-triggered: the last
/// direction pressed since the previous drain wins, and the caller keeps
/// it pending until the next simulation tick.
///
/// Bindings:
///   W A S D / arrows  →  steer snake 0 (interactive mode only)
///   P / F1            →  pause
///   B / Backspace     →  step back one frame (while paused)
///   Q / Esc / Ctrl-C  →  quit

use std::time::Duration;

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::domain::geometry::Direction;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Command {
    Steer(Direction),
    TogglePause,
    Rewind,
    Quit,
}

/// Map one key event to a command. Releases never map.
pub fn command_for(key: &KeyEvent) -> Option<Command> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') | KeyCode::Char('C') => Some(Command::Quit),
            _ => None,
        };
    }
    let cmd = match key.code {
        KeyCode::Up | KeyCode::Char('w') | KeyCode::Char('W') => Command::Steer(Direction::Up),
        KeyCode::Down | KeyCode::Char('s') | KeyCode::Char('S') => Command::Steer(Direction::Down),
        KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('A') => Command::Steer(Direction::Left),
        KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('D') => Command::Steer(Direction::Right),
        KeyCode::Char('p') | KeyCode::Char('P') | KeyCode::F(1) => Command::TogglePause,
        KeyCode::Char('b') | KeyCode::Char('B') | KeyCode::Backspace => Command::Rewind,
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Command::Quit,
        _ => return None,
    };
    Some(cmd)
}

pub struct InputState {
    /// Commands from the most recent `drain_events()`, in arrival order.
    commands: Vec<Command>,
}

impl InputState {
    pub fn new() -> Self {
        InputState { commands: Vec::with_capacity(8) }
    }

    /// Drain all pending terminal events without blocking.
    /// Call once per frame.
    pub fn drain_events(&mut self) {
        self.commands.clear();
        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.push_key(&key);
            }
        }
    }

    fn push_key(&mut self, key: &KeyEvent) {
        if let Some(cmd) = command_for(key) {
            self.commands.push(cmd);
        }
    }

    /// Latest steering press this frame.
    pub fn steer(&self) -> Option<Direction> {
        self.commands.iter().rev().find_map(|c| match c {
            Command::Steer(d) => Some(*d),
            _ => None,
        })
    }

    /// Odd number of pause presses this frame flips the pause state.
    pub fn pause_toggled(&self) -> bool {
        self.commands.iter().filter(|c| **c == Command::TogglePause).count() % 2 == 1
    }

    pub fn rewind_requested(&self) -> bool {
        self.commands.contains(&Command::Rewind)
    }

    pub fn quit_requested(&self) -> bool {
        self.commands.contains(&Command::Quit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn wasd_and_arrows_steer() {
        assert_eq!(command_for(&press(KeyCode::Char('w'))), Some(Command::Steer(Direction::Up)));
        assert_eq!(command_for(&press(KeyCode::Char('A'))), Some(Command::Steer(Direction::Left)));
        assert_eq!(command_for(&press(KeyCode::Down)), Some(Command::Steer(Direction::Down)));
        assert_eq!(command_for(&press(KeyCode::Right)), Some(Command::Steer(Direction::Right)));
    }

    #[test]
    fn meta_keys() {
        assert_eq!(command_for(&press(KeyCode::Char('p'))), Some(Command::TogglePause));
        assert_eq!(command_for(&press(KeyCode::F(1))), Some(Command::TogglePause));
        assert_eq!(command_for(&press(KeyCode::Esc)), Some(Command::Quit));
        assert_eq!(command_for(&press(KeyCode::Char('b'))), Some(Command::Rewind));
        assert_eq!(command_for(&press(KeyCode::Backspace)), Some(Command::Rewind));
        assert_eq!(command_for(&press(KeyCode::Char('q'))), Some(Command::Quit));
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(command_for(&ctrl_c), Some(Command::Quit));
        assert_eq!(command_for(&press(KeyCode::Char('c'))), None);
    }

    #[test]
    fn releases_are_ignored() {
        let release = KeyEvent {
            code: KeyCode::Char('w'),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        };
        assert_eq!(command_for(&release), None);
    }

    #[test]
    fn last_steer_wins_and_pause_pairs_cancel() {
        let mut input = InputState::new();
        input.push_key(&press(KeyCode::Char('w')));
        input.push_key(&press(KeyCode::Char('p')));
        input.push_key(&press(KeyCode::Left));
        assert_eq!(input.steer(), Some(Direction::Left));
        assert!(input.pause_toggled());
        assert!(!input.quit_requested());

        input.push_key(&press(KeyCode::F(1)));
        assert!(!input.pause_toggled());
    }
}
