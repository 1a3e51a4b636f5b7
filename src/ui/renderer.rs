/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// The renderer only reads the snapshot; it never feeds anything back
/// into the simulation.

use std::collections::VecDeque;
use std::io::{self, BufWriter, Write};
use std::time::Duration;

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::geometry::Position;
use crate::domain::snake::SnakeId;
use crate::sim::event::GameEvent;
use crate::sim::spawn::SnakeProfile;
use crate::sim::world::WorldState;

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for all "empty" terminal cells, so the
    /// gaps between rows match the cells on VTE terminals.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Sentinel used to invalidate the back buffer.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        let bg = match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        };
        Cell { ch, fg, bg }
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width { break; }
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }

    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::new(' ', Color::White, bg));
        }
    }
}

// ── Event log ──

/// Rolling list of recent event lines shown under the arena.
pub struct EventLog {
    lines: VecDeque<String>,
    cap: usize,
}

impl EventLog {
    pub fn new(cap: usize) -> Self {
        EventLog { lines: VecDeque::with_capacity(cap), cap }
    }

    pub fn record(&mut self, frame: u64, events: &[GameEvent]) {
        for e in events {
            if self.cap == 0 { return; }
            while self.lines.len() >= self.cap {
                self.lines.pop_front();
            }
            self.lines.push_back(format!("[{frame:>4}] {e}"));
        }
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }
}

// ── Renderer ──

const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;
pub const LOG_LINES: usize = 4;

const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };
const WALL: Color = Color::Rgb { r: 90, g: 110, b: 160 };
const FOOD: Color = Color::Rgb { r: 255, g: 210, b: 60 };
const DEAD: Color = Color::DarkGrey;

/// Everything one frame shows.
pub struct View<'a> {
    pub state: &'a WorldState,
    pub profiles: &'a [SnakeProfile],
    pub log: &'a EventLog,
    pub interval: Duration,
    pub max_rounds: u64,
    pub paused: bool,
    /// `Some(winner)` once the match is over.
    pub finished: Option<Option<SnakeId>>,
    pub interactive: bool,
}

pub fn snake_color(id: SnakeId) -> Color {
    match id % 4 {
        0 => Color::Rgb { r: 235, g: 80, b: 80 },
        1 => Color::Rgb { r: 90, g: 220, b: 110 },
        2 => Color::Rgb { r: 90, g: 150, b: 255 },
        _ => Color::Rgb { r: 220, g: 110, b: 230 },
    }
}

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        // Force full repaint on first frame.
        self.back.cells.fill(Cell::INVALID);

        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, view: &View<'_>) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        self.compose(view);
        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        // Explicit base colors; ResetColor would fall back to the
        // terminal's own default and leave line artifacts.
        queue!(self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) { continue; }

                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
                cursor_at = Some((x + 1, y));
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose(&mut self, view: &View<'_>) {
        self.front.clear();
        let state = view.state;

        self.compose_hud(view);
        self.compose_arena(view);

        let mut row = MAP_ROW + state.height.max(0) as usize + 1;
        self.compose_status(view, row);
        row += view.profiles.len() + 1;

        for line in view.log.lines() {
            self.front.put_str(1, row, line, Color::Grey, Color::Reset);
            row += 1;
        }
        row = row.max(MAP_ROW + state.height.max(0) as usize + view.profiles.len() + LOG_LINES + 2);

        let help = if view.interactive {
            " WASD/Arrows: steer ■   P/F1: pause   Q/Esc: quit   │  Pad: D-pad, Start, Select"
        } else {
            " P/F1: pause   Q/Esc: quit   │  Pad: Start, Select"
        };
        self.front.put_str(0, row, help, Color::DarkGrey, Color::Reset);

        if let Some(winner) = view.finished {
            self.compose_banner(view, winner);
        } else if view.paused {
            self.compose_pause_overlay(view);
        }
    }

    fn compose_hud(&mut self, view: &View<'_>) {
        let s = view.state;
        let hud = format!(
            " Frame {:>5}/{:<5}  Alive {}/{}  Food {}  Tick {} ms ",
            s.frame,
            view.max_rounds,
            s.alive_count(),
            s.snakes.len(),
            s.food.len(),
            view.interval.as_millis(),
        );
        self.front.fill_row(HUD_ROW, HUD_BG);
        self.front.put_str(0, HUD_ROW, &hud, Color::White, HUD_BG);
    }

    fn compose_arena(&mut self, view: &View<'_>) {
        let s = view.state;
        let (w, h) = (s.width.max(0) as usize, s.height.max(0) as usize);

        for y in 0..h {
            for x in 0..w {
                let ch = match (x, y) {
                    (0, 0) => '╔',
                    (x, 0) if x == w - 1 => '╗',
                    (0, y) if y == h - 1 => '╚',
                    (x, y) if x == w - 1 && y == h - 1 => '╝',
                    (_, 0) => '═',
                    (_, y) if y == h - 1 => '═',
                    (0, _) => '║',
                    (x, _) if x == w - 1 => '║',
                    _ => continue,
                };
                self.front.set(x, MAP_ROW + y, Cell::new(ch, WALL, Color::Reset));
            }
        }

        for f in &s.food {
            self.put_at(*f, Cell::new('●', FOOD, Color::Reset));
        }

        // Dead first so survivors draw on top of corpses.
        let order = s.snakes.iter().filter(|sn| !sn.alive).chain(s.alive_snakes());
        for snake in order {
            let glyph = self.glyph(view, snake.id);
            let color = if snake.alive { snake_color(snake.id) } else { DEAD };
            for (i, &seg) in snake.body.iter().enumerate().rev() {
                let ch = match (i, snake.alive) {
                    (0, true) => glyph,
                    (0, false) => '✖',
                    _ => '■',
                };
                self.put_at(seg, Cell::new(ch, color, Color::Reset));
            }
        }
    }

    fn compose_status(&mut self, view: &View<'_>, row: usize) {
        for (i, profile) in view.profiles.iter().enumerate() {
            let Some(snake) = view.state.find_snake(profile.id) else { continue };
            let (status, color) = if snake.alive {
                ("ALIVE", snake_color(snake.id))
            } else {
                ("DEAD ", DEAD)
            };
            let line = format!(
                " {} {:<10} {}  Score {:>4}  Length {:>3}  Kills {}",
                profile.glyph,
                profile.personality.name(),
                status,
                snake.score,
                snake.len(),
                snake.kills,
            );
            self.front.put_str(0, row + i, &line, color, Color::Reset);
        }
    }

    fn compose_banner(&mut self, view: &View<'_>, winner: Option<SnakeId>) {
        let text = match winner.and_then(|id| view.profiles.iter().find(|p| p.id == id)) {
            Some(p) => format!("  WINNER: {} snake {} ({})  ", p.glyph, p.id, p.personality),
            None if view.state.alive_count() > 1 => "  TIME UP: no single survivor  ".to_string(),
            None => "  NO SURVIVORS  ".to_string(),
        };
        let color = winner.map_or(Color::White, snake_color);
        self.compose_box(view, &[&text, "", "  press Q to exit  "], color);
    }

    fn compose_pause_overlay(&mut self, view: &View<'_>) {
        self.compose_box(view, &["      PAUSED      ", "", "  P / F1  resume  ", "  B / Bksp back   ", "  Q / Esc quit    "],
            Color::Rgb { r: 255, g: 220, b: 50 });
    }

    /// Boxed lines centred over the arena.
    fn compose_box(&mut self, view: &View<'_>, lines: &[&str], fg: Color) {
        let dim = Color::Rgb { r: 40, g: 40, b: 40 };
        let inner = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        let box_w = inner + 2;
        let box_h = lines.len() + 2;
        let arena_w = view.state.width.max(0) as usize;
        let arena_h = view.state.height.max(0) as usize;
        let x0 = arena_w.saturating_sub(box_w) / 2;
        let y0 = MAP_ROW + arena_h.saturating_sub(box_h) / 2;

        let bar = "─".repeat(inner);
        self.front.put_str(x0, y0, &format!("┌{bar}┐"), fg, dim);
        for (i, line) in lines.iter().enumerate() {
            self.front.put_str(x0, y0 + 1 + i, &format!("│{line:<inner$}│"), fg, dim);
        }
        self.front.put_str(x0, y0 + box_h - 1, &format!("└{bar}┘"), fg, dim);
    }

    fn put_at(&mut self, pos: Position, cell: Cell) {
        if pos.x < 0 || pos.y < 0 { return; }
        self.front.set(pos.x as usize, MAP_ROW + pos.y as usize, cell);
    }

    fn glyph(&self, view: &View<'_>, id: SnakeId) -> char {
        view.profiles.iter().find(|p| p.id == id).map_or('@', |p| p.glyph)
    }
}
