/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// Each frame is composed into `front`, compared cell by cell with
/// `back` (the previous frame), and only changed cells are emitted.
/// Commands are batched with `queue!` and flushed once, then the
/// buffers swap.
///
/// ## Pixel → terminal mapping
///
/// The level lives in pixel space (cols × cell_size wide). One grid cell
/// is drawn as 2 terminal columns × 1 row, so x is sampled every half
/// cell and y every full cell. Moving tiles and the actor snap to the
/// nearest terminal cell.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::tile::{FallStage, Tile, TileKind};
use crate::sim::save::Stats;
use crate::sim::world::{Phase, WorldState};

use super::particles::ParticleSystem;

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Every "empty" cell gets this explicit background so inter-row gaps
    /// match the cells on VTE terminals.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Never equal to a real cell; forces a full repaint.
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

// ── Layout ──

/// Terminal columns per grid cell.
const CELL_W: usize = 2;
const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;
const MAP_COL: usize = 1;

const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };
const MSG_BG: Color = Color::Rgb { r: 200, g: 180, b: 50 };
const MAP_BG: Color = Color::Rgb { r: 12, g: 12, b: 20 };
const GOLD: Color = Color::Rgb { r: 255, g: 200, b: 50 };
const GREEN: Color = Color::Rgb { r: 80, g: 255, b: 80 };

/// `rgb` blended toward the map background by `alpha` (1.0 = opaque).
fn fade((r, g, b): (u8, u8, u8), alpha: f32) -> Color {
    let a = alpha.clamp(0.0, 1.0);
    let mix = |c: u8, base: u8| (base as f32 + (c as f32 - base as f32) * a).round() as u8;
    Color::Rgb { r: mix(r, 12), g: mix(g, 12), b: mix(b, 20) }
}

/// Glyph pair and base colour for a visible tile.
fn tile_glyph(tile: &Tile) -> (char, char, (u8, u8, u8)) {
    match tile.kind {
        // Fake walls must be indistinguishable from walls.
        TileKind::Wall | TileKind::Fake | TileKind::Invisible => ('█', '█', (120, 120, 130)),
        TileKind::Goal => ('▐', '▌', (80, 255, 80)),
        TileKind::Spike | TileKind::MovingSpike { .. } => ('▲', '▲', (230, 60, 60)),
        TileKind::MovingPlatform { .. } => ('▬', '▬', (100, 200, 255)),
        TileKind::Disappearing { solid: true, .. } => ('▓', '▓', (180, 100, 220)),
        TileKind::Disappearing { solid: false, .. } => ('░', '░', (180, 100, 220)),
        TileKind::Falling { stage: FallStage::Armed, .. } => ('▀', '▀', (255, 150, 40)),
        TileKind::Falling { .. } => ('▀', '▀', (170, 110, 60)),
    }
}

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_phase: Option<Phase>,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_phase: None,
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
        self.resize(tw as usize, th as usize);
        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    fn resize(&mut self, w: usize, h: usize) {
        self.term_w = w;
        self.term_h = h;
        self.front.resize(w, h);
        self.back.resize(w, h);
        self.back.cells.fill(Cell::INVALID);
    }

    pub fn render(&mut self, world: &WorldState, particles: &ParticleSystem, stats: &Stats) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        let phase_changed = self.last_phase != Some(world.phase);
        if tw as usize != self.term_w || th as usize != self.term_h || phase_changed {
            self.resize(tw as usize, th as usize);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_phase = Some(world.phase);
        }

        self.front.clear();
        match world.phase {
            Phase::Title => self.compose_title(world, stats),
            Phase::LevelSelect => self.compose_level_select(world),
            Phase::Playing => self.compose_game(world, particles, stats),
            Phase::Won => {
                self.compose_game(world, particles, stats);
                self.compose_won(world);
            }
            Phase::GameComplete => self.compose_complete(world, stats),
        }
        if world.paused && world.phase == Phase::Playing {
            self.compose_pause_overlay(world);
        }

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        // Explicit base colours; ResetColor would fall back to the
        // terminal default and leave seams.
        queue!(self.writer, SetForegroundColor(last_fg), SetBackgroundColor(last_bg))?;

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

    // ── Playing ──

    /// Terminal position for a pixel coordinate, or None if outside the map.
    fn to_screen(w: &WorldState, px: f32, py: f32) -> Option<(usize, usize)> {
        let half = w.grid.cell_size / CELL_W as f32;
        let col = (px / half).round();
        let row = (py / w.grid.cell_size).round();
        if col < 0.0 || row < 0.0 { return None; }
        let (col, row) = (col as usize, row as usize);
        if col >= w.grid.cols * CELL_W || row >= w.grid.rows { return None; }
        Some((MAP_COL + col, MAP_ROW + row))
    }

    /// Terminal cells covered by the actor, at least one each way.
    fn actor_span(w: &WorldState) -> (usize, usize) {
        let half = w.grid.cell_size / CELL_W as f32;
        let cols = (w.actor.width() / half).round().max(1.0) as usize;
        let rows = (w.actor.height() / w.grid.cell_size).round().max(1.0) as usize;
        (cols, rows)
    }

    fn compose_game(&mut self, w: &WorldState, particles: &ParticleSystem, stats: &Stats) {
        let map_w = w.grid.cols * CELL_W;

        // HUD
        self.front.fill_row(HUD_ROW, HUD_BG);
        let secs = stats.time_played_ms / 1000;
        let hud = format!(
            " Lv {}/{}  {:<16} Deaths {:<4} Total {:<6} Time {:02}:{:02}",
            w.current_level + 1, w.total_levels(), w.level.name,
            w.level_deaths, stats.total_deaths, secs / 60, secs % 60,
        );
        self.front.put_str(0, HUD_ROW, &hud, Color::White, HUD_BG);

        // Map background
        for row in 0..w.grid.rows {
            for col in 0..map_w {
                self.front.set(MAP_COL + col, MAP_ROW + row, Cell::new(' ', Color::White, MAP_BG));
            }
        }

        for tile in w.level.tiles.iter().filter(|t| t.is_visible()) {
            let Some((col, row)) = Self::to_screen(w, tile.x, tile.y) else { continue };
            let (c0, c1, rgb) = tile_glyph(tile);
            let fg = fade(rgb, tile.opacity());
            self.front.set(col, row, Cell::new(c0, fg, MAP_BG));
            if col + 1 < MAP_COL + map_w {
                self.front.set(col + 1, row, Cell::new(c1, fg, MAP_BG));
            }
        }

        for p in particles.iter() {
            let Some((col, row)) = Self::to_screen(w, p.x, p.y) else { continue };
            let ch = if p.size >= 4.5 { '*' } else { '·' };
            let fg = match p.color {
                Color::Rgb { r, g, b } => fade((r, g, b), p.life),
                other => other,
            };
            self.front.set(col, row, Cell::new(ch, fg, MAP_BG));
        }

        if !w.actor.is_dead() {
            if let Some((col, row)) = Self::to_screen(w, w.actor.x, w.actor.y) {
                let fg = Color::Rgb { r: 255, g: 230, b: 90 };
                let (span_w, span_h) = Self::actor_span(w);
                for r in row..(row + span_h).min(MAP_ROW + w.grid.rows) {
                    for c in col..(col + span_w).min(MAP_COL + map_w) {
                        self.front.set(c, r, Cell::new('█', fg, MAP_BG));
                    }
                }
            }
        }

        let msg_row = MAP_ROW + w.grid.rows + 1;
        if !w.message.is_empty() {
            self.front.fill_row(msg_row, MSG_BG);
            self.front.put_str(0, msg_row, &format!(" ◈ {} ", w.message), Color::Black, MSG_BG);
        }

        let help = " ←→/AD:Move  ↑/W/Space:Jump  R:Restart  P:Pause  Esc:Title";
        self.front.put_str(0, msg_row + 1, help, Color::DarkGrey, Color::Reset);
    }

    fn compose_won(&mut self, w: &WorldState) {
        let map_w = w.grid.cols * CELL_W;
        let lines = [
            "╔══════════════════════════════╗",
            "║       ★ LEVEL CLEARED ★      ║",
            "║  ENTER: Next     ESC: Title  ║",
            "╚══════════════════════════════╝",
        ];
        let cx = MAP_COL + map_w.saturating_sub(lines[0].chars().count()) / 2;
        let cy = MAP_ROW + w.grid.rows / 2 - 2;
        let bg = Color::Rgb { r: 20, g: 60, b: 20 };
        for (i, line) in lines.iter().enumerate() {
            let fg = if i == 2 { GREEN } else { GOLD };
            self.front.put_str(cx, cy + i, line, fg, bg);
        }
    }

    fn compose_pause_overlay(&mut self, w: &WorldState) {
        let map_w = w.grid.cols * CELL_W;
        let dim = Color::Rgb { r: 40, g: 40, b: 40 };
        let lines = [
            "╔══════════════════════╗",
            "║        PAUSED        ║",
            "║                      ║",
            "║  P / F1   Resume     ║",
            "║  R        Restart    ║",
            "║  L        Levels     ║",
            "║  ESC      Title      ║",
            "╚══════════════════════╝",
        ];
        let cx = MAP_COL + map_w.saturating_sub(lines[0].chars().count()) / 2;
        let cy = MAP_ROW + w.grid.rows.saturating_sub(lines.len()) / 2;
        for (i, line) in lines.iter().enumerate() {
            let fg = if i == 1 { GOLD } else { Color::Rgb { r: 100, g: 200, b: 255 } };
            self.front.put_str(cx, cy + i, line, fg, dim);
        }
    }

    // ── Menus ──

    fn compose_title(&mut self, w: &WorldState, stats: &Stats) {
        let title = [
            r" _____                    _             ",
            r"|_   _| __ __ _ _ __  ___| |_ ___ _ __  ",
            r"  | || '__/ _` | '_ \/ __| __/ _ \ '_ \ ",
            r"  | || | | (_| | |_) \__ \ ||  __/ |_) |",
            r"  |_||_|  \__,_| .__/|___/\__\___| .__/ ",
            r"               |_|               |_|    ",
        ];
        for (i, line) in title.iter().enumerate() {
            self.front.put_str(4, 2 + i, line, GOLD, Color::Reset);
        }
        self.front.put_str(8, 9, "━━━ Nothing here is what it seems ━━━", Color::Rgb { r: 180, g: 140, b: 50 }, Color::Reset);

        let menu = 12;
        self.front.put_str(8, menu, "ENTER   Play", GREEN, Color::Reset);
        self.front.put_str(8, menu + 1, "  L     Level Select", Color::White, Color::Reset);
        self.front.put_str(8, menu + 2, "  Q     Quit", Color::White, Color::Reset);

        let secs = stats.time_played_ms / 1000;
        let info = format!(
            "Levels {}/{}   Deaths {}   Time {}:{:02}:{:02}",
            w.unlocked.min(w.total_levels()), w.total_levels(),
            stats.total_deaths, secs / 3600, (secs / 60) % 60, secs % 60,
        );
        self.front.put_str(8, menu + 4, &info, Color::DarkGrey, Color::Reset);

        if !w.message.is_empty() {
            let row = self.front.height.saturating_sub(1);
            self.front.fill_row(row, MSG_BG);
            self.front.put_str(0, row, &format!(" ◈ {} ", w.message), Color::Black, MSG_BG);
        }
    }

    fn compose_level_select(&mut self, w: &WorldState) {
        self.front.put_str(2, 1, "╔══════════════════════════════════╗", GOLD, Color::Reset);
        self.front.put_str(2, 2, "║          LEVEL  SELECT           ║", GOLD, Color::Reset);
        self.front.put_str(2, 3, "╚══════════════════════════════════╝", GOLD, Color::Reset);

        let list_top = 5;
        let cursor_bg = Color::Rgb { r: 30, g: 60, b: 30 };
        for (idx, def) in w.levels.iter().enumerate() {
            let row = list_top + idx;
            if row + 3 >= self.front.height { break; }
            let unlocked = w.is_unlocked(idx);
            let label = if unlocked {
                format!("{:>3}. {}", idx + 1, def.name)
            } else {
                format!("{:>3}. ── locked ──", idx + 1)
            };
            if idx == w.select_cursor {
                for x in 2..40.min(self.front.width) {
                    self.front.set(x, row, Cell::new(' ', Color::White, cursor_bg));
                }
                let fg = if unlocked { GREEN } else { Color::DarkGrey };
                self.front.put_str(2, row, "▸", GREEN, cursor_bg);
                self.front.put_str(3, row, &label, fg, cursor_bg);
            } else {
                let fg = if unlocked { Color::White } else { Color::DarkGrey };
                self.front.put_str(3, row, &label, fg, Color::Reset);
            }
        }

        let footer = list_top + w.levels.len() + 1;
        self.front.put_str(2, footer, "ENTER: Start   ↑↓: Select   ESC: Back", Color::DarkGrey, Color::Reset);
    }

    fn compose_complete(&mut self, w: &WorldState, stats: &Stats) {
        let box_art = [
            "╔══════════════════════════════════╗",
            "║   ★ ALL LEVELS COMPLETE! ★       ║",
            "╚══════════════════════════════════╝",
        ];
        for (i, line) in box_art.iter().enumerate() {
            self.front.put_str(4, 4 + i, line, GOLD, Color::Reset);
        }
        let levels = format!("◈ {} levels cleared", w.total_levels());
        let deaths = format!("◈ Total deaths: {}", stats.total_deaths);
        self.front.put_str(6, 9, &levels, GREEN, Color::Reset);
        self.front.put_str(6, 10, &deaths, Color::White, Color::Reset);
        self.front.put_str(6, 12, "▸ ENTER / ESC: Back to Title", GREEN, Color::Reset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::domain::entity::Actor;
    use crate::sim::level::embedded_levels;

    fn world() -> WorldState {
        WorldState::new(&GameConfig::default(), embedded_levels()).unwrap()
    }

    #[test]
    fn pixels_map_to_two_columns_per_cell() {
        let w = world();
        assert_eq!(Renderer::to_screen(&w, 0.0, 0.0), Some((MAP_COL, MAP_ROW)));
        assert_eq!(Renderer::to_screen(&w, 40.0, 40.0), Some((MAP_COL + 2, MAP_ROW + 1)));
        assert_eq!(Renderer::to_screen(&w, 760.0, 560.0), Some((MAP_COL + 38, MAP_ROW + 14)));
        assert_eq!(Renderer::to_screen(&w, -30.0, 0.0), None);
        assert_eq!(Renderer::to_screen(&w, 0.0, 620.0), None);
    }

    #[test]
    fn actor_span_follows_actor_size() {
        let mut w = world();
        assert_eq!(Renderer::actor_span(&w), (2, 1));

        w.actor = Actor::new(80.0, 80.0).unwrap();
        assert_eq!(Renderer::actor_span(&w), (4, 2));

        w.actor = Actor::new(4.0, 4.0).unwrap();
        assert_eq!(Renderer::actor_span(&w), (1, 1));
    }

    #[test]
    fn fake_wall_draws_like_a_wall() {
        let wall = Tile::new(0, 0, 40.0, TileKind::Wall);
        let fake = Tile::new(0, 0, 40.0, TileKind::Fake);
        assert_eq!(tile_glyph(&wall), tile_glyph(&fake));
    }

    #[test]
    fn fade_blends_toward_background() {
        assert_eq!(fade((200, 100, 50), 1.0), Color::Rgb { r: 200, g: 100, b: 50 });
        assert_eq!(fade((200, 100, 50), 0.0), Color::Rgb { r: 12, g: 12, b: 20 });
    }
}
