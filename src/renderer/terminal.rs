//! Terminal renderer
//!
//! Scales the playfield onto the character grid, draws into a cell buffer,
//! then flushes it row by row with a color change only where the color
//! actually changes.

use std::io::{self, Write};

use crossterm::{
    QueueableCommand, cursor,
    style::{self, Color, Print},
};
use glam::Vec2;

use super::Presenter;
use crate::consts::{PLAYFIELD_HEIGHT, PLAYFIELD_WIDTH};
use crate::sim::{
    BlockGrade, ColorTag, EntityKind, FallingEntity, GamePhase, PowerUpKind, Snapshot, level_color,
    level_name,
};

/// Rows reserved above the playfield
const HUD_ROWS: u16 = 2;
const HEALTH_BAR_WIDTH: usize = 20;
const C_HUD: Color = Color::White;
const C_CATCHER: Color = Color::Blue;
const C_SHIELDED: Color = Color::Magenta;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Cell {
    ch: char,
    color: Color,
}

const BLANK: Cell = Cell {
    ch: ' ',
    color: Color::Reset,
};

pub struct TerminalRenderer<W: Write> {
    out: W,
    cols: u16,
    rows: u16,
    cells: Vec<Cell>,
    fps: Option<u32>,
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W, cols: u16, rows: u16) -> Self {
        Self {
            out,
            cols,
            rows,
            cells: vec![BLANK; cols as usize * rows as usize],
            fps: None,
        }
    }

    pub fn resize(&mut self, cols: u16, rows: u16) {
        self.cols = cols;
        self.rows = rows;
        self.cells = vec![BLANK; cols as usize * rows as usize];
    }

    /// Show a frame rate in the HUD (None hides it)
    pub fn set_fps(&mut self, fps: Option<u32>) {
        self.fps = fps;
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn field_rows(&self) -> u16 {
        self.rows.saturating_sub(HUD_ROWS)
    }

    /// Playfield point to (col, row)
    fn to_cell(&self, p: Vec2) -> (i32, i32) {
        let col = (p.x / PLAYFIELD_WIDTH * self.cols as f32).floor() as i32;
        let row = (p.y / PLAYFIELD_HEIGHT * self.field_rows() as f32).floor() as i32;
        (col, row + HUD_ROWS as i32)
    }

    fn set(&mut self, col: i32, row: i32, ch: char, color: Color) {
        if col >= 0 && row >= 0 && (col as u16) < self.cols && (row as u16) < self.rows {
            self.cells[row as usize * self.cols as usize + col as usize] = Cell { ch, color };
        }
    }

    fn put_str(&mut self, col: i32, row: i32, text: &str, color: Color) {
        for (i, ch) in text.chars().enumerate() {
            self.set(col + i as i32, row, ch, color);
        }
    }

    fn put_centered(&mut self, row: i32, text: &str, color: Color) {
        let col = (self.cols as i32 - text.chars().count() as i32) / 2;
        self.put_str(col.max(0), row, text, color);
    }

    /// Fill the cells covered by a playfield rectangle (at least one)
    fn fill(&mut self, min: Vec2, max: Vec2, ch: char, color: Color) {
        let (c0, r0) = self.to_cell(min);
        let (c1, r1) = self.to_cell(max - Vec2::splat(0.01));
        for row in r0..=r1.max(r0) {
            for col in c0..=c1.max(c0) {
                if row >= HUD_ROWS as i32 {
                    self.set(col, row, ch, color);
                }
            }
        }
    }

    fn draw(&mut self, frame: &Snapshot<'_>) {
        self.cells.fill(BLANK);

        for particle in frame.particles {
            let (col, row) = self.to_cell(particle.pos);
            if row >= HUD_ROWS as i32 {
                self.set(col, row, '·', color(particle.color));
            }
        }

        for entity in frame.blocks.iter().chain(frame.power_ups) {
            self.draw_entity(entity);
        }

        let catcher = frame.catcher.bounds();
        let catcher_color = if frame.effects.is_active(PowerUpKind::Shield) {
            C_SHIELDED
        } else {
            C_CATCHER
        };
        self.fill(catcher.min, catcher.max(), '▀', catcher_color);

        self.draw_hud(frame);

        match frame.session.phase {
            GamePhase::Running => {}
            GamePhase::Paused => {
                let mid = self.rows as i32 / 2;
                self.put_centered(mid - 1, "GAME PAUSED", Color::Yellow);
                self.put_centered(mid + 1, "P to continue, Q to quit", C_HUD);
            }
            GamePhase::Over => self.draw_game_over(frame),
        }
    }

    fn draw_entity(&mut self, entity: &FallingEntity) {
        let ch = match entity.kind {
            EntityKind::Block(BlockGrade::Good) => 'o',
            EntityKind::Block(BlockGrade::Bad) => 'x',
            EntityKind::Block(BlockGrade::Special) => '^',
            EntityKind::Block(BlockGrade::Bonus) => '$',
            EntityKind::Block(BlockGrade::Bomb) => '@',
            EntityKind::PowerUp(PowerUpKind::SlowMotion) => 'S',
            EntityKind::PowerUp(PowerUpKind::DoublePoints) => '2',
            EntityKind::PowerUp(PowerUpKind::Magnet) => 'M',
            EntityKind::PowerUp(PowerUpKind::Shield) => 'O',
        };
        let bounds = entity.bounds();
        self.fill(bounds.min, bounds.max(), ch, color(entity.kind.color()));
    }

    fn draw_hud(&mut self, frame: &Snapshot<'_>) {
        let session = frame.session;
        let mut line = format!(
            "Score: {}  High: {}  Level {} - {}",
            session.score,
            session.high_score,
            session.level,
            level_name(session.level)
        );
        if let Some(fps) = self.fps {
            line.push_str(&format!("  {fps} fps"));
        }
        self.put_str(0, 0, &line, color(level_color(session.level)));

        let filled = (session.health.max(0) as usize * HEALTH_BAR_WIDTH).div_ceil(100);
        let bar = format!(
            "[{}{}] {:>3}%",
            "#".repeat(filled),
            " ".repeat(HEALTH_BAR_WIDTH - filled.min(HEALTH_BAR_WIDTH)),
            session.health
        );
        self.put_str(0, 1, &bar, Color::Green);

        let mut col = bar.chars().count() as i32 + 2;
        for (kind, ticks) in frame.effects.active() {
            let label = format!("{}: {}s", kind.name(), ticks / 60);
            self.put_str(col, 1, &label, color(kind.color()));
            col += label.chars().count() as i32 + 2;
        }
    }

    fn draw_game_over(&mut self, frame: &Snapshot<'_>) {
        let session = frame.session;
        let mid = self.rows as i32 / 2;
        self.put_centered(mid - 3, "GAME OVER", Color::Red);
        self.put_centered(mid - 1, &format!("Final Score: {}", session.score), C_HUD);
        self.put_centered(mid, &format!("High Score: {}", session.high_score), Color::Yellow);
        self.put_centered(
            mid + 1,
            &format!(
                "Reached Level: {} - {}",
                session.level,
                level_name(session.level)
            ),
            color(level_color(session.level)),
        );
        self.put_centered(mid + 3, "Press R to restart or Q to quit", C_HUD);

        let runs = frame.high_scores.runs();
        if runs.is_empty() {
            return;
        }
        let top = mid + 5;
        self.put_centered(top, "Best runs", C_HUD);
        let mut marked = false;
        for (i, run) in runs.iter().enumerate() {
            let row = top + 1 + i as i32;
            if row >= self.rows as i32 {
                break;
            }
            // First entry matching this session is the one it just earned
            let current = !marked
                && run.score == session.score
                && run.level == session.level
                && run.ticks == session.ticks;
            marked |= current;
            let line = format!(
                "{:>2}. {:>7}  L{}  {:>4}s",
                i + 1,
                run.score,
                run.level,
                run.ticks / 60
            );
            let color = if current { Color::Yellow } else { C_HUD };
            self.put_centered(row, &line, color);
        }
    }

    fn flush_cells(&mut self) -> io::Result<()> {
        let mut prev: Option<Color> = None;
        for row in 0..self.rows {
            self.out.queue(cursor::MoveTo(0, row))?;
            let start = row as usize * self.cols as usize;
            for i in start..start + self.cols as usize {
                let cell = self.cells[i];
                if prev != Some(cell.color) {
                    self.out.queue(style::SetForegroundColor(cell.color))?;
                    prev = Some(cell.color);
                }
                self.out.queue(Print(cell.ch))?;
            }
        }
        self.out.queue(style::ResetColor)?;
        self.out.flush()
    }
}

impl<W: Write> Presenter for TerminalRenderer<W> {
    fn present(&mut self, frame: &Snapshot<'_>) -> io::Result<()> {
        self.draw(frame);
        self.flush_cells()
    }
}

fn color(tag: ColorTag) -> Color {
    match tag {
        ColorTag::White => Color::White,
        // Black on a dark terminal is invisible
        ColorTag::Black => Color::DarkGrey,
        ColorTag::Red => Color::Red,
        ColorTag::Green => Color::Green,
        ColorTag::Blue => Color::Blue,
        ColorTag::Yellow => Color::Yellow,
        ColorTag::Orange => Color::DarkYellow,
        ColorTag::Purple => Color::Magenta,
        ColorTag::Cyan => Color::Cyan,
        ColorTag::Pink => Color::Rgb {
            r: 255,
            g: 192,
            b: 203,
        },
    }
}
