//! Terminal keys to per-tick input
//!
//! Many terminals never report key releases, so a direction counts as held
//! while its last press or repeat is recent. Terminals that do report
//! releases drop the key immediately.

use std::collections::HashMap;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::sim::TickInput;

/// A key is considered "held" if its last press/repeat event arrived within
/// this many frames (≈133 ms at 60 FPS, refreshed by OS key repeat).
pub const HOLD_WINDOW: u64 = 8;

/// Game actions a key can map to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Left,
    Right,
    Pause,
    Quit,
    Restart,
    /// Toggle demo autopilot
    Demo,
    /// Leave immediately (Esc / Ctrl-C)
    Exit,
}

impl Key {
    pub fn from_event(event: &KeyEvent) -> Option<Key> {
        match event.code {
            KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('A') => Some(Key::Left),
            KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('D') => Some(Key::Right),
            KeyCode::Char('c') if event.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(Key::Exit)
            }
            KeyCode::Esc => Some(Key::Exit),
            KeyCode::Char('p') | KeyCode::Char('P') => Some(Key::Pause),
            KeyCode::Char('q') | KeyCode::Char('Q') => Some(Key::Quit),
            KeyCode::Char('r') | KeyCode::Char('R') => Some(Key::Restart),
            KeyCode::Char('i') | KeyCode::Char('I') => Some(Key::Demo),
            _ => None,
        }
    }
}

/// Accumulates key events between frames
#[derive(Debug, Default)]
pub struct InputMapper {
    /// Frame each held key was last seen
    held: HashMap<Key, u64>,
    pause: bool,
    quit: bool,
    restart: bool,
    exit: bool,
    idle_mode: bool,
}

impl InputMapper {
    pub fn new(idle_mode: bool) -> Self {
        Self {
            idle_mode,
            ..Default::default()
        }
    }

    /// Feed one terminal key event
    pub fn handle(&mut self, event: &KeyEvent, frame: u64) {
        let Some(key) = Key::from_event(event) else {
            return;
        };
        match event.kind {
            KeyEventKind::Press => self.press(key, frame),
            KeyEventKind::Repeat => {
                if matches!(key, Key::Left | Key::Right) {
                    self.held.insert(key, frame);
                }
            }
            KeyEventKind::Release => self.release(key),
        }
    }

    pub fn press(&mut self, key: Key, frame: u64) {
        match key {
            Key::Left | Key::Right => {
                self.held.insert(key, frame);
            }
            Key::Pause => self.pause = true,
            Key::Quit => self.quit = true,
            Key::Restart => self.restart = true,
            Key::Exit => self.exit = true,
            Key::Demo => {
                self.idle_mode = !self.idle_mode;
                log::info!("Idle mode: {}", self.idle_mode);
            }
        }
    }

    pub fn release(&mut self, key: Key) {
        self.held.remove(&key);
    }

    fn is_held(&self, key: Key, frame: u64) -> bool {
        self.held
            .get(&key)
            .map(|&last| frame.saturating_sub(last) <= HOLD_WINDOW)
            .unwrap_or(false)
    }

    /// Input for the next tick of `frame`
    pub fn tick_input(&self, frame: u64) -> TickInput {
        TickInput {
            left: self.is_held(Key::Left, frame),
            right: self.is_held(Key::Right, frame),
            pause: self.pause,
            quit: self.quit,
            restart: self.restart,
            idle_mode: self.idle_mode,
        }
    }

    /// Clear one-shot inputs after the first tick has seen them
    pub fn consume_one_shots(&mut self) {
        self.pause = false;
        self.quit = false;
        self.restart = false;
    }

    /// Esc / Ctrl-C was pressed
    pub fn exit_requested(&self) -> bool {
        self.exit
    }
}
