//! Presentation sinks
//!
//! A presenter receives one immutable [`Snapshot`] per frame. It can fail,
//! but the caller only logs the failure; the simulation never sees it.

pub mod terminal;

use std::io;

use crate::sim::Snapshot;

pub use terminal::TerminalRenderer;

pub trait Presenter {
    fn present(&mut self, frame: &Snapshot<'_>) -> io::Result<()>;
}

/// Discards every frame (headless runs)
#[derive(Debug, Default)]
pub struct NullPresenter {
    pub frames: u64,
}

impl Presenter for NullPresenter {
    fn present(&mut self, _frame: &Snapshot<'_>) -> io::Result<()> {
        self.frames += 1;
        Ok(())
    }
}
