//! Platform abstraction layer
//!
//! Handles the parts of the game that touch the outside world:
//! - Input events (terminal keys to per-tick input)
//! - Time (fixed-timestep accumulator)

pub mod input;
pub mod time;

pub use input::{InputMapper, Key};
pub use time::FixedTimestep;
