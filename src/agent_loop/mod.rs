//! Agent loop primitives (accumulator, turns, events).

pub mod accumulator;
pub mod events;
pub mod runner;
pub mod types;

pub use accumulator::*;
pub use events::*;
pub use runner::*;
pub use types::*;
