//! Core types for bugwatch.

pub mod history;
pub mod message;
pub mod stream;

pub use history::*;
pub use message::*;
pub use stream::*;
