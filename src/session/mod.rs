//! Session layer: history between turns, persistence, starter prompts.

pub mod chat;
pub mod store;

pub use chat::ChatSession;
pub use store::{FileSessionStore, InMemorySessionStore, SessionStore};

/// A suggested first message shown to new users.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Starter {
    pub label: &'static str,
    pub message: &'static str,
}

pub const STARTERS: [Starter; 2] = [
    Starter {
        label: "Get PSIRTs released in January 2025",
        message: "Get me all the psirts released in the January 2025",
    },
    Starter {
        label: "Get bugs related to Catalyst 9800",
        message: "Cisco Catalyst 9800 bugs",
    },
];
