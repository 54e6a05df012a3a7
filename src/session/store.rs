//! Persistence of conversation history between turns.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::BugwatchError;
use crate::types::ConversationHistory;

const SESSION_FILE_VERSION: u32 = 1;
const MAX_SESSION_ID_LEN: usize = 64;

/// Storage abstraction for conversation histories, keyed by session id.
pub trait SessionStore: Send + Sync {
    fn load(&self, session_id: &str) -> Result<Option<ConversationHistory>, BugwatchError>;
    fn save(&self, session_id: &str, history: &ConversationHistory) -> Result<(), BugwatchError>;
    fn clear(&self, session_id: &str) -> Result<(), BugwatchError>;
}

/// Process-local store.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, ConversationHistory>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> BugwatchError {
    BugwatchError::SessionStore("session map lock poisoned".into())
}

impl SessionStore for InMemorySessionStore {
    fn load(&self, session_id: &str) -> Result<Option<ConversationHistory>, BugwatchError> {
        let sessions = self.sessions.read().map_err(|_| poisoned())?;
        Ok(sessions.get(session_id).cloned())
    }

    fn save(&self, session_id: &str, history: &ConversationHistory) -> Result<(), BugwatchError> {
        let mut sessions = self.sessions.write().map_err(|_| poisoned())?;
        sessions.insert(session_id.to_string(), history.clone());
        Ok(())
    }

    fn clear(&self, session_id: &str) -> Result<(), BugwatchError> {
        let mut sessions = self.sessions.write().map_err(|_| poisoned())?;
        sessions.remove(session_id);
        Ok(())
    }
}

/// File-backed store: one JSON document per session.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    base_dir: PathBuf,
}

impl FileSessionStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn new_default() -> Self {
        Self::new(default_session_dir())
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn session_path(&self, session_id: &str) -> Result<PathBuf, BugwatchError> {
        let label = checked_label(session_id)?;
        Ok(self.base_dir.join(format!("{label}.json")))
    }

    fn ensure_parent(path: &Path) -> Result<(), BugwatchError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self, session_id: &str) -> Result<Option<ConversationHistory>, BugwatchError> {
        let path = self.session_path(session_id)?;
        let raw = match fs::read_to_string(&path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let file: SessionFile = serde_json::from_str(&raw)?;
        if file.version != SESSION_FILE_VERSION {
            return Err(BugwatchError::SessionStore(format!(
                "unsupported session file version {} in {}",
                file.version,
                path.display()
            )));
        }
        file.history.validate().map_err(|reason| {
            BugwatchError::SessionStore(format!(
                "session file {} is inconsistent: {reason}",
                path.display()
            ))
        })?;
        Ok(Some(file.history))
    }

    fn save(&self, session_id: &str, history: &ConversationHistory) -> Result<(), BugwatchError> {
        let path = self.session_path(session_id)?;
        Self::ensure_parent(&path)?;
        let file = SessionFile {
            version: SESSION_FILE_VERSION,
            session_id: session_id.to_string(),
            saved_at: Utc::now(),
            history: history.clone(),
        };
        fs::write(&path, serde_json::to_string_pretty(&file)?)?;
        Ok(())
    }

    fn clear(&self, session_id: &str) -> Result<(), BugwatchError> {
        let path = self.session_path(session_id)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SessionFile {
    version: u32,
    session_id: String,
    saved_at: DateTime<Utc>,
    history: ConversationHistory,
}

fn default_session_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "bugwatch")
        .map(|dirs| dirs.data_dir().join("sessions"))
        .unwrap_or_else(|| PathBuf::from(".bugwatch/sessions"))
}

/// Session ids double as file names, so only a lowercase, path-free
/// alphabet is accepted. Distinct ids never share a file.
fn checked_label(session_id: &str) -> Result<&str, BugwatchError> {
    let valid = !session_id.is_empty()
        && session_id.len() <= MAX_SESSION_ID_LEN
        && session_id
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-' || b == b'_');
    if valid {
        Ok(session_id)
    } else {
        Err(BugwatchError::SessionStore(format!(
            "invalid session id '{session_id}': use 1-{MAX_SESSION_ID_LEN} lowercase letters, digits, '-' or '_'"
        )))
    }
}
