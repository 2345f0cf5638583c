use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use taskboard_core::PublicUser;

/// Signed-in user and bearer token, kept between runs.
///
/// Expiry is left to the server: a stale token surfaces as a 401 on the next
/// request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub current_user: PublicUser,
    pub token: String,
}

#[derive(Debug, Clone)]
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn default_path() -> Result<PathBuf> {
        let state_dir = dirs::state_dir()
            .or_else(dirs::config_dir)
            .or_else(|| dirs::home_dir().map(|h| h.join(".local/state")))
            .context("Could not find state directory")?;

        Ok(state_dir.join("taskboard").join("session.json"))
    }

    /// A missing or unreadable file means "signed out".
    pub fn load(&self) -> Option<Session> {
        let contents = fs::read_to_string(&self.path).ok()?;
        serde_json::from_str(&contents).ok()
    }

    pub fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let contents = serde_json::to_string_pretty(session)?;
        fs::write(&self.path, contents)
            .with_context(|| format!("writing {}", self.path.display()))?;
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("removing {}", self.path.display())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn session() -> Session {
        Session {
            current_user: PublicUser {
                id: "3f2c9a4e-0000-4000-8000-000000000001".into(),
                username: "ada".into(),
                email: "ada@example.com".into(),
                created_at: Utc::now(),
            },
            token: "header.payload.signature".into(),
        }
    }

    #[test]
    fn saved_session_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");
        let file = SessionFile::new(&path);

        let saved = session();
        file.save(&saved).unwrap();
        assert_eq!(file.load(), Some(saved));

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"currentUser\""));
        assert!(raw.contains("\"token\""));
    }

    #[test]
    fn missing_or_corrupt_file_is_signed_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let file = SessionFile::new(&path);
        assert_eq!(file.load(), None);

        fs::write(&path, "{not json").unwrap();
        assert_eq!(file.load(), None);
    }

    #[test]
    fn clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let file = SessionFile::new(dir.path().join("session.json"));
        file.save(&session()).unwrap();

        file.clear().unwrap();
        file.clear().unwrap();
        assert_eq!(file.load(), None);
    }
}
