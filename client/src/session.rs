//! Logged-in session, held in memory and optionally persisted to disk.

use crate::Result;
use directories::ProjectDirs;
use raspadinha_types::{Amount, UserProfile};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::watch;
use tracing::{info, warn};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub user: UserProfile,
    pub token: String,
}

struct Inner {
    current: RwLock<Option<Session>>,
    path: Option<PathBuf>,
    changes: watch::Sender<Option<Session>>,
}

/// Shared handle to the current session.
///
/// Clones observe the same session. When created with a path, every change is
/// written to that file so the session survives restarts.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Inner>,
}

impl SessionStore {
    pub fn in_memory() -> Self {
        Self::build(None, None)
    }

    /// Store backed by `path`, loading whatever session it already holds.
    ///
    /// A missing or unreadable file starts logged out.
    pub fn persistent(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let restored = restore(&path);
        if restored.is_some() {
            info!(path = %path.display(), "restored session");
        }
        Self::build(Some(path), restored)
    }

    /// Default session file under the platform config directory.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("br", "raspadinha", "raspadinha")
            .map(|dirs| dirs.config_dir().join("session.json"))
    }

    fn build(path: Option<PathBuf>, initial: Option<Session>) -> Self {
        let (changes, _) = watch::channel(initial.clone());
        Self {
            inner: Arc::new(Inner {
                current: RwLock::new(initial),
                path,
                changes,
            }),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.inner.path.as_deref()
    }

    pub fn current(&self) -> Option<Session> {
        self.read().clone()
    }

    pub fn token(&self) -> Option<String> {
        self.read().as_ref().map(|session| session.token.clone())
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.read().as_ref().map(|session| session.user.clone())
    }

    pub fn balance(&self) -> Option<Amount> {
        self.read().as_ref().map(|session| session.user.balance)
    }

    /// Subscribe to session changes (login, logout, profile refresh).
    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.inner.changes.subscribe()
    }

    pub fn set(&self, session: Session) -> Result<()> {
        self.persist(Some(&session))?;
        *self.write() = Some(session.clone());
        self.inner.changes.send_replace(Some(session));
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        self.persist(None)?;
        let previous = self.write().take();
        if previous.is_some() {
            self.inner.changes.send_replace(None);
        }
        Ok(())
    }

    /// Replace the cached profile, keeping the token.
    ///
    /// Returns false when logged out or when the profile is unchanged.
    pub fn update_user(&self, user: UserProfile) -> Result<bool> {
        let updated = {
            let mut guard = self.write();
            match guard.as_mut() {
                Some(session) if session.user != user => {
                    session.user = user;
                    Some(session.clone())
                }
                _ => None,
            }
        };
        let Some(session) = updated else {
            return Ok(false);
        };
        self.persist(Some(&session))?;
        self.inner.changes.send_replace(Some(session));
        Ok(true)
    }

    /// Replace the cached balance. Returns false when logged out or unchanged.
    pub fn set_balance(&self, balance: Amount) -> Result<bool> {
        let Some(mut user) = self.user() else {
            return Ok(false);
        };
        user.balance = balance;
        self.update_user(user)
    }

    fn persist(&self, session: Option<&Session>) -> Result<()> {
        let Some(path) = &self.inner.path else {
            return Ok(());
        };
        match session {
            Some(session) => {
                if let Some(dir) = path.parent() {
                    std::fs::create_dir_all(dir)?;
                }
                let data = serde_json::to_vec_pretty(session)?;
                std::fs::write(path, data)?;
            }
            None => match std::fs::remove_file(path) {
                Ok(()) => {}
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => return Err(err.into()),
            },
        }
        Ok(())
    }

    fn read(&self) -> RwLockReadGuard<'_, Option<Session>> {
        self.inner
            .current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Option<Session>> {
        self.inner
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::in_memory()
    }
}

fn restore(path: &Path) -> Option<Session> {
    let data = match std::fs::read(path) {
        Ok(data) => data,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return None,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "failed to read session file");
            return None;
        }
    };
    match serde_json::from_slice(&data) {
        Ok(session) => Some(session),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "ignoring corrupt session file");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_user;

    fn session(token: &str) -> Session {
        Session {
            user: sample_user(),
            token: token.to_string(),
        }
    }

    #[test]
    fn test_persistent_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        let store = SessionStore::persistent(&path);
        assert!(store.current().is_none());
        store.set(session("abc")).unwrap();
        assert!(path.exists());

        let reopened = SessionStore::persistent(&path);
        assert_eq!(reopened.token().as_deref(), Some("abc"));

        reopened.clear().unwrap();
        assert!(!path.exists());
        assert!(SessionStore::persistent(&path).current().is_none());
    }

    #[test]
    fn test_corrupt_file_starts_logged_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, b"{not json").unwrap();
        let store = SessionStore::persistent(&path);
        assert!(store.current().is_none());
    }

    #[test]
    fn test_set_balance_reports_changes() {
        let store = SessionStore::in_memory();
        assert!(!store.set_balance(Amount::from_reais(1)).unwrap());

        store.set(session("t")).unwrap();
        let cached = store.balance().unwrap();
        assert!(!store.set_balance(cached).unwrap());
        assert!(store.set_balance(cached + Amount::from_reais(5)).unwrap());
        assert_eq!(store.balance(), Some(cached + Amount::from_reais(5)));
    }

    #[test]
    fn test_clones_share_state_and_notify() {
        let store = SessionStore::in_memory();
        let other = store.clone();
        let mut changes = store.subscribe();

        other.set(session("shared")).unwrap();
        assert_eq!(store.token().as_deref(), Some("shared"));
        assert!(changes.has_changed().unwrap());
        changes.borrow_and_update();

        store.clear().unwrap();
        assert!(changes.has_changed().unwrap());
        assert!(changes.borrow_and_update().is_none());
        assert!(other.current().is_none());
    }
}
