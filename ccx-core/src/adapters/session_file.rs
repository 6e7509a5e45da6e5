//! Session storage adapters
//!
//! `FileSessionStore` keeps the session in `session.json` inside the client
//! directory. Writes go through a temp file and a rename while holding an
//! exclusive lock on `session.lock`, so concurrent invocations never see a
//! half-written file.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use fs2::FileExt;
use tempfile::NamedTempFile;

use crate::domain::result::{Error, Result};
use crate::domain::Session;
use crate::ports::SessionStore;

const SESSION_FILE: &str = "session.json";
const LOCK_FILE: &str = "session.lock";

/// Session persisted as JSON on disk
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(SESSION_FILE)
    }

    /// Take the exclusive lock; released when the returned file is dropped
    fn lock(&self) -> Result<File> {
        fs::create_dir_all(&self.dir)?;
        let lock_file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.dir.join(LOCK_FILE))?;
        lock_file
            .lock_exclusive()
            .map_err(|e| Error::session(format!("Failed to lock session file: {}", e)))?;
        Ok(lock_file)
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<Session>> {
        let path = self.path();
        let content = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let session = serde_json::from_str(&content).map_err(|e| {
            Error::session(format!(
                "Stored session at {} is unreadable ({}). Run 'ccx logout' to reset it.",
                path.display(),
                e
            ))
        })?;
        Ok(Some(session))
    }

    fn save(&self, session: &Session) -> Result<()> {
        let _lock = self.lock()?;

        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(serde_json::to_string_pretty(session)?.as_bytes())?;
        tmp.flush()?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(tmp.path(), fs::Permissions::from_mode(0o600))?;
        }

        tmp.persist(self.path())
            .map_err(|e| Error::session(format!("Failed to write session: {}", e.error)))?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let _lock = self.lock()?;
        match fs::remove_file(self.path()) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-process session store
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    session: Mutex<Option<Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: Session) -> Self {
        Self {
            session: Mutex::new(Some(session)),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<Session>> {
        let guard = self
            .session
            .lock()
            .map_err(|e| Error::session(format!("Lock poisoned: {}", e)))?;
        Ok(guard.clone())
    }

    fn save(&self, session: &Session) -> Result<()> {
        let mut guard = self
            .session
            .lock()
            .map_err(|e| Error::session(format!("Lock poisoned: {}", e)))?;
        *guard = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut guard = self
            .session
            .lock()
            .map_err(|e| Error::session(format!("Lock poisoned: {}", e)))?;
        *guard = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Role;
    use chrono::Utc;
    use tempfile::tempdir;

    fn session() -> Session {
        Session {
            access_token: "tok".to_string(),
            refresh_token: Some("ref".to_string()),
            user_id: Some(3),
            email: "sara@bank.ma".to_string(),
            full_name: Some("Sara".to_string()),
            role: Role::User,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_file_store_round_trip_and_clear() {
        let dir = tempdir().unwrap();
        let store = FileSessionStore::new(dir.path());

        assert!(store.load().unwrap().is_none());

        let s = session();
        store.save(&s).unwrap();
        assert_eq!(store.load().unwrap(), Some(s));

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
        assert!(!store.path().exists());

        // Clearing twice is fine
        store.clear().unwrap();
    }

    #[test]
    fn test_file_store_creates_missing_dir() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let store = FileSessionStore::new(&nested);
        store.save(&session()).unwrap();
        assert!(nested.join(SESSION_FILE).exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_file_store_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let store = FileSessionStore::new(dir.path());
        store.save(&session()).unwrap();
        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_corrupt_file_is_session_error() {
        let dir = tempdir().unwrap();
        let store = FileSessionStore::new(dir.path());
        fs::write(store.path(), "{not json").unwrap();
        assert!(matches!(store.load().unwrap_err(), Error::Session(_)));
        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_memory_store() {
        let store = MemorySessionStore::new();
        assert!(store.load().unwrap().is_none());
        store.save(&session()).unwrap();
        assert!(store.load().unwrap().is_some());
        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }
}
