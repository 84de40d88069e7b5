use std::fs;
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};

use jurisflow_client_core::session::{SessionStore, StoredSession};

pub const ENV_HOME: &str = "JURISFLOW_HOME";
pub const SESSION_FILE_NAME: &str = "session.json";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("session directory {path} could not be created: {source}")]
    CreateDir { path: PathBuf, source: io::Error },
    #[error("session file {path} could not be read: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("session file {path} could not be written: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("session file {path} could not be removed: {source}")]
    Remove { path: PathBuf, source: io::Error },
    #[error("session encode failed: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Session persisted as one JSON document on disk.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// `$JURISFLOW_HOME/session.json`, else `<config dir>/jurisflow/session.json`.
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(default_session_path())
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    type Error = StoreError;

    fn load_session(&self) -> Result<Option<StoredSession>, Self::Error> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        match serde_json::from_str::<StoredSession>(&raw) {
            Ok(session) => Ok(Some(session)),
            Err(error) => {
                tracing::warn!(
                    path = %self.path.display(),
                    %error,
                    "ignoring unreadable session file"
                );
                Ok(None)
            }
        }
    }

    fn persist_session(&self, session: &StoredSession) -> Result<(), Self::Error> {
        let parent = self.path.parent().filter(|parent| !parent.as_os_str().is_empty());
        if let Some(parent) = parent {
            fs::create_dir_all(parent).map_err(|source| StoreError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let encoded = serde_json::to_string_pretty(session)?;
        write_private(&self.path, encoded.as_bytes()).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })
    }

    fn clear_session(&self) -> Result<(), Self::Error> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Remove {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

/// The file holds a bearer token, so it is readable by the owner only.
#[cfg(unix)]
fn write_private(path: &Path, contents: &[u8]) -> io::Result<()> {
    use std::os::unix::fs::{OpenOptionsExt as _, PermissionsExt as _};

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // `mode` only applies when the file is created.
    file.set_permissions(fs::Permissions::from_mode(0o600))?;
    file.write_all(contents)?;
    file.sync_all()
}

#[cfg(not(unix))]
fn write_private(path: &Path, contents: &[u8]) -> io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(contents)?;
    file.sync_all()
}

fn default_session_path() -> PathBuf {
    if let Some(home) = std::env::var_os(ENV_HOME).filter(|home| !home.is_empty()) {
        return PathBuf::from(home).join(SESSION_FILE_NAME);
    }

    if let Some(mut config_dir) = dirs::config_dir() {
        config_dir.push("jurisflow");
        config_dir.push(SESSION_FILE_NAME);
        return config_dir;
    }

    if let Some(mut home_dir) = dirs::home_dir() {
        home_dir.push(".jurisflow");
        home_dir.push(SESSION_FILE_NAME);
        return home_dir;
    }

    PathBuf::from(SESSION_FILE_NAME)
}
