use crate::error::AppError;
use crate::model::User;
use std::path::{Path, PathBuf};

pub mod guard;

const SESSION_DIR_NAME: &str = "session";
const SESSION_ENV_VAR: &str = "TASKDECK_SESSION_PATH";
const TOKEN_FILE_NAME: &str = "token";
const USER_FILE_NAME: &str = "user.json";

/// An authenticated session: the bearer token and the profile it belongs to.
/// The two are always set and cleared together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub user: User,
}

/// Single source of truth for "who is logged in".
///
/// Holds the current session in memory and mirrors it to two durable entries
/// (`token`, `user.json`) under the session directory. No network calls
/// originate here.
#[derive(Debug)]
pub struct SessionStore {
    dir: PathBuf,
    session: Option<Session>,
}

pub fn session_dir() -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(SESSION_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::invalid_data("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata)
            .join("taskdeck")
            .join(SESSION_DIR_NAME))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::invalid_data("HOME is not set"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("taskdeck")
            .join(SESSION_DIR_NAME))
    }
}

impl SessionStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir, session: None }
    }

    /// Open the default store location and restore any persisted session.
    pub fn open() -> Result<Self, AppError> {
        let mut store = Self::new(session_dir()?);
        store.restore()?;
        Ok(store)
    }

    fn token_path(&self) -> PathBuf {
        self.dir.join(TOKEN_FILE_NAME)
    }

    fn user_path(&self) -> PathBuf {
        self.dir.join(USER_FILE_NAME)
    }

    /// Re-establish the session from the durable pair.
    ///
    /// Partial or unreadable state is not trusted: unless both entries are
    /// present and the profile parses, any leftovers are removed and no
    /// session is established.
    pub fn restore(&mut self) -> Result<(), AppError> {
        self.session = None;

        let token = read_entry(&self.token_path())?;
        let user_json = read_entry(&self.user_path())?;

        let (token, user_json) = match (token, user_json) {
            (Some(token), Some(user_json)) => (token, user_json),
            (None, None) => return Ok(()),
            _ => {
                tracing::warn!("partial session state on disk, discarding");
                return self.clear();
            }
        };

        let token = token.trim().to_string();
        let user: User = match serde_json::from_str(&user_json) {
            Ok(user) if !token.is_empty() => user,
            _ => {
                tracing::warn!("unreadable session state on disk, discarding");
                return self.clear();
            }
        };

        self.session = Some(Session { token, user });
        Ok(())
    }

    /// Establish a session and persist both entries durably.
    pub fn set(&mut self, token: String, user: User) -> Result<(), AppError> {
        std::fs::create_dir_all(&self.dir).map_err(|err| AppError::io(err.to_string()))?;

        let profile = serde_json::to_string_pretty(&user)
            .map_err(|err| AppError::invalid_data(err.to_string()))?;
        write_entry(&self.token_path(), &token)?;
        write_entry(&self.user_path(), &profile)?;

        self.session = Some(Session { token, user });
        Ok(())
    }

    /// Tear down the session and remove both durable entries.
    pub fn clear(&mut self) -> Result<(), AppError> {
        self.session = None;
        remove_entry(&self.token_path())?;
        remove_entry(&self.user_path())?;
        Ok(())
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn token(&self) -> Option<&str> {
        self.session.as_ref().map(|session| session.token.as_str())
    }

    pub fn user(&self) -> Option<&User> {
        self.session.as_ref().map(|session| &session.user)
    }
}

fn read_entry(path: &Path) -> Result<Option<String>, AppError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(AppError::io(err.to_string())),
    }
}

fn write_entry(path: &Path, content: &str) -> Result<(), AppError> {
    std::fs::write(path, content).map_err(|err| AppError::io(err.to_string()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let permissions = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(path, permissions).map_err(|err| AppError::io(err.to_string()))?;
    }

    Ok(())
}

fn remove_entry(path: &Path) -> Result<(), AppError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(AppError::io(err.to_string())),
    }
}
