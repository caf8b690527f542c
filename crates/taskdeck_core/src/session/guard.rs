use crate::error::AppError;
use crate::session::SessionStore;

/// Gate in front of authenticated views.
///
/// Starts in `Checking` and resolves exactly once against the session store;
/// resolution happens after the store's `restore()` has completed, so no
/// timed check window is needed. There is no path back to `Checking` short
/// of constructing a new guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    Checking,
    Authenticated,
    Unauthenticated,
}

#[derive(Debug)]
pub struct SessionGuard {
    state: GuardState,
}

impl SessionGuard {
    pub fn new() -> Self {
        Self {
            state: GuardState::Checking,
        }
    }

    pub fn state(&self) -> GuardState {
        self.state
    }

    /// Resolve `Checking` against the store. Once resolved, the outcome is
    /// final for the lifetime of this guard and later calls return it
    /// unchanged.
    pub fn resolve(&mut self, store: &SessionStore) -> GuardState {
        if self.state == GuardState::Checking {
            self.state = if store.is_authenticated() {
                GuardState::Authenticated
            } else {
                GuardState::Unauthenticated
            };
        }
        self.state
    }

    /// Error unless the guard has resolved to `Authenticated`.
    pub fn require(&self) -> Result<(), AppError> {
        match self.state {
            GuardState::Authenticated => Ok(()),
            _ => Err(AppError::unauthorized("not logged in")),
        }
    }
}

impl Default for SessionGuard {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::{GuardState, SessionGuard};
    use crate::model::User;
    use crate::session::SessionStore;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("taskdeck-{nanos}-{name}"))
    }

    fn sample_user() -> User {
        serde_json::from_str(r#"{"id": "7", "email": "a@x.com"}"#).unwrap()
    }

    #[test]
    fn starts_checking_and_requires_nothing_yet() {
        let guard = SessionGuard::new();
        assert_eq!(guard.state(), GuardState::Checking);
        assert!(guard.require().is_err());
    }

    #[test]
    fn resolves_authenticated_when_store_holds_session() {
        let dir = temp_dir("guard-auth");
        let mut store = SessionStore::new(dir.clone());
        store.set("tok-1".to_string(), sample_user()).unwrap();

        let mut guard = SessionGuard::new();
        assert_eq!(guard.resolve(&store), GuardState::Authenticated);
        assert!(guard.require().is_ok());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn resolves_unauthenticated_on_empty_store() {
        let store = SessionStore::new(temp_dir("guard-unauth"));
        let mut guard = SessionGuard::new();
        assert_eq!(guard.resolve(&store), GuardState::Unauthenticated);

        let err = guard.require().unwrap_err();
        assert_eq!(err.code(), "unauthorized");
    }

    #[test]
    fn resolution_is_final_until_remount() {
        let dir = temp_dir("guard-final");
        let mut store = SessionStore::new(dir.clone());

        let mut guard = SessionGuard::new();
        assert_eq!(guard.resolve(&store), GuardState::Unauthenticated);

        // A session established afterwards does not flip an already
        // resolved guard; only a new guard observes it.
        store.set("tok-1".to_string(), sample_user()).unwrap();
        assert_eq!(guard.resolve(&store), GuardState::Unauthenticated);

        let mut remounted = SessionGuard::new();
        assert_eq!(remounted.resolve(&store), GuardState::Authenticated);
        std::fs::remove_dir_all(&dir).ok();
    }
}
