//! Authentication collaborator. The core only asks whether a session is present.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub user: String,
}

impl Session {
    pub fn new(user: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user: user.to_string(),
        }
    }
}

pub trait SessionProvider: Send + Sync {
    fn get_session(&self) -> Option<Session>;
    fn invalidate(&self);
}

/// Holds at most one session in process memory.
#[derive(Debug, Clone, Default)]
pub struct StaticSessions {
    current: Arc<RwLock<Option<Session>>>,
}

impl StaticSessions {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn signed_in(user: &str) -> Self {
        let sessions = Self::default();
        sessions.sign_in(user);
        sessions
    }

    pub fn sign_in(&self, user: &str) -> Session {
        let session = Session::new(user);
        log::info!("Signed in as '{}' (session {})", user, session.id);
        if let Ok(mut current) = self.current.write() {
            *current = Some(session.clone());
        }
        session
    }
}

impl SessionProvider for StaticSessions {
    fn get_session(&self) -> Option<Session> {
        self.current.read().ok().and_then(|current| current.clone())
    }

    fn invalidate(&self) {
        if let Ok(mut current) = self.current.write() {
            if let Some(session) = current.take() {
                log::info!("Invalidated session {}", session.id);
            }
        }
    }
}
