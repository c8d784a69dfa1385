use std::sync::{Arc, Mutex};

/// Landing page, where logout sends the user.
pub const ENTRY_PATH: &str = "/";
pub const EDITOR_PATH: &str = "/editor";

pub trait Navigator: Send + Sync {
    fn navigate(&self, path: &str);
}

/// Records every navigation. Front ends read `current()` to decide what to show.
#[derive(Debug, Clone)]
pub struct RecordingNavigator {
    history: Arc<Mutex<Vec<String>>>,
}

impl Default for RecordingNavigator {
    fn default() -> Self {
        Self::starting_at(EDITOR_PATH)
    }
}

impl RecordingNavigator {
    pub fn starting_at(path: &str) -> Self {
        Self {
            history: Arc::new(Mutex::new(vec![path.to_string()])),
        }
    }

    pub fn current(&self) -> Option<String> {
        self.history.lock().ok().and_then(|h| h.last().cloned())
    }

    pub fn history(&self) -> Vec<String> {
        self.history.lock().map(|h| h.clone()).unwrap_or_default()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, path: &str) {
        log::debug!("Navigating to {}", path);
        if let Ok(mut history) = self.history.lock() {
            history.push(path.to_string());
        }
    }
}
