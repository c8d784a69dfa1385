use serde::{Deserialize, Serialize};

use crate::registry::LanguageId;

pub const DEFAULT_SNIPPET: &str = "// Start coding here...\nconsole.log(\"Hello CodeDitor!\");";

/// The text being edited, its language tag and the unsaved-changes flag.
///
/// `version` increases on every mutation of what a save persists (content or
/// language) so that asynchronous save completions can tell whether the
/// record they wrote is still current.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    content: String,
    language: LanguageId,
    dirty: bool,
    version: u64,
}

impl Default for Document {
    fn default() -> Self {
        Self::new(DEFAULT_SNIPPET, LanguageId::default())
    }
}

impl Document {
    pub fn new(content: &str, language: LanguageId) -> Self {
        Self {
            content: content.to_string(),
            language,
            dirty: false,
            version: 0,
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn language(&self) -> LanguageId {
        self.language
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub(crate) fn replace_content(&mut self, text: &str) {
        self.content = text.to_string();
        self.dirty = true;
        self.version += 1;
    }

    /// Switching to a different language is an unsaved change; re-selecting
    /// the current one is not.
    pub(crate) fn set_language(&mut self, language: LanguageId) {
        if self.language == language {
            return;
        }
        self.language = language;
        self.dirty = true;
        self.version += 1;
    }

    /// Clears the dirty flag if no edit happened after `version` was saved.
    pub(crate) fn mark_clean_at(&mut self, version: u64) -> bool {
        if self.version != version {
            return false;
        }
        self.dirty = false;
        true
    }

    pub fn line_count(&self) -> usize {
        self.content.split('\n').count()
    }

    pub fn char_count(&self) -> usize {
        self.content.chars().count()
    }
}
