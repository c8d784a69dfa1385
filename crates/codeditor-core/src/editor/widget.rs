/// The embedded text-editing widget as seen from the surface.
///
/// Rendering and highlighting are the widget's business. The surface only pushes
/// value, language mode and theme, and pulls user edits.
pub trait TextWidget: Send {
    fn value(&self) -> String;
    fn set_value(&mut self, text: &str);
    fn set_language_mode(&mut self, mode: &str);
    fn set_theme(&mut self, theme: &str);
    /// Text produced by user edits since the last call, if any.
    fn take_change(&mut self) -> Option<String>;
}

/// In-memory widget used by the terminal front end and in tests.
#[derive(Debug, Default, Clone)]
pub struct BufferWidget {
    value: String,
    language_mode: String,
    theme: String,
    pending_change: bool,
}

impl BufferWidget {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates the user typing: replaces the buffer and raises a change.
    pub fn edit(&mut self, text: &str) {
        self.value = text.to_string();
        self.pending_change = true;
    }

    pub fn language_mode(&self) -> &str {
        &self.language_mode
    }

    pub fn theme(&self) -> &str {
        &self.theme
    }
}

impl TextWidget for BufferWidget {
    fn value(&self) -> String {
        self.value.clone()
    }

    // Programmatic updates do not count as user edits.
    fn set_value(&mut self, text: &str) {
        self.value = text.to_string();
        self.pending_change = false;
    }

    fn set_language_mode(&mut self, mode: &str) {
        self.language_mode = mode.to_string();
    }

    fn set_theme(&mut self, theme: &str) {
        self.theme = theme.to_string();
    }

    fn take_change(&mut self) -> Option<String> {
        if !self.pending_change {
            return None;
        }
        self.pending_change = false;
        Some(self.value.clone())
    }
}
