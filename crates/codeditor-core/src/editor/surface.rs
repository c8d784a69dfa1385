use serde::{Deserialize, Serialize};
use strum::Display;

use super::document::Document;
use super::picker::LanguagePicker;
use super::widget::TextWidget;
use crate::errors::{EditorError, Result};
use crate::executors::{ExecutionRequest, ExecutionResult};
use crate::registry::{LanguageId, Registry, ThemeId};

pub const CONSOLE_PLACEHOLDER: &str =
    "// Console output will appear here...\n// Click \"Run\" to execute your code";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: &str) -> Self {
        Self {
            level,
            message: message.to_string(),
        }
    }
}

/// Issued by [`EditorSurface::begin_run`]. Only the newest ticket's result is displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunTicket {
    pub seq: u64,
    pub request: ExecutionRequest,
}

/// Snapshot handed to the persistence collaborator, tagged with the document version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveTicket {
    pub version: u64,
    pub content: String,
    pub language: LanguageId,
}

#[derive(Debug, Default, Clone)]
struct Console {
    displayed: Option<(u64, ExecutionResult)>,
    latest_issued: u64,
    running: Option<LanguageId>,
}

/// State behind the editor page.
///
/// Every mutation goes through a named operation. Run and Save are split into a
/// `begin_*` half that snapshots the document and a completion half that applies
/// the outcome, so the asynchronous work in between never touches this struct.
#[derive(Debug, Clone)]
pub struct EditorSurface {
    document: Document,
    theme: ThemeId,
    picker: LanguagePicker,
    console: Console,
    notice: Option<Notice>,
}

impl Default for EditorSurface {
    fn default() -> Self {
        Self::new(Document::default(), ThemeId::default())
    }
}

impl EditorSurface {
    pub fn new(document: Document, theme: ThemeId) -> Self {
        Self {
            document,
            theme,
            picker: LanguagePicker::Closed,
            console: Console::default(),
            notice: None,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn content(&self) -> &str {
        self.document.content()
    }

    pub fn language(&self) -> LanguageId {
        self.document.language()
    }

    pub fn theme(&self) -> ThemeId {
        self.theme
    }

    pub fn picker(&self) -> LanguagePicker {
        self.picker
    }

    pub fn is_dirty(&self) -> bool {
        self.document.is_dirty()
    }

    // ----------------- Editing -----------------

    pub fn set_content(&mut self, text: &str) {
        self.document.replace_content(text);
    }

    pub fn set_language(&mut self, id: &str) -> Result<()> {
        let entry = Registry::lookup(id).map_err(|_| EditorError::InvalidLanguage(id.to_string()))?;
        self.select_language(entry.id);
        Ok(())
    }

    pub fn select_language(&mut self, language: LanguageId) {
        self.document.set_language(language);
    }

    pub fn toggle_theme(&mut self) {
        self.theme = self.theme.toggled();
    }

    pub fn toggle_picker(&mut self) {
        self.picker = self.picker.toggled();
    }

    /// Picks a language from the dropdown. The picker stays open on an invalid id.
    pub fn choose_language(&mut self, id: &str) -> Result<()> {
        self.set_language(id)?;
        self.close_picker();
        Ok(())
    }

    pub fn close_picker(&mut self) {
        self.picker = LanguagePicker::Closed;
    }

    pub fn line_count(&self) -> usize {
        self.document.line_count()
    }

    pub fn char_count(&self) -> usize {
        self.document.char_count()
    }

    /// Bottom bar text, e.g. `Lines: 2  Characters: 56  JAVASCRIPT`.
    pub fn status_line(&self) -> String {
        format!(
            "Lines: {}  Characters: {}  {}",
            self.line_count(),
            self.char_count(),
            self.language().to_string().to_uppercase()
        )
    }

    // ----------------- Console -----------------

    pub fn begin_run(&mut self) -> RunTicket {
        self.console.latest_issued += 1;
        self.console.running = Some(self.language());
        RunTicket {
            seq: self.console.latest_issued,
            request: ExecutionRequest::new(self.content(), self.language()),
        }
    }

    /// Displays `result` if `seq` is the newest issued run. Returns whether it was shown.
    pub fn apply_run_result(&mut self, seq: u64, result: ExecutionResult) -> bool {
        if seq != self.console.latest_issued {
            log::debug!(
                "Discarding stale run #{} (latest is #{})",
                seq,
                self.console.latest_issued
            );
            return false;
        }
        self.console.running = None;
        self.console.displayed = Some((seq, result));
        true
    }

    pub fn latest_run(&self) -> u64 {
        self.console.latest_issued
    }

    pub fn is_running(&self) -> bool {
        self.console.running.is_some()
    }

    pub fn displayed_result(&self) -> Option<&ExecutionResult> {
        self.console.displayed.as_ref().map(|(_, result)| result)
    }

    /// Sequence number of the run whose result is on screen.
    pub fn displayed_seq(&self) -> Option<u64> {
        self.console.displayed.as_ref().map(|(seq, _)| *seq)
    }

    pub fn clear_console(&mut self) {
        self.console.displayed = None;
        self.console.running = None;
    }

    pub fn console_text(&self) -> String {
        if let Some(language) = self.console.running {
            return format!("> Running {} code...", language);
        }
        match &self.console.displayed {
            Some((_, result)) => result.render(),
            None => CONSOLE_PLACEHOLDER.to_string(),
        }
    }

    // ----------------- Save -----------------

    pub fn begin_save(&self) -> SaveTicket {
        SaveTicket {
            version: self.document.version(),
            content: self.content().to_string(),
            language: self.language(),
        }
    }

    /// Applies a save outcome. Returns whether the document became clean.
    pub fn complete_save(&mut self, version: u64, outcome: &Result<()>) -> bool {
        match outcome {
            Ok(()) => {
                let clean = self.document.mark_clean_at(version);
                if clean {
                    self.post_notice(Notice::new(NoticeLevel::Info, "Document saved."));
                } else {
                    self.post_notice(Notice::new(
                        NoticeLevel::Info,
                        "Saved an earlier version. Newer edits are still unsaved.",
                    ));
                }
                clean
            }
            Err(err) => {
                let err = match err {
                    EditorError::SaveFailed(_) => err.clone(),
                    other => EditorError::SaveFailed(other.to_string()),
                };
                self.post_notice(Notice::new(NoticeLevel::Error, &err.to_string()));
                false
            }
        }
    }

    // ----------------- Notices -----------------

    pub fn post_notice(&mut self, notice: Notice) {
        self.notice = Some(notice);
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }

    // ----------------- Widget -----------------

    pub fn sync_widget(&self, widget: &mut dyn TextWidget) {
        if widget.value() != self.content() {
            widget.set_value(self.content());
        }
        widget.set_language_mode(&self.language().to_string());
        widget.set_theme(self.theme.widget_theme());
    }

    /// Pulls a pending user edit from the widget. Returns whether content changed.
    pub fn on_widget_change(&mut self, widget: &mut dyn TextWidget) -> bool {
        match widget.take_change() {
            Some(text) => {
                self.set_content(&text);
                true
            }
            None => false,
        }
    }
}
