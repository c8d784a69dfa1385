//! The editing surface: document, theme, language picker, console and notices.

pub mod document;
pub mod picker;
pub mod surface;
pub mod widget;

pub use document::{Document, DEFAULT_SNIPPET};
pub use picker::LanguagePicker;
pub use surface::{
    EditorSurface, Notice, NoticeLevel, RunTicket, SaveTicket, CONSOLE_PLACEHOLDER,
};
pub use widget::{BufferWidget, TextWidget};
