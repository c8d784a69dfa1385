//! State-and-contract core of the CodeDitor editor page.
//!
//! The page is an explicit [`EditorSurface`] mutated only through named
//! operations, plus a [`CommandDispatcher`] that turns Run, Save, Logout and
//! Clear into effects:
//!
//! - **Registry**: the fixed, ordered set of languages and the two themes
//! - **Editor surface**: document, theme, language picker, console and notices
//! - **Execution channel**: runs `(source, language)` on a backend under a timeout
//! - **Dispatcher**: async Run/Save with sequence tags, serialized saves and teardown
//!
//! Collaborators (sessions, navigation, persistence, the text widget) are traits
//! with small in-process implementations so the core runs end to end.

pub mod config;
pub mod dispatcher;
pub mod editor;
pub mod errors;
pub mod executors;
pub mod factory;
pub mod navigation;
pub mod persistence;
pub mod registry;
pub mod session;

pub use config::{ConfigLoader, EditorConfig};
pub use dispatcher::{
    Collaborators, Command, CommandDispatcher, CommandOutcome, Event, LogoutPolicy,
};
pub use editor::{Document, EditorSurface, Notice, NoticeLevel};
pub use errors::{EditorError, ExecutorError};
pub use executors::{
    CodeExecutor, ExecutionChannel, ExecutionRequest, ExecutionResult, ExecutorRouter,
};
pub use factory::{EditorFactory, EditorParts};
pub use persistence::DocumentStore;
pub use registry::{LanguageId, Registry, ThemeId};
pub use session::{Session, SessionProvider};
