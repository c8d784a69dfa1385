//! Line-oriented editor page for the terminal.
//!
//! Plain lines are appended to the document. Lines starting with `:` are
//! editor commands, see [`HELP`].

use anyhow::Result;
use codeditor_core::editor::{BufferWidget, EditorSurface, TextWidget};
use codeditor_core::navigation::{RecordingNavigator, ENTRY_PATH};
use codeditor_core::{
    Command, CommandDispatcher, CommandOutcome, EditorError, EditorParts, Event, NoticeLevel,
    Registry,
};
use std::path::Path;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

const HELP: &str = "\
Commands:
  :run            run the document
  :save           save the document
  :lang <id>      switch language
  :langs          toggle the language list
  :theme          toggle dark/light theme
  :clear          clear the console
  :stats          show the status bar
  :show           print the document
  :reset          empty the document
  :set <file>     replace the document with a file's contents
  :logout [!]     sign out, `!` drops unsaved changes
  :quit           leave the editor
Any other line is appended to the document.";

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

pub struct TerminalEditor {
    surface: EditorSurface,
    dispatcher: CommandDispatcher,
    widget: BufferWidget,
    navigator: RecordingNavigator,
}

impl TerminalEditor {
    pub fn new(
        surface: EditorSurface,
        dispatcher: CommandDispatcher,
        navigator: RecordingNavigator,
    ) -> Self {
        let mut widget = BufferWidget::new();
        surface.sync_widget(&mut widget);
        Self {
            surface,
            dispatcher,
            widget,
            navigator,
        }
    }

    /// Drives the page until `:quit`, logout or end of input.
    pub async fn run(parts: EditorParts, navigator: RecordingNavigator) -> Result<()> {
        let EditorParts {
            surface,
            dispatcher,
            mut events,
        } = parts;
        let mut editor = Self::new(surface, dispatcher, navigator);

        println!("{}", HELP);
        editor.print_document();
        println!("{}", editor.surface.status_line());

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            tokio::select! {
                line = lines.next_line() => {
                    match line? {
                        Some(line) => {
                            if editor.handle_line(&line) == Flow::Quit {
                                break;
                            }
                        }
                        None => break,
                    }
                }
                Some(event) = events.recv() => editor.handle_event(event),
            }
        }

        editor.shutdown(&mut events);
        Ok(())
    }

    fn handle_line(&mut self, line: &str) -> Flow {
        let Some(command) = line.strip_prefix(':') else {
            self.append_line(line);
            return Flow::Continue;
        };

        let (name, arg) = match command.trim().split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (command.trim(), ""),
        };

        match name {
            "run" => self.dispatch(Command::Run),
            "save" => self.dispatch(Command::Save),
            "clear" => self.dispatch(Command::ClearConsole),
            "logout" => self.dispatch(Command::Logout {
                discard_unsaved: arg == "!",
            }),
            "logout!" => self.dispatch(Command::Logout {
                discard_unsaved: true,
            }),
            "lang" => self.choose_language(arg),
            "langs" => self.toggle_language_list(),
            "theme" => {
                self.surface.toggle_theme();
                self.surface.sync_widget(&mut self.widget);
                println!("Theme: {}", self.widget.theme());
            }
            "stats" => println!("{}", self.surface.status_line()),
            "show" => self.print_document(),
            "reset" => {
                self.widget.edit("");
                self.surface.on_widget_change(&mut self.widget);
            }
            "set" => self.load_file(arg),
            "help" => println!("{}", HELP),
            "quit" | "q" => return Flow::Quit,
            other => println!("Unknown command ':{}', try :help", other),
        }

        self.flush_notice();
        if self.navigator.current().as_deref() == Some(ENTRY_PATH) {
            return Flow::Quit;
        }
        Flow::Continue
    }

    fn append_line(&mut self, line: &str) {
        let mut text = self.widget.value();
        if !text.is_empty() && !text.ends_with('\n') {
            text.push('\n');
        }
        text.push_str(line);
        self.widget.edit(&text);
        self.surface.on_widget_change(&mut self.widget);
    }

    fn dispatch(&mut self, command: Command) {
        match self.dispatcher.dispatch(&mut self.surface, command) {
            Ok(CommandOutcome::RunStarted(_)) | Ok(CommandOutcome::ConsoleCleared) => {
                println!("{}", self.surface.console_text());
            }
            Ok(CommandOutcome::SaveQueued(version)) => println!("Saving (v{})...", version),
            Ok(CommandOutcome::ConfirmationRequired) => {
                println!("You have unsaved changes. Use :logout! to discard them, or :save first.");
            }
            Ok(CommandOutcome::LoggedOut) => println!("Logged out."),
            Ok(CommandOutcome::Ignored) => {}
            Err(EditorError::NotAuthenticated) => {
                println!("Not signed in. Start the editor with --user to save documents.");
            }
            Err(e) => println!("Error: {}", e),
        }
    }

    fn handle_event(&mut self, event: Event) {
        let is_run = matches!(event, Event::RunFinished { .. });
        if self.dispatcher.handle_event(&mut self.surface, event) && is_run {
            println!("{}", self.surface.console_text());
        }
        self.flush_notice();
    }

    fn choose_language(&mut self, id: &str) {
        match self.surface.choose_language(id) {
            Ok(()) => {
                self.surface.sync_widget(&mut self.widget);
                println!("Language: {}", Registry::entry(self.surface.language()).label);
            }
            Err(e) => println!("{}", e),
        }
    }

    fn toggle_language_list(&mut self) {
        self.surface.toggle_picker();
        if !self.surface.picker().is_open() {
            return;
        }
        for entry in Registry::languages() {
            let marker = if entry.id == self.surface.language() { "*" } else { " " };
            println!(" {} {:<12} {}", marker, entry.id, entry.label);
        }
    }

    fn load_file(&mut self, arg: &str) {
        if arg.is_empty() {
            println!("Usage: :set <file>");
            return;
        }
        let path = Path::new(arg);
        match std::fs::read_to_string(path) {
            Ok(content) => {
                self.widget.edit(&content);
                self.surface.on_widget_change(&mut self.widget);
                if let Some(language) = Registry::infer_from_path(path) {
                    self.surface.select_language(language);
                    self.surface.sync_widget(&mut self.widget);
                }
                println!("{}", self.surface.status_line());
            }
            Err(e) => println!("Cannot read {}: {}", path.display(), e),
        }
    }

    fn print_document(&self) {
        for (n, line) in self.surface.content().lines().enumerate() {
            println!("{:>4} | {}", n + 1, line);
        }
    }

    fn flush_notice(&mut self) {
        if let Some(notice) = self.surface.take_notice() {
            let tag = match notice.level {
                NoticeLevel::Info => "info",
                NoticeLevel::Warning => "warning",
                NoticeLevel::Error => "error",
            };
            println!("[{}] {}", tag, notice.message);
        }
    }

    fn shutdown(&mut self, events: &mut mpsc::UnboundedReceiver<Event>) {
        self.dispatcher.teardown();
        events.close();
        if self.surface.is_dirty() {
            log::warn!("Leaving the editor with unsaved changes");
        }
    }
}
