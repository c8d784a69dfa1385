//! Builds editor sessions and their collaborators from an [`EditorConfig`]

use std::sync::Arc;
use tokio::sync::mpsc;

use crate::config::{
    EditorConfig, EditorSettings, ExecutionBackend, ExecutionConfig, PersistenceConfig,
};
use crate::dispatcher::{Collaborators, CommandDispatcher, Event};
use crate::editor::{Document, EditorSurface};
use crate::errors::EditorError;
use crate::executors::docker::DockerCodeExecutor;
use crate::executors::native::NativeCodeExecutor;
use crate::executors::remote::HttpCodeExecutor;
use crate::executors::{CodeExecutor, ExecutionChannel, ExecutorRouter};
use crate::navigation::Navigator;
use crate::persistence::{DocumentStore, FileDocumentStore, RemoteDocumentStore};
use crate::registry::LanguageId;
use crate::session::SessionProvider;

/// A ready-to-drive editor page. `events` must be drained into
/// `dispatcher.handle_event` by the owner of `surface`.
pub struct EditorParts {
    pub surface: EditorSurface,
    pub dispatcher: CommandDispatcher,
    pub events: mpsc::UnboundedReceiver<Event>,
}

pub struct EditorFactory;

impl EditorFactory {
    pub fn create_from_config(
        config: &EditorConfig,
        sessions: Arc<dyn SessionProvider>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<EditorParts, EditorError> {
        let collaborators = Collaborators {
            channel: Self::configure_channel(&config.execution)?,
            store: Self::configure_store(&config.persistence),
            sessions,
            navigator,
        };
        let (dispatcher, events) = CommandDispatcher::new(collaborators, config.logout.policy);
        Ok(EditorParts {
            surface: Self::configure_surface(&config.editor),
            dispatcher,
            events,
        })
    }

    pub fn configure_surface(settings: &EditorSettings) -> EditorSurface {
        EditorSurface::new(
            Document::new(&settings.initial_content, settings.default_language),
            settings.default_theme,
        )
    }

    pub fn configure_channel(config: &ExecutionConfig) -> Result<ExecutionChannel, EditorError> {
        let router = Self::configure_router(config)?;
        log::info!(
            "Execution channel ready: {:?} backend, {} ms timeout, languages [{}]",
            config.backend,
            config.timeout_ms,
            router
                .supported()
                .iter()
                .map(|id| id.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(ExecutionChannel::new(router, config.timeout()))
    }

    pub fn configure_router(config: &ExecutionConfig) -> Result<ExecutorRouter, EditorError> {
        let router = match &config.backend {
            ExecutionBackend::Native => {
                let mut native = NativeCodeExecutor::new();
                if let Some(dir) = &config.work_dir {
                    native = native.with_work_dir(dir.clone());
                }
                ExecutorRouter::with_default_backend(Arc::new(native))
            }
            ExecutionBackend::Docker => {
                let mut docker = DockerCodeExecutor::new()?;
                if let Some(dir) = &config.work_dir {
                    docker = docker.with_work_dir(dir.clone());
                }
                let docker: Arc<dyn CodeExecutor> = Arc::new(docker);
                ExecutorRouter::with_default_backend(docker).unroute(LanguageId::Typescript)
            }
            ExecutionBackend::Remote { url } => {
                ExecutorRouter::with_default_backend(Arc::new(HttpCodeExecutor::new(url)))
            }
            ExecutionBackend::None => ExecutorRouter::new(),
        };
        Ok(router)
    }

    pub fn configure_store(config: &PersistenceConfig) -> Arc<dyn DocumentStore> {
        match config {
            PersistenceConfig::File { dir } => Arc::new(FileDocumentStore::new(dir.clone())),
            PersistenceConfig::Remote { url } => Arc::new(RemoteDocumentStore::new(url)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::RecordingNavigator;
    use crate::registry::ThemeId;
    use crate::session::StaticSessions;

    #[test]
    fn test_router_per_backend() {
        let mut config = ExecutionConfig::default();
        config.backend = ExecutionBackend::None;
        assert!(EditorFactory::configure_router(&config).unwrap().supported().is_empty());

        config.backend = ExecutionBackend::Remote {
            url: "http://localhost:4000".to_string(),
        };
        let router = EditorFactory::configure_router(&config).unwrap();
        assert!(router.supports(LanguageId::Typescript));
        assert!(!router.supports(LanguageId::Css));
    }

    #[tokio::test]
    async fn test_create_from_config() {
        let mut config = EditorConfig::default();
        config.editor.default_language = LanguageId::Python;
        config.editor.default_theme = ThemeId::Light;
        config.editor.initial_content = "print('hi')".to_string();
        config.execution.backend = ExecutionBackend::None;

        let parts = EditorFactory::create_from_config(
            &config,
            Arc::new(StaticSessions::anonymous()),
            Arc::new(RecordingNavigator::default()),
        )
        .unwrap();
        assert_eq!(parts.surface.language(), LanguageId::Python);
        assert_eq!(parts.surface.theme(), ThemeId::Light);
        assert_eq!(parts.surface.content(), "print('hi')");
        assert!(!parts.surface.is_dirty());
        assert_eq!(parts.dispatcher.collaborators().store.name(), "file");
    }
}
