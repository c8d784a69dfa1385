//! Language to backend routing.
//!
//! Registry membership and backend wiring are allowed to diverge: a language
//! can be listed in the picker without any backend able to run it.

use std::collections::HashMap;
use std::sync::Arc;

use super::CodeExecutor;
use crate::errors::ExecutorError;
use crate::registry::{LanguageId, Registry};

#[derive(Clone, Default)]
pub struct ExecutorRouter {
    routes: HashMap<LanguageId, Arc<dyn CodeExecutor>>,
}

impl ExecutorRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes every language that declares a toolchain in the registry to `executor`.
    pub fn with_default_backend(executor: Arc<dyn CodeExecutor>) -> Self {
        let mut router = Self::new();
        for entry in Registry::languages() {
            if entry.backend.is_some() {
                router.routes.insert(entry.id, executor.clone());
            }
        }
        router
    }

    pub fn route(mut self, language: LanguageId, executor: Arc<dyn CodeExecutor>) -> Self {
        self.routes.insert(language, executor);
        self
    }

    pub fn unroute(mut self, language: LanguageId) -> Self {
        self.routes.remove(&language);
        self
    }

    pub fn resolve(&self, language: LanguageId) -> Result<Arc<dyn CodeExecutor>, ExecutorError> {
        self.routes
            .get(&language)
            .cloned()
            .ok_or(ExecutorError::UnsupportedLanguage(language))
    }

    pub fn supports(&self, language: LanguageId) -> bool {
        self.routes.contains_key(&language)
    }

    /// Supported languages in registry display order.
    pub fn supported(&self) -> Vec<LanguageId> {
        Registry::languages()
            .iter()
            .map(|entry| entry.id)
            .filter(|id| self.supports(*id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executors::{ExecutionRequest, ExecutionResult};
    use async_trait::async_trait;

    struct Echo;

    #[async_trait]
    impl CodeExecutor for Echo {
        fn name(&self) -> &'static str {
            "echo"
        }

        async fn execute_code(
            &self,
            request: &ExecutionRequest,
        ) -> Result<ExecutionResult, ExecutorError> {
            Ok(ExecutionResult::success(&request.content))
        }
    }

    #[test]
    fn test_default_backend_skips_markup_languages() {
        let router = ExecutorRouter::with_default_backend(Arc::new(Echo));
        assert_eq!(
            router.supported(),
            vec![
                LanguageId::Javascript,
                LanguageId::Python,
                LanguageId::Java,
                LanguageId::Cpp,
                LanguageId::Typescript,
            ]
        );
        assert!(matches!(
            router.resolve(LanguageId::Html),
            Err(ExecutorError::UnsupportedLanguage(LanguageId::Html))
        ));
    }

    #[test]
    fn test_explicit_routes() {
        let router = ExecutorRouter::new()
            .route(LanguageId::Json, Arc::new(Echo))
            .route(LanguageId::Python, Arc::new(Echo))
            .unroute(LanguageId::Python);
        assert_eq!(router.supported(), vec![LanguageId::Json]);
        assert_eq!(router.resolve(LanguageId::Json).unwrap().name(), "echo");
    }
}
