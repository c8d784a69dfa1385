use super::*;
use crate::dispatcher::LogoutPolicy;
use crate::editor::DEFAULT_SNIPPET;
use crate::registry::{LanguageId, ThemeId};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::NamedTempFile;

fn parse(yaml: &str) -> EditorConfig {
    let mut config: EditorConfig = serde_yaml::from_str(yaml).unwrap();
    ConfigLoader::apply_overrides(&mut config, |_| None).unwrap();
    config.validate().unwrap();
    config
}

#[test]
fn test_defaults() {
    let config = EditorConfig::default();
    assert_eq!(config.editor.default_language, LanguageId::Javascript);
    assert_eq!(config.editor.default_theme, ThemeId::Dark);
    assert_eq!(config.editor.initial_content, DEFAULT_SNIPPET);
    assert_eq!(config.execution.timeout(), Duration::from_millis(5000));
    assert_eq!(config.execution.backend, ExecutionBackend::Native);
    assert_eq!(config.logout.policy, LogoutPolicy::Confirm);
    assert!(config.validate().is_ok());
}

#[test]
fn test_full_document() {
    let config = parse(
        r#"
editor:
  default_language: python
  default_theme: light
  initial_content: "print('hi')"
execution:
  timeout_ms: 1500
  backend:
    type: remote
    url: http://localhost:4000
persistence:
  type: file
  dir: /tmp/codeditor-docs
logout:
  policy: discard-with-warning
logging:
  level: debug
"#,
    );
    assert_eq!(config.editor.default_language, LanguageId::Python);
    assert_eq!(config.editor.default_theme, ThemeId::Light);
    assert_eq!(config.execution.timeout_ms, 1500);
    assert_eq!(
        config.execution.backend,
        ExecutionBackend::Remote {
            url: "http://localhost:4000".to_string()
        }
    );
    assert_eq!(
        config.persistence,
        PersistenceConfig::File {
            dir: PathBuf::from("/tmp/codeditor-docs")
        }
    );
    assert_eq!(config.logout.policy, LogoutPolicy::DiscardWithWarning);
}

#[test]
fn test_unknown_language_is_a_parse_error() {
    let err = serde_yaml::from_str::<EditorConfig>("editor:\n  default_language: cobol\n");
    assert!(err.is_err());
}

#[test]
fn test_validation_failures() {
    let mut config = EditorConfig::default();
    config.execution.timeout_ms = 0;
    assert!(config.validate().is_err());

    let mut config = EditorConfig::default();
    config.execution.backend = ExecutionBackend::Remote {
        url: "localhost:4000".to_string(),
    };
    assert!(config.validate().is_err());

    let mut config = EditorConfig::default();
    config.logging.level = "loud".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_environment_overrides() {
    let mut config = EditorConfig::default();
    ConfigLoader::apply_overrides(&mut config, |key| match key {
        TIMEOUT_ENV => Some("250".to_string()),
        BACKEND_URL_ENV => Some("http://exec:8080".to_string()),
        _ => None,
    })
    .unwrap();
    assert_eq!(config.execution.timeout_ms, 250);
    assert_eq!(
        config.execution.backend,
        ExecutionBackend::Remote {
            url: "http://exec:8080".to_string()
        }
    );

    let err = ConfigLoader::apply_overrides(&mut config, |key| {
        (key == TIMEOUT_ENV).then(|| "soon".to_string())
    })
    .unwrap_err();
    assert!(err.to_string().contains(TIMEOUT_ENV));
}

#[tokio::test]
async fn test_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "execution:\n  backend:\n    type: docker").unwrap();

    let config = ConfigLoader::from_file(file.path()).await.unwrap();
    assert_eq!(config.execution.backend, ExecutionBackend::Docker);

    let err = ConfigLoader::from_file("/nonexistent/codeditor.yaml")
        .await
        .unwrap_err();
    assert!(matches!(err, crate::errors::EditorError::ConfigError(_)));
}
