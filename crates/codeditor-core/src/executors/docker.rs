use async_trait::async_trait;
use bollard::container::LogOutput;
use bollard::models::{ContainerCreateBody, HostConfig};
use bollard::query_parameters::{
    CreateContainerOptions, LogsOptions, RemoveContainerOptions, StartContainerOptions,
    WaitContainerOptions,
};
use bollard::Docker;
use futures_util::stream::StreamExt;
use std::path::PathBuf;
use std::time::Instant;
use tempfile::Builder;
use uuid::Uuid;

use super::{CodeExecutor, ExecutionRequest, ExecutionResult};
use crate::errors::ExecutorError;
use crate::registry::LanguageId;

const CONTAINER_WORK_DIR: &str = "/app";
const MEMORY_LIMIT_BYTES: i64 = 256 * 1024 * 1024;

/// Removes the container when the run finishes or its future is dropped.
struct ContainerGuard {
    docker: Docker,
    id: String,
}

impl Drop for ContainerGuard {
    fn drop(&mut self) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            log::warn!("No runtime to remove container {}", self.id);
            return;
        };
        let docker = self.docker.clone();
        let id = std::mem::take(&mut self.id);
        handle.spawn(async move {
            let options = RemoveContainerOptions {
                force: true,
                ..Default::default()
            };
            if let Err(e) = docker.remove_container(&id, Some(options)).await {
                log::debug!("Failed to remove container {}: {}", id, e);
            }
        });
    }
}

/// Image, script file name and command for one language.
#[derive(Debug, PartialEq, Eq)]
struct ContainerPlan {
    image: &'static str,
    script: &'static str,
    cmd: Vec<String>,
}

impl ContainerPlan {
    fn interpreted(image: &'static str, program: &str, script: &'static str) -> Self {
        Self {
            image,
            script,
            cmd: vec![program.to_string(), format!("{}/{}", CONTAINER_WORK_DIR, script)],
        }
    }

    fn for_language(language: LanguageId) -> Result<Self, ExecutorError> {
        match language {
            LanguageId::Python => Ok(Self::interpreted("python:3.12-slim", "python", "main.py")),
            LanguageId::Javascript => Ok(Self::interpreted("node:20-slim", "node", "main.js")),
            LanguageId::Java => Ok(Self::interpreted("eclipse-temurin:21", "java", "Main.java")),
            LanguageId::Cpp => Ok(Self {
                image: "gcc:13",
                script: "main.cpp",
                cmd: vec![
                    "sh".to_string(),
                    "-c".to_string(),
                    format!(
                        "g++ -std=c++17 -o /tmp/main {}/main.cpp && /tmp/main",
                        CONTAINER_WORK_DIR
                    ),
                ],
            }),
            // TypeScript needs a package fetch and the sandbox has no network.
            _ => Err(ExecutorError::UnsupportedLanguage(language)),
        }
    }
}

pub struct DockerCodeExecutor {
    docker: Docker,
    work_dir: Option<PathBuf>,
}

impl DockerCodeExecutor {
    pub fn new() -> Result<Self, ExecutorError> {
        let docker = Docker::connect_with_local_defaults()?;
        Ok(Self {
            docker,
            work_dir: None,
        })
    }

    /// Host directory holding the per-run scratch dirs that get bind-mounted.
    pub fn with_work_dir(mut self, work_dir: PathBuf) -> Self {
        self.work_dir = Some(work_dir);
        self
    }

    async fn collect_logs(&self, id: &str) -> Result<(String, String), ExecutorError> {
        let options = LogsOptions {
            stdout: true,
            stderr: true,
            ..Default::default()
        };
        let mut logs = self.docker.logs(id, Some(options));
        let mut output = CapturedOutput::default();
        while let Some(frame) = logs.next().await {
            output.push(frame?);
        }
        Ok(output.decode())
    }
}

/// Raw bytes per stream. Frames can split a multibyte character, so decoding
/// happens once at the end.
#[derive(Debug, Default)]
struct CapturedOutput {
    stdout: Vec<u8>,
    stderr: Vec<u8>,
}

impl CapturedOutput {
    fn push(&mut self, frame: LogOutput) {
        match frame {
            LogOutput::StdOut { message } => self.stdout.extend_from_slice(&message),
            LogOutput::StdErr { message } => self.stderr.extend_from_slice(&message),
            _ => {}
        }
    }

    fn decode(self) -> (String, String) {
        (
            String::from_utf8_lossy(&self.stdout).into_owned(),
            String::from_utf8_lossy(&self.stderr).into_owned(),
        )
    }
}

#[async_trait]
impl CodeExecutor for DockerCodeExecutor {
    fn name(&self) -> &'static str {
        "docker"
    }

    async fn execute_code(
        &self,
        request: &ExecutionRequest,
    ) -> Result<ExecutionResult, ExecutorError> {
        let plan = ContainerPlan::for_language(request.language)?;

        let mut builder = Builder::new();
        builder.prefix("codeditor-docker-");
        let scratch = match &self.work_dir {
            Some(dir) => builder.tempdir_in(dir)?,
            None => builder.tempdir()?,
        };
        let mount_source = scratch
            .path()
            .to_str()
            .ok_or_else(|| ExecutorError::Unavailable("Scratch dir path is not UTF-8".to_string()))?
            .to_string();
        tokio::fs::write(scratch.path().join(plan.script), &request.content).await?;

        let body = ContainerCreateBody {
            image: Some(plan.image.to_string()),
            cmd: Some(plan.cmd),
            working_dir: Some(CONTAINER_WORK_DIR.to_string()),
            network_disabled: Some(true),
            host_config: Some(HostConfig {
                binds: Some(vec![format!("{}:{}", mount_source, CONTAINER_WORK_DIR)]),
                memory: Some(MEMORY_LIMIT_BYTES),
                network_mode: Some("none".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let options = CreateContainerOptions {
            name: Some(format!("codeditor-run-{}", Uuid::new_v4())),
            ..Default::default()
        };

        let started = Instant::now();
        let container = self.docker.create_container(Some(options), body).await?;
        let _guard = ContainerGuard {
            docker: self.docker.clone(),
            id: container.id.clone(),
        };
        log::debug!("Started {} container {}", plan.image, container.id);
        self.docker
            .start_container(&container.id, None::<StartContainerOptions>)
            .await?;

        let exit_code = match self
            .docker
            .wait_container(&container.id, None::<WaitContainerOptions>)
            .next()
            .await
        {
            Some(Ok(response)) => response.status_code,
            // bollard reports a non-zero exit as an error carrying the code.
            Some(Err(bollard::errors::Error::DockerContainerWaitError { code, .. })) => code,
            Some(Err(e)) => return Err(ExecutorError::BollardError(e)),
            None => {
                return Err(ExecutorError::Unavailable(
                    "Container exited without a status".to_string(),
                ))
            }
        };
        let duration_ms = started.elapsed().as_millis() as u64;
        let (stdout, stderr) = self.collect_logs(&container.id).await?;

        Ok(ExecutionResult {
            stdout,
            stderr,
            exit_status: exit_code as i32,
            duration_ms,
        })
    }
}
