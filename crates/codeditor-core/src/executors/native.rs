//! Executes source through toolchains installed on the host.
//
// Each language maps to a toolchain that knows how to name the script file and
// build the command. Scripts live in a throwaway temp dir per run.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Instant;
use tempfile::Builder;
use tokio::fs;
use tokio::process::Command;
use which::which;

use super::{CodeExecutor, ExecutionRequest, ExecutionResult};
use crate::errors::ExecutorError;
use crate::registry::LanguageId;

// ----------------- Toolchains -----------------

trait Toolchain: Send + Sync {
    /// Executables tried in order on PATH.
    fn candidates(&self) -> &'static [&'static str];
    fn script_name(&self) -> &'static str;
    fn commands(&self, tool: &Path, script: &Path, dir: &Path) -> Vec<Command>;
}

struct Interpreter {
    candidates: &'static [&'static str],
    script_name: &'static str,
}

impl Toolchain for Interpreter {
    fn candidates(&self) -> &'static [&'static str] {
        self.candidates
    }

    fn script_name(&self) -> &'static str {
        self.script_name
    }

    fn commands(&self, tool: &Path, script: &Path, _dir: &Path) -> Vec<Command> {
        let mut cmd = Command::new(tool);
        cmd.arg(script);
        vec![cmd]
    }
}

struct CppCompiler;

impl Toolchain for CppCompiler {
    fn candidates(&self) -> &'static [&'static str] {
        &["g++", "clang++"]
    }

    fn script_name(&self) -> &'static str {
        "main.cpp"
    }

    fn commands(&self, tool: &Path, script: &Path, dir: &Path) -> Vec<Command> {
        let binary = dir.join("main");
        let mut compile = Command::new(tool);
        compile.arg("-std=c++17").arg("-o").arg(&binary).arg(script);
        vec![compile, Command::new(binary)]
    }
}

fn toolchain_for(language: LanguageId) -> Option<Box<dyn Toolchain>> {
    match language {
        LanguageId::Javascript => Some(Box::new(Interpreter {
            candidates: &["node", "nodejs"],
            script_name: "main.js",
        })),
        LanguageId::Python => Some(Box::new(Interpreter {
            candidates: &["python3", "python"],
            script_name: "main.py",
        })),
        // Single-file source launch, available since JDK 11.
        LanguageId::Java => Some(Box::new(Interpreter {
            candidates: &["java"],
            script_name: "Main.java",
        })),
        LanguageId::Typescript => Some(Box::new(Interpreter {
            candidates: &["tsx", "ts-node"],
            script_name: "main.ts",
        })),
        LanguageId::Cpp => Some(Box::new(CppCompiler)),
        LanguageId::Html | LanguageId::Css | LanguageId::Json => None,
    }
}

// ----------------- NativeCodeExecutor -----------------

#[derive(Debug, Clone, Default)]
pub struct NativeCodeExecutor {
    work_dir: Option<PathBuf>,
}

impl NativeCodeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parent directory for per-run scratch dirs, the system temp dir otherwise.
    pub fn with_work_dir(mut self, work_dir: PathBuf) -> Self {
        self.work_dir = Some(work_dir);
        self
    }

    /// Whether a toolchain for `language` can be found on PATH.
    pub fn is_available(language: LanguageId) -> bool {
        toolchain_for(language)
            .map(|toolchain| find_tool(toolchain.candidates()).is_some())
            .unwrap_or(false)
    }

    async fn run_step(mut cmd: Command, dir: &Path) -> Result<Output, ExecutorError> {
        cmd.current_dir(dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        Ok(cmd.output().await?)
    }
}

fn find_tool(candidates: &[&str]) -> Option<PathBuf> {
    candidates.iter().find_map(|tool| which(tool).ok())
}

#[async_trait]
impl CodeExecutor for NativeCodeExecutor {
    fn name(&self) -> &'static str {
        "native"
    }

    async fn execute_code(
        &self,
        request: &ExecutionRequest,
    ) -> Result<ExecutionResult, ExecutorError> {
        let toolchain = toolchain_for(request.language)
            .ok_or(ExecutorError::UnsupportedLanguage(request.language))?;
        let tool = find_tool(toolchain.candidates()).ok_or_else(|| {
            ExecutorError::Unavailable(format!(
                "no {} toolchain found on PATH (tried {})",
                request.language,
                toolchain.candidates().join(", ")
            ))
        })?;

        let mut builder = Builder::new();
        builder.prefix("codeditor-run-");
        let temp_dir = match &self.work_dir {
            Some(dir) => builder.tempdir_in(dir)?,
            None => builder.tempdir()?,
        };
        let script = temp_dir.path().join(toolchain.script_name());
        fs::write(&script, request.content.as_bytes()).await?;

        let started = Instant::now();
        let mut stdout = String::new();
        let mut stderr = String::new();
        let mut exit_status = 0;

        for cmd in toolchain.commands(&tool, &script, temp_dir.path()) {
            let output = Self::run_step(cmd, temp_dir.path()).await?;
            stdout.push_str(&String::from_utf8_lossy(&output.stdout));
            stderr.push_str(&String::from_utf8_lossy(&output.stderr));
            // Killed by a signal: no exit code.
            exit_status = output.status.code().unwrap_or(-1);
            if exit_status != 0 {
                break;
            }
        }

        Ok(ExecutionResult {
            stdout,
            stderr,
            exit_status,
            duration_ms: started.elapsed().as_millis() as u64,
        })
    }
}
