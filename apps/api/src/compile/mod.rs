//! Typesetting of generated documents through an external LaTeX engine.

pub mod fallback;

use std::{
    path::{Path, PathBuf},
    process::Stdio,
    time::Duration,
};

use async_trait::async_trait;
use serde::Serialize;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::errors::AppError;

/// Time allowed for `--version` when probing the engine.
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);
/// Log lines kept in a compilation error.
const LOG_EXCERPT_LINES: usize = 3;

#[derive(Debug, Clone, Serialize)]
pub struct CompilerStatus {
    pub program: String,
    pub available: bool,
    pub detail: Option<String>,
}

/// Turns a `.tex` file into a PDF next to it.
#[async_trait]
pub trait DocumentCompiler: Send + Sync {
    /// Compiles `source` inside its own directory and returns the PDF path.
    async fn compile(&self, source: &Path) -> Result<PathBuf, AppError>;

    /// Checks that the engine can be run at all.
    async fn probe(&self) -> CompilerStatus;

    async fn compile_with_timeout(
        &self,
        source: &Path,
        limit: Duration,
    ) -> Result<PathBuf, AppError> {
        match tokio::time::timeout(limit, self.compile(source)).await {
            Ok(result) => result,
            Err(_) => Err(AppError::Compilation(format!(
                "compilation timed out after {}s",
                limit.as_secs()
            ))),
        }
    }
}

/// Runs `<program> -interaction=nonstopmode <file>` with the source directory as
/// working directory, so relative `\input` paths and the class file resolve.
#[derive(Debug, Clone)]
pub struct XelatexCompiler {
    program: String,
}

impl XelatexCompiler {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    fn spawn_error(&self, e: std::io::Error) -> AppError {
        if e.kind() == std::io::ErrorKind::NotFound {
            AppError::Configuration(format!("{} is not installed or not in PATH", self.program))
        } else {
            AppError::FileSystem(e)
        }
    }
}

#[async_trait]
impl DocumentCompiler for XelatexCompiler {
    async fn compile(&self, source: &Path) -> Result<PathBuf, AppError> {
        let dir = source
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let file_name = source
            .file_name()
            .ok_or_else(|| AppError::Template(format!("not a file: {}", source.display())))?;

        info!("Compiling {} with {}", source.display(), self.program);
        let output = self
            .command()
            .arg("-interaction=nonstopmode")
            .arg(file_name)
            .current_dir(dir)
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;
        debug!("{} exited with {}", self.program, output.status);

        // The engine may exit non-zero on recoverable warnings; the PDF is what counts.
        let pdf = source.with_extension("pdf");
        if pdf.is_file() {
            return Ok(pdf);
        }

        let details = log_excerpt(&source.with_extension("log")).await.unwrap_or_default();
        warn!("No PDF produced for {}", source.display());
        Err(AppError::Compilation(details))
    }

    async fn probe(&self) -> CompilerStatus {
        let run = self.command().arg("--version").output();
        let (available, detail) = match tokio::time::timeout(PROBE_TIMEOUT, run).await {
            Ok(Ok(output)) if output.status.success() => {
                let version = String::from_utf8_lossy(&output.stdout)
                    .lines()
                    .next()
                    .map(str::to_string);
                (true, version)
            }
            Ok(Ok(_)) => (false, Some(format!("{} is not working properly", self.program))),
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => (
                false,
                Some(format!("{} is not installed or not in PATH", self.program)),
            ),
            Ok(Err(e)) => (false, Some(format!("Error checking {}: {e}", self.program))),
            Err(_) => (false, Some(format!("{} --version timed out", self.program))),
        };

        CompilerStatus {
            program: self.program.clone(),
            available,
            detail,
        }
    }
}

/// Last error lines of a LaTeX log, or `None` if the log is missing or has none.
pub async fn log_excerpt(log_path: &Path) -> Option<String> {
    let bytes = tokio::fs::read(log_path).await.ok()?;
    let content = String::from_utf8_lossy(&bytes);
    let errors: Vec<&str> = content
        .lines()
        .filter(|line| {
            line.contains("Error:") || line.contains('!') || line.contains("Fatal error")
        })
        .map(str::trim)
        .collect();
    if errors.is_empty() {
        return None;
    }
    let start = errors.len().saturating_sub(LOG_EXCERPT_LINES);
    Some(errors[start..].join("\n"))
}
