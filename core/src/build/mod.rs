//! External build invocation
//!
//! The book builder is an opaque command-line tool (`gitbook` in
//! production). Contract: `init <path>`, `install <path>`, `build <path>`
//! and `pdf <path> <output>`; exit code 0 means success, anything else is
//! a failure whose stderr is surfaced verbatim. Invocations are bounded
//! by a timeout.

pub mod summary;

use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use futures::future::BoxFuture;
use thiserror::Error;
use tokio::fs;
use tokio::process::Command;
use tracing::info;

/// External tool errors
#[derive(Error, Debug)]
pub enum BuildError {
    /// Tool exited non-zero; stderr is passed through untouched
    #[error("{command} failed: {stderr}")]
    Failed { command: String, stderr: String },

    /// Tool did not finish within the configured bound
    #[error("{command} timed out after {timeout_secs}s")]
    TimedOut { command: String, timeout_secs: u64 },

    /// Tool binary could not be spawned at all
    #[error("Failed to run {command}: {source}")]
    Spawn { command: String, source: io::Error },

    /// Expected build artifact missing after a zero exit
    #[error("Build output not found at {0}")]
    MissingOutput(PathBuf),

    /// IO error while relocating build output
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Captured output of a successful invocation.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Wrapper around the external book-builder binary.
#[derive(Clone)]
pub struct BookBuilder {
    program: String,
    timeout: Duration,
}

impl BookBuilder {
    pub fn new(program: String, timeout: Duration) -> Self {
        Self { program, timeout }
    }

    /// `<tool> init <path>`
    pub async fn init(&self, path: &Path) -> Result<ToolOutput, BuildError> {
        self.run(&["init".as_ref(), path.as_os_str()], None).await
    }

    /// `<tool> install <path>`
    pub async fn install(&self, path: &Path) -> Result<ToolOutput, BuildError> {
        self.run(&["install".as_ref(), path.as_os_str()], None).await
    }

    /// `<tool> build <path>`
    pub async fn build(&self, path: &Path) -> Result<ToolOutput, BuildError> {
        self.run(&["build".as_ref(), path.as_os_str()], None).await
    }

    /// `<tool> pdf . <output>` from inside the project folder
    pub async fn pdf(&self, path: &Path, output: &Path) -> Result<ToolOutput, BuildError> {
        self.run(&["pdf".as_ref(), ".".as_ref(), output.as_os_str()], Some(path))
            .await
    }

    async fn run(
        &self,
        args: &[&std::ffi::OsStr],
        cwd: Option<&Path>,
    ) -> Result<ToolOutput, BuildError> {
        let command_line = std::iter::once(self.program.clone())
            .chain(args.iter().map(|a| a.to_string_lossy().into_owned()))
            .collect::<Vec<_>>()
            .join(" ");

        let mut cmd = Command::new(&self.program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }

        info!("Running {}", command_line);
        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(source)) => {
                return Err(BuildError::Spawn {
                    command: command_line,
                    source,
                })
            }
            Err(_) => {
                return Err(BuildError::TimedOut {
                    command: command_line,
                    timeout_secs: self.timeout.as_secs(),
                })
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        if !output.status.success() {
            return Err(BuildError::Failed {
                command: command_line,
                stderr,
            });
        }

        Ok(ToolOutput { stdout, stderr })
    }

    /// Move the tool's `_book` output from the project folder into the
    /// per-session target directory, replacing any previous build there.
    pub async fn relocate_book(
        &self,
        project: &Path,
        target_dir: &Path,
    ) -> Result<PathBuf, BuildError> {
        let source = project.join("_book");
        if !fs::try_exists(&source).await? {
            return Err(BuildError::MissingOutput(source));
        }

        fs::create_dir_all(target_dir).await?;
        let target = target_dir.join("_book");
        if fs::try_exists(&target).await? {
            fs::remove_dir_all(&target).await?;
        }

        // rename can cross a device boundary; fall back to copy + delete
        if fs::rename(&source, &target).await.is_err() {
            copy_dir(source.clone(), target.clone()).await?;
            fs::remove_dir_all(&source).await?;
        }

        Ok(target)
    }
}

fn copy_dir(source: PathBuf, target: PathBuf) -> BoxFuture<'static, io::Result<()>> {
    Box::pin(async move {
        fs::create_dir_all(&target).await?;
        let mut entries = fs::read_dir(&source).await?;
        while let Some(entry) = entries.next_entry().await? {
            let from = entry.path();
            let to = target.join(entry.file_name());
            if entry.file_type().await?.is_dir() {
                copy_dir(from, to).await?;
            } else {
                fs::copy(&from, &to).await?;
            }
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn zero_exit_is_success() {
        let builder = BookBuilder::new("true".to_string(), Duration::from_secs(5));
        let dir = TempDir::new().unwrap();
        builder.init(dir.path()).await.unwrap();
    }

    #[tokio::test]
    async fn non_zero_exit_surfaces_failure() {
        let builder = BookBuilder::new("false".to_string(), Duration::from_secs(5));
        let dir = TempDir::new().unwrap();
        let err = builder.build(dir.path()).await.unwrap_err();
        assert!(matches!(err, BuildError::Failed { .. }));
    }

    #[tokio::test]
    async fn missing_binary_is_a_spawn_error() {
        let builder = BookBuilder::new(
            "definitely-not-a-real-binary".to_string(),
            Duration::from_secs(5),
        );
        let dir = TempDir::new().unwrap();
        let err = builder.build(dir.path()).await.unwrap_err();
        assert!(matches!(err, BuildError::Spawn { .. }));
    }

    #[tokio::test]
    async fn relocate_replaces_previous_build() {
        let builder = BookBuilder::new("true".to_string(), Duration::from_secs(5));
        let project = TempDir::new().unwrap();
        let sessions = TempDir::new().unwrap();

        fs::create_dir_all(project.path().join("_book")).await.unwrap();
        fs::write(project.path().join("_book/index.html"), "new")
            .await
            .unwrap();
        fs::create_dir_all(sessions.path().join("_book")).await.unwrap();
        fs::write(sessions.path().join("_book/index.html"), "old")
            .await
            .unwrap();

        let target = builder
            .relocate_book(project.path(), sessions.path())
            .await
            .unwrap();
        let content = fs::read_to_string(target.join("index.html")).await.unwrap();
        assert_eq!(content, "new");
        assert!(!project.path().join("_book").exists());
    }
}
