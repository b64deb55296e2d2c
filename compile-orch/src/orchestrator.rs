use std::path::Path;
use std::process::Stdio;
use tokio::{fs, process::Command, time};
use tracing::{info, warn};

use crate::{
    error::Error,
    session::Session,
    types::{CompilerConfig, ASM_EXTENSION},
};

struct CapturedOutput {
    stdout: String,
    stderr: String,
}

/// Runs the external compiler against per-request session directories.
///
/// The compiler's exit code is deliberately not inspected: the only
/// success signal is the presence of a recognized assembly artifact in
/// the session directory.
pub struct CompileOrchestrator {
    config: CompilerConfig,
}

impl CompileOrchestrator {
    pub fn new(config: CompilerConfig) -> Self {
        Self { config }
    }

    /// Path of the configured compiler executable.
    pub fn compiler_path(&self) -> &Path {
        &self.config.compiler_path
    }

    /// Whether the configured compiler executable is present on disk.
    pub fn compiler_exists(&self) -> bool {
        self.config.compiler_path.exists()
    }

    /// Compile one source text and return the generated assembly.
    ///
    /// The session directory is removed before this returns, whichever
    /// path is taken.
    pub async fn compile(&self, source: &str) -> Result<String, Error> {
        let session = Session::create().await?;
        self.compile_in(session, source).await
    }

    /// The session guard is owned here, so it is dropped (and its
    /// directory removed) on every return path, early `?` returns
    /// included.
    async fn compile_in(&self, session: Session, source: &str) -> Result<String, Error> {
        info!("compiling in session {}", session.id());

        fs::write(session.source_path(), source).await?;

        let output = self.run_compiler(&session).await?;

        if !output.stdout.is_empty() {
            info!("compiler stdout: {}", output.stdout.trim_end());
        }
        if !output.stderr.is_empty() {
            warn!("compiler stderr: {}", output.stderr.trim_end());
        }

        match session.find_artifact(ASM_EXTENSION).await? {
            Some(path) => {
                let assembly = fs::read_to_string(&path).await?;
                info!("generated {} bytes of assembly", assembly.len());
                Ok(assembly)
            }
            None => Err(Error::NoArtifact {
                stdout: output.stdout,
                stderr: output.stderr,
            }),
        }
    }

    async fn run_compiler(&self, session: &Session) -> Result<CapturedOutput, Error> {
        let child = Command::new(&self.config.compiler_path)
            .arg(session.source_path())
            .current_dir(&session.root_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // Dropping the wait future on timeout kills the child.
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    Error::CompilerMissing(self.config.compiler_path.clone())
                } else {
                    Error::Io(e)
                }
            })?;

        let output = match time::timeout(self.config.timeout, child.wait_with_output()).await {
            Ok(output) => output?,
            Err(_) => return Err(Error::Timeout(self.config.timeout.as_secs())),
        };

        Ok(CapturedOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::{Duration, Instant};

    fn fake_compiler(dir: &Path, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("compiler");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        let mut perms = std::fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();
        path
    }

    fn orchestrator(compiler: PathBuf, timeout_secs: u64) -> CompileOrchestrator {
        CompileOrchestrator::new(CompilerConfig::new(
            compiler,
            Duration::from_secs(timeout_secs),
        ))
    }

    /// The fake compiler records its working directory into `marker` so
    /// tests can check the session directory is gone afterwards.
    fn session_dir_from(marker: &Path) -> PathBuf {
        PathBuf::from(std::fs::read_to_string(marker).unwrap().trim())
    }

    #[tokio::test]
    async fn returns_artifact_contents_unmodified() {
        let dir = tempfile::tempdir().unwrap();
        let compiler = fake_compiler(
            dir.path(),
            r#"printf '.globl main\nmain:\n  ret\n' > prog.s"#,
        );

        let asm = orchestrator(compiler, 5)
            .compile("fn main() {}")
            .await
            .unwrap();
        assert_eq!(asm, ".globl main\nmain:\n  ret\n");
    }

    #[tokio::test]
    async fn session_directory_removed_after_success() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("cwd.txt");
        let compiler = fake_compiler(
            dir.path(),
            &format!("pwd > {}\ntouch prog.s", marker.display()),
        );

        orchestrator(compiler, 5).compile("fn main() {}").await.unwrap();
        assert!(!session_dir_from(&marker).exists());
    }

    #[tokio::test]
    async fn session_directory_removed_when_no_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("cwd.txt");
        let compiler = fake_compiler(
            dir.path(),
            &format!("pwd > {}\nexit 1", marker.display()),
        );

        let result = orchestrator(compiler, 5).compile("garbage").await;
        assert!(matches!(result, Err(Error::NoArtifact { .. })));
        assert!(!session_dir_from(&marker).exists());
    }

    #[tokio::test]
    async fn session_directory_removed_after_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("cwd.txt");
        let compiler = fake_compiler(
            dir.path(),
            &format!("pwd > {}\nsleep 30", marker.display()),
        );

        let result = orchestrator(compiler, 1).compile("fn main() {}").await;
        assert!(matches!(result, Err(Error::Timeout(1))));
        assert!(!session_dir_from(&marker).exists());
    }

    #[tokio::test]
    async fn session_directory_removed_when_compiler_missing() {
        let session = Session::create().await.unwrap();
        let root_dir = session.root_dir.clone();

        let result = orchestrator(PathBuf::from("/nonexistent/compiler"), 5)
            .compile_in(session, "fn main() {}")
            .await;
        assert!(matches!(result, Err(Error::CompilerMissing(_))));
        assert!(!root_dir.exists());
    }

    #[tokio::test]
    async fn timeout_is_enforced_within_budget() {
        let dir = tempfile::tempdir().unwrap();
        let compiler = fake_compiler(dir.path(), "sleep 30");

        let started = Instant::now();
        let result = orchestrator(compiler, 1).compile("fn main() {}").await;
        assert!(matches!(result, Err(Error::Timeout(_))));
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn missing_compiler_reports_expected_path() {
        let expected = PathBuf::from("/nonexistent/path/to/compiler");
        let result = orchestrator(expected.clone(), 5).compile("fn main() {}").await;

        match result {
            Err(Error::CompilerMissing(path)) => assert_eq!(path, expected),
            other => panic!("expected CompilerMissing, got {other:?}"),
        }
        let message = orchestrator(expected.clone(), 5)
            .compile("fn main() {}")
            .await
            .unwrap_err()
            .to_string();
        assert!(message.contains("/nonexistent/path/to/compiler"));
    }

    #[tokio::test]
    async fn no_artifact_error_carries_both_streams() {
        let dir = tempfile::tempdir().unwrap();
        let compiler = fake_compiler(dir.path(), "echo building; echo broken >&2");

        let err = orchestrator(compiler, 5)
            .compile("garbage")
            .await
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("building"));
        assert!(message.contains("broken"));
    }

    #[tokio::test]
    async fn exit_code_is_ignored_when_artifact_exists() {
        let dir = tempfile::tempdir().unwrap();
        let compiler = fake_compiler(dir.path(), "echo 'ret' > prog.s\nexit 7");

        let asm = orchestrator(compiler, 5)
            .compile("fn main() {}")
            .await
            .unwrap();
        assert_eq!(asm, "ret\n");
    }
}
