use std::path::PathBuf;
use std::time::Duration;

/// Fixed name of the input file written into each session directory.
pub const SOURCE_FILE_NAME: &str = "prog.rs";

/// Filename suffix that marks a recognized compilation artifact.
pub const ASM_EXTENSION: &str = "s";

/// Configuration for the external compiler, fixed at startup and passed
/// into the orchestrator at construction time.
#[derive(Debug, Clone)]
pub struct CompilerConfig {
    /// Path of the external compiler executable
    pub compiler_path: PathBuf,
    /// Wall-clock budget for a single compiler run
    pub timeout: Duration,
}

impl CompilerConfig {
    pub fn new(compiler_path: PathBuf, timeout: Duration) -> Self {
        Self {
            compiler_path,
            timeout,
        }
    }
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            compiler_path: default_compiler_path(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// `compiler` next to the running executable, falling back to a bare
/// relative path when the executable location is unavailable.
pub fn default_compiler_path() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("compiler")))
        .unwrap_or_else(|| PathBuf::from("compiler"))
}
