use std::path::PathBuf;
use thiserror::Error;

/// Failure taxonomy for a compile run.
///
/// Every variant is reported to the caller as a structured failure; none
/// is fatal to the long-lived server process.
#[derive(Error, Debug)]
pub enum Error {
    #[error("compilation timed out after {0} seconds")]
    Timeout(u64),

    #[error("compiler not found; copy the compiler executable to: {}", .0.display())]
    CompilerMissing(PathBuf),

    #[error("no assembly output was produced; stdout: {stdout} stderr: {stderr}")]
    NoArtifact { stdout: String, stderr: String },

    #[error("system error: {0}")]
    System(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
