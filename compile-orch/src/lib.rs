//! # Compile Orchestrator
//!
//! Orchestration glue around an external, pre-built compiler executable.
//! Each compile request gets its own uniquely named working directory
//! under the system temp root, the compiler runs against it under a hard
//! wall-clock timeout, and the generated assembly artifact is collected
//! before the directory is torn down. The directory never outlives the
//! request that created it.

mod error;
mod orchestrator;
mod service;
mod session;
mod types;

pub use error::Error;
pub use orchestrator::CompileOrchestrator;
pub use service::CompileService;
pub use session::Session;
pub use types::{default_compiler_path, CompilerConfig, ASM_EXTENSION, SOURCE_FILE_NAME};

/// Result type for orchestration operations
pub type Result<T> = std::result::Result<T, Error>;
