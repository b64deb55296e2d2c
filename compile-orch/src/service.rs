use std::path::Path;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, error, info};

use crate::{error::Error, orchestrator::CompileOrchestrator, types::CompilerConfig};

/// Shared handle over the orchestrator, gated by an admission semaphore.
///
/// The reference deployment runs with a single permit, so requests are
/// processed one at a time. Per-session directories keep compiles
/// data-isolated by construction if more permits are granted.
#[derive(Clone)]
pub struct CompileService {
    orchestrator: Arc<CompileOrchestrator>,
    semaphore: Arc<Semaphore>,
}

impl CompileService {
    pub fn new(config: CompilerConfig, max_concurrent_compiles: usize) -> Self {
        Self {
            orchestrator: Arc::new(CompileOrchestrator::new(config)),
            semaphore: Arc::new(Semaphore::new(max_concurrent_compiles)),
        }
    }

    pub async fn compile(&self, source: &str) -> Result<String, Error> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|e| Error::System(format!("failed to acquire compile permit: {e}")))?;

        debug!("starting compile run");
        let result = self.orchestrator.compile(source).await;
        match &result {
            Ok(assembly) => info!("compile succeeded ({} bytes of assembly)", assembly.len()),
            Err(e) => error!("compile failed: {e}"),
        }
        result
    }

    pub fn compiler_path(&self) -> &Path {
        self.orchestrator.compiler_path()
    }

    pub fn compiler_exists(&self) -> bool {
        self.orchestrator.compiler_exists()
    }

    pub fn available_slots(&self) -> usize {
        self.semaphore.available_permits()
    }
}
