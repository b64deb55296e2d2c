use clap::Parser;
use compile_orch::{default_compiler_path, CompileService, CompilerConfig};
use compile_orch_server::{create_app, run_server};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to listen on
    #[arg(short, long, default_value = "127.0.0.1:5002")]
    addr: SocketAddr,

    /// Path to the external compiler executable (default: `compiler`
    /// next to the server binary)
    #[arg(long)]
    compiler_path: Option<PathBuf>,

    /// Wall-clock timeout for a single compile, in seconds
    #[arg(long, default_value = "10")]
    timeout: u64,

    /// Maximum number of compiles processed at once
    #[arg(long, default_value = "1")]
    max_concurrent: usize,

    /// Directory holding the pre-built front-end assets
    #[arg(long, default_value = "static")]
    assets_dir: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let config = CompilerConfig::new(
        args.compiler_path.unwrap_or_else(default_compiler_path),
        Duration::from_secs(args.timeout),
    );

    info!("compiler path: {}", config.compiler_path.display());
    if config.compiler_path.exists() {
        info!("compiler executable found");
    } else {
        warn!(
            "compiler executable missing; copy it to {} before compiling",
            config.compiler_path.display()
        );
    }

    let service = CompileService::new(config, args.max_concurrent);
    let app = create_app(service, args.assets_dir);
    run_server(app, args.addr).await?;

    Ok(())
}
