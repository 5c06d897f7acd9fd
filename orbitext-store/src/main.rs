use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use orbitext_store::{router, AppState, FsStore, MemoryStore};

#[derive(Parser, Debug)]
#[command(author, version, about = "Text store for the orbitext viewer")]
struct Args {
    /// Address to listen on
    #[arg(long, env = "TEXT_STORE_ADDR", default_value = "127.0.0.1:8080")]
    addr: SocketAddr,

    /// Bucket holding the text object
    #[arg(long, env = "OSS_BUCKET", default_value = "orbitext")]
    bucket: String,

    /// Directory of the text object inside the bucket
    #[arg(long, env = "OSS_DIRECTORY", default_value = "3dtext")]
    directory: String,

    /// Keep objects under this directory; in memory when unset
    #[arg(long, env = "TEXT_STORE_ROOT")]
    root: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let state = match &args.root {
        Some(root) => {
            if let Err(err) = tokio::fs::create_dir_all(root).await {
                warn!("failed to create store root: {err}");
            }
            info!("storing objects under {}", root.display());
            AppState::new(FsStore::new(root), &args.bucket, &args.directory)
        }
        None => {
            warn!("TEXT_STORE_ROOT not set, text is kept in memory");
            AppState::new(MemoryStore::new(), &args.bucket, &args.directory)
        }
    };
    info!("object key {}/{}", state.bucket(), state.key());

    let app = router(state);

    info!("text store listening on http://{}", args.addr);
    let listener = tokio::net::TcpListener::bind(args.addr).await?;
    axum::serve(listener, app).await
}
