//! orbitext desktop viewer.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use orbitext::viewer::{self, remote::DEFAULT_STORE_URL, ViewerOptions};

#[derive(Parser, Debug)]
#[command(author, version, about = "Orbiting text labels")]
struct Args {
    /// Settings file, created on first save
    #[arg(long, env = "ORBITEXT_SETTINGS", default_value = "orbitext.json")]
    settings: PathBuf,

    /// Text store base URL
    #[arg(long, env = "TEXT_STORE_URL", default_value = DEFAULT_STORE_URL)]
    store_url: String,

    /// Run without the text store panel
    #[arg(long)]
    offline: bool,

    /// Seed for label placement
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    tracing::info!("settings file: {}", args.settings.display());

    viewer::run(ViewerOptions {
        settings_path: args.settings,
        store_url: (!args.offline).then_some(args.store_url),
        seed: args.seed,
    })
}
