use clap::Parser;

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "+", env!("BUILD_NUMBER"));

#[derive(Parser, Debug)]
#[command(name = "bdw", version = VERSION, about = "Build Deployment Watcher TUI")]
pub struct Cli {
    /// Base URL of the build-management service
    #[arg(short, long, default_value = "http://localhost:8000")]
    pub url: String,

    /// Show only builds for this repository (owner/repo)
    #[arg(short, long)]
    pub repo: Option<String>,

    /// Builds-list poll interval in seconds
    #[arg(short, long, default_value_t = 10)]
    pub interval: u64,
}
