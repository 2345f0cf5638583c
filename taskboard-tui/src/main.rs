use std::path::PathBuf;

use clap::Parser;

mod client;
mod session;
mod store;
mod sync;
mod ui;

use client::ApiClient;
use session::SessionFile;
use store::Store;
use sync::TaskManager;

/// Terminal client for a taskboard server.
#[derive(Debug, Parser)]
#[command(name = "taskboard", version, about)]
struct Args {
    /// Base URL of the taskboard server.
    #[arg(long, env = "TASKBOARD_SERVER", default_value = "http://localhost:3000")]
    server: String,

    /// Where the signed-in session is kept. Defaults to the user state directory.
    #[arg(long, env = "TASKBOARD_SESSION")]
    session_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let session_path = match args.session_file {
        Some(path) => path,
        None => SessionFile::default_path()?,
    };

    let manager = TaskManager::new(ApiClient::new(args.server), Store::new());
    let app = ui::App::new(manager, SessionFile::new(session_path));

    ui::run_app(app).await?;

    Ok(())
}
