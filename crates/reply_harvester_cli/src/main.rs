mod app;
mod args;
mod progress;

use std::process::ExitCode;

use clap::Parser;
use harvest_logging::{harvest_error, harvest_warn};
use tokio_util::sync::CancellationToken;

use crate::args::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    harvest_logging::initialize(cli.log_destination(), cli.log_level());

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            harvest_warn!("Interrupted; finishing with the posts collected so far");
            interrupt.cancel();
        }
    });

    match app::run(&cli, cancel).await {
        Ok(summary) => {
            println!("{summary}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            harvest_error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}
