//! The `gambit` server binary.

mod cli;
mod telemetry;

use std::time::Duration;

use clap::Parser;
use cli::Cli;
use gambit::prelude::*;

#[tokio::main]
async fn main() -> Result<(), GambitError> {
    let cli = Cli::parse();
    telemetry::init_tracing(cli.log_format);

    let rules = match cli.start_fen.as_deref() {
        Some(fen) => ChessRules::from_fen(fen)?,
        None => ChessRules::new(),
    };

    let server = GambitServer::builder()
        .bind(&cli.bind)
        .idle_timeout(Duration::from_secs(cli.idle_timeout_secs))
        .heartbeat_interval(Duration::from_secs(cli.heartbeat_secs))
        .build(rules)
        .await?;
    tracing::info!(addr = %server.local_addr()?, "gambit ready");

    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
            }
        })
        .await
}
