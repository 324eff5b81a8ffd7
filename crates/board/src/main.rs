use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sportsync_board::config::BoardConfig;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sportsync_board=info,sportsync_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // --- Configuration ---
    let config = BoardConfig::from_env();
    tracing::info!(
        api_url = %config.client.api_url,
        filter = %config.filter,
        "Loaded board configuration"
    );

    match sportsync_board::run(&config).await {
        Ok(board) => print!("{board}"),
        Err(e) => {
            tracing::error!(error = %e, "Failed to build session board");
            std::process::exit(1);
        }
    }
}
