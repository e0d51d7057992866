//! Terminal chat client for DevNet.
//!
//! Run with:
//! ```not_rust
//! DEVNET_COOKIE="access_token=..." cargo run --bin devnet-client -- --to 2
//! ```

use clap::Parser;
use devnet_client::ui::Args;
use devnet_shared::logger::setup_logger;

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    if let Err(e) = devnet_client::run_client(args).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
