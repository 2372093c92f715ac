//! Task board server with realtime team and per-user events.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin taskboard-server
//! cargo run --bin taskboard-server -- --host 0.0.0.0 --port 3000
//! JWT_SECRET=change-me OPENAI_API_KEY=sk-... cargo run --bin taskboard-server
//! ```

use clap::Parser;
use taskboard_server::{config::ServerConfig, ui::Server};
use taskboard_shared::logger::setup_logger;

#[tokio::main]
async fn main() {
    let config = ServerConfig::parse();

    // Initialize tracing
    setup_logger(&["taskboard_server"], env!("CARGO_BIN_NAME"), &config.log_level);

    let server = match Server::from_config(&config) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Failed to initialize server: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run(config.host.clone(), config.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
