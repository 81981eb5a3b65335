use hackbuddy::app;
use hackbuddy::config::Config;

/// Main entry point for the HackBuddy web server
///
/// Reads `HACKBUDDY_ADDR` / `HACKBUDDY_DATA_DIR` from the environment and
/// serves the spaces and JSON API. Logging follows `RUST_LOG`, `info` by default.
///
/// # Returns
/// * `Result<(), Box<dyn std::error::Error>>` - Success or error object
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::load();
    app::run(config).await
}
