pub mod config;
pub mod models;
pub mod db;
pub mod sync; // Remote Mirror
pub mod validation;
pub mod stats;
pub mod services;

use tracing_subscriber::EnvFilter;

pub fn run() {
    // Initialize tracing; stdout is reserved for command output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let args: Vec<String> = std::env::args().skip(1).collect();
    match services::run_command(&config::AppConfig::from_env(), &args) {
        Ok(output) => println!("{output}"),
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            std::process::exit(1);
        }
    }
}
