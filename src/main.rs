// src/main.rs
mod api;
mod config;
mod geometry;
mod layout;
mod maxrects;
mod model;
mod types;

use config::AppConfig;

#[tokio::main]
async fn main() {
    if let Err(err) = dotenvy::dotenv() {
        if !matches!(err, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
        {
            eprintln!("⚠️ Could not load .env: {}", err);
        }
    }

    let app_config = AppConfig::from_env();
    let api_config = app_config.api.clone();
    let calculator_config = app_config.calculator.clone();

    println!("🚀 Pallet layout service starting...");
    api::start_api_server(api_config, calculator_config).await;
}
