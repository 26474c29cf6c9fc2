use actix_web::{web, App, HttpServer};
use log::{error, info};

mod clients;
mod config;
mod error;
mod game;
mod models;
mod routes;
mod websocket;

use crate::clients::analysis::AnalysisClient;
use crate::config::Config;
use crate::models::AppState;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = Config::from_env();
    let analysis = AnalysisClient::new(&config.analysis_api_base, config.analysis_timeout)
        .map_err(|e| {
            error!("Failed to build analysis client: {}", e);
            std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
        })?;

    let (host, port) = config.bind_address();
    info!("Starting chess decision support server at http://{}:{}", host, port);
    info!("Analysis service: {}", analysis.base_url());

    // Create shared application state
    let static_dir = config.static_dir.clone();
    let app_state = web::Data::new(AppState::new(config, analysis));

    // Start HTTP server
    HttpServer::new(move || {
        let static_dir = static_dir.clone();
        App::new()
            .app_data(app_state.clone())
            .configure(move |cfg| routes::configure_routes(cfg, &static_dir))
    })
    .bind((host, port))?
    .run()
    .await
}
