use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use env_logger::Env;
use log::{info, warn};
use std::io;

use patient_records::api;
use patient_records::app_state::AppState;
use patient_records::config::{AppConfig, LoggingConfig};

/// log4rs from the configured file, env_logger when that file is unusable
fn init_logging(logging: &LoggingConfig) {
    if let Err(e) = log4rs::init_file(&logging.config_file, Default::default()) {
        env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
        warn!("Could not load log config {} ({}), logging to stderr", logging.config_file, e);
    }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    let config = AppConfig::load().map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;
    init_logging(&config.logging);

    let app_state = AppState::from_config(config.clone())
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
    let app_state = web::Data::new(app_state);
    let max_payload_size = config.server.max_payload_size;

    info!("Starting server on {}:{}", config.server.host, config.server.port);
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(Cors::permissive())
            .app_data(app_state.clone())
            .app_data(web::PayloadConfig::default().limit(max_payload_size))
            .configure(api::configure)
    })
    .workers(config.server.workers)
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
