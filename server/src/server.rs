use std::io;

use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};

use crate::config::Config;
use crate::handlers::root;
use crate::server_state::ServerState;

pub fn cors(origin: Option<&str>) -> Cors {
    match origin {
        Some(origin) => Cors::default()
            .allowed_origin(origin)
            .allow_any_method()
            .allow_any_header()
            .supports_credentials()
            .max_age(3600),
        None => Cors::permissive(),
    }
}

pub async fn run(config: Config) -> io::Result<()> {
    let state = ServerState::from_config(&config)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;
    let state = web::Data::new(state);
    let cors_origin = config.cors_origin.clone();

    log::info!("Listening on {}", config.bind_addr);
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(cors(cors_origin.as_deref()))
            .wrap(Logger::default())
            .configure(root)
    })
    .bind(&config.bind_addr)?
    .run()
    .await
}
