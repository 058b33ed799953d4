use std::env;

use actix_web::{web, App, HttpServer};
use env_logger::Builder;
use log::{info, LevelFilter};

use twitter_api::db::AppState;
use twitter_api::handlers;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    Builder::new()
        .filter_level(LevelFilter::Debug)
        .format_timestamp_secs()
        .init();

    info!("Starting Twitter API backend...");

    let data_dir = env::var("TWITTER_API_DATA_DIR").unwrap_or_else(|_| "data".to_string());
    let bind_addr = env::var("TWITTER_API_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());

    let state = web::Data::new(AppState::open(&data_dir));
    info!("Serving collections from {data_dir}");

    // Start HTTP server
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(handlers::routes)
    })
    .bind(bind_addr.as_str())?
    .run()
    .await
}
