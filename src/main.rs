use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use env_logger::Env;
use log::{error, info};

use travelflow_api::config::AppConfig;
use travelflow_api::routes;
use travelflow_api::state::AppState;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if cfg!(debug_assertions) {
        dotenv::dotenv().ok();
    }

    env_logger::init_from_env(Env::default().default_filter_or("info"));
    info!("TravelFlow API starting...");

    let config = AppConfig::from_env();
    let (host, port) = (config.host.clone(), config.port);
    let jwt_secret = config.jwt_secret.clone();

    let state = match AppState::from_config(config).await {
        Ok(state) => web::Data::new(state),
        Err(e) => {
            error!("Startup failed: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::Other, e));
        }
    };
    info!(
        "Using {} storage, binding to {}:{}",
        state.repository.backend(),
        host,
        port
    );

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .app_data(state.clone())
            .configure(|cfg| routes::configure(cfg, &jwt_secret))
    })
    .bind((host, port))?
    .run()
    .await
}
