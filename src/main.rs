use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use log::{error, info};
use reqwest::Client;

use huddle_be::config::{GatewayConfig, ServerConfig};
use huddle_be::gateway::SupabaseGateway;
use huddle_be::{configure, AppState};

fn mask_key(k: &str) -> String {
    if k.len() <= 8 {
        "[REDACTED]".to_string()
    } else {
        format!("{}***{}", &k[..4], &k[k.len() - 4..])
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init();
    dotenv::dotenv().ok();

    let gateway_config = match GatewayConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("invalid gateway configuration: {:#}", e);
            std::process::exit(1);
        }
    };
    let server_config = ServerConfig::from_env();

    info!("Gateway URL: {}", gateway_config.base_url);
    info!("Gateway key: {}", mask_key(&gateway_config.service_role_key));

    let http_client = Client::builder()
        .user_agent("huddle-be/0.1")
        .build()
        .expect("failed to build http client");

    let gateway = SupabaseGateway::new(&gateway_config, http_client);
    let state = web::Data::new(AppState::new(gateway));

    let allowed_origins = server_config.allowed_origins.clone();
    info!("Starting server on {}", server_config.bind_address);

    HttpServer::new(move || {
        let mut cors = Cors::default()
            .allowed_methods(vec!["GET", "POST", "OPTIONS"])
            .allowed_headers(vec![
                "authorization",
                "content-type",
                "accept",
                "x-requested-with",
            ])
            .supports_credentials()
            .max_age(3600);

        for origin in allowed_origins
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
        {
            cors = cors.allowed_origin(origin);
        }

        App::new()
            .wrap(cors)
            .wrap(Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind(&server_config.bind_address)?
    .run()
    .await
}
