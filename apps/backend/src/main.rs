use std::time::Duration;

use actix_web::{web, App, HttpServer};
use cah_backend::chain::ChainGateway;
use cah_backend::config::Config;
use cah_backend::domain::TimerConfig;
use cah_backend::extractors::validated_json::BodyLimit;
use cah_backend::infra::state::build_state;
use cah_backend::middleware::cors::cors_middleware;
use cah_backend::middleware::request_trace::RequestTrace;
use cah_backend::middleware::structured_logger::StructuredLogger;
use cah_backend::middleware::trace_span::TraceSpan;
use cah_backend::routes;

mod telemetry;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    telemetry::init_tracing();

    // Environment variables must be set by the runtime environment:
    // - Docker: Set via docker-compose env_file or docker run --env-file
    // - Local dev: Source env files manually (e.g., set -a; . ./.env; set +a)
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Invalid configuration: {e}");
            std::process::exit(1);
        }
    };
    let timers = match TimerConfig::from_env() {
        Ok(timers) => timers,
        Err(e) => {
            eprintln!("❌ Invalid round timers: {e}");
            std::process::exit(1);
        }
    };

    let mut builder = build_state().with_config(&config).with_timers(timers);
    builder = match &config.redis_url {
        Some(url) => builder.with_redis(url.clone()),
        None => builder.with_memory_store(),
    };
    if let Some(base_url) = &config.chain_gateway_url {
        let timeout = Duration::from_millis(config.gateway_timeout_ms);
        match ChainGateway::new(base_url, &config.game_address, timeout) {
            Ok(gateway) => builder = builder.with_gateway(gateway),
            Err(e) => {
                eprintln!("❌ Failed to set up chain gateway: {e}");
                std::process::exit(1);
            }
        }
    }

    let app_state = match builder.build().await {
        Ok(state) => state,
        Err(e) => {
            eprintln!("❌ Failed to build application state: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(
        host = %config.host,
        port = config.port,
        redis = config.redis_url.is_some(),
        gateway = config.chain_gateway_url.is_some(),
        rounds = timers.rounds_total,
        "starting CAH backend"
    );

    let data = web::Data::new(app_state);
    let origins = config.cors_allowed_origins.clone();
    let json_limit = config.max_json_payload_size;

    HttpServer::new(move || {
        App::new()
            .wrap(cors_middleware(&origins))
            .wrap(StructuredLogger)
            .wrap(TraceSpan)
            .wrap(RequestTrace)
            .app_data(data.clone())
            .app_data(BodyLimit(json_limit))
            .configure(routes::configure)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
