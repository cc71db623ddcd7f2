//! Palate Engine - Hybrid Food Recommendations
//!
//! Port: 8083
//! Latency target: <200ms recommendations

use actix_web::{web, App, HttpResponse, HttpServer};
use dining_gateway_core::config::{load_dotenv, ConfigLoader, ServiceConfig};
use tracing::info;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    load_dotenv();

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .json()
        .init();

    let config = ServiceConfig::from_env().unwrap_or_else(|error| {
        tracing::warn!(%error, "falling back to default service configuration");
        ServiceConfig::default()
    });

    info!("Starting Palate engine on port {}", config.port);

    HttpServer::new(|| App::new().route("/health", web::get().to(health_check)))
        .bind((config.host.clone(), config.port))?
        .run()
        .await
}

async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "palate-engine",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
