mod db_types;
mod error;
mod handlers;
mod ingest;
mod quo_types;
mod store;
mod types;
mod utils;

use crate::store::PgStore;
use crate::types::AppState;

use axum::{
    routing::{get, post},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::env;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::prelude::*;

pub mod consts {
    pub const UNKNOWN_CALLER: &str = "Unknown";
    pub const CONTACTS_FALLBACK_LINK: &str = "/contacts";
    pub const PHONE_SUFFIX_LEN: usize = 10;
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let subscriber = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_file(true)
                .with_line_number(true),
        )
        .with(tracing_subscriber::filter::Targets::new().with_targets([
            ("hyper", tracing_subscriber::filter::LevelFilter::OFF),
            (
                "quo_webhook_rs",
                tracing_subscriber::filter::LevelFilter::DEBUG,
            ),
        ]));
    tracing::subscriber::set_global_default(subscriber).unwrap();

    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL not set!");
    let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("failed to connect to Postgres");
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .expect("failed to run migrations");

    let app_state = Arc::new(AppState {
        store: Arc::new(PgStore::new(db_pool)),
    });

    // Permissive CORS so provider dashboards can exercise the endpoint and
    // preflight OPTIONS requests are answered.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/webhooks/quo", post(handlers::quo_webhook))
        .route("/", get(handlers::health))
        .layer(cors)
        .with_state(app_state);

    axum::Server::bind(&bind_addr.parse().unwrap())
        .serve(app.into_make_service())
        .await
        .unwrap();
}
