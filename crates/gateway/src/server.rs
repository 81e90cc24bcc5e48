use std::net::SocketAddr;

use {
    axum::{
        Router,
        http::Method,
        routing::{get, post},
    },
    skillbox_skills::SkillService,
    tower_http::cors::{Any, CorsLayer},
    tracing::info,
};

use crate::{
    middleware::security_headers,
    routes::{self, AppState},
};

pub fn build_app(service: SkillService) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    let state = AppState {
        service,
        version: env!("CARGO_PKG_VERSION"),
    };

    Router::new()
        .route("/health", get(routes::health))
        .route("/api/skills", get(routes::list_skills))
        .route("/api/categories", get(routes::list_categories))
        .route("/api/skills/search", get(routes::search_skills))
        .route("/api/skills/{name}", get(routes::skill_info))
        .route("/api/skills/{name}/docs", get(routes::skill_docs))
        .route("/api/skills/{name}/requirements", get(routes::skill_requirements))
        .route("/api/skills/{name}/status", get(routes::skill_status))
        .route("/api/skills/{name}/install", post(routes::install_skill))
        .route("/api/skills/{name}/remove", post(routes::remove_skill))
        .layer(cors)
        .layer(axum::middleware::from_fn(security_headers))
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn serve(bind: &str, port: u16, service: SkillService) -> std::io::Result<()> {
    let skills = service.registry().len();
    let app = build_app(service);

    let listener = tokio::net::TcpListener::bind((bind, port)).await?;
    let addr: SocketAddr = listener.local_addr()?;
    info!(%addr, skills, "skills API listening");
    axum::serve(listener, app).await
}
