use crate::ForumServices;
use axum::{extract::State, Json};
use serde_json::{json, Value};
use std::sync::Arc;

/// GET /health
pub async fn health_check(State(services): State<Arc<ForumServices>>) -> Json<Value> {
    Json(json!({
        "status": "available",
        "env": services.env,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
