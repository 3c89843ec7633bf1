//! Question Handlers

use crate::models::*;
use crate::services::ServiceError;
use crate::ForumServices;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use shaheed_auth::AuthUser;
use std::sync::Arc;

/// GET /questions - List top-level questions
pub async fn list_questions(
    State(services): State<Arc<ForumServices>>,
) -> Result<impl IntoResponse, ServiceError> {
    let questions = services.questions.list().await?;
    Ok(Json(serde_json::json!({
        "data": questions,
        "count": questions.len()
    })))
}

/// GET /questions/:id - Get a question
pub async fn get_question(
    State(services): State<Arc<ForumServices>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    let question = services.questions.get(id).await?;
    Ok(Json(question))
}

/// GET /questions/:id/replies - List replies to a question
pub async fn list_replies(
    State(services): State<Arc<ForumServices>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    let replies = services.questions.replies(id).await?;
    Ok(Json(serde_json::json!({
        "data": replies,
        "count": replies.len()
    })))
}

/// POST /questions - Ask a question or reply
pub async fn create_question(
    State(services): State<Arc<ForumServices>>,
    user: AuthUser,
    Json(req): Json<CreateQuestionRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let question = services.questions.create(user.id, req).await?;

    Ok((StatusCode::CREATED, Json(question)))
}

/// PUT /questions/:id - Update a question
pub async fn update_question(
    State(services): State<Arc<ForumServices>>,
    user: AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<UpdateQuestionRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let question = services.questions.update(id, user.id, req).await?;

    Ok(Json(question))
}

/// DELETE /questions/:id - Delete a question
pub async fn delete_question(
    State(services): State<Arc<ForumServices>>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    services.questions.delete(id, user.id).await?;

    Ok(StatusCode::NO_CONTENT)
}
