//! Forum Services

use crate::models::*;
use crate::moderation::{ContentModerator, ModerationError};
use sqlx::PgPool;
use std::sync::Arc;
use validator::Validate;

/// Service error type
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Permission denied")]
    PermissionDenied,

    #[error("Content flagged: {0}")]
    ContentFlagged(String),

    #[error("Moderation unavailable: {0}")]
    ModerationUnavailable(#[from] ModerationError),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::Validation(err.to_string())
    }
}

/// Question service
pub struct QuestionService {
    db: PgPool,
    moderator: Option<Arc<dyn ContentModerator>>,
}

impl QuestionService {
    pub fn new(db: PgPool, moderator: Option<Arc<dyn ContentModerator>>) -> Self {
        Self { db, moderator }
    }

    /// List top-level questions, newest first
    pub async fn list(&self) -> Result<Vec<Question>, ServiceError> {
        let questions = sqlx::query_as(
            "SELECT * FROM questions WHERE parent_id IS NULL ORDER BY created_at DESC",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(questions)
    }

    /// Get a top-level question by ID
    pub async fn get(&self, id: i64) -> Result<Question, ServiceError> {
        sqlx::query_as("SELECT * FROM questions WHERE id = $1 AND parent_id IS NULL")
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Question not found: {}", id)))
    }

    /// Replies to a question, oldest first
    pub async fn replies(&self, id: i64) -> Result<Vec<Question>, ServiceError> {
        self.find(id).await?;

        let replies = sqlx::query_as(
            "SELECT * FROM questions WHERE parent_id = $1 ORDER BY created_at ASC",
        )
        .bind(id)
        .fetch_all(&self.db)
        .await?;

        Ok(replies)
    }

    /// Create a question or reply after it passes moderation
    pub async fn create(
        &self,
        user_id: i64,
        req: CreateQuestionRequest,
    ) -> Result<Question, ServiceError> {
        req.validate()?;

        let flagged = self.screen(&req.content).await?;

        if let Some(parent_id) = req.parent_id {
            self.find(parent_id).await?;
        }

        if let Some(reason) = flagged {
            return Err(self.reject(user_id, &req, reason).await);
        }

        let question: Question = sqlx::query_as(
            r#"INSERT INTO questions (content, location, user_id, parent_id)
               VALUES ($1, $2, $3, $4)
               RETURNING *"#,
        )
        .bind(&req.content)
        .bind(&req.location)
        .bind(user_id)
        .bind(req.parent_id)
        .fetch_one(&self.db)
        .await?;

        tracing::info!(question_id = question.id, user_id, "Question created");
        Ok(question)
    }

    /// Update a question's content or location
    pub async fn update(
        &self,
        id: i64,
        user_id: i64,
        req: UpdateQuestionRequest,
    ) -> Result<Question, ServiceError> {
        req.validate()?;

        let flagged = match &req.content {
            Some(content) => self.screen(content).await?,
            None => None,
        };

        let existing = self.find(id).await?;
        ensure_owner(&existing, user_id)?;

        if let (Some(reason), Some(content)) = (flagged, &req.content) {
            let submission = CreateQuestionRequest {
                content: content.clone(),
                location: req.location.clone().unwrap_or(existing.location),
                parent_id: existing.parent_id,
            };
            return Err(self.reject(user_id, &submission, reason).await);
        }

        let question = sqlx::query_as(
            r#"UPDATE questions SET
               content = COALESCE($2, content),
               location = COALESCE($3, location),
               updated_at = NOW()
               WHERE id = $1
               RETURNING *"#,
        )
        .bind(id)
        .bind(&req.content)
        .bind(&req.location)
        .fetch_one(&self.db)
        .await?;

        Ok(question)
    }

    /// Delete a question and its replies
    pub async fn delete(&self, id: i64, user_id: i64) -> Result<(), ServiceError> {
        let existing = self.find(id).await?;
        ensure_owner(&existing, user_id)?;

        sqlx::query("DELETE FROM questions WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        tracing::info!(question_id = id, user_id, "Question deleted");
        Ok(())
    }

    /// Record a submission rejected by moderation
    pub async fn flag(
        &self,
        user_id: i64,
        req: &CreateQuestionRequest,
        reason: &str,
    ) -> Result<(), ServiceError> {
        sqlx::query(
            r#"INSERT INTO flagged_questions (user_id, content, parent_id, location, reason)
               VALUES ($1, $2, $3, $4, $5)"#,
        )
        .bind(user_id)
        .bind(&req.content)
        .bind(req.parent_id)
        .bind(&req.location)
        .bind(reason)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    /// Run `content` past the moderator; `Some(reason)` when it is flagged
    pub async fn screen(&self, content: &str) -> Result<Option<String>, ServiceError> {
        let Some(moderator) = &self.moderator else {
            return Ok(None);
        };

        let verdict = moderator.screen(content).await?;

        Ok(verdict.flagged.then_some(verdict.reason))
    }

    /// Record a flagged submission and build the error returned to the caller
    async fn reject(
        &self,
        user_id: i64,
        submission: &CreateQuestionRequest,
        reason: String,
    ) -> ServiceError {
        if let Err(e) = self.flag(user_id, submission, &reason).await {
            return e;
        }

        tracing::info!(user_id, reason = %reason, "Submission flagged");
        ServiceError::ContentFlagged(reason)
    }

    /// Any question or reply by ID
    async fn find(&self, id: i64) -> Result<Question, ServiceError> {
        sqlx::query_as("SELECT * FROM questions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Question not found: {}", id)))
    }
}

fn ensure_owner(question: &Question, user_id: i64) -> Result<(), ServiceError> {
    if question.user_id != user_id {
        return Err(ServiceError::PermissionDenied);
    }
    Ok(())
}
