use anyhow::Context;
use serde::Serialize;
use sqlx::{FromRow, PgExecutor, PgPool, Postgres, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

use super::dto::UpdateRecommendationRequest;
use crate::ownership::{Owned, Pagination, WithOwner};

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub career_suggestion: String,
    pub justification: Option<String>,
    pub course_link: Option<String>,
    pub ai_model_used: Option<String>,
    pub confidence_score: Option<f64>,
    pub skill_gaps: Vec<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Owned for Recommendation {
    fn owner_id(&self) -> Uuid {
        self.user_id
    }
}

/// Row to insert; the owner is supplied separately.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRecommendation {
    pub career_suggestion: String,
    pub justification: Option<String>,
    pub course_link: Option<String>,
    pub ai_model_used: Option<String>,
    pub confidence_score: Option<f64>,
    pub skill_gaps: Vec<String>,
}

pub async fn insert<'e, E>(
    exec: E,
    user_id: Uuid,
    rec: &NewRecommendation,
) -> Result<Recommendation, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Recommendation>(
        r#"
        INSERT INTO recommendations
               (user_id, career_suggestion, justification, course_link,
                ai_model_used, confidence_score, skill_gaps)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id, user_id, career_suggestion, justification, course_link,
                  ai_model_used, confidence_score, skill_gaps, created_at, updated_at
        "#,
    )
    .bind(user_id)
    .bind(&rec.career_suggestion)
    .bind(rec.justification.as_deref())
    .bind(rec.course_link.as_deref())
    .bind(rec.ai_model_used.as_deref())
    .bind(rec.confidence_score)
    .bind(&rec.skill_gaps)
    .fetch_one(exec)
    .await
}

/// Insert inside a caller-owned transaction.
pub async fn insert_tx(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    rec: &NewRecommendation,
) -> anyhow::Result<Recommendation> {
    insert(&mut **tx, user_id, rec)
        .await
        .context("insert recommendation")
}

pub async fn list_by_owner(
    db: &PgPool,
    user_id: Uuid,
    page: Pagination,
) -> Result<Vec<Recommendation>, sqlx::Error> {
    sqlx::query_as::<_, Recommendation>(
        r#"
        SELECT id, user_id, career_suggestion, justification, course_link,
               ai_model_used, confidence_score, skill_gaps, created_at, updated_at
          FROM recommendations
         WHERE user_id = $1
         ORDER BY created_at DESC
         LIMIT $2 OFFSET $3
        "#,
    )
    .bind(user_id)
    .bind(page.limit)
    .bind(page.offset)
    .fetch_all(db)
    .await
}

pub async fn find_by_id(db: &PgPool, id: Uuid) -> Result<Option<Recommendation>, sqlx::Error> {
    sqlx::query_as::<_, Recommendation>(
        r#"
        SELECT id, user_id, career_suggestion, justification, course_link,
               ai_model_used, confidence_score, skill_gaps, created_at, updated_at
          FROM recommendations
         WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await
}

pub async fn find_with_owner(
    db: &PgPool,
    id: Uuid,
) -> Result<Option<WithOwner<Recommendation>>, sqlx::Error> {
    sqlx::query_as::<_, WithOwner<Recommendation>>(
        r#"
        SELECT r.id, r.user_id, r.career_suggestion, r.justification, r.course_link,
               r.ai_model_used, r.confidence_score, r.skill_gaps, r.created_at, r.updated_at,
               u.id AS owner_id, u.username AS owner_username, u.email AS owner_email
          FROM recommendations r
          JOIN users u ON u.id = r.user_id
         WHERE r.id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await
}

pub async fn update(
    db: &PgPool,
    id: Uuid,
    body: &UpdateRecommendationRequest,
) -> Result<Option<Recommendation>, sqlx::Error> {
    sqlx::query_as::<_, Recommendation>(
        r#"
        UPDATE recommendations
           SET career_suggestion = COALESCE($2, career_suggestion),
               justification     = COALESCE($3, justification),
               course_link       = COALESCE($4, course_link),
               ai_model_used     = COALESCE($5, ai_model_used),
               confidence_score  = COALESCE($6, confidence_score),
               skill_gaps        = COALESCE($7, skill_gaps),
               updated_at        = now()
         WHERE id = $1
        RETURNING id, user_id, career_suggestion, justification, course_link,
                  ai_model_used, confidence_score, skill_gaps, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(body.career_suggestion.as_deref().map(str::trim))
    .bind(body.justification.as_deref())
    .bind(body.course_link.as_deref())
    .bind(body.ai_model_used.as_deref())
    .bind(body.confidence_score)
    .bind(body.skill_gaps.as_deref())
    .fetch_optional(db)
    .await
}

pub async fn delete(db: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let res = sqlx::query("DELETE FROM recommendations WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(res.rows_affected() > 0)
}
