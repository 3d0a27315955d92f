use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use super::dto::{CreateSkillRequest, Proficiency, UpdateSkillRequest};
use crate::ownership::{Owned, Pagination, WithOwner};

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Skill {
    pub id: Uuid,
    pub user_id: Uuid,
    pub skill_name: String,
    pub proficiency_level: Option<Proficiency>,
    pub years_experience: Option<f64>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Owned for Skill {
    fn owner_id(&self) -> Uuid {
        self.user_id
    }
}

pub async fn insert(
    db: &PgPool,
    user_id: Uuid,
    body: &CreateSkillRequest,
) -> Result<Skill, sqlx::Error> {
    sqlx::query_as::<_, Skill>(
        r#"
        INSERT INTO skills (user_id, skill_name, proficiency_level, years_experience)
        VALUES ($1, $2, $3, $4)
        RETURNING id, user_id, skill_name, proficiency_level, years_experience,
                  created_at, updated_at
        "#,
    )
    .bind(user_id)
    .bind(body.skill_name.trim())
    .bind(body.proficiency_level)
    .bind(body.years_experience)
    .fetch_one(db)
    .await
}

/// Most experienced first.
pub async fn list_by_owner(
    db: &PgPool,
    user_id: Uuid,
    page: Pagination,
) -> Result<Vec<Skill>, sqlx::Error> {
    sqlx::query_as::<_, Skill>(
        r#"
        SELECT id, user_id, skill_name, proficiency_level, years_experience,
               created_at, updated_at
          FROM skills
         WHERE user_id = $1
         ORDER BY years_experience DESC NULLS LAST, created_at DESC
         LIMIT $2 OFFSET $3
        "#,
    )
    .bind(user_id)
    .bind(page.limit)
    .bind(page.offset)
    .fetch_all(db)
    .await
}

pub async fn find_by_id(db: &PgPool, id: Uuid) -> Result<Option<Skill>, sqlx::Error> {
    sqlx::query_as::<_, Skill>(
        r#"
        SELECT id, user_id, skill_name, proficiency_level, years_experience,
               created_at, updated_at
          FROM skills
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
) -> Result<Option<WithOwner<Skill>>, sqlx::Error> {
    sqlx::query_as::<_, WithOwner<Skill>>(
        r#"
        SELECT s.id, s.user_id, s.skill_name, s.proficiency_level, s.years_experience,
               s.created_at, s.updated_at,
               u.id AS owner_id, u.username AS owner_username, u.email AS owner_email
          FROM skills s
          JOIN users u ON u.id = s.user_id
         WHERE s.id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await
}

pub async fn update(
    db: &PgPool,
    id: Uuid,
    body: &UpdateSkillRequest,
) -> Result<Option<Skill>, sqlx::Error> {
    sqlx::query_as::<_, Skill>(
        r#"
        UPDATE skills
           SET skill_name        = COALESCE($2, skill_name),
               proficiency_level = COALESCE($3, proficiency_level),
               years_experience  = COALESCE($4, years_experience),
               updated_at        = now()
         WHERE id = $1
        RETURNING id, user_id, skill_name, proficiency_level, years_experience,
                  created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(body.skill_name.as_deref().map(str::trim))
    .bind(body.proficiency_level)
    .bind(body.years_experience)
    .fetch_optional(db)
    .await
}

pub async fn delete(db: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let res = sqlx::query("DELETE FROM skills WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(res.rows_affected() > 0)
}
