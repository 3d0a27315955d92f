use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use super::dto::{CreateQualificationRequest, UpdateQualificationRequest};
use crate::ownership::{Owned, Pagination, WithOwner};

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Qualification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub institution: Option<String>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub date_obtained: Option<OffsetDateTime>,
    pub description: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Owned for Qualification {
    fn owner_id(&self) -> Uuid {
        self.user_id
    }
}

pub async fn insert(
    db: &PgPool,
    user_id: Uuid,
    body: &CreateQualificationRequest,
) -> Result<Qualification, sqlx::Error> {
    sqlx::query_as::<_, Qualification>(
        r#"
        INSERT INTO qualifications (user_id, title, institution, date_obtained, description)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, user_id, title, institution, date_obtained, description,
                  created_at, updated_at
        "#,
    )
    .bind(user_id)
    .bind(body.title.trim())
    .bind(body.institution.as_deref())
    .bind(body.date_obtained)
    .bind(body.description.as_deref())
    .fetch_one(db)
    .await
}

pub async fn list_by_owner(
    db: &PgPool,
    user_id: Uuid,
    page: Pagination,
) -> Result<Vec<Qualification>, sqlx::Error> {
    sqlx::query_as::<_, Qualification>(
        r#"
        SELECT id, user_id, title, institution, date_obtained, description,
               created_at, updated_at
          FROM qualifications
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

pub async fn find_by_id(db: &PgPool, id: Uuid) -> Result<Option<Qualification>, sqlx::Error> {
    sqlx::query_as::<_, Qualification>(
        r#"
        SELECT id, user_id, title, institution, date_obtained, description,
               created_at, updated_at
          FROM qualifications
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
) -> Result<Option<WithOwner<Qualification>>, sqlx::Error> {
    sqlx::query_as::<_, WithOwner<Qualification>>(
        r#"
        SELECT q.id, q.user_id, q.title, q.institution, q.date_obtained, q.description,
               q.created_at, q.updated_at,
               u.id AS owner_id, u.username AS owner_username, u.email AS owner_email
          FROM qualifications q
          JOIN users u ON u.id = q.user_id
         WHERE q.id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await
}

pub async fn update(
    db: &PgPool,
    id: Uuid,
    body: &UpdateQualificationRequest,
) -> Result<Option<Qualification>, sqlx::Error> {
    sqlx::query_as::<_, Qualification>(
        r#"
        UPDATE qualifications
           SET title         = COALESCE($2, title),
               institution   = COALESCE($3, institution),
               date_obtained = COALESCE($4, date_obtained),
               description   = COALESCE($5, description),
               updated_at    = now()
         WHERE id = $1
        RETURNING id, user_id, title, institution, date_obtained, description,
                  created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(body.title.as_deref().map(str::trim))
    .bind(body.institution.as_deref())
    .bind(body.date_obtained)
    .bind(body.description.as_deref())
    .fetch_optional(db)
    .await
}

pub async fn delete(db: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let res = sqlx::query("DELETE FROM qualifications WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(res.rows_affected() > 0)
}
