use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use super::dto::{CreateInterestRequest, UpdateInterestRequest};
use crate::ownership::{Owned, Pagination, WithOwner};

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Interest {
    pub id: Uuid,
    pub user_id: Uuid,
    pub interest_name: String,
    pub description: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Owned for Interest {
    fn owner_id(&self) -> Uuid {
        self.user_id
    }
}

pub async fn insert(
    db: &PgPool,
    user_id: Uuid,
    body: &CreateInterestRequest,
) -> Result<Interest, sqlx::Error> {
    sqlx::query_as::<_, Interest>(
        r#"
        INSERT INTO interests (user_id, interest_name, description)
        VALUES ($1, $2, $3)
        RETURNING id, user_id, interest_name, description, created_at, updated_at
        "#,
    )
    .bind(user_id)
    .bind(body.interest_name.trim())
    .bind(body.description.as_deref())
    .fetch_one(db)
    .await
}

pub async fn list_by_owner(
    db: &PgPool,
    user_id: Uuid,
    page: Pagination,
) -> Result<Vec<Interest>, sqlx::Error> {
    sqlx::query_as::<_, Interest>(
        r#"
        SELECT id, user_id, interest_name, description, created_at, updated_at
          FROM interests
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

pub async fn find_by_id(db: &PgPool, id: Uuid) -> Result<Option<Interest>, sqlx::Error> {
    sqlx::query_as::<_, Interest>(
        r#"
        SELECT id, user_id, interest_name, description, created_at, updated_at
          FROM interests
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
) -> Result<Option<WithOwner<Interest>>, sqlx::Error> {
    sqlx::query_as::<_, WithOwner<Interest>>(
        r#"
        SELECT i.id, i.user_id, i.interest_name, i.description, i.created_at, i.updated_at,
               u.id AS owner_id, u.username AS owner_username, u.email AS owner_email
          FROM interests i
          JOIN users u ON u.id = i.user_id
         WHERE i.id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await
}

pub async fn update(
    db: &PgPool,
    id: Uuid,
    body: &UpdateInterestRequest,
) -> Result<Option<Interest>, sqlx::Error> {
    sqlx::query_as::<_, Interest>(
        r#"
        UPDATE interests
           SET interest_name = COALESCE($2, interest_name),
               description   = COALESCE($3, description),
               updated_at    = now()
         WHERE id = $1
        RETURNING id, user_id, interest_name, description, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(body.interest_name.as_deref().map(str::trim))
    .bind(body.description.as_deref())
    .fetch_optional(db)
    .await
}

pub async fn delete(db: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let res = sqlx::query("DELETE FROM interests WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(res.rows_affected() > 0)
}
