use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgRow, FromRow, Row};
use uuid::Uuid;

use crate::errors::AppError;

/// Record that belongs to exactly one user.
pub trait Owned {
    fn owner_id(&self) -> Uuid;
}

#[derive(Debug, Clone, Copy)]
pub enum Access {
    View,
    Update,
    Delete,
}

impl Access {
    fn verb(self) -> &'static str {
        match self {
            Access::View => "view",
            Access::Update => "update",
            Access::Delete => "delete",
        }
    }
}

/// Human-readable names for one resource type, used in error messages.
#[derive(Debug, Clone, Copy)]
pub struct Kind {
    pub singular: &'static str,
    pub plural: &'static str,
}

impl Kind {
    pub fn not_found(self) -> AppError {
        AppError::NotFound(format!("{} not found", self.singular))
    }

    pub fn none_for_user(self) -> AppError {
        AppError::NotFound(format!("No {} found for this user", self.plural))
    }

    pub fn forbidden(self, access: Access) -> AppError {
        AppError::Forbidden(format!(
            "Access denied: Cannot {} other users {}",
            access.verb(),
            self.plural
        ))
    }
}

/// Unparseable ids cannot exist in the store.
pub fn parse_id(raw: &str, kind: Kind) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| kind.not_found())
}

/// Existence first, ownership second.
pub fn authorize<T: Owned>(
    found: Option<T>,
    user_id: Uuid,
    kind: Kind,
    access: Access,
) -> Result<T, AppError> {
    let record = found.ok_or_else(|| kind.not_found())?;
    if record.owner_id() != user_id {
        return Err(kind.forbidden(access));
    }
    Ok(record)
}

/// For `/user/:userId` routes: the path id must be the caller. Runs before any lookup.
pub fn ensure_self(raw_user_id: &str, user_id: Uuid, kind: Kind) -> Result<Uuid, AppError> {
    match Uuid::parse_str(raw_user_id) {
        Ok(id) if id == user_id => Ok(id),
        _ => Err(kind.forbidden(Access::View)),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OwnerSummary {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

/// Read-side view: a stored record joined with its owner's public fields.
/// Queries select the owner as `owner_id`, `owner_username`, `owner_email`.
#[derive(Debug, Clone, Serialize)]
pub struct WithOwner<T> {
    #[serde(flatten)]
    pub record: T,
    pub owner: OwnerSummary,
}

impl<T: Owned> Owned for WithOwner<T> {
    fn owner_id(&self) -> Uuid {
        self.record.owner_id()
    }
}

impl<'r, T> FromRow<'r, PgRow> for WithOwner<T>
where
    T: FromRow<'r, PgRow>,
{
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            record: T::from_row(row)?,
            owner: OwnerSummary {
                id: row.try_get("owner_id")?,
                username: row.try_get("owner_username")?,
                email: row.try_get("owner_email")?,
            },
        })
    }
}

/// `?limit=&offset=` on list endpoints. No limit when absent.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Pagination {
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: i64,
}

impl Pagination {
    pub fn validate(self) -> Result<Self, AppError> {
        if self.limit.is_some_and(|l| l < 0) || self.offset < 0 {
            return Err(AppError::Validation(
                "limit and offset must not be negative".into(),
            ));
        }
        Ok(self)
    }
}
