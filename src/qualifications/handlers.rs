use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};

use super::{
    dto::{CreateQualificationRequest, UpdateQualificationRequest},
    repo::{self, Qualification},
};
use crate::{
    auth::AuthUser,
    errors::{parse_json, AppError, AppJson, AppQuery},
    ownership::{authorize, ensure_self, parse_id, Access, Kind, Pagination, WithOwner},
    state::AppState,
    users::dto::MessageResponse,
};

pub(crate) const QUALIFICATIONS: Kind = Kind {
    singular: "Qualification",
    plural: "qualifications",
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/qualifications",
            get(list_qualifications).post(create_qualification),
        )
        .route(
            "/qualifications/user/:user_id",
            get(list_qualifications_by_user),
        )
        .route(
            "/qualifications/:id",
            get(get_qualification)
                .put(update_qualification)
                .delete(delete_qualification),
        )
}

#[instrument(skip(state, body))]
pub async fn create_qualification(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppJson(body): AppJson<CreateQualificationRequest>,
) -> Result<(StatusCode, Json<Qualification>), AppError> {
    body.validate()?;
    let qualification = repo::insert(&state.db, user_id, &body).await?;
    info!(qualification_id = %qualification.id, %user_id, "qualification created");
    Ok((StatusCode::CREATED, Json(qualification)))
}

#[instrument(skip(state))]
pub async fn list_qualifications(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppQuery(page): AppQuery<Pagination>,
) -> Result<Json<Vec<Qualification>>, AppError> {
    let rows = repo::list_by_owner(&state.db, user_id, page.validate()?).await?;
    Ok(Json(rows))
}

#[instrument(skip(state))]
pub async fn list_qualifications_by_user(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(target): Path<String>,
    AppQuery(page): AppQuery<Pagination>,
) -> Result<Json<Vec<Qualification>>, AppError> {
    let target = ensure_self(&target, user_id, QUALIFICATIONS)?;
    let rows = repo::list_by_owner(&state.db, target, page.validate()?).await?;
    if rows.is_empty() {
        return Err(QUALIFICATIONS.none_for_user());
    }
    Ok(Json(rows))
}

#[instrument(skip(state))]
pub async fn get_qualification(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<WithOwner<Qualification>>, AppError> {
    let id = parse_id(&id, QUALIFICATIONS)?;
    let found = repo::find_with_owner(&state.db, id).await?;
    Ok(Json(authorize(found, user_id, QUALIFICATIONS, Access::View)?))
}

#[instrument(skip(state, body))]
pub async fn update_qualification(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Qualification>, AppError> {
    let id = parse_id(&id, QUALIFICATIONS)?;
    authorize(
        repo::find_by_id(&state.db, id).await?,
        user_id,
        QUALIFICATIONS,
        Access::Update,
    )?;
    let body: UpdateQualificationRequest = parse_json(&body)?;
    body.validate()?;
    let qualification = repo::update(&state.db, id, &body)
        .await?
        .ok_or_else(|| QUALIFICATIONS.not_found())?;
    info!(qualification_id = %qualification.id, "qualification updated");
    Ok(Json(qualification))
}

#[instrument(skip(state))]
pub async fn delete_qualification(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_id(&id, QUALIFICATIONS)?;
    authorize(
        repo::find_by_id(&state.db, id).await?,
        user_id,
        QUALIFICATIONS,
        Access::Delete,
    )?;
    if !repo::delete(&state.db, id).await? {
        return Err(QUALIFICATIONS.not_found());
    }
    info!(qualification_id = %id, "qualification deleted");
    Ok(Json(MessageResponse::new("Qualification deleted successfully")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn other_users_list_is_forbidden() {
        let err = list_qualifications_by_user(
            State(AppState::fake()),
            AuthUser(Uuid::new_v4()),
            Path(Uuid::new_v4().to_string()),
            AppQuery(Pagination::default()),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }
}
