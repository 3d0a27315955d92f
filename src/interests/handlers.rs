use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};

use super::{
    dto::{CreateInterestRequest, UpdateInterestRequest},
    repo::{self, Interest},
};
use crate::{
    auth::AuthUser,
    errors::{parse_json, AppError, AppJson, AppQuery},
    ownership::{authorize, ensure_self, parse_id, Access, Kind, Pagination, WithOwner},
    state::AppState,
    users::dto::MessageResponse,
};

pub(crate) const INTERESTS: Kind = Kind {
    singular: "Interest",
    plural: "interests",
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/interests", get(list_interests).post(create_interest))
        .route("/interests/user/:user_id", get(list_interests_by_user))
        .route(
            "/interests/:id",
            get(get_interest).put(update_interest).delete(delete_interest),
        )
}

#[instrument(skip(state, body))]
pub async fn create_interest(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppJson(body): AppJson<CreateInterestRequest>,
) -> Result<(StatusCode, Json<Interest>), AppError> {
    body.validate()?;
    let interest = repo::insert(&state.db, user_id, &body).await?;
    info!(interest_id = %interest.id, %user_id, "interest created");
    Ok((StatusCode::CREATED, Json(interest)))
}

#[instrument(skip(state))]
pub async fn list_interests(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppQuery(page): AppQuery<Pagination>,
) -> Result<Json<Vec<Interest>>, AppError> {
    Ok(Json(
        repo::list_by_owner(&state.db, user_id, page.validate()?).await?,
    ))
}

#[instrument(skip(state))]
pub async fn list_interests_by_user(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(target): Path<String>,
    AppQuery(page): AppQuery<Pagination>,
) -> Result<Json<Vec<Interest>>, AppError> {
    let target = ensure_self(&target, user_id, INTERESTS)?;
    let interests = repo::list_by_owner(&state.db, target, page.validate()?).await?;
    if interests.is_empty() {
        return Err(INTERESTS.none_for_user());
    }
    Ok(Json(interests))
}

#[instrument(skip(state))]
pub async fn get_interest(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<WithOwner<Interest>>, AppError> {
    let id = parse_id(&id, INTERESTS)?;
    let found = repo::find_with_owner(&state.db, id).await?;
    Ok(Json(authorize(found, user_id, INTERESTS, Access::View)?))
}

#[instrument(skip(state, body))]
pub async fn update_interest(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Interest>, AppError> {
    let id = parse_id(&id, INTERESTS)?;
    authorize(
        repo::find_by_id(&state.db, id).await?,
        user_id,
        INTERESTS,
        Access::Update,
    )?;
    let body: UpdateInterestRequest = parse_json(&body)?;
    body.validate()?;
    let interest = repo::update(&state.db, id, &body)
        .await?
        .ok_or_else(|| INTERESTS.not_found())?;
    info!(interest_id = %interest.id, "interest updated");
    Ok(Json(interest))
}

#[instrument(skip(state))]
pub async fn delete_interest(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_id(&id, INTERESTS)?;
    authorize(
        repo::find_by_id(&state.db, id).await?,
        user_id,
        INTERESTS,
        Access::Delete,
    )?;
    if !repo::delete(&state.db, id).await? {
        return Err(INTERESTS.not_found());
    }
    info!(interest_id = %id, "interest deleted");
    Ok(Json(MessageResponse::new("Interest deleted successfully")))
}
