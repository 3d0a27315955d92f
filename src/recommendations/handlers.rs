use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::{CreateRecommendationRequest, GeneratedRecommendations, UpdateRecommendationRequest},
    orchestrator,
    repo::{self, NewRecommendation, Recommendation},
};
use crate::{
    auth::AuthUser,
    errors::{parse_json, AppError, AppJson, AppQuery},
    ownership::{authorize, ensure_self, parse_id, Access, Kind, Pagination, WithOwner},
    state::AppState,
    users::dto::MessageResponse,
};

pub(crate) const RECOMMENDATIONS: Kind = Kind {
    singular: "Recommendation",
    plural: "recommendations",
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/recommendations",
            get(list_recommendations).post(create_recommendation),
        )
        .route(
            "/recommendations/generate/:user_id",
            post(generate_recommendations),
        )
        .route(
            "/recommendations/user/:user_id",
            get(list_recommendations_by_user),
        )
        .route(
            "/recommendations/:id",
            get(get_recommendation)
                .put(update_recommendation)
                .delete(delete_recommendation),
        )
}

#[instrument(skip(state))]
pub async fn generate_recommendations(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(target): Path<String>,
) -> Result<(StatusCode, Json<GeneratedRecommendations>), AppError> {
    match Uuid::parse_str(&target) {
        Ok(id) if id == user_id => {}
        _ => {
            warn!(%user_id, %target, "generation requested for another user");
            return Err(AppError::Forbidden(
                "Access denied: Cannot generate recommendations for other users".into(),
            ));
        }
    }
    let generated = orchestrator::generate(&state, user_id).await?;
    Ok((StatusCode::CREATED, Json(generated)))
}

#[instrument(skip(state, body))]
pub async fn create_recommendation(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppJson(body): AppJson<CreateRecommendationRequest>,
) -> Result<(StatusCode, Json<Recommendation>), AppError> {
    body.validate()?;
    let rec = NewRecommendation {
        career_suggestion: body.career_suggestion.trim().to_string(),
        justification: body.justification,
        course_link: body.course_link,
        ai_model_used: body.ai_model_used,
        confidence_score: body.confidence_score,
        skill_gaps: body.skill_gaps.unwrap_or_default(),
    };
    let saved = repo::insert(&state.db, user_id, &rec).await?;
    info!(recommendation_id = %saved.id, %user_id, "recommendation created");
    Ok((StatusCode::CREATED, Json(saved)))
}

#[instrument(skip(state))]
pub async fn list_recommendations(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppQuery(page): AppQuery<Pagination>,
) -> Result<Json<Vec<Recommendation>>, AppError> {
    Ok(Json(
        repo::list_by_owner(&state.db, user_id, page.validate()?).await?,
    ))
}

#[instrument(skip(state))]
pub async fn list_recommendations_by_user(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(target): Path<String>,
    AppQuery(page): AppQuery<Pagination>,
) -> Result<Json<Vec<Recommendation>>, AppError> {
    let target = ensure_self(&target, user_id, RECOMMENDATIONS)?;
    let recs = repo::list_by_owner(&state.db, target, page.validate()?).await?;
    if recs.is_empty() {
        return Err(RECOMMENDATIONS.none_for_user());
    }
    Ok(Json(recs))
}

#[instrument(skip(state))]
pub async fn get_recommendation(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<WithOwner<Recommendation>>, AppError> {
    let id = parse_id(&id, RECOMMENDATIONS)?;
    let found = repo::find_with_owner(&state.db, id).await?;
    Ok(Json(authorize(found, user_id, RECOMMENDATIONS, Access::View)?))
}

#[instrument(skip(state, body))]
pub async fn update_recommendation(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Recommendation>, AppError> {
    let id = parse_id(&id, RECOMMENDATIONS)?;
    authorize(
        repo::find_by_id(&state.db, id).await?,
        user_id,
        RECOMMENDATIONS,
        Access::Update,
    )?;
    let body: UpdateRecommendationRequest = parse_json(&body)?;
    body.validate()?;
    let rec = repo::update(&state.db, id, &body)
        .await?
        .ok_or_else(|| RECOMMENDATIONS.not_found())?;
    info!(recommendation_id = %rec.id, "recommendation updated");
    Ok(Json(rec))
}

#[instrument(skip(state))]
pub async fn delete_recommendation(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_id(&id, RECOMMENDATIONS)?;
    authorize(
        repo::find_by_id(&state.db, id).await?,
        user_id,
        RECOMMENDATIONS,
        Access::Delete,
    )?;
    if !repo::delete(&state.db, id).await? {
        return Err(RECOMMENDATIONS.not_found());
    }
    info!(recommendation_id = %id, "recommendation deleted");
    Ok(Json(MessageResponse::new(
        "Recommendation deleted successfully",
    )))
}
