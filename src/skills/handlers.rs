use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};

use super::{
    dto::{CreateSkillRequest, UpdateSkillRequest},
    repo::{self, Skill},
};
use crate::{
    auth::AuthUser,
    errors::{parse_json, AppError, AppJson, AppQuery},
    ownership::{authorize, ensure_self, parse_id, Access, Kind, Pagination, WithOwner},
    state::AppState,
    users::dto::MessageResponse,
};

pub(crate) const SKILLS: Kind = Kind {
    singular: "Skill",
    plural: "skills",
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/skills", get(list_skills).post(create_skill))
        .route("/skills/user/:user_id", get(list_skills_by_user))
        .route(
            "/skills/:id",
            get(get_skill).put(update_skill).delete(delete_skill),
        )
}

#[instrument(skip(state, body))]
pub async fn create_skill(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppJson(body): AppJson<CreateSkillRequest>,
) -> Result<(StatusCode, Json<Skill>), AppError> {
    body.validate()?;
    let skill = repo::insert(&state.db, user_id, &body).await?;
    info!(skill_id = %skill.id, %user_id, "skill created");
    Ok((StatusCode::CREATED, Json(skill)))
}

#[instrument(skip(state))]
pub async fn list_skills(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppQuery(page): AppQuery<Pagination>,
) -> Result<Json<Vec<Skill>>, AppError> {
    let skills = repo::list_by_owner(&state.db, user_id, page.validate()?).await?;
    Ok(Json(skills))
}

#[instrument(skip(state))]
pub async fn list_skills_by_user(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(target): Path<String>,
    AppQuery(page): AppQuery<Pagination>,
) -> Result<Json<Vec<Skill>>, AppError> {
    let target = ensure_self(&target, user_id, SKILLS)?;
    let skills = repo::list_by_owner(&state.db, target, page.validate()?).await?;
    if skills.is_empty() {
        return Err(SKILLS.none_for_user());
    }
    Ok(Json(skills))
}

#[instrument(skip(state))]
pub async fn get_skill(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<WithOwner<Skill>>, AppError> {
    let id = parse_id(&id, SKILLS)?;
    let found = repo::find_with_owner(&state.db, id).await?;
    Ok(Json(authorize(found, user_id, SKILLS, Access::View)?))
}

#[instrument(skip(state, body))]
pub async fn update_skill(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Skill>, AppError> {
    let id = parse_id(&id, SKILLS)?;
    authorize(repo::find_by_id(&state.db, id).await?, user_id, SKILLS, Access::Update)?;
    let body: UpdateSkillRequest = parse_json(&body)?;
    body.validate()?;
    let skill = repo::update(&state.db, id, &body)
        .await?
        .ok_or_else(|| SKILLS.not_found())?;
    info!(skill_id = %skill.id, "skill updated");
    Ok(Json(skill))
}

#[instrument(skip(state))]
pub async fn delete_skill(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_id(&id, SKILLS)?;
    authorize(repo::find_by_id(&state.db, id).await?, user_id, SKILLS, Access::Delete)?;
    if !repo::delete(&state.db, id).await? {
        return Err(SKILLS.not_found());
    }
    info!(skill_id = %id, "skill deleted");
    Ok(Json(MessageResponse::new("Skill deleted successfully")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn list_for_other_user_is_forbidden_before_lookup() {
        // The fake pool has no server behind it; reaching the store would be a Database error.
        let err = list_skills_by_user(
            State(AppState::fake()),
            AuthUser(Uuid::new_v4()),
            Path(Uuid::new_v4().to_string()),
            AppQuery(Pagination::default()),
        )
        .await
        .unwrap_err();
        assert!(
            matches!(err, AppError::Forbidden(ref m) if m == "Access denied: Cannot view other users skills")
        );
    }

    #[tokio::test]
    async fn malformed_id_is_not_found() {
        let err = get_skill(
            State(AppState::fake()),
            AuthUser(Uuid::new_v4()),
            Path("not-a-uuid".into()),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::NotFound(ref m) if m == "Skill not found"));
    }

    #[tokio::test]
    async fn update_checks_id_before_decoding_body() {
        let err = update_skill(
            State(AppState::fake()),
            AuthUser(Uuid::new_v4()),
            Path("not-a-uuid".into()),
            Bytes::from_static(br#"{"proficiencyLevel":"Expert"}"#),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::NotFound(ref m) if m == "Skill not found"));
    }
}
