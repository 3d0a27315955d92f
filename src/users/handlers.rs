use axum::{
    body::Bytes,
    extract::{FromRef, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use super::{
    dto::{
        normalize_email, normalize_username, AuthResponse, LoginRequest, MessageResponse,
        PublicUser, RefreshRequest, RegisterRequest, UpdateUserRequest,
    },
    repo::{NewUser, User, UserChanges},
};
use crate::{
    auth::{
        password::{hash_password, validate_password, verify_password},
        AuthUser, JwtKeys,
    },
    errors::{parse_json, AppError, AppJson},
    ownership::{authorize, parse_id, Access, Kind},
    state::AppState,
};

const USERS: Kind = Kind {
    singular: "User",
    plural: "profiles",
};

const TAKEN: &str = "Username or email already registered";

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/users/register", post(register))
        .route("/users/login", post(login))
        .route("/users/refresh", post(refresh))
}

pub fn profile_routes() -> Router<AppState> {
    Router::new().route(
        "/users/:id",
        get(get_user).put(update_user).delete(delete_user),
    )
}

fn issue_tokens(state: &AppState, user: User) -> Result<AuthResponse, AppError> {
    let keys = JwtKeys::from_ref(state);
    let token = keys.sign_access(user.id)?;
    let refresh_token = keys.sign_refresh(user.id)?;
    Ok(AuthResponse {
        token,
        refresh_token,
        user: user.into(),
    })
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let username = normalize_username(&payload.username)?;
    let email = normalize_email(&payload.email)?;
    validate_password(&payload.password)?;

    if User::find_by_email(&state.db, &email).await?.is_some()
        || User::find_by_username(&state.db, &username).await?.is_some()
    {
        warn!(%username, %email, "username or email already registered");
        return Err(AppError::Conflict(TAKEN.into()));
    }

    let hash = hash_password(&payload.password)?;
    let user = User::create(
        &state.db,
        NewUser {
            username: &username,
            email: &email,
            password_hash: &hash,
            first_name: payload.first_name.as_deref(),
            last_name: payload.last_name.as_deref(),
        },
    )
    .await
    .map_err(|e| AppError::on_write(e, TAKEN))?;

    info!(user_id = %user.id, username = %user.username, "user registered");
    Ok((StatusCode::CREATED, Json(issue_tokens(&state, user)?)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let found = match (&payload.email, &payload.username) {
        (Some(email), _) => User::find_by_email(&state.db, &email.trim().to_lowercase()).await?,
        (None, Some(username)) => User::find_by_username(&state.db, username.trim()).await?,
        (None, None) => {
            return Err(AppError::Validation("email or username is required".into()));
        }
    };

    let Some(user) = found else {
        warn!("login for unknown account");
        return Err(AppError::InvalidCredentials);
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AppError::InvalidCredentials);
    }

    info!(user_id = %user.id, "user logged in");
    Ok(Json(issue_tokens(&state, user)?))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RefreshRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys.verify_refresh(&payload.refresh_token)?;
    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or(AppError::UnknownSubject)?;
    Ok(Json(issue_tokens(&state, user)?))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<PublicUser>, AppError> {
    let id = parse_id(&id, USERS)?;
    let user = authorize(
        User::find_by_id(&state.db, id).await?,
        user_id,
        USERS,
        Access::View,
    )?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, body))]
pub async fn update_user(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<PublicUser>, AppError> {
    let id = parse_id(&id, USERS)?;
    authorize(
        User::find_by_id(&state.db, id).await?,
        user_id,
        USERS,
        Access::Update,
    )?;

    let changes = user_changes(parse_json(&body)?)?;

    if let Some(email) = &changes.email {
        if matches!(User::find_by_email(&state.db, email).await?, Some(other) if other.id != id) {
            return Err(AppError::Conflict(TAKEN.into()));
        }
    }
    if let Some(username) = &changes.username {
        if matches!(User::find_by_username(&state.db, username).await?, Some(other) if other.id != id)
        {
            return Err(AppError::Conflict(TAKEN.into()));
        }
    }

    let user = User::update(&state.db, id, changes)
        .await
        .map_err(|e| AppError::on_write(e, TAKEN))?
        .ok_or_else(|| USERS.not_found())?;

    info!(user_id = %user.id, "user updated");
    Ok(Json(user.into()))
}

/// Validates the supplied fields and hashes a new password if present.
fn user_changes(payload: UpdateUserRequest) -> Result<UserChanges, AppError> {
    let password_hash = match payload.password.as_deref() {
        Some(plain) => {
            validate_password(plain)?;
            Some(hash_password(plain)?)
        }
        None => None,
    };
    Ok(UserChanges {
        username: payload.username.as_deref().map(normalize_username).transpose()?,
        email: payload.email.as_deref().map(normalize_email).transpose()?,
        password_hash,
        first_name: payload.first_name,
        last_name: payload.last_name,
    })
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_id(&id, USERS)?;
    authorize(
        User::find_by_id(&state.db, id).await?,
        user_id,
        USERS,
        Access::Delete,
    )?;

    if !User::delete(&state.db, id).await? {
        return Err(USERS.not_found());
    }

    info!(user_id = %id, "user deleted with owned records");
    Ok(Json(MessageResponse::new("User deleted successfully")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_validates_supplied_fields_only() {
        let changes = user_changes(UpdateUserRequest {
            first_name: Some("Al".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(changes.first_name.as_deref(), Some("Al"));
        assert!(changes.email.is_none());
        assert!(changes.password_hash.is_none());

        let bad = user_changes(UpdateUserRequest {
            email: Some("nope".into()),
            ..Default::default()
        });
        assert!(matches!(bad, Err(AppError::Validation(_))));
    }

    #[test]
    fn update_hashes_new_password() {
        let changes = user_changes(UpdateUserRequest {
            password: Some("newpass1".into()),
            ..Default::default()
        })
        .unwrap();
        let hash = changes.password_hash.unwrap();
        assert_ne!(hash, "newpass1");
        assert!(verify_password("newpass1", &hash).unwrap());
    }

    #[tokio::test]
    async fn register_rejects_bad_input_before_touching_store() {
        let state = AppState::fake();
        let err = register(
            State(state.clone()),
            AppJson(RegisterRequest {
                username: "alice".into(),
                email: "not-an-email".into(),
                password: "pw12345".into(),
                first_name: None,
                last_name: None,
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = register(
            State(state),
            AppJson(RegisterRequest {
                username: "alice".into(),
                email: "a@x.com".into(),
                password: "pw".into(),
                first_name: None,
                last_name: None,
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn login_needs_an_identifier() {
        let err = login(
            State(AppState::fake()),
            AppJson(LoginRequest {
                email: None,
                username: None,
                password: "pw12345".into(),
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn refresh_rejects_access_token() {
        let state = AppState::fake();
        let access = JwtKeys::from_ref(&state)
            .sign_access(uuid::Uuid::new_v4())
            .unwrap();
        let err = refresh(
            State(state),
            AppJson(RefreshRequest {
                refresh_token: access,
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::InvalidToken));
    }
}
