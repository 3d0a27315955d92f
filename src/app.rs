use std::net::SocketAddr;

use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::AppConfig;
use crate::state::AppState;
use crate::{interests, qualifications, recommendations, skills, users};

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .nest(
            "/api",
            Router::new()
                .merge(users::router())
                .merge(skills::router())
                .merge(qualifications::router())
                .merge(interests::router())
                .merge(recommendations::router())
                .route("/health", get(|| async { "ok" })),
        )
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!(
                        "http_request",
                        %method,
                        uri = %uri,
                        status = tracing::field::Empty
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     _latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, "response");
                        } else {
                            tracing::info!(%status, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router, config: &AppConfig) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(t) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {t}"));
        }
        match body {
            Some(b) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(b.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn health_is_public() {
        let app = build_app(AppState::fake());
        let resp = app
            .oneshot(request(Method::GET, "/api/health", None, None))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn protected_routes_need_a_token() {
        let app = build_app(AppState::fake());
        for (method, uri) in [
            (Method::GET, "/api/skills"),
            (Method::GET, "/api/qualifications"),
            (Method::GET, "/api/interests"),
            (Method::GET, "/api/recommendations"),
            (Method::POST, "/api/recommendations/generate/abc"),
        ] {
            let (status, body) = send(&app, request(method, uri, None, None)).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
            assert_eq!(body["message"], "No token provided");
        }
    }

    #[tokio::test]
    async fn garbage_token_is_rejected() {
        let app = build_app(AppState::fake());
        let (status, body) =
            send(&app, request(Method::GET, "/api/skills", Some("nope"), None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Invalid token");
    }

    #[tokio::test]
    async fn malformed_register_body_is_validation_error() {
        let app = build_app(AppState::fake());
        let req = Request::builder()
            .method(Method::POST)
            .uri("/api/users/register")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].is_string());
    }

    mod db {
        //! Run with `DATABASE_URL=... cargo test -- --ignored`.
        use super::*;
        use crate::ai::ScriptedAi;
        use std::sync::Arc;
        use uuid::Uuid;

        async fn live_app(ai: Arc<ScriptedAi>) -> Router {
            let url = std::env::var("DATABASE_URL").expect("DATABASE_URL");
            let db = sqlx::postgres::PgPoolOptions::new()
                .max_connections(2)
                .connect(&url)
                .await
                .expect("connect");
            sqlx::migrate!("./migrations").run(&db).await.expect("migrate");
            build_app(AppState::from_parts(
                db,
                Arc::new(crate::state::test_config()),
                ai,
            ))
        }

        async fn register(app: &Router, name: &str) -> (String, String) {
            let suffix = Uuid::new_v4().simple().to_string();
            let (status, body) = send(
                app,
                request(
                    Method::POST,
                    "/api/users/register",
                    None,
                    Some(json!({
                        "username": format!("{name}-{suffix}"),
                        "email": format!("{name}-{suffix}@x.com"),
                        "password": "pw12345"
                    })),
                ),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
            (
                body["user"]["id"].as_str().unwrap().to_string(),
                format!("{name}-{suffix}@x.com"),
            )
        }

        fn timestamp(v: &Value) -> time::OffsetDateTime {
            time::OffsetDateTime::parse(
                v.as_str().unwrap(),
                &time::format_description::well_known::Rfc3339,
            )
            .unwrap()
        }

        async fn login(app: &Router, email: &str) -> String {
            let (status, body) = send(
                app,
                request(
                    Method::POST,
                    "/api/users/login",
                    None,
                    Some(json!({ "email": email, "password": "pw12345" })),
                ),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            body["token"].as_str().unwrap().to_string()
        }

        #[tokio::test]
        #[ignore]
        async fn register_login_create_skill_and_cross_user_forbidden() {
            let app = live_app(Arc::new(ScriptedAi::reply("{}"))).await;
            let (alice_id, alice_email) = register(&app, "alice").await;
            let (bob_id, _) = register(&app, "bob").await;
            let token = login(&app, &alice_email).await;

            let (status, skill) = send(
                &app,
                request(
                    Method::POST,
                    "/api/skills",
                    Some(&token),
                    Some(json!({
                        "skillName": "Go",
                        "proficiencyLevel": "Advanced",
                        "yearsExperience": 5,
                        "userId": bob_id
                    })),
                ),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
            assert_eq!(skill["userId"], alice_id);

            let (status, _) = send(
                &app,
                request(
                    Method::GET,
                    &format!("/api/skills/user/{bob_id}"),
                    Some(&token),
                    None,
                ),
            )
            .await;
            assert_eq!(status, StatusCode::FORBIDDEN);
        }

        #[tokio::test]
        #[ignore]
        async fn qualification_fields_round_trip() {
            let app = live_app(Arc::new(ScriptedAi::reply("{}"))).await;
            let (_, email) = register(&app, "carol").await;
            let token = login(&app, &email).await;

            let (status, created) = send(
                &app,
                request(
                    Method::POST,
                    "/api/qualifications",
                    Some(&token),
                    Some(json!({
                        "title": "BSc Computer Science",
                        "institution": "MIT",
                        "dateObtained": "2020-06-01T00:00:00Z",
                        "description": "Graduated with honors"
                    })),
                ),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);

            let id = created["id"].as_str().unwrap();
            let (status, fetched) = send(
                &app,
                request(
                    Method::GET,
                    &format!("/api/qualifications/{id}"),
                    Some(&token),
                    None,
                ),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(fetched["description"], "Graduated with honors");
            assert_eq!(fetched["institution"], "MIT");
            assert_eq!(fetched["owner"]["email"], email);

            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            let (status, _) = send(
                &app,
                request(
                    Method::PUT,
                    &format!("/api/qualifications/{id}"),
                    Some(&token),
                    Some(json!({ "description": "Summa cum laude" })),
                ),
            )
            .await;
            assert_eq!(status, StatusCode::OK);

            let (_, updated) = send(
                &app,
                request(
                    Method::GET,
                    &format!("/api/qualifications/{id}"),
                    Some(&token),
                    None,
                ),
            )
            .await;
            assert_eq!(updated["description"], "Summa cum laude");
            assert_eq!(updated["title"], "BSc Computer Science");
            assert_eq!(updated["institution"], "MIT");
            assert_eq!(updated["dateObtained"], created["dateObtained"]);
            assert!(timestamp(&updated["updatedAt"]) > timestamp(&created["updatedAt"]));
        }

        #[tokio::test]
        #[ignore]
        async fn generation_persists_nothing_on_malformed_reply() {
            let ai = Arc::new(ScriptedAi::reply("not json at all"));
            let app = live_app(ai.clone()).await;
            let (user_id, email) = register(&app, "dave").await;
            let token = login(&app, &email).await;

            let (status, _) = send(
                &app,
                request(
                    Method::POST,
                    &format!("/api/recommendations/generate/{user_id}"),
                    Some(&token),
                    None,
                ),
            )
            .await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "no grounding data yet");
            assert_eq!(ai.calls(), 0);

            send(
                &app,
                request(
                    Method::POST,
                    "/api/interests",
                    Some(&token),
                    Some(json!({ "interestName": "Robotics" })),
                ),
            )
            .await;

            let (status, _) = send(
                &app,
                request(
                    Method::POST,
                    &format!("/api/recommendations/generate/{user_id}"),
                    Some(&token),
                    None,
                ),
            )
            .await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(ai.calls(), 1);

            let (status, recs) = send(
                &app,
                request(Method::GET, "/api/recommendations", Some(&token), None),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(recs, json!([]));
        }

        async fn create_skill(app: &Router, token: &str) -> String {
            let (status, skill) = send(
                app,
                request(
                    Method::POST,
                    "/api/skills",
                    Some(token),
                    Some(json!({ "skillName": "Go", "yearsExperience": 5 })),
                ),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
            skill["id"].as_str().unwrap().to_string()
        }

        #[tokio::test]
        #[ignore]
        async fn update_checks_existence_and_owner_before_body() {
            let app = live_app(Arc::new(ScriptedAi::reply("{}"))).await;
            let (_, alice_email) = register(&app, "alice").await;
            let (_, bob_email) = register(&app, "bob").await;
            let alice = login(&app, &alice_email).await;
            let bob = login(&app, &bob_email).await;
            let skill_id = create_skill(&app, &alice).await;

            let (status, _) = send(
                &app,
                request(
                    Method::PUT,
                    &format!("/api/skills/{skill_id}"),
                    Some(&bob),
                    Some(json!({ "yearsExperience": "five" })),
                ),
            )
            .await;
            assert_eq!(status, StatusCode::FORBIDDEN);

            let (status, _) = send(
                &app,
                request(
                    Method::PUT,
                    &format!("/api/skills/{}", Uuid::new_v4()),
                    Some(&alice),
                    Some(json!({ "proficiencyLevel": "Expert" })),
                ),
            )
            .await;
            assert_eq!(status, StatusCode::NOT_FOUND);

            let (status, _) = send(
                &app,
                request(
                    Method::PUT,
                    &format!("/api/skills/{skill_id}"),
                    Some(&alice),
                    Some(json!({ "yearsExperience": "five" })),
                ),
            )
            .await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
        }

        #[tokio::test]
        #[ignore]
        async fn foreign_record_get_put_delete_are_forbidden() {
            let app = live_app(Arc::new(ScriptedAi::reply("{}"))).await;
            let (_, alice_email) = register(&app, "alice").await;
            let (_, bob_email) = register(&app, "bob").await;
            let alice = login(&app, &alice_email).await;
            let bob = login(&app, &bob_email).await;
            let skill_id = create_skill(&app, &alice).await;
            let uri = format!("/api/skills/{skill_id}");

            for (method, body) in [
                (Method::GET, None),
                (Method::PUT, Some(json!({ "skillName": "Rust" }))),
                (Method::DELETE, None),
            ] {
                let (status, _) = send(&app, request(method.clone(), &uri, Some(&bob), body)).await;
                assert_eq!(status, StatusCode::FORBIDDEN, "{method}");
            }

            let (status, skill) = send(&app, request(Method::GET, &uri, Some(&alice), None)).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(skill["skillName"], "Go");

            let (status, _) = send(
                &app,
                request(
                    Method::GET,
                    &format!("/api/skills/{}", Uuid::new_v4()),
                    Some(&bob),
                    None,
                ),
            )
            .await;
            assert_eq!(status, StatusCode::NOT_FOUND);
        }

        #[tokio::test]
        #[ignore]
        async fn generation_persists_every_suggestion_with_defaults() {
            let ai = Arc::new(ScriptedAi::reply(
                r#"```json
                {"recommendations":[
                  {"career":"Robotics Engineer","explanation":"Loves robots",
                   "courses":[{"title":"ROS Basics","link":"https://example.test/ros"}],
                   "confidence":0.7,"skillGaps":["C++"]},
                  {"career":"Embedded Developer","explanation":"Hardware interest","courses":[]}
                ]}
                ```"#,
            ));
            let app = live_app(ai.clone()).await;
            let (user_id, email) = register(&app, "erin").await;
            let token = login(&app, &email).await;
            send(
                &app,
                request(
                    Method::POST,
                    "/api/interests",
                    Some(&token),
                    Some(json!({ "interestName": "Robotics" })),
                ),
            )
            .await;

            let (status, body) = send(
                &app,
                request(
                    Method::POST,
                    &format!("/api/recommendations/generate/{user_id}"),
                    Some(&token),
                    None,
                ),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
            assert_eq!(ai.calls(), 1);
            assert!(body["message"].is_string());
            assert_eq!(body["aiResponse"]["recommendations"].as_array().unwrap().len(), 2);

            let recs = body["recommendations"].as_array().unwrap();
            assert_eq!(recs.len(), 2);
            assert!(recs.iter().all(|r| r["userId"] == user_id));
            assert!(recs.iter().all(|r| r["aiModelUsed"] == "scripted-model"));
            assert_eq!(recs[0]["careerSuggestion"], "Robotics Engineer");
            assert_eq!(recs[0]["confidenceScore"], 0.7);
            assert_eq!(recs[0]["skillGaps"], json!(["C++"]));
            let courses: Value =
                serde_json::from_str(recs[0]["courseLink"].as_str().unwrap()).unwrap();
            assert_eq!(courses[0]["title"], "ROS Basics");
            assert_eq!(recs[1]["confidenceScore"], 0.85);
            assert_eq!(recs[1]["skillGaps"], json!([]));
            assert_eq!(recs[1]["justification"], "Hardware interest");

            let (status, stored) = send(
                &app,
                request(
                    Method::GET,
                    &format!("/api/recommendations/user/{user_id}"),
                    Some(&token),
                    None,
                ),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(stored.as_array().unwrap().len(), 2);
        }
    }
}
