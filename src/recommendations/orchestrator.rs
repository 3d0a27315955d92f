//! Career generation for one user.
//!
//! Loads the user's skills, qualifications and interests, asks the configured
//! [`AiClient`] for three career suggestions and stores each suggestion as a
//! [`Recommendation`]. All rows of one generation are written in a single
//! transaction, so a failed insert leaves nothing behind.

use anyhow::Context;
use sqlx::PgPool;
use tracing::{error, info, instrument};
use uuid::Uuid;

use super::{
    dto::{confidence_in_range, CareerReply, GeneratedRecommendations, DEFAULT_CONFIDENCE},
    prompts,
    repo::{self, NewRecommendation, Recommendation},
};
use crate::{
    ai::{strip_json_fences, AiClient},
    errors::AppError,
    interests::repo::{self as interests_repo, Interest},
    ownership::Pagination,
    qualifications::repo::{self as qualifications_repo, Qualification},
    skills::repo::{self as skills_repo, Skill},
    state::AppState,
    users::repo::User,
};

/// Everything the prompt is grounded on.
pub struct Profile {
    pub user: User,
    pub skills: Vec<Skill>,
    pub qualifications: Vec<Qualification>,
    pub interests: Vec<Interest>,
}

impl Profile {
    pub fn is_empty(&self) -> bool {
        self.skills.is_empty() && self.qualifications.is_empty() && self.interests.is_empty()
    }
}

pub async fn load_profile(db: &PgPool, user_id: Uuid) -> Result<Profile, AppError> {
    let user = User::find_by_id(db, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    let all = Pagination::default();
    let skills = skills_repo::list_by_owner(db, user_id, all).await?;
    let qualifications = qualifications_repo::list_by_owner(db, user_id, all).await?;
    let interests = interests_repo::list_by_owner(db, user_id, all).await?;

    Ok(Profile {
        user,
        skills,
        qualifications,
        interests,
    })
}

/// Prompts the model and validates its reply. Makes no call for an empty profile.
pub async fn ask_model(ai: &dyn AiClient, profile: &Profile) -> Result<CareerReply, AppError> {
    if profile.is_empty() {
        return Err(AppError::InsufficientData);
    }

    let prompt = prompts::career_prompt(
        &profile.user,
        &profile.skills,
        &profile.qualifications,
        &profile.interests,
    );
    let raw = ai.generate(&prompt).await.map_err(|e| {
        error!(error = %e, model = ai.model(), "career generation call failed");
        AppError::ExternalService(e.to_string())
    })?;

    parse_reply(&raw)
}

pub fn parse_reply(raw: &str) -> Result<CareerReply, AppError> {
    let malformed = |reason: String| AppError::MalformedAiResponse {
        reason,
        raw: raw.to_string(),
    };

    let reply: CareerReply =
        serde_json::from_str(strip_json_fences(raw)).map_err(|e| malformed(e.to_string()))?;

    if reply.recommendations.is_empty() {
        return Err(malformed("recommendations is empty".into()));
    }
    for (i, s) in reply.recommendations.iter().enumerate() {
        if s.career.trim().is_empty() {
            return Err(malformed(format!("recommendations[{i}].career is empty")));
        }
        if let Some(c) = s.confidence {
            if !confidence_in_range(c) {
                return Err(malformed(format!(
                    "recommendations[{i}].confidence {c} is outside 0..=1"
                )));
            }
        }
    }
    Ok(reply)
}

pub fn to_records(reply: &CareerReply, model: &str) -> Result<Vec<NewRecommendation>, AppError> {
    reply
        .recommendations
        .iter()
        .map(|s| -> Result<NewRecommendation, AppError> {
            Ok(NewRecommendation {
                career_suggestion: s.career.trim().to_string(),
                justification: Some(s.explanation.clone()),
                course_link: Some(
                    serde_json::to_string(&s.courses).context("serialize courses")?,
                ),
                ai_model_used: Some(model.to_string()),
                confidence_score: Some(s.confidence.unwrap_or(DEFAULT_CONFIDENCE)),
                skill_gaps: s.skill_gaps.clone().unwrap_or_default(),
            })
        })
        .collect()
}

pub async fn persist(
    db: &PgPool,
    user_id: Uuid,
    records: &[NewRecommendation],
) -> Result<Vec<Recommendation>, AppError> {
    let mut tx = db.begin().await.context("begin tx")?;
    let mut saved = Vec::with_capacity(records.len());
    for rec in records {
        saved.push(repo::insert_tx(&mut tx, user_id, rec).await?);
    }
    tx.commit().await.context("commit tx")?;
    Ok(saved)
}

/// Caller identity has already been checked against `user_id`.
#[instrument(skip(state))]
pub async fn generate(
    state: &AppState,
    user_id: Uuid,
) -> Result<GeneratedRecommendations, AppError> {
    let profile = load_profile(&state.db, user_id).await?;
    let reply = ask_model(state.ai.as_ref(), &profile).await?;
    let records = to_records(&reply, state.ai.model())?;
    let saved = persist(&state.db, user_id, &records).await?;

    info!(%user_id, count = saved.len(), model = state.ai.model(), "recommendations generated");
    Ok(GeneratedRecommendations {
        message: "Career recommendations generated successfully".into(),
        recommendations: saved,
        ai_response: reply,
    })
}
