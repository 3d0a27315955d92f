use serde::{Deserialize, Serialize};

use super::repo::Recommendation;
use crate::errors::AppError;

pub const DEFAULT_CONFIDENCE: f64 = 0.85;

/// Body of `POST /recommendations` for a client-written recommendation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRecommendationRequest {
    pub career_suggestion: String,
    pub justification: Option<String>,
    pub course_link: Option<String>,
    pub ai_model_used: Option<String>,
    pub confidence_score: Option<f64>,
    pub skill_gaps: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRecommendationRequest {
    pub career_suggestion: Option<String>,
    pub justification: Option<String>,
    pub course_link: Option<String>,
    pub ai_model_used: Option<String>,
    pub confidence_score: Option<f64>,
    pub skill_gaps: Option<Vec<String>>,
}

fn check_career(career: &str) -> Result<(), AppError> {
    if career.trim().is_empty() {
        return Err(AppError::Validation("careerSuggestion is required".into()));
    }
    Ok(())
}

pub(crate) fn confidence_in_range(score: f64) -> bool {
    (0.0..=1.0).contains(&score)
}

fn check_confidence(score: Option<f64>) -> Result<(), AppError> {
    match score {
        Some(s) if !confidence_in_range(s) => Err(AppError::Validation(
            "confidenceScore must be between 0 and 1".into(),
        )),
        _ => Ok(()),
    }
}

impl CreateRecommendationRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        check_career(&self.career_suggestion)?;
        check_confidence(self.confidence_score)
    }
}

impl UpdateRecommendationRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(career) = &self.career_suggestion {
            check_career(career)?;
        }
        check_confidence(self.confidence_score)
    }
}

/// Reply the model is asked to produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CareerReply {
    pub recommendations: Vec<CareerSuggestion>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CareerSuggestion {
    pub career: String,
    pub explanation: String,
    pub courses: Vec<Course>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skill_gaps: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub title: String,
    pub link: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedRecommendations {
    pub message: String,
    pub recommendations: Vec<Recommendation>,
    pub ai_response: CareerReply,
}
