use serde::{Deserialize, Serialize};

use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "proficiency_level")]
pub enum Proficiency {
    Beginner,
    Intermediate,
    Advanced,
}

/// Body of `POST /skills`. The owner always comes from the token; a `userId`
/// in the body is ignored.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSkillRequest {
    pub skill_name: String,
    pub proficiency_level: Option<Proficiency>,
    pub years_experience: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSkillRequest {
    pub skill_name: Option<String>,
    pub proficiency_level: Option<Proficiency>,
    pub years_experience: Option<f64>,
}

fn check_name(name: &str) -> Result<(), AppError> {
    if name.trim().is_empty() {
        return Err(AppError::Validation("skillName is required".into()));
    }
    Ok(())
}

fn check_years(years: Option<f64>) -> Result<(), AppError> {
    match years {
        Some(y) if !y.is_finite() || y < 0.0 => Err(AppError::Validation(
            "yearsExperience must be a non-negative number".into(),
        )),
        _ => Ok(()),
    }
}

impl CreateSkillRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        check_name(&self.skill_name)?;
        check_years(self.years_experience)
    }
}

impl UpdateSkillRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(name) = &self.skill_name {
            check_name(name)?;
        }
        check_years(self.years_experience)
    }
}
