use serde::Deserialize;

use crate::errors::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInterestRequest {
    pub interest_name: String,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInterestRequest {
    pub interest_name: Option<String>,
    pub description: Option<String>,
}

fn check_name(name: &str) -> Result<(), AppError> {
    if name.trim().is_empty() {
        return Err(AppError::Validation("interestName is required".into()));
    }
    Ok(())
}

impl CreateInterestRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        check_name(&self.interest_name)
    }
}

impl UpdateInterestRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        self.interest_name.as_deref().map_or(Ok(()), check_name)
    }
}
