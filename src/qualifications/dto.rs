use serde::Deserialize;
use time::OffsetDateTime;

use crate::errors::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateQualificationRequest {
    pub title: String,
    pub institution: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub date_obtained: Option<OffsetDateTime>,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQualificationRequest {
    pub title: Option<String>,
    pub institution: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub date_obtained: Option<OffsetDateTime>,
    pub description: Option<String>,
}

fn check_title(title: &str) -> Result<(), AppError> {
    if title.trim().is_empty() {
        return Err(AppError::Validation("title is required".into()));
    }
    Ok(())
}

impl CreateQualificationRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        check_title(&self.title)
    }
}

impl UpdateQualificationRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        self.title.as_deref().map_or(Ok(()), check_title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_obtained_is_rfc3339() {
        let req: CreateQualificationRequest = serde_json::from_str(
            r#"{"title":"BSc","institution":"MIT","dateObtained":"2020-06-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(req.date_obtained.unwrap().year(), 2020);
        assert!(req.validate().is_ok());

        assert!(serde_json::from_str::<CreateQualificationRequest>(
            r#"{"title":"BSc","dateObtained":"last summer"}"#
        )
        .is_err());
    }

    #[test]
    fn optional_fields_may_be_absent() {
        let req: CreateQualificationRequest = serde_json::from_str(r#"{"title":"BSc"}"#).unwrap();
        assert!(req.institution.is_none());
        assert!(req.date_obtained.is_none());
    }

    #[test]
    fn description_only_update_is_valid() {
        let req: UpdateQualificationRequest =
            serde_json::from_str(r#"{"description":"with honours"}"#).unwrap();
        assert!(req.title.is_none());
        assert!(req.validate().is_ok());

        let blank = UpdateQualificationRequest {
            title: Some(" ".into()),
            ..Default::default()
        };
        assert!(blank.validate().is_err());
    }
}
