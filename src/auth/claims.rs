use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Access tokens open the API; refresh tokens only buy a new pair.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT payload shared by both token kinds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Id of the user the token was issued to.
    pub sub: Uuid,
    /// Unix seconds.
    pub iat: usize,
    /// Unix seconds.
    pub exp: usize,
    pub iss: String,
    pub aud: String,
    pub kind: TokenKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_is_serialized_lowercase() {
        let claims = Claims {
            sub: Uuid::nil(),
            iat: 1,
            exp: 2,
            iss: "careerpath".into(),
            aud: "careerpath-users".into(),
            kind: TokenKind::Refresh,
        };
        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["kind"], "refresh");
        assert_eq!(json["sub"], Uuid::nil().to_string());
    }
}
