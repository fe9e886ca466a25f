use actix_web::{HttpMessage, HttpResponse, dev::ServiceRequest};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    env_config::JwtConfig,
    error::{AppError, Res},
};

/// Claims carried by a Supabase access token. Only the fields the dashboard
/// needs are decoded.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JwtClaims {
    /// Supabase user id.
    pub sub: Uuid,
    pub aud: String,
    pub exp: usize,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: UserMetadata,
}

/// Profile fields set at sign-up.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct UserMetadata {
    #[serde(default)]
    pub user_type: Option<String>,
}

impl JwtClaims {
    pub fn user_id(&self) -> Uuid {
        self.sub
    }
}

/// Signs claims with the project secret. Supabase issues the real tokens;
/// this is used by local tooling and tests.
pub fn encode_jwt(claims: &JwtClaims, config: &JwtConfig) -> Res<String> {
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(AppError::from)
}

/// Extracts claims object from a Supabase access token.
pub fn validate_jwt(token: &str, config: &JwtConfig) -> Res<JwtClaims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[config.audience.as_str()]);

    let token_data = jsonwebtoken::decode::<JwtClaims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )?;
    Ok(token_data.claims)
}

pub fn get_jwt_claims_or_error(req: &ServiceRequest) -> Result<JwtClaims, HttpResponse> {
    if let Some(jwt_claims_res) = req.extensions().get::<Res<JwtClaims>>() {
        match jwt_claims_res {
            Ok(claims) => Ok(claims.clone()),
            Err(app_error) => Err(app_error.to_http_response()),
        }
    } else {
        Err(
            AppError::Unauthorized("No authorization token provided".to_string())
                .to_http_response(),
        )
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;

    fn config() -> JwtConfig {
        JwtConfig {
            secret: "super-secret-jwt-token-with-at-least-32-characters".to_string(),
            audience: "authenticated".to_string(),
        }
    }

    fn claims(aud: &str, exp_in: Duration) -> JwtClaims {
        JwtClaims {
            sub: Uuid::new_v4(),
            aud: aud.to_string(),
            exp: (Utc::now() + exp_in).timestamp() as usize,
            email: Some("owner@example.com".to_string()),
            user_metadata: UserMetadata {
                user_type: Some("agency".to_string()),
            },
        }
    }

    #[test]
    fn validates_signed_token() {
        let original = claims("authenticated", Duration::hours(1));
        let token = encode_jwt(&original, &config()).unwrap();
        let decoded = validate_jwt(&token, &config()).unwrap();
        assert_eq!(decoded.user_id(), original.sub);
        assert_eq!(decoded.user_metadata.user_type.as_deref(), Some("agency"));
    }

    #[test]
    fn rejects_wrong_audience() {
        let token = encode_jwt(&claims("anon", Duration::hours(1)), &config()).unwrap();
        assert!(validate_jwt(&token, &config()).is_err());
    }

    #[test]
    fn rejects_expired_token() {
        let token = encode_jwt(&claims("authenticated", -Duration::hours(2)), &config()).unwrap();
        assert!(validate_jwt(&token, &config()).is_err());
    }

    #[test]
    fn rejects_foreign_signature() {
        let token = encode_jwt(&claims("authenticated", Duration::hours(1)), &config()).unwrap();
        let other = JwtConfig {
            secret: "another-project-secret-another-project-secret".to_string(),
            ..config()
        };
        assert!(validate_jwt(&token, &other).is_err());
    }

    #[test]
    fn metadata_is_optional() {
        let json = serde_json::json!({
            "sub": Uuid::nil(),
            "aud": "authenticated",
            "exp": 1,
        });
        let claims: JwtClaims = serde_json::from_value(json).unwrap();
        assert!(claims.user_metadata.user_type.is_none());
        assert!(claims.email.is_none());
    }
}
