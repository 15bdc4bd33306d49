use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
};
use jsonwebtoken::{DecodingKey, Validation, decode};
use tracing::error;

use crate::dto::claims_dto::Claims;

/// HS256 secret used to verify bearer tokens, installed as a request extension.
#[derive(Clone)]
pub struct JwtSecret(pub String);

pub struct AuthUser(pub Claims);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let secret = parts
            .extensions
            .get::<JwtSecret>()
            .cloned()
            .ok_or((StatusCode::INTERNAL_SERVER_ERROR, "Authentication is not configured"))?;

        let headers = &parts.headers;
        let auth = headers.get("Authorization").and_then(|h| h.to_str().ok());
        let token = auth
            .and_then(|s| s.strip_prefix("Bearer "))
            .ok_or((StatusCode::UNAUTHORIZED, "Missing or invalid Authorization header"))?;

        let claims = decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret.0.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| {
            error!("Token decoding failed: {:?}", e);
            (StatusCode::UNAUTHORIZED, "Invalid token")
        })?;

        Ok(AuthUser(claims.claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use jsonwebtoken::{EncodingKey, Header, encode};

    const SECRET: &str = "test-secret";

    fn parts(authorization: Option<String>, with_secret: bool) -> Parts {
        let mut builder = Request::builder().uri("/leagues/1/draft/picks");
        if let Some(value) = authorization {
            builder = builder.header("Authorization", value);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        if with_secret {
            parts.extensions.insert(JwtSecret(SECRET.to_string()));
        }
        parts
    }

    fn token(secret: &str) -> String {
        let claims = Claims {
            sub: "owner1".to_string(),
            exp: (chrono::Utc::now().timestamp() + 600) as usize,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    #[tokio::test]
    async fn valid_bearer_token_yields_claims() {
        let mut parts = parts(Some(format!("Bearer {}", token(SECRET))), true);
        let AuthUser(claims) = AuthUser::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(claims.sub, "owner1");
    }

    #[tokio::test]
    async fn rejects_missing_or_foreign_tokens() {
        let mut missing = parts(None, true);
        let err = AuthUser::from_request_parts(&mut missing, &()).await.err().unwrap();
        assert_eq!(err.0, StatusCode::UNAUTHORIZED);

        let mut forged = parts(Some(format!("Bearer {}", token("other"))), true);
        let err = AuthUser::from_request_parts(&mut forged, &()).await.err().unwrap();
        assert_eq!(err.0, StatusCode::UNAUTHORIZED);

        let mut unconfigured = parts(Some(format!("Bearer {}", token(SECRET))), false);
        let err = AuthUser::from_request_parts(&mut unconfigured, &()).await.err().unwrap();
        assert_eq!(err.0, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
