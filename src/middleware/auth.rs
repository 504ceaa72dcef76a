// src/middleware/auth.rs
//
// Identity is an external collaborator: tokens are issued elsewhere, this
// middleware only verifies them and lifts the caller into a `Principal`.
use axum::{
    body::Body,
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::Config;
use crate::db::models::user::{Principal, Role};
use crate::utils::api_response::ApiResponse;

/// JWT claims attached by the identity provider.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject - user id as string.
    pub sub: String,
    pub username: String,
    pub role: String,
    /// Expiration time (UNIX time).
    pub exp: usize,
}

impl Claims {
    pub fn principal(&self) -> Option<Principal> {
        let id = self.sub.parse::<i32>().ok()?;
        let role = Role::parse(&self.role)?;
        Some(Principal { id, role })
    }
}

pub async fn jwt_middleware(mut req: Request<Body>, next: Next) -> Result<Response, Response> {
    let auth_header = req.headers().get("Authorization").ok_or_else(|| {
        ApiResponse::<()>::error(StatusCode::UNAUTHORIZED, "Missing Authorization header", None)
            .into_response()
    })?;

    let token_str = auth_header.to_str().map_err(|_| {
        ApiResponse::<()>::error(
            StatusCode::BAD_REQUEST,
            "Invalid Authorization header format",
            None,
        )
        .into_response()
    })?;

    let token = token_str.strip_prefix("Bearer ").ok_or_else(|| {
        ApiResponse::<()>::error(
            StatusCode::BAD_REQUEST,
            "Invalid token format (missing 'Bearer ' prefix)",
            None,
        )
        .into_response()
    })?;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(Config::get().jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        tracing::warn!(error = %e, "JWT decoding failed");
        ApiResponse::<()>::error(
            StatusCode::UNAUTHORIZED,
            "Invalid token",
            Some(json!({ "error": e.to_string() })),
        )
        .into_response()
    })?;

    let principal = token_data.claims.principal().ok_or_else(|| {
        ApiResponse::<()>::error(
            StatusCode::UNAUTHORIZED,
            "Token carries an invalid subject or role",
            None,
        )
        .into_response()
    })?;

    req.extensions_mut().insert(token_data.claims);
    req.extensions_mut().insert(principal);
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claims_resolve_to_a_principal() {
        let claims = Claims {
            sub: "42".into(),
            username: "amina".into(),
            role: "chef".into(),
            exp: 0,
        };
        let principal = claims.principal().unwrap();
        assert_eq!(principal.id, 42);
        assert_eq!(principal.role, Role::Chef);
    }

    #[test]
    fn role_parsing_is_case_insensitive_and_closed() {
        let mut claims = Claims {
            sub: "1".into(),
            username: "x".into(),
            role: "ADMIN".into(),
            exp: 0,
        };
        assert_eq!(claims.principal().unwrap().role, Role::Admin);

        claims.role = "superuser".into();
        assert!(claims.principal().is_none());

        claims.role = "admin".into();
        claims.sub = "not-a-number".into();
        assert!(claims.principal().is_none());
    }
}
