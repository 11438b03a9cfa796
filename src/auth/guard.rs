//! Request guards for admin routes

use hyper::header::{HeaderMap, AUTHORIZATION};
use tracing::debug;

use crate::auth::{extract_token_from_header, has_permission, Claims, JwtValidator};
use crate::types::AdminError;

/// Validate admin access from request headers.
///
/// Missing or non-Bearer header and any verification failure are 401;
/// a valid token whose role is not an admin-panel role is 403.
pub fn require_admin(headers: &HeaderMap, jwt: &JwtValidator) -> Result<Claims, AdminError> {
    let auth_header = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());

    let token = extract_token_from_header(auth_header)
        .ok_or_else(|| AdminError::Unauthorized("Token required".into()))?;

    let result = jwt.verify_token(token);
    let claims = match (result.valid, result.claims) {
        (true, Some(claims)) => claims,
        _ => {
            debug!(reason = ?result.error, "Rejected admin token");
            return Err(AdminError::Unauthorized("Invalid token".into()));
        }
    };

    if claims.admin_role().is_none() {
        return Err(AdminError::Forbidden("Access denied - invalid role".into()));
    }

    Ok(claims)
}

/// Require a specific permission on top of an admin role
pub fn require_permission(claims: &Claims, permission: &str) -> Result<(), AdminError> {
    let role = claims
        .admin_role()
        .ok_or_else(|| AdminError::Forbidden("Access denied - invalid role".into()))?;

    if has_permission(role, claims.permissions.as_deref(), permission) {
        Ok(())
    } else {
        Err(AdminError::Forbidden(format!(
            "Access denied - permission '{permission}' required"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AdminRole, TokenInput, PERMISSION_BUDGET};
    use hyper::header::HeaderValue;

    fn validator() -> JwtValidator {
        JwtValidator::new(
            "test-secret-that-is-at-least-32-characters-long".into(),
            3600,
        )
        .unwrap()
    }

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    fn token(role: AdminRole, permissions: Option<Vec<String>>) -> String {
        validator()
            .generate_token(TokenInput {
                username: "jeza".into(),
                role,
                permissions,
            })
            .unwrap()
    }

    #[test]
    fn test_missing_header_is_unauthorized() {
        let err = require_admin(&HeaderMap::new(), &validator()).unwrap_err();
        assert!(matches!(err, AdminError::Unauthorized(_)));
    }

    #[test]
    fn test_non_bearer_is_unauthorized() {
        let headers = headers_with(&format!("Basic {}", token(AdminRole::Admin, None)));
        let err = require_admin(&headers, &validator()).unwrap_err();
        assert!(matches!(err, AdminError::Unauthorized(_)));
    }

    #[test]
    fn test_garbage_token_is_unauthorized() {
        let err = require_admin(&headers_with("Bearer not.a.jwt"), &validator()).unwrap_err();
        assert!(matches!(err, AdminError::Unauthorized(_)));
    }

    #[test]
    fn test_valid_admin_token() {
        let headers = headers_with(&format!("Bearer {}", token(AdminRole::Admin, None)));
        let claims = require_admin(&headers, &validator()).unwrap();
        assert_eq!(claims.username, "jeza");
    }

    #[test]
    fn test_permission_checks() {
        let admin = require_admin(
            &headers_with(&format!("Bearer {}", token(AdminRole::Admin, None))),
            &validator(),
        )
        .unwrap();
        assert!(matches!(
            require_permission(&admin, PERMISSION_BUDGET),
            Err(AdminError::Forbidden(_))
        ));

        let editor = require_admin(
            &headers_with(&format!(
                "Bearer {}",
                token(AdminRole::ContentEditor, Some(vec!["budget".into()]))
            )),
            &validator(),
        )
        .unwrap();
        assert!(require_permission(&editor, PERMISSION_BUDGET).is_ok());

        let root = require_admin(
            &headers_with(&format!("Bearer {}", token(AdminRole::SuperAdmin, None))),
            &validator(),
        )
        .unwrap();
        assert!(require_permission(&root, PERMISSION_BUDGET).is_ok());
    }
}
