use std::fmt;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{HeaderMap, Method};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::error::{SchoolError, SchoolResult};
use crate::server::types::ApiErrorType;
use crate::types::AppState;

/// Identifies a caller by a hash of their bearer token.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct PrincipalKey(String);

impl PrincipalKey {
    /// Hashes the raw token so it is never kept around.
    pub fn from_token(token: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        let digest = hasher.finalize();
        let hash = digest[..16].iter().map(|b| format!("{b:02x}")).collect();
        Self(hash)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PrincipalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}...", &self.0[..8.min(self.0.len())])
    }
}

/// Role claimed by the caller through the `x-role` header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Role {
    Admin,
    Teacher,
    Student,
    Parent,
    #[default]
    Guest,
}

impl Role {
    fn from_header(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" => Role::Admin,
            "teacher" => Role::Teacher,
            "student" => Role::Student,
            "parent" => Role::Parent,
            _ => Role::Guest,
        }
    }
}

/// Who is calling, attached to every request as an extension.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthContext {
    pub principal: Option<PrincipalKey>,
    pub role: Role,
}

impl AuthContext {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let principal = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(PrincipalKey::from_token);
        let role = headers
            .get("x-role")
            .and_then(|v| v.to_str().ok())
            .map(Role::from_header)
            .unwrap_or_default();

        Self { principal, role }
    }

    /// Short label for log lines, e.g. `3f2a9c1e... (Admin)`.
    pub fn caller(&self) -> String {
        match &self.principal {
            Some(p) => format!("{} ({:?})", p, self.role),
            None => format!("anonymous ({:?})", self.role),
        }
    }
}

/// Decides whether a caller may perform a request.
pub trait AccessPolicy: Send + Sync {
    fn check(&self, ctx: &AuthContext, method: &Method, path: &str) -> SchoolResult<()>;
}

/// Lets every request through.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl AccessPolicy for AllowAll {
    fn check(&self, _ctx: &AuthContext, _method: &Method, _path: &str) -> SchoolResult<()> {
        Ok(())
    }
}

/// Builds the caller's [`AuthContext`] and asks the configured policy about the request.
pub async fn authorize(
    State(s): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    let ctx = AuthContext::from_headers(req.headers());
    let path = req.uri().path().to_string();

    if let Err(e) = s.policy.check(&ctx, req.method(), &path) {
        match &ctx.principal {
            Some(p) => warn!("Denied {} {} for {} ({:?}): {}", req.method(), path, p, ctx.role, e),
            None => warn!("Denied {} {} for anonymous caller: {}", req.method(), path, e),
        }
        return ApiErrorType::from(e).into_response();
    }

    req.extensions_mut().insert(ctx);
    next.run(req).await
}

/// Only admins may change anything; reads are open. Useful as a stricter default.
#[derive(Debug, Clone, Copy, Default)]
pub struct AdminWrites;

impl AccessPolicy for AdminWrites {
    fn check(&self, ctx: &AuthContext, method: &Method, _path: &str) -> SchoolResult<()> {
        if method == Method::GET || method == Method::HEAD || ctx.role == Role::Admin {
            Ok(())
        } else {
            Err(SchoolError::Forbidden(
                "Only administrators may modify school records".to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_principal_key_hides_token() {
        let key = PrincipalKey::from_token("secret-token");
        assert_eq!(key.as_str().len(), 32);
        assert!(!key.as_str().contains("secret"));
        assert_eq!(key, PrincipalKey::from_token("secret-token"));
        assert_eq!(key.to_string(), format!("{}...", &key.as_str()[..8]));
    }

    #[test]
    fn test_context_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer abc"));
        headers.insert("x-role", HeaderValue::from_static("Teacher"));
        let ctx = AuthContext::from_headers(&headers);
        assert_eq!(ctx.principal, Some(PrincipalKey::from_token("abc")));
        assert_eq!(ctx.role, Role::Teacher);

        let anonymous = AuthContext::from_headers(&HeaderMap::new());
        assert_eq!(anonymous, AuthContext::default());
    }

    #[test]
    fn test_caller_label() {
        let ctx = AuthContext {
            principal: Some(PrincipalKey::from_token("secret-token")),
            role: Role::Teacher,
        };
        let label = ctx.caller();
        assert!(label.ends_with("... (Teacher)"));
        assert!(!label.contains("secret"));
        assert_eq!(AuthContext::default().caller(), "anonymous (Guest)");
    }

    #[test]
    fn test_admin_writes_policy() {
        let policy = AdminWrites;
        let guest = AuthContext::default();
        let admin = AuthContext {
            principal: None,
            role: Role::Admin,
        };
        assert!(policy.check(&guest, &Method::GET, "/api/students").is_ok());
        assert!(matches!(
            policy.check(&guest, &Method::POST, "/api/students"),
            Err(SchoolError::Forbidden(_))
        ));
        assert!(policy.check(&admin, &Method::DELETE, "/api/students/x").is_ok());
    }
}
