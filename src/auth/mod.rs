/*!
 * # Authentication and Authorization Module
 *
 * Bearer-token authentication for vendor staff and storefront customers.
 *
 * - HS256 JWTs issued by [`AuthService`]
 * - argon2 password hashes ([`password`])
 * - the permission-key ability map ([`ability`]) enforced by
 *   [`ability_middleware`]; the `admin` role bypasses ability checks
 */

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

pub mod ability;
pub mod password;

pub use ability::{Ability, Action, Subject};

/// Role name carried by storefront customer tokens
pub const CUSTOMER_ROLE: &str = "customer";
/// Role name that bypasses ability checks
pub const ADMIN_ROLE: &str = "admin";

/// Claim structure for JWT tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,              // Subject (user or customer ID)
    pub name: Option<String>,     // Display name
    pub email: Option<String>,    // Email
    pub roles: Vec<String>,       // Role names
    pub permissions: Vec<String>, // Permission keys resolved at login
    pub jti: String,              // JWT ID
    pub iat: i64,                 // Issued at time
    pub exp: i64,                 // Expiration time
    pub nbf: i64,                 // Not valid before time
    pub iss: String,              // Issuer
    pub aud: String,              // Audience
}

/// Authenticated principal extracted from the JWT token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub roles: Vec<String>,
    pub permissions: Vec<String>,
    pub token_id: String,
}

impl AuthUser {
    /// Check if the principal has a specific role
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Check if the principal holds a specific permission key
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(ADMIN_ROLE)
    }

    pub fn is_customer(&self) -> bool {
        self.has_role(CUSTOMER_ROLE)
    }

    pub fn ability(&self) -> Ability {
        Ability::from_keys(&self.permissions)
    }

    /// Ability check with the admin bypass applied
    pub fn can(&self, action: Action, subject: Subject) -> bool {
        self.is_admin() || self.ability().can(action, subject)
    }

    /// Parses the subject claim as a UUID
    pub fn id(&self) -> Result<Uuid, AuthError> {
        Uuid::parse_str(&self.user_id).map_err(|_| AuthError::InvalidToken)
    }
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            name: claims.name,
            email: claims.email,
            roles: claims.roles,
            permissions: claims.permissions,
            token_id: claims.jti,
        }
    }
}

/// Authentication configuration
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_audience: String,
    pub jwt_issuer: String,
    pub access_token_expiration: Duration,
}

impl AuthConfig {
    pub fn new(
        jwt_secret: String,
        jwt_audience: String,
        jwt_issuer: String,
        access_token_expiration: Duration,
    ) -> Self {
        Self {
            jwt_secret,
            jwt_audience,
            jwt_issuer,
            access_token_expiration,
        }
    }
}

impl From<&crate::config::AppConfig> for AuthConfig {
    fn from(cfg: &crate::config::AppConfig) -> Self {
        Self::new(
            cfg.jwt_secret.clone(),
            cfg.auth_audience.clone(),
            cfg.auth_issuer.clone(),
            Duration::from_secs(cfg.jwt_expiration as u64),
        )
    }
}

/// Identity fields placed into a token
#[derive(Debug, Clone)]
pub struct TokenSubject {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub roles: Vec<String>,
    pub permissions: Vec<String>,
}

/// Token response
#[derive(Debug, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Issues and validates access tokens
#[derive(Debug, Clone)]
pub struct AuthService {
    pub config: AuthConfig,
}

impl AuthService {
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    /// Generate a JWT for a staff user or customer
    pub fn generate_token(&self, subject: &TokenSubject) -> Result<AccessToken, AuthError> {
        let now = Utc::now();
        let exp = now
            + ChronoDuration::from_std(self.config.access_token_expiration)
                .map_err(|_| AuthError::InternalError("Invalid token duration".to_string()))?;

        let claims = Claims {
            sub: subject.id.to_string(),
            name: Some(subject.name.clone()),
            email: Some(subject.email.clone()),
            roles: subject.roles.clone(),
            permissions: subject.permissions.clone(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            nbf: now.timestamp(),
            iss: self.config.jwt_issuer.clone(),
            aud: self.config.jwt_audience.clone(),
        };

        let access_token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::TokenCreation(e.to_string()))?;

        Ok(AccessToken {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.config.access_token_expiration.as_secs() as i64,
        })
    }

    /// Validate a JWT token and extract the claims
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.config.jwt_issuer.as_str()]);
        validation.set_audience(&[self.config.jwt_audience.as_str()]);

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        })
    }
}

/// Authentication error types
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing authentication")]
    MissingAuth,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Token creation failed: {0}")]
    TokenCreation(String),

    #[error("Insufficient permissions")]
    InsufficientPermissions,

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error_code, error_message): (StatusCode, &str, String) = match &self {
            Self::MissingAuth => (
                StatusCode::UNAUTHORIZED,
                "AUTH_MISSING",
                "Authentication required".to_string(),
            ),
            Self::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "AUTH_INVALID_CREDENTIALS",
                "Invalid credentials".to_string(),
            ),
            Self::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                "AUTH_INVALID_TOKEN",
                "Invalid authentication token".to_string(),
            ),
            Self::TokenExpired => (
                StatusCode::UNAUTHORIZED,
                "AUTH_TOKEN_EXPIRED",
                "Token has expired".to_string(),
            ),
            Self::TokenCreation(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "AUTH_TOKEN_CREATION_FAILED",
                "Token creation failed".to_string(),
            ),
            Self::InsufficientPermissions => (
                StatusCode::FORBIDDEN,
                "AUTH_INSUFFICIENT_PERMISSIONS",
                "Insufficient permissions".to_string(),
            ),
            Self::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "AUTH_INTERNAL_ERROR",
                "Internal server error".to_string(),
            ),
        };

        let body = Json(serde_json::json!({
            "error": {
                "code": error_code,
                "message": error_message,
            },
            "request_id": crate::tracing::current_request_id().map(|r| r.0),
        }));

        (status, body).into_response()
    }
}

impl From<AuthError> for crate::errors::ServiceError {
    fn from(err: AuthError) -> Self {
        use crate::errors::ServiceError;
        match err {
            AuthError::InsufficientPermissions => ServiceError::Forbidden(err.to_string()),
            AuthError::TokenCreation(msg) | AuthError::InternalError(msg) => {
                ServiceError::InternalError(msg)
            }
            other => ServiceError::Unauthorized(other.to_string()),
        }
    }
}

impl From<AuthError> for crate::errors::ApiError {
    fn from(err: AuthError) -> Self {
        crate::errors::ApiError::ServiceError(err.into())
    }
}

/// Ability middleware: 403 unless the principal can perform `action` on `subject`
pub async fn ability_middleware(
    State((action, subject)): State<(Action, Subject)>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or(AuthError::MissingAuth)?;

    if !user.can(action, subject) {
        debug!(user = %user.user_id, %action, %subject, "ability check denied");
        return Err(AuthError::InsufficientPermissions);
    }

    Ok(next.run(request).await)
}

/// Role middleware to check if a principal has the required role
pub async fn role_middleware(
    State(required_role): State<String>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or(AuthError::MissingAuth)?;

    if !user.has_role(&required_role) {
        return Err(AuthError::InsufficientPermissions);
    }

    Ok(next.run(request).await)
}

/// Authentication middleware that extracts and validates bearer tokens
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let auth_service = match request.extensions().get::<Arc<AuthService>>() {
        Some(service) => service.clone(),
        None => {
            return AuthError::InternalError("Authentication service not available".into())
                .into_response();
        }
    };

    match extract_auth_from_headers(request.headers(), &auth_service) {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

/// Extract authentication info from request headers
fn extract_auth_from_headers(
    headers: &HeaderMap,
    auth_service: &AuthService,
) -> Result<AuthUser, AuthError> {
    let auth_value = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AuthError::MissingAuth)?;

    let token = auth_value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::MissingAuth)?;

    auth_service.validate_token(token).map(AuthUser::from)
}

/// Extension methods for Router to add auth middleware
pub trait AuthRouterExt {
    fn with_auth(self) -> Self;
    fn with_ability(self, action: Action, subject: Subject) -> Self;
    fn with_role(self, role: &str) -> Self;
}

impl<S> AuthRouterExt for axum::Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_auth(self) -> Self {
        self.layer(axum::middleware::from_fn(auth_middleware))
    }

    fn with_ability(self, action: Action, subject: Subject) -> Self {
        self.layer(axum::middleware::from_fn_with_state(
            (action, subject),
            ability_middleware,
        ))
        .with_auth()
    }

    fn with_role(self, role: &str) -> Self {
        self.layer(axum::middleware::from_fn_with_state(
            role.to_string(),
            role_middleware,
        ))
        .with_auth()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request as HttpRequest, routing::get, Extension, Router};
    use tower::ServiceExt;

    fn service() -> Arc<AuthService> {
        Arc::new(AuthService::new(AuthConfig::new(
            "k8Jd02hfQm1zXv7Lp3Rt9Ws6Yb4Nc5Ae".into(),
            "aud".into(),
            "iss".into(),
            Duration::from_secs(600),
        )))
    }

    fn subject(roles: &[&str], permissions: &[&str]) -> TokenSubject {
        TokenSubject {
            id: Uuid::new_v4(),
            name: "Casey".into(),
            email: "casey@example.com".into(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
            permissions: permissions.iter().map(|p| p.to_string()).collect(),
        }
    }

    #[test]
    fn token_round_trip_preserves_claims() {
        let svc = service();
        let subj = subject(&["manager"], &["orders:read"]);
        let token = svc.generate_token(&subj).unwrap();
        let claims = svc.validate_token(&token.access_token).unwrap();
        assert_eq!(claims.sub, subj.id.to_string());
        assert_eq!(claims.permissions, vec!["orders:read".to_string()]);
        assert_eq!(token.token_type, "Bearer");
    }

    #[test]
    fn token_from_other_issuer_is_rejected() {
        let other = AuthService::new(AuthConfig::new(
            "k8Jd02hfQm1zXv7Lp3Rt9Ws6Yb4Nc5Ae".into(),
            "aud".into(),
            "someone-else".into(),
            Duration::from_secs(600),
        ));
        let token = other.generate_token(&subject(&[], &[])).unwrap();
        assert!(matches!(
            service().validate_token(&token.access_token),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn admin_bypasses_ability() {
        let user = AuthUser::from(
            service()
                .validate_token(
                    &service()
                        .generate_token(&subject(&[ADMIN_ROLE], &[]))
                        .unwrap()
                        .access_token,
                )
                .unwrap(),
        );
        assert!(user.can(Action::Delete, Subject::Role));
    }

    async fn ok() -> &'static str {
        "ok"
    }

    async fn call(router: Router, token: Option<String>) -> StatusCode {
        let mut builder = HttpRequest::builder().uri("/");
        if let Some(t) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", t));
        }
        router
            .layer(Extension(service()))
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn ability_layer_enforces_permissions() {
        let router = || {
            Router::new()
                .route("/", get(ok))
                .with_ability(Action::Update, Subject::Product)
        };

        assert_eq!(call(router(), None).await, StatusCode::UNAUTHORIZED);

        let reader = service()
            .generate_token(&subject(&["staff"], &["products:read"]))
            .unwrap();
        assert_eq!(
            call(router(), Some(reader.access_token)).await,
            StatusCode::FORBIDDEN
        );

        let manager = service()
            .generate_token(&subject(&["staff"], &["products:manage"]))
            .unwrap();
        assert_eq!(
            call(router(), Some(manager.access_token)).await,
            StatusCode::OK
        );
    }

    #[tokio::test]
    async fn role_layer_requires_role() {
        let router = || Router::new().route("/", get(ok)).with_role(CUSTOMER_ROLE);
        let staff = service().generate_token(&subject(&["staff"], &[])).unwrap();
        assert_eq!(
            call(router(), Some(staff.access_token)).await,
            StatusCode::FORBIDDEN
        );
        let customer = service()
            .generate_token(&subject(&[CUSTOMER_ROLE], &[]))
            .unwrap();
        assert_eq!(
            call(router(), Some(customer.access_token)).await,
            StatusCode::OK
        );
    }
}
