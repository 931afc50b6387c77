/// HTTP middleware utilities for the blog service
///
/// Provides bearer-token authentication and request metrics logging. The
/// implementations are intentionally lightweight wrappers so that handlers
/// can pull the authenticated user straight out of request extensions.
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{Error, FromRequest, HttpMessage, HttpRequest};
use futures::future::LocalBoxFuture;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::future::{ready, Ready};
use std::rc::Rc;
use std::str::FromStr;
use std::time::Instant;
use uuid::Uuid;

use crate::error::AppError;
use crate::metrics::HTTP_REQUESTS_TOTAL;

// =====================================================================
// JWT Authentication
// =====================================================================

/// Claims carried by MediBlog access tokens.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    /// User role (patient, doctor, nurse, admin)
    pub role: String,
    /// Expiry, seconds since epoch
    pub exp: usize,
}

/// Roles known to the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Patient,
    Doctor,
    Nurse,
    Admin,
}

impl Role {
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Patient => "patient",
            Role::Doctor => "doctor",
            Role::Nurse => "nurse",
            Role::Admin => "admin",
        }
    }
}

impl FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "patient" => Ok(Role::Patient),
            "doctor" => Ok(Role::Doctor),
            "nurse" => Ok(Role::Nurse),
            "admin" => Ok(Role::Admin),
            _ => Err(()),
        }
    }
}

/// Authenticated principal stored in request extensions after auth.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: Role,
}

/// Fail with 403 unless the principal holds the admin role.
pub fn require_admin(user: &AuthUser) -> Result<(), AppError> {
    if user.role.is_admin() {
        Ok(())
    } else {
        Err(AppError::Authorization("Admin access required".to_string()))
    }
}

/// Actix middleware that validates a Bearer token and stores the principal.
///
/// The blog API mixes public reads and authenticated writes on the same
/// paths, so the middleware wraps the whole scope and only enforces that a
/// *presented* token is valid; requests without an Authorization header
/// pass through anonymous. Handlers that require a principal take the
/// `AuthUser` extractor, which turns an anonymous request into a 401.
#[derive(Clone)]
pub struct JwtAuth {
    key: DecodingKey,
    validation: Validation,
}

impl JwtAuth {
    pub fn new(secret: &str) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    fn authenticate(&self, req: &ServiceRequest) -> Result<Option<AuthUser>, AppError> {
        let Some(auth_header) = req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
        else {
            return Ok(None);
        };

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Authentication("Invalid Authorization scheme".to_string()))?;

        let claims = decode::<Claims>(token, &self.key, &self.validation)
            .map_err(|_| AppError::Authentication("Invalid or expired token".to_string()))?
            .claims;

        let id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::Authentication("Invalid user ID in token".to_string()))?;

        let role = Role::from_str(&claims.role)
            .map_err(|_| AppError::Authentication("Unknown role in token".to_string()))?;

        Ok(Some(AuthUser { id, role }))
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtAuthService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtAuthService {
            service: Rc::new(service),
            auth: self.clone(),
        }))
    }
}

pub struct JwtAuthService<S> {
    service: Rc<S>,
    auth: JwtAuth,
}

impl<S, B> Service<ServiceRequest> for JwtAuthService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let outcome = self.auth.authenticate(&req);

        Box::pin(async move {
            if let Some(user) = outcome? {
                req.extensions_mut().insert(user);
            }
            service.call(req).await
        })
    }
}

impl FromRequest for AuthUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        ready(req.extensions().get::<AuthUser>().cloned().ok_or_else(|| {
            AppError::Authentication("Authentication required".to_string()).into()
        }))
    }
}

// =====================================================================
// Request metrics middleware
// =====================================================================

pub struct RequestMetrics;

impl<S, B> Transform<S, ServiceRequest> for RequestMetrics
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RequestMetricsService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestMetricsService {
            service: Rc::new(service),
        }))
    }
}

pub struct RequestMetricsService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequestMetricsService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let method = req.method().to_string();
        let path = req.path().to_string();
        let start = Instant::now();

        Box::pin(async move {
            let res = service.call(req).await?;

            // Label by matched pattern so per-id paths do not explode the
            // metric cardinality.
            let pattern = res
                .request()
                .match_pattern()
                .unwrap_or_else(|| path.clone());
            let status = res.status().as_u16().to_string();

            HTTP_REQUESTS_TOTAL
                .with_label_values(&[&method, &pattern, &status])
                .inc();

            let elapsed = start.elapsed().as_millis();
            tracing::debug!(%method, %path, %status, %elapsed, "request completed");

            Ok(res)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn token(secret: &str, sub: &str, role: &str, exp: usize) -> String {
        let claims = Claims {
            sub: sub.to_string(),
            role: role.to_string(),
            exp,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn far_future() -> usize {
        (chrono::Utc::now().timestamp() + 3600) as usize
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!(Role::from_str("admin"), Ok(Role::Admin));
        assert_eq!(Role::from_str("doctor"), Ok(Role::Doctor));
        assert_eq!(Role::from_str("nurse"), Ok(Role::Nurse));
        assert_eq!(Role::from_str("patient"), Ok(Role::Patient));
        assert!(Role::from_str("superuser").is_err());
        assert!(Role::from_str("Admin").is_err());
    }

    #[test]
    fn test_require_admin() {
        let admin = AuthUser {
            id: Uuid::new_v4(),
            role: Role::Admin,
        };
        let doctor = AuthUser {
            id: Uuid::new_v4(),
            role: Role::Doctor,
        };

        assert!(require_admin(&admin).is_ok());
        assert!(require_admin(&doctor).is_err());
    }

    #[actix_web::test]
    async fn test_authenticate_accepts_valid_token() {
        let secret = "unit-test-secret";
        let auth = JwtAuth::new(secret);
        let user_id = Uuid::new_v4();
        let token = token(secret, &user_id.to_string(), "doctor", far_future());

        let req = actix_web::test::TestRequest::default()
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_srv_request();

        let user = auth.authenticate(&req).unwrap().unwrap();
        assert_eq!(user.id, user_id);
        assert_eq!(user.role, Role::Doctor);
    }

    #[actix_web::test]
    async fn test_authenticate_rejects_wrong_secret() {
        let auth = JwtAuth::new("right-secret");
        let token = token("wrong-secret", &Uuid::new_v4().to_string(), "admin", far_future());

        let req = actix_web::test::TestRequest::default()
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_srv_request();

        assert!(auth.authenticate(&req).is_err());
    }

    #[actix_web::test]
    async fn test_authenticate_passes_anonymous_requests_through() {
        let auth = JwtAuth::new("secret");

        let no_header = actix_web::test::TestRequest::default().to_srv_request();
        assert!(auth.authenticate(&no_header).unwrap().is_none());
    }

    #[actix_web::test]
    async fn test_authenticate_rejects_non_bearer_scheme() {
        let auth = JwtAuth::new("secret");

        let basic = actix_web::test::TestRequest::default()
            .insert_header(("Authorization", "Basic abc"))
            .to_srv_request();
        assert!(auth.authenticate(&basic).is_err());
    }

    #[actix_web::test]
    async fn test_authenticate_rejects_unknown_role() {
        let secret = "unit-test-secret";
        let auth = JwtAuth::new(secret);
        let token = token(secret, &Uuid::new_v4().to_string(), "janitor", far_future());

        let req = actix_web::test::TestRequest::default()
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .to_srv_request();

        assert!(auth.authenticate(&req).is_err());
    }
}
