//! Authenticated actor.
//!
//! Token issuance and verification happen upstream. By the time a request
//! reaches a handler the gateway has resolved the caller, and the actor is
//! carried through request extensions and handed to services as a plain value.

use crate::errors::ServiceError;
use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";
pub const ACTOR_ID_HEADER: &str = "x-actor-id";
pub const ACTOR_EMAIL_HEADER: &str = "x-actor-email";

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    User,
    Doctor,
    Manager,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Actor {
    User { id: Uuid, email: String },
    Doctor { id: Uuid, email: String },
    Manager { id: Uuid, email: String },
    Admin { id: Uuid, email: String },
}

impl Actor {
    pub fn new(role: Role, id: Uuid, email: impl Into<String>) -> Self {
        let email = email.into();
        match role {
            Role::User => Actor::User { id, email },
            Role::Doctor => Actor::Doctor { id, email },
            Role::Manager => Actor::Manager { id, email },
            Role::Admin => Actor::Admin { id, email },
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            Actor::User { id, .. }
            | Actor::Doctor { id, .. }
            | Actor::Manager { id, .. }
            | Actor::Admin { id, .. } => *id,
        }
    }

    pub fn email(&self) -> &str {
        match self {
            Actor::User { email, .. }
            | Actor::Doctor { email, .. }
            | Actor::Manager { email, .. }
            | Actor::Admin { email, .. } => email,
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Actor::User { .. } => Role::User,
            Actor::Doctor { .. } => Role::Doctor,
            Actor::Manager { .. } => Role::Manager,
            Actor::Admin { .. } => Role::Admin,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Actor::Admin { .. })
    }

    /// Id of the acting user, or `Unauthorized` for any other role.
    pub fn require_user(&self) -> Result<Uuid, ServiceError> {
        match self {
            Actor::User { id, .. } => Ok(*id),
            other => Err(role_mismatch(other, Role::User)),
        }
    }

    /// Id of the acting pharmacy manager, or `Unauthorized` for any other role.
    pub fn require_manager(&self) -> Result<Uuid, ServiceError> {
        match self {
            Actor::Manager { id, .. } => Ok(*id),
            other => Err(role_mismatch(other, Role::Manager)),
        }
    }

    pub fn require_admin(&self) -> Result<Uuid, ServiceError> {
        match self {
            Actor::Admin { id, .. } => Ok(*id),
            other => Err(role_mismatch(other, Role::Admin)),
        }
    }
}

fn role_mismatch(actor: &Actor, expected: Role) -> ServiceError {
    ServiceError::Unauthorized(format!(
        "{} is not allowed to act as {}",
        actor.role(),
        expected
    ))
}

/// Reads the actor resolved by the gateway from trusted headers.
pub fn actor_from_headers(headers: &HeaderMap) -> Option<Actor> {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

    let role = Role::from_str(header(ACTOR_ROLE_HEADER)?.trim()).ok()?;
    let id = Uuid::parse_str(header(ACTOR_ID_HEADER)?.trim()).ok()?;
    let email = header(ACTOR_EMAIL_HEADER).unwrap_or_default();
    Some(Actor::new(role, id, email))
}

/// Middleware that stores the gateway-resolved actor in request extensions.
/// Requests without one pass through untouched and fail in the extractor.
pub async fn gateway_actor_middleware(mut request: Request, next: Next) -> Response {
    if let Some(actor) = actor_from_headers(request.headers()) {
        request.extensions_mut().insert(actor);
    }
    next.run(request).await
}

#[async_trait]
impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Actor>()
            .cloned()
            .ok_or_else(|| ServiceError::Unauthorized("authentication required".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use axum::http::HeaderValue;

    #[test]
    fn role_accessors_are_exhaustive() {
        let id = Uuid::new_v4();
        let manager = Actor::new(Role::Manager, id, "pm@pharmahub.test");
        assert_eq!(manager.id(), id);
        assert_eq!(manager.email(), "pm@pharmahub.test");
        assert_eq!(manager.require_manager().unwrap(), id);
        assert_matches!(manager.require_user(), Err(ServiceError::Unauthorized(_)));
        assert!(!manager.is_admin());
    }

    #[test]
    fn headers_resolve_to_actor() {
        let id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(ACTOR_ROLE_HEADER, HeaderValue::from_static("admin"));
        headers.insert(
            ACTOR_ID_HEADER,
            HeaderValue::from_str(&id.to_string()).unwrap(),
        );

        let actor = actor_from_headers(&headers).unwrap();
        assert_eq!(actor, Actor::Admin { id, email: String::new() });
    }

    #[test]
    fn unknown_role_header_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(ACTOR_ROLE_HEADER, HeaderValue::from_static("superuser"));
        headers.insert(
            ACTOR_ID_HEADER,
            HeaderValue::from_str(&Uuid::new_v4().to_string()).unwrap(),
        );
        assert!(actor_from_headers(&headers).is_none());
    }
}
