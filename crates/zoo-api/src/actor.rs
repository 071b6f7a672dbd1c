//! Acting-user extraction from request headers
//!
//! `x-user-id`, `x-user-email` and `x-user-name` identify the caller for
//! audit stamps. A request without `x-user-id` acts as `system`.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use std::convert::Infallible;
use zoo_store::Actor;

/// Header carrying the user id
pub const USER_ID_HEADER: &str = "x-user-id";
/// Header carrying the user email
pub const USER_EMAIL_HEADER: &str = "x-user-email";
/// Header carrying the display name
pub const USER_NAME_HEADER: &str = "x-user-name";

/// Caller identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActingUser(pub Actor);

fn header(parts: &Parts, name: &str) -> Option<String> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
}

#[async_trait]
impl<S> FromRequestParts<S> for ActingUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let mut actor = header(parts, USER_ID_HEADER).map_or_else(Actor::system, Actor::user);
        if let Some(email) = header(parts, USER_EMAIL_HEADER) {
            actor = actor.with_email(email);
        }
        if let Some(name) = header(parts, USER_NAME_HEADER) {
            actor = actor.with_display_name(name);
        }
        Ok(Self(actor))
    }
}
