//! # Session identity
//!
//! Every voter is identified by an opaque session token carried in a
//! cookie. The token is minted on first contact and reused for the life of
//! the browsing session, so "one vote per feature" really means one vote
//! per browser session. Clearing cookies or switching browsers yields a
//! fresh identity; that is an accepted limit of the scheme, not something
//! the backend tries to detect.
//!
//! The rest of the service treats the token as an uninterpreted string key.

use axum::{
    extract::{FromRequestParts, Request},
    http::{
        HeaderMap, HeaderValue,
        header::{COOKIE, SET_COOKIE},
        request::Parts,
    },
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "session_id";

const SESSION_MAX_AGE_SECS: u64 = 86_400;

/// Resolved voter identity, stashed in request extensions by
/// [`resolve_session`].
#[derive(Debug, Clone)]
pub struct SessionId(pub String);

/// Voter identity as seen by a handler. `None` means the resolver layer
/// never ran, which is a wiring error for routes that need an identity.
pub struct Identity(pub Option<String>);

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Identity(
            parts
                .extensions
                .get::<SessionId>()
                .map(|session| session.0.clone()),
        ))
    }
}

/// Middleware resolving the session for every request: reuse the cookie
/// when present, otherwise mint a fresh token and hand it back on the
/// response.
pub async fn resolve_session(mut request: Request, next: Next) -> Response {
    if let Some(token) = session_from_headers(request.headers()) {
        request.extensions_mut().insert(SessionId(token));
        return next.run(request).await;
    }

    let token = Uuid::new_v4().to_string();
    request.extensions_mut().insert(SessionId(token.clone()));

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&session_cookie(&token)) {
        response.headers_mut().append(SET_COOKIE, value);
    }
    response
}

fn session_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get(COOKIE)?
        .to_str()
        .ok()?
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

fn session_cookie(token: &str) -> String {
    format!(
        "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={SESSION_MAX_AGE_SECS}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with_cookie(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_session_from_headers() {
        let headers = headers_with_cookie("session_id=abc-123");
        assert_eq!(session_from_headers(&headers).as_deref(), Some("abc-123"));
    }

    #[test]
    fn test_session_among_other_cookies() {
        let headers = headers_with_cookie("theme=dark; session_id=tok; lang=en");
        assert_eq!(session_from_headers(&headers).as_deref(), Some("tok"));
    }

    #[test]
    fn test_missing_or_empty_session() {
        assert_eq!(session_from_headers(&HeaderMap::new()), None);

        let headers = headers_with_cookie("theme=dark");
        assert_eq!(session_from_headers(&headers), None);

        let headers = headers_with_cookie("session_id=");
        assert_eq!(session_from_headers(&headers), None);
    }

    #[test]
    fn test_cookie_attributes() {
        let cookie = session_cookie("tok");
        assert!(cookie.starts_with("session_id=tok; "));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Max-Age=86400"));
    }
}
