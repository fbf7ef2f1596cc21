//! 认证中间件
//!
//! - request_context：请求上下文中间件，注入 request_id/trace_id
//! - bearer_token：从 Authorization 头提取 Bearer token
//! - require_identity：校验托管方 access token，得到身份
//! - require_session：在身份基础上取得活动会话
//!
//! 托管方负责登录，本层只校验 token 并按身份查找会话。

use axum::{
    body::Body,
    extract::Request,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    middleware::Next,
    response::Response,
};
use domain::Identity;
use shimms_auth::{AuthError, Session};
use shimms_telemetry::new_request_ids;
use std::sync::Arc;
use tracing::{Instrument, info_span};

use crate::AppState;
use crate::utils::response::{auth_error, session_not_found_error};

/// 请求上下文中间件：注入 request_id/trace_id
pub async fn request_context(mut req: Request<Body>, next: Next) -> Response {
    let ids = new_request_ids();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    req.extensions_mut().insert(ids.clone());

    let span = info_span!(
        "request",
        request_id = %ids.request_id,
        trace_id = %ids.trace_id,
        method = %method,
        path = %path
    );

    let mut response: Response = next.run(req).instrument(span).await;
    response.headers_mut().insert(
        "x-request-id",
        HeaderValue::from_str(&ids.request_id).unwrap_or_else(|_| HeaderValue::from_static("")),
    );
    response.headers_mut().insert(
        "x-trace-id",
        HeaderValue::from_str(&ids.trace_id).unwrap_or_else(|_| HeaderValue::from_static("")),
    );
    response
}

/// 从请求头中提取 Bearer token
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let header_value = headers.get(header::AUTHORIZATION)?;
    let auth_str = header_value.to_str().ok()?;
    auth_str.strip_prefix("Bearer ")
}

/// 校验 token 并提取身份
pub fn require_identity(state: &AppState, headers: &HeaderMap) -> Result<Identity, Response> {
    let token = match bearer_token(headers) {
        Some(token) => token,
        None => return Err(auth_error(StatusCode::UNAUTHORIZED)),
    };
    match state.verifier.verify(token) {
        Ok(identity) => Ok(identity),
        Err(AuthError::TokenMissing | AuthError::TokenInvalid | AuthError::TokenExpired) => {
            Err(auth_error(StatusCode::UNAUTHORIZED))
        }
    }
}

/// 校验 token 并取得该身份的活动会话
pub async fn require_session(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<Arc<Session>, Response> {
    let identity = require_identity(state, headers)?;
    match state.sessions.get(&identity.id).await {
        Some(session) => Ok(session),
        None => Err(session_not_found_error()),
    }
}

#[cfg(test)]
mod tests {
    use super::bearer_token;
    use axum::http::{HeaderMap, HeaderValue, header};

    #[test]
    fn bearer_token_extracts() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer token-1"),
        );
        assert_eq!(bearer_token(&headers), Some("token-1"));
    }

    #[test]
    fn bearer_token_requires_scheme() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("token-1"));
        assert_eq!(bearer_token(&headers), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }
}
