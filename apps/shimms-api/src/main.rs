//! 会话网关：托管身份登录后的角色、切换、事件与诊断上报 HTTP 接口。

mod handlers;
mod middleware;
mod routes;
mod sessions;
mod utils;

use axum::Router;
use shimms_auth::{IdentityVerifier, JwtIdentityVerifier, SessionConfig, SessionDeps};
use shimms_config::AppConfig;
use shimms_storage::{PgRoleGrantStore, PgRoleSwitchValidator, PgTelemetrySink, connect_pool};
use shimms_telemetry::{ViewTelemetryConfig, init_tracing};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::sessions::SessionRegistry;

#[derive(Clone)]
pub struct AppState {
    pub verifier: Arc<dyn IdentityVerifier>,
    pub deps: SessionDeps,
    pub session_config: SessionConfig,
    pub sessions: Arc<SessionRegistry>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 加载本地 .env（如存在），便于直接 cargo run 启动
    dotenvy::dotenv().ok();
    // 从环境变量加载运行配置
    let config = AppConfig::from_env()?;
    // 初始化结构化日志
    init_tracing();

    // 托管后端 Postgres（user_roles / analytics_events）
    let pool = connect_pool(&config.database_url).await?;
    let deps = SessionDeps {
        grants: Arc::new(PgRoleGrantStore::new(pool.clone())),
        validator: Arc::new(PgRoleSwitchValidator::new(pool.clone())),
        telemetry_sink: Arc::new(PgTelemetrySink::new(pool)),
    };
    let state = AppState {
        verifier: Arc::new(JwtIdentityVerifier::new(config.jwt_secret.clone())),
        deps,
        session_config: session_config(&config),
        sessions: Arc::new(SessionRegistry::new()),
    };

    let app = build_app(state);
    tracing::info!(target: "shimms.api", addr = %config.http_addr, "listening");
    let listener = tokio::net::TcpListener::bind(&config.http_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn session_config(config: &AppConfig) -> SessionConfig {
    SessionConfig {
        role_load_timeout: Duration::from_millis(config.role_load_timeout_ms),
        role_switch_timeout: Duration::from_millis(config.role_switch_timeout_ms),
        telemetry: ViewTelemetryConfig {
            enabled: config.telemetry_enabled,
            delivery_timeout: Duration::from_millis(config.telemetry_delivery_timeout_ms),
        },
        empty_view_threshold: Duration::from_secs(config.empty_view_threshold_seconds),
    }
}

/// 路由同时挂载在 `/` 与 `/api` 下。
fn build_app(state: AppState) -> Router {
    let api = routes::create_api_router();
    Router::new()
        .merge(api.clone())
        .nest("/api", api)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(middleware::request_context))
                .layer(TraceLayer::new_for_http()),
        )
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::AppState;
    use crate::sessions::SessionRegistry;
    use axum::http::{HeaderMap, HeaderValue, header};
    use jsonwebtoken::{EncodingKey, Header};
    use shimms_auth::{JwtIdentityVerifier, SessionConfig, SessionDeps};
    use shimms_storage::{InMemoryRoleGrantStore, InMemoryRoleSwitchValidator, InMemoryTelemetrySink};
    use std::sync::Arc;
    use std::time::{SystemTime, UNIX_EPOCH};

    pub const SECRET: &str = "secret";

    pub struct TestEnv {
        pub state: AppState,
        pub grants: Arc<InMemoryRoleGrantStore>,
        pub validator: Arc<InMemoryRoleSwitchValidator>,
        pub sink: Arc<InMemoryTelemetrySink>,
    }

    pub fn build_state() -> TestEnv {
        let grants = Arc::new(InMemoryRoleGrantStore::new());
        let validator = Arc::new(InMemoryRoleSwitchValidator::new(grants.clone()));
        let sink = Arc::new(InMemoryTelemetrySink::new());
        let state = AppState {
            verifier: Arc::new(JwtIdentityVerifier::new(SECRET.to_string())),
            deps: SessionDeps {
                grants: grants.clone(),
                validator: validator.clone(),
                telemetry_sink: sink.clone(),
            },
            session_config: SessionConfig::default(),
            sessions: Arc::new(SessionRegistry::new()),
        };
        TestEnv {
            state,
            grants,
            validator,
            sink,
        }
    }

    pub fn bearer_headers(sub: &str) -> HeaderMap {
        let exp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_secs()
            + 3600;
        let token = jsonwebtoken::encode(
            &Header::default(),
            &serde_json::json!({ "sub": sub, "email": "user@example.se", "aud": "authenticated", "exp": exp }),
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .expect("token");
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).expect("header"),
        );
        headers
    }

    pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        serde_json::from_slice(&bytes).expect("json")
    }
}

#[cfg(test)]
mod tests {
    use super::build_app;
    use super::test_support::{bearer_headers, body_json, build_state};
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode, header};
    use tower::ServiceExt;

    #[tokio::test]
    async fn health_served_under_both_prefixes_with_request_ids() {
        let env = build_state();
        let app = build_app(env.state);

        for uri in ["/health", "/api/health"] {
            let response = app
                .clone()
                .oneshot(Request::builder().uri(uri).body(Body::empty()).expect("request"))
                .await
                .expect("response");
            assert_eq!(response.status(), StatusCode::OK);
            assert!(response.headers().contains_key("x-request-id"));
            assert!(response.headers().contains_key("x-trace-id"));
        }
    }

    #[tokio::test]
    async fn session_routes_require_bearer_token() {
        let env = build_state();
        let app = build_app(env.state);

        let response = app
            .oneshot(Request::builder().uri("/api/session").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn session_started_through_router() {
        let env = build_state();
        env.grants.grant("user-1", "coach");
        let app = build_app(env.state.clone());
        let headers = bearer_headers("user-1");

        let mut request = Request::builder().method(Method::POST).uri("/api/session");
        if let Some(value) = headers.get(header::AUTHORIZATION) {
            request = request.header(header::AUTHORIZATION, value);
        }
        let response = app
            .oneshot(request.body(Body::empty()).expect("request"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["data"]["activeRole"], "coach");
        assert_eq!(env.state.sessions.len().await, 1);
    }
}
