//! 捐赠平台 REST API 服务
//!
//! 启动 HTTP 服务与后台 Worker（过期扫描、通知投递）。

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::Request,
    http::{HeaderValue, header},
    middleware,
    middleware::Next,
    response::Response,
    routing::get,
};
use donation_api::{
    routes,
    state::{AppState, Repositories},
    worker::{ExpireWorker, NotificationWorker},
};
use donation_core::{EmailChannel, EmailChannelConfig, MemoryStore, OutboxDispatcher};
use donation_shared::{
    config::{AppConfig, StorageBackend},
    database::Database,
    observability::{self, middleware as obs_middleware},
};
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 统一加载配置：config/default.toml → config/{env}.toml → config/donation-api.toml → 环境变量
    let config = AppConfig::load("donation-api").unwrap_or_default();

    let obs_config = config
        .observability
        .clone()
        .with_service_name(&config.service_name);
    let _guard = observability::init(&obs_config).await?;

    info!("Starting donation-api on {}", config.server_addr());

    // 存储后端在启动时装配一次，之后通过 AppState 注入
    let (repos, db) = match config.storage.backend {
        StorageBackend::Postgres => {
            let db = Database::connect(&config.database).await?;
            if config.database.run_migrations {
                db.run_migrations().await?;
            }
            (Repositories::postgres(db.pool().clone()), Some(db))
        }
        StorageBackend::Memory => {
            warn!("Using in-memory storage, data is lost on restart");
            (Repositories::memory(Arc::new(MemoryStore::new())), None)
        }
    };

    let state = AppState::new(&repos, &config.lifecycle);

    // 启动报名过期处理 Worker
    if config.lifecycle.sweep_interval_secs > 0 {
        let worker = ExpireWorker::new(state.expiry.clone(), config.lifecycle.sweep_interval_secs);
        tokio::spawn(async move {
            worker.run().await;
        });
    } else {
        info!("ExpireWorker disabled");
    }

    // 启动通知投递 Worker
    if config.notification.poll_interval_secs > 0 {
        let channel = EmailChannel::new(EmailChannelConfig {
            endpoint: config.notification.email_endpoint.clone(),
            from_address: config.notification.from_address.clone(),
            ..Default::default()
        })?;
        let dispatcher = OutboxDispatcher::new(
            repos.outbox.clone(),
            Arc::new(channel),
            config.notification.max_attempts.max(1) as u32,
            config.notification.batch_size,
        );
        let worker = NotificationWorker::new(
            Arc::new(dispatcher),
            config.notification.poll_interval_secs,
        );
        tokio::spawn(async move {
            worker.run().await;
        });
    } else {
        info!("NotificationWorker disabled");
    }

    let cors = build_cors(&config);
    let db_for_close = db.clone();

    let app = Router::new()
        .nest("/api", routes::api_routes())
        .route("/health", get(health_check))
        .route(
            "/ready",
            get({
                let db_for_ready = db;
                move || readiness_check(db_for_ready.clone())
            }),
        )
        // HTTP 安全头
        .layer(middleware::from_fn(security_headers))
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        // 可观测性中间件：请求追踪和指标收集
        .layer(middleware::from_fn(obs_middleware::http_tracing))
        .layer(middleware::from_fn(obs_middleware::request_id))
        .with_state(state);

    let listener = TcpListener::bind(config.server_addr()).await?;
    info!("Listening on {}", config.server_addr());

    // 优雅关闭：收到 SIGTERM 或 Ctrl+C 时停止接收新连接并等待已有请求处理完毕
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(db) = db_for_close {
        db.close().await;
    }

    info!("Server shutdown complete");

    Ok(())
}

/// CORS 配置：`server.cors_origins` 为逗号分隔的来源列表，"*" 表示全部
fn build_cors(config: &AppConfig) -> CorsLayer {
    let allowed_origins = config.server.cors_origins.trim();

    if allowed_origins == "*" {
        if config.is_production() {
            warn!("cors_origins=\"*\" 在生产环境中不安全，请设置为具体域名");
        }
        info!("CORS allowed_origins: * (all origins)");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        info!("CORS allowed_origins: {}", allowed_origins);
        let origins: Vec<_> = allowed_origins
            .split(',')
            .filter_map(|s| s.trim().parse::<HeaderValue>().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// 为所有响应注入 HTTP 安全头
async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        header::STRICT_TRANSPORT_SECURITY,
        HeaderValue::from_static("max-age=31536000; includeSubDomains"),
    );
    headers.insert(header::X_XSS_PROTECTION, HeaderValue::from_static("0"));
    response
}

/// 监听关闭信号
///
/// K8s 通过 SIGTERM 通知 Pod 停止；本地开发通过 Ctrl+C。
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "注册 Ctrl+C 处理器失败");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "注册 SIGTERM 处理器失败");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, initiating graceful shutdown..."),
        _ = terminate => info!("Received SIGTERM, initiating graceful shutdown..."),
    }
}

/// 存活探针：服务进程正常即返回 ok
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "donation-api"
    }))
}

/// 就绪探针：PostgreSQL 后端时检查数据库连接
async fn readiness_check(db: Option<Database>) -> Json<serde_json::Value> {
    let db_status = match &db {
        Some(db) => {
            if db.health_check().await.is_ok() {
                "ok"
            } else {
                "fail"
            }
        }
        None => "memory",
    };
    let all_ok = db_status != "fail";

    Json(serde_json::json!({
        "status": if all_ok { "ok" } else { "degraded" },
        "service": "donation-api",
        "checks": {
            "database": db_status
        }
    }))
}
