//! 可观测性模块集成测试
//!
//! 覆盖指标记录、HTTP 中间件和配置默认值。

// ============================================================================
// 指标记录测试
// ============================================================================

mod metrics_tests {
    use donation_shared::observability::metrics::{
        record_expirations, record_http_request, record_notification, record_qr_scan,
        record_registration, record_review, set_worker_last_run,
    };

    // 未安装 recorder 时记录指标是空操作，不应 panic

    #[test]
    fn test_record_http_request() {
        record_http_request("GET", "/api/programs/{id}", 200, 0.05);
        record_http_request("POST", "/api/programs/register", 201, 0.12);
        record_http_request("POST", "/api/programs/scan-qr", 410, 0.01);
        record_http_request("GET", "unmatched", 404, 0.001);
    }

    #[test]
    fn test_record_lifecycle_metrics() {
        record_registration("success");
        record_registration("CAPACITY_EXCEEDED");
        record_qr_scan("checked_in");
        record_qr_scan("EXPIRED");
        record_expirations("sweep", 12);
        record_expirations("scan", 0);
    }

    #[test]
    fn test_record_review_and_notification() {
        record_review("DONOR", true);
        record_review("BENEFICIARY", false);
        record_notification("sent");
        record_notification("retry");
        record_notification("failed");
        set_worker_last_run("expire_worker");
    }
}

// ============================================================================
// HTTP 中间件测试
// ============================================================================

mod middleware_tests {
    use axum::{Router, body::Body, http::Request, middleware, routing::get};
    use donation_shared::observability::middleware::{RequestId, http_tracing, request_id};
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new()
            .route("/ping", get(|| async { "pong" }))
            .layer(middleware::from_fn(http_tracing))
            .layer(middleware::from_fn(request_id))
    }

    #[tokio::test]
    async fn test_request_id_is_generated() {
        let response = app()
            .oneshot(Request::builder().uri("/ping").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let id = response.headers().get("x-request-id").unwrap();
        assert!(!id.to_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_request_id_is_propagated() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/ping")
                    .header("x-request-id", "req-42")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.headers().get("x-request-id").unwrap(), "req-42");
    }

    #[tokio::test]
    async fn test_unmatched_route_passes_through() {
        let response = app()
            .oneshot(Request::builder().uri("/missing").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), 404);
    }

    #[test]
    fn test_request_id_wrapper() {
        let id = RequestId("abc".to_string());
        assert_eq!(id.clone().as_str(), "abc");
    }
}

// ============================================================================
// 配置测试
// ============================================================================

mod config_tests {
    use donation_shared::config::{AppConfig, StorageBackend};
    use donation_shared::observability::{ObservabilityConfig, ObservabilityGuard};

    #[test]
    fn test_observability_defaults() {
        let config = ObservabilityConfig::default().with_service_name("donation-api");
        assert_eq!(config.service_name, "donation-api");
        assert!(config.metrics_enabled);
        assert!(config.otlp_endpoint.is_none());
    }

    #[test]
    fn test_app_config_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.storage.backend, StorageBackend::Postgres);
        assert_eq!(config.lifecycle.sweep_batch_size, 500);
        assert_eq!(config.notification.batch_size, 50);
        assert!(!config.is_production());
    }

    #[test]
    fn test_empty_guard() {
        let guard = ObservabilityGuard::empty();
        drop(guard);
    }
}
