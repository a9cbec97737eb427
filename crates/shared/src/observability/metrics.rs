//! Prometheus 指标模块
//!
//! 基于 metrics crate 和 metrics-exporter-prometheus 实现指标收集与导出。
//! 指标通过独立的 HTTP 端口暴露，供 Prometheus 抓取。

use anyhow::Result;
use axum::{Router, routing::get};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{error, info};

use super::ObservabilityConfig;

/// Metrics 资源守卫
pub struct MetricsHandle {
    _server_handle: tokio::task::JoinHandle<()>,
}

/// 初始化 Prometheus 指标导出
///
/// 启动一个独立的 HTTP 服务器在指定端口暴露 `/metrics` 端点。
pub async fn init(config: &ObservabilityConfig) -> Result<MetricsHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    register_common_metrics(&config.service_name);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.metrics_port));
    let server_handle = start_metrics_server(addr, handle).await?;

    Ok(MetricsHandle {
        _server_handle: server_handle,
    })
}

/// 注册通用指标描述（出现在 /metrics 的 HELP 注释中）
fn register_common_metrics(service_name: &str) {
    metrics::describe_counter!("http_requests_total", "Total number of HTTP requests");
    metrics::describe_histogram!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds"
    );

    metrics::describe_counter!(
        "program_registrations_total",
        "Total number of program registration attempts"
    );
    metrics::describe_counter!("qr_scans_total", "Total number of QR check-in scans");
    metrics::describe_counter!(
        "application_expirations_total",
        "Total number of applications moved to EXPIRED"
    );
    metrics::describe_counter!("profile_reviews_total", "Total number of review decisions");
    metrics::describe_counter!(
        "notifications_delivered_total",
        "Total number of outbox delivery attempts"
    );
    metrics::describe_gauge!(
        "worker_last_run_timestamp",
        "Unix timestamp of the last background worker iteration"
    );

    metrics::counter!("service_starts_total", "service" => service_name.to_string()).increment(1);
}

/// 启动指标 HTTP 服务器
async fn start_metrics_server(
    addr: SocketAddr,
    handle: PrometheusHandle,
) -> Result<tokio::task::JoinHandle<()>> {
    let app = Router::new()
        .route("/metrics", get(move || std::future::ready(handle.render())))
        .route("/health", get(|| async { "OK" }));

    let listener = TcpListener::bind(addr).await?;
    info!("Metrics server listening on {}", addr);

    let server_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("Metrics server error: {}", e);
        }
    });

    Ok(server_handle)
}

// ============================================================================
// 便捷的指标记录函数
// ============================================================================

/// 记录 HTTP 请求
#[inline]
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let status_str = status.to_string();
    metrics::counter!(
        "http_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status_str.clone()
    )
    .increment(1);

    metrics::histogram!(
        "http_request_duration_seconds",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status_str
    )
    .record(duration_secs);
}

/// 记录一次报名尝试，outcome 为 "success" 或错误码
#[inline]
pub fn record_registration(outcome: &str) {
    metrics::counter!("program_registrations_total", "outcome" => outcome.to_string())
        .increment(1);
}

/// 记录一次扫码核销，outcome 为 "checked_in" 或错误码
#[inline]
pub fn record_qr_scan(outcome: &str) {
    metrics::counter!("qr_scans_total", "outcome" => outcome.to_string()).increment(1);
}

/// 记录过期处理数量
#[inline]
pub fn record_expirations(source: &str, count: u64) {
    metrics::counter!("application_expirations_total", "source" => source.to_string())
        .increment(count);
}

/// 记录审核决定
#[inline]
pub fn record_review(kind: &str, approved: bool) {
    metrics::counter!(
        "profile_reviews_total",
        "kind" => kind.to_string(),
        "approved" => approved.to_string()
    )
    .increment(1);
}

/// 记录通知投递结果
#[inline]
pub fn record_notification(status: &str) {
    metrics::counter!("notifications_delivered_total", "status" => status.to_string())
        .increment(1);
}

/// 记录后台 Worker 最近一次运行时间
#[inline]
pub fn set_worker_last_run(worker: &str) {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default();
    metrics::gauge!("worker_last_run_timestamp", "worker" => worker.to_string()).set(now);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_functions_do_not_panic() {
        // 未安装 recorder 时这些函数也不应 panic
        record_http_request("GET", "/api/programs", 200, 0.1);
        record_registration("success");
        record_qr_scan("ALREADY_USED");
        record_expirations("sweep", 3);
        record_review("DONOR", false);
        record_notification("sent");
        set_worker_last_run("expire_worker");
    }
}
