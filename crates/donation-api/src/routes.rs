//! 路由配置模块
//!
//! 定义所有 REST API 端点的路由映射，由 main 统一挂载到 `/api` 下

use axum::{
    Router,
    routing::{get, post},
};

use crate::{handlers, state::AppState};

/// 构建活动报名与核销相关的路由
///
/// 静态路径段（register、scan-qr、application、beneficiary、admin）优先于 `{id}` 匹配
fn program_routes() -> Router<AppState> {
    Router::new()
        // 报名生命周期
        .route("/programs/register", post(handlers::application::register))
        .route("/programs/scan-qr", post(handlers::application::scan_qr))
        .route(
            "/programs/application/{id}",
            get(handlers::application::get_application),
        )
        .route(
            "/programs/application/{id}/cancel",
            post(handlers::application::cancel_application),
        )
        .route(
            "/programs/application/{id}/qr",
            get(handlers::application::get_application_qr),
        )
        .route(
            "/programs/beneficiary/{id}/applications",
            get(handlers::application::list_beneficiary_applications),
        )
        .route(
            "/programs/admin/update-expired",
            post(handlers::application::update_expired),
        )
        // 活动管理
        .route(
            "/programs",
            get(handlers::program::list_programs).post(handlers::program::create_program),
        )
        .route("/programs/{id}", get(handlers::program::get_program))
        .route(
            "/programs/{id}/publish",
            post(handlers::program::publish_program),
        )
        .route(
            "/programs/{id}/cancel",
            post(handlers::program::cancel_program),
        )
        .route(
            "/programs/{id}/applications",
            get(handlers::application::list_program_applications),
        )
        .route("/programs/{id}/stats", get(handlers::program::program_stats))
}

/// 构建捐赠人、受助人与审核相关的路由
fn profile_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/donors",
            get(handlers::profile::list_donors).post(handlers::profile::create_donor),
        )
        .route("/donors/{id}", get(handlers::profile::get_donor))
        .route(
            "/donors/{id}/review",
            post(handlers::profile::review_donor),
        )
        .route(
            "/donors/{id}/donations",
            get(handlers::donation::list_donor_donations),
        )
        .route(
            "/beneficiaries",
            get(handlers::profile::list_beneficiaries).post(handlers::profile::create_beneficiary),
        )
        .route(
            "/beneficiaries/{id}",
            get(handlers::profile::get_beneficiary),
        )
        .route(
            "/beneficiaries/{id}/review",
            post(handlers::profile::review_beneficiary),
        )
}

/// 构建捐赠登记与后台汇总路由
fn donation_routes() -> Router<AppState> {
    Router::new()
        .route("/donations", post(handlers::donation::create_donation))
        .route("/admin/dashboard", get(handlers::dashboard::summary))
}

/// 构建所有 API 路由
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(program_routes())
        .merge(profile_routes())
        .merge(donation_routes())
}
