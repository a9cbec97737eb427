//! 管理后台仪表盘 API 处理器

use axum::{Json, extract::State};
use donation_core::dto::DashboardSummary;

use crate::{dto::ApiResponse, error::Result, state::AppState};

/// 仪表盘汇总
///
/// GET /api/admin/dashboard
pub async fn summary(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<DashboardSummary>>> {
    let summary = state.dashboard.summary().await?;
    Ok(Json(ApiResponse::success(summary)))
}
