//! 活动管理 API 处理器
//!
//! 活动的创建、查询、发布、取消以及报名统计

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use donation_core::Program;
use donation_core::dto::ProgramStats;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{ApiResponse, CreateProgramRequest, PageResponse, PaginationParams, ProgramQueryFilter},
    error::Result,
    state::AppState,
};

/// 创建活动（草稿）
///
/// POST /api/programs
pub async fn create_program(
    State(state): State<AppState>,
    Json(req): Json<CreateProgramRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Program>>)> {
    req.validate()?;

    let program = state.programs.create(req.into()).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(program))))
}

/// 活动列表
///
/// GET /api/programs
pub async fn list_programs(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
    Query(filter): Query<ProgramQueryFilter>,
) -> Result<Json<ApiResponse<PageResponse<Program>>>> {
    let paged = state
        .programs
        .list(filter.status, pagination.limit(), pagination.offset())
        .await?;

    Ok(Json(ApiResponse::success(PageResponse::from_paged(
        paged,
        pagination.page,
        pagination.limit(),
    ))))
}

/// 活动详情
///
/// GET /api/programs/{id}
pub async fn get_program(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Program>>> {
    let program = state.programs.get(id).await?;
    Ok(Json(ApiResponse::success(program)))
}

/// 发布活动，开放报名
///
/// POST /api/programs/{id}/publish
pub async fn publish_program(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Program>>> {
    let program = state.programs.publish(id).await?;
    Ok(Json(ApiResponse::success(program)))
}

/// 取消活动，同时取消其下所有未结束的报名
///
/// POST /api/programs/{id}/cancel
pub async fn cancel_program(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Program>>> {
    let program = state.programs.cancel(id).await?;
    Ok(Json(ApiResponse::success(program)))
}

/// 活动报名统计
///
/// GET /api/programs/{id}/stats
pub async fn program_stats(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ProgramStats>>> {
    let stats = state.programs.stats(id).await?;
    Ok(Json(ApiResponse::success(stats)))
}
