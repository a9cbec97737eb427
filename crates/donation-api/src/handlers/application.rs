//! 报名与核销 API 处理器
//!
//! 报名、报名查询、取消、二维码获取、扫码核销以及手动触发过期扫描

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use donation_core::{ProgramApplication, QrPayload};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{ApiResponse, ExpireResultDto, RegisterProgramRequest, RegistrationDto, ScanQrRequest},
    error::Result,
    state::AppState,
};

/// 活动报名
///
/// POST /api/programs/register
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterProgramRequest>,
) -> Result<(StatusCode, Json<ApiResponse<RegistrationDto>>)> {
    req.validate()?;

    let result = state.registration.register(req.into()).await?;
    let dto = RegistrationDto {
        application_id: result.application_id,
        qr_token: result.qr_token,
        expires_at: result.expires_at,
        warnings: result.warnings,
    };

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(dto, "报名成功")),
    ))
}

/// 获取报名详情
///
/// GET /api/programs/application/{id}
pub async fn get_application(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ProgramApplication>>> {
    let application = state.registration.get_application(id).await?;
    Ok(Json(ApiResponse::success(application)))
}

/// 取消报名，释放名额
///
/// POST /api/programs/application/{id}/cancel
pub async fn cancel_application(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ProgramApplication>>> {
    let application = state.registration.cancel(id).await?;
    Ok(Json(ApiResponse::success(application)))
}

/// 获取报名二维码
///
/// GET /api/programs/application/{id}/qr
pub async fn get_application_qr(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<QrPayload>>> {
    let payload = state.registration.qr_payload(id).await?;
    Ok(Json(ApiResponse::success(payload)))
}

/// 受助人的报名记录
///
/// GET /api/programs/beneficiary/{id}/applications
pub async fn list_beneficiary_applications(
    State(state): State<AppState>,
    Path(beneficiary_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<ProgramApplication>>>> {
    let items = state
        .registration
        .list_by_beneficiary(beneficiary_id)
        .await?;
    Ok(Json(ApiResponse::success(items)))
}

/// 活动的报名记录
///
/// GET /api/programs/{id}/applications
pub async fn list_program_applications(
    State(state): State<AppState>,
    Path(program_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<ProgramApplication>>>> {
    let items = state.registration.list_by_program(program_id).await?;
    Ok(Json(ApiResponse::success(items)))
}

/// 扫码核销
///
/// POST /api/programs/scan-qr
pub async fn scan_qr(
    State(state): State<AppState>,
    Json(req): Json<ScanQrRequest>,
) -> Result<Json<ApiResponse<ProgramApplication>>> {
    req.validate()?;

    let application = state.checkin.scan(req.token.trim()).await?;
    Ok(Json(ApiResponse::success_with_message(application, "核销成功")))
}

/// 手动触发过期扫描
///
/// POST /api/programs/admin/update-expired
pub async fn update_expired(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<ExpireResultDto>>> {
    let updated_count = state.expiry.sweep().await?;
    info!(updated_count, "Manual expiry sweep finished");
    Ok(Json(ApiResponse::success(ExpireResultDto { updated_count })))
}
