//! 捐赠登记 API 处理器

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use donation_core::Donation;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{ApiResponse, CreateDonationRequest},
    error::Result,
    state::AppState,
};

/// 登记捐赠
///
/// POST /api/donations
pub async fn create_donation(
    State(state): State<AppState>,
    Json(req): Json<CreateDonationRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Donation>>)> {
    req.validate()?;

    let donation = state.donations.record(req.into()).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(donation))))
}

/// 捐赠人的捐赠记录
///
/// GET /api/donors/{id}/donations
pub async fn list_donor_donations(
    State(state): State<AppState>,
    Path(donor_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<Donation>>>> {
    let donations = state.donations.list_by_donor(donor_id).await?;
    Ok(Json(ApiResponse::success(donations)))
}
