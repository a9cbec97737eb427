//! 捐赠人 / 受助人资料 API 处理器
//!
//! 两类资料共用同一套处理逻辑，按路由区分资料类型

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use donation_core::{Profile, ProfileKind, ReviewedProfile};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        ApiResponse, CreateProfileRequest, PageResponse, PaginationParams, ProfileQueryFilter,
        ReviewRequest,
    },
    error::Result,
    state::AppState,
};

// ==================== 捐赠人 ====================

/// POST /api/donors
pub async fn create_donor(
    state: State<AppState>,
    req: Json<CreateProfileRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Profile>>)> {
    create_profile(state, ProfileKind::Donor, req).await
}

/// GET /api/donors
pub async fn list_donors(
    state: State<AppState>,
    pagination: Query<PaginationParams>,
    filter: Query<ProfileQueryFilter>,
) -> Result<Json<ApiResponse<PageResponse<Profile>>>> {
    list_profiles(state, ProfileKind::Donor, pagination, filter).await
}

/// GET /api/donors/{id}
pub async fn get_donor(
    state: State<AppState>,
    id: Path<Uuid>,
) -> Result<Json<ApiResponse<Profile>>> {
    get_profile(state, ProfileKind::Donor, id).await
}

/// 审核捐赠人
///
/// POST /api/donors/{id}/review
pub async fn review_donor(
    state: State<AppState>,
    id: Path<Uuid>,
    req: Json<ReviewRequest>,
) -> Result<Json<ApiResponse<ReviewedProfile>>> {
    review_profile(state, ProfileKind::Donor, id, req).await
}

// ==================== 受助人 ====================

/// POST /api/beneficiaries
pub async fn create_beneficiary(
    state: State<AppState>,
    req: Json<CreateProfileRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Profile>>)> {
    create_profile(state, ProfileKind::Beneficiary, req).await
}

/// GET /api/beneficiaries
pub async fn list_beneficiaries(
    state: State<AppState>,
    pagination: Query<PaginationParams>,
    filter: Query<ProfileQueryFilter>,
) -> Result<Json<ApiResponse<PageResponse<Profile>>>> {
    list_profiles(state, ProfileKind::Beneficiary, pagination, filter).await
}

/// GET /api/beneficiaries/{id}
pub async fn get_beneficiary(
    state: State<AppState>,
    id: Path<Uuid>,
) -> Result<Json<ApiResponse<Profile>>> {
    get_profile(state, ProfileKind::Beneficiary, id).await
}

/// 审核受助人
///
/// POST /api/beneficiaries/{id}/review
pub async fn review_beneficiary(
    state: State<AppState>,
    id: Path<Uuid>,
    req: Json<ReviewRequest>,
) -> Result<Json<ApiResponse<ReviewedProfile>>> {
    review_profile(state, ProfileKind::Beneficiary, id, req).await
}

// ==================== 共用逻辑 ====================

async fn create_profile(
    State(state): State<AppState>,
    kind: ProfileKind,
    Json(req): Json<CreateProfileRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Profile>>)> {
    req.validate()?;

    let profile = state.profiles.register(kind, req.into()).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(profile))))
}

async fn list_profiles(
    State(state): State<AppState>,
    kind: ProfileKind,
    Query(pagination): Query<PaginationParams>,
    Query(filter): Query<ProfileQueryFilter>,
) -> Result<Json<ApiResponse<PageResponse<Profile>>>> {
    let paged = state
        .profiles
        .list(
            kind,
            filter.review_status,
            pagination.limit(),
            pagination.offset(),
        )
        .await?;

    Ok(Json(ApiResponse::success(PageResponse::from_paged(
        paged,
        pagination.page,
        pagination.limit(),
    ))))
}

async fn get_profile(
    State(state): State<AppState>,
    kind: ProfileKind,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Profile>>> {
    let profile = state.profiles.get(kind, id).await?;
    Ok(Json(ApiResponse::success(profile)))
}

async fn review_profile(
    State(state): State<AppState>,
    kind: ProfileKind,
    Path(id): Path<Uuid>,
    Json(req): Json<ReviewRequest>,
) -> Result<Json<ApiResponse<ReviewedProfile>>> {
    req.validate()?;

    let reviewed = state.reviews.review(kind, id, req.into()).await?;
    Ok(Json(ApiResponse::success_with_message(reviewed, "审核完成")))
}
