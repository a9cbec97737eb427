//! 请求 DTO 定义
//!
//! 所有 REST API 的请求参数和请求体结构，字段校验在进入服务层前完成

use chrono::{DateTime, Utc};
use donation_core::dto::{NewDonation, NewProfile, NewProgram, RegisterRequest, ReviewDecision};
use donation_core::{DonationKind, ProgramStatus, ReviewStatus};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

// ==================== 报名与核销 ====================

/// 活动报名请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterProgramRequest {
    pub beneficiary_id: Uuid,
    pub program_id: Uuid,
}

impl From<RegisterProgramRequest> for RegisterRequest {
    fn from(req: RegisterProgramRequest) -> Self {
        Self {
            beneficiary_id: req.beneficiary_id,
            program_id: req.program_id,
        }
    }
}

/// 扫码核销请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ScanQrRequest {
    #[validate(length(min = 1, max = 128, message = "二维码内容长度必须在1-128个字符之间"))]
    pub token: String,
}

// ==================== 活动 ====================

/// 创建活动请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProgramRequest {
    #[validate(length(min = 1, max = 200, message = "活动标题长度必须在1-200个字符之间"))]
    pub title: String,
    #[validate(length(max = 2000, message = "活动描述不能超过2000个字符"))]
    pub description: Option<String>,
    #[validate(length(max = 255, message = "活动地点不能超过255个字符"))]
    pub location: Option<String>,
    pub scheduled_at: DateTime<Utc>,
    #[validate(range(min = 1, max = 100000, message = "活动名额必须在1-100000之间"))]
    pub max_participants: i32,
}

impl From<CreateProgramRequest> for NewProgram {
    fn from(req: CreateProgramRequest) -> Self {
        Self {
            title: req.title,
            description: req.description,
            location: req.location,
            scheduled_at: req.scheduled_at,
            max_participants: req.max_participants,
        }
    }
}

/// 活动列表过滤
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramQueryFilter {
    pub status: Option<ProgramStatus>,
}

// ==================== 资料与审核 ====================

/// 捐赠人 / 受助人注册请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProfileRequest {
    #[validate(email(message = "邮箱格式不正确"))]
    pub email: String,
    #[validate(length(min = 1, max = 100, message = "姓名长度必须在1-100个字符之间"))]
    pub full_name: String,
    #[validate(length(max = 32, message = "电话号码不能超过32个字符"))]
    pub phone: Option<String>,
    #[validate(length(max = 255, message = "地址不能超过255个字符"))]
    pub address: Option<String>,
    #[validate(length(max = 100, message = "机构名称不能超过100个字符"))]
    pub organization: Option<String>,
    #[validate(range(min = 1, max = 50, message = "家庭人数必须在1-50之间"))]
    pub household_size: Option<i32>,
}

impl From<CreateProfileRequest> for NewProfile {
    fn from(req: CreateProfileRequest) -> Self {
        Self {
            email: req.email,
            full_name: req.full_name,
            phone: req.phone,
            address: req.address,
            organization: req.organization,
            household_size: req.household_size,
        }
    }
}

/// 资料列表过滤
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileQueryFilter {
    pub review_status: Option<ReviewStatus>,
}

/// 审核请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRequest {
    pub approved: bool,
    #[validate(length(max = 500, message = "审核意见不能超过500个字符"))]
    pub reason: Option<String>,
}

impl From<ReviewRequest> for ReviewDecision {
    fn from(req: ReviewRequest) -> Self {
        Self {
            approved: req.approved,
            reason: req.reason,
        }
    }
}

// ==================== 捐赠 ====================

/// 捐赠登记请求
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateDonationRequest {
    pub donor_id: Uuid,
    pub kind: DonationKind,
    #[validate(range(min = 1i64, max = 100000000000i64, message = "捐赠金额必须在1-100000000000分之间"))]
    pub amount_cents: Option<i64>,
    #[validate(length(equal = 3, message = "币种必须为3位代码"))]
    pub currency: Option<String>,
    #[validate(length(min = 1, max = 100, message = "物品名称长度必须在1-100个字符之间"))]
    pub item_name: Option<String>,
    #[validate(range(min = 1, message = "数量必须大于0"))]
    pub quantity: Option<i32>,
    #[validate(length(max = 20, message = "单位不能超过20个字符"))]
    pub unit: Option<String>,
    #[validate(length(max = 500, message = "备注不能超过500个字符"))]
    pub note: Option<String>,
    pub received_at: Option<DateTime<Utc>>,
}

impl From<CreateDonationRequest> for NewDonation {
    fn from(req: CreateDonationRequest) -> Self {
        Self {
            donor_id: req.donor_id,
            kind: req.kind,
            amount_cents: req.amount_cents,
            currency: req.currency,
            item_name: req.item_name,
            quantity: req.quantity,
            unit: req.unit,
            note: req.note,
            received_at: req.received_at,
        }
    }
}

// ==================== 分页 ====================

/// 分页参数
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationParams {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
}

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    20
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            page_size: default_page_size(),
        }
    }
}

impl PaginationParams {
    /// 计算数据库查询的 offset
    pub fn offset(&self) -> i64 {
        (self.page.max(1) - 1).saturating_mul(self.limit())
    }

    /// 获取限制条数（最大100）
    pub fn limit(&self) -> i64 {
        self.page_size.clamp(1, 100)
    }
}
