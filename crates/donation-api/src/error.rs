//! HTTP 层错误类型定义
//!
//! 将领域错误映射为 HTTP 状态码和统一的错误响应体

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use donation_core::DonationError;
use donation_shared::observability::tracing::current_trace_id;
use serde_json::json;

/// API 错误类型
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    // 请求错误
    #[error("参数验证失败: {0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),

    // 资格与状态错误
    #[error("{0}")]
    NotEligible(String),
    #[error("{0}")]
    ProgramNotOpen(String),
    #[error("{0}")]
    Expired(String),

    // 冲突
    #[error("{0}")]
    CapacityExceeded(String),
    #[error("{0}")]
    DuplicateRegistration(String),
    #[error("{0}")]
    AlreadyUsed(String),
    #[error("{0}")]
    Conflict(String),

    // 系统错误
    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),
    #[error("内部错误: {0}")]
    Internal(String),
}

impl ApiError {
    /// 返回对应的 HTTP 状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::NotEligible(_) | Self::ProgramNotOpen(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Expired(_) => StatusCode::GONE,
            Self::CapacityExceeded(_)
            | Self::DuplicateRegistration(_)
            | Self::AlreadyUsed(_)
            | Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 返回错误码，与领域错误码保持一致
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::NotEligible(_) => "NOT_ELIGIBLE",
            Self::ProgramNotOpen(_) => "PROGRAM_NOT_OPEN",
            Self::Expired(_) => "EXPIRED",
            Self::CapacityExceeded(_) => "CAPACITY_EXCEEDED",
            Self::DuplicateRegistration(_) => "DUPLICATE_REGISTRATION",
            Self::AlreadyUsed(_) => "ALREADY_USED",
            Self::Conflict(_) => "CONFLICT",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // 系统级错误只返回通用提示，详细信息仅记录日志
        let message = match &self {
            Self::Database(e) => {
                tracing::error!(error = %e, trace_id = ?current_trace_id(), "数据库操作失败");
                "服务内部错误，请稍后重试".to_string()
            }
            Self::Internal(e) => {
                tracing::error!(error = %e, trace_id = ?current_trace_id(), "内部错误");
                "服务内部错误，请稍后重试".to_string()
            }
            other => other.to_string(),
        };

        let body = json!({
            "success": false,
            "code": self.error_code(),
            "message": message,
            "data": serde_json::Value::Null
        });

        (status, axum::Json(body)).into_response()
    }
}

/// 从 validator 错误转换
impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}

/// 从领域错误转换
impl From<DonationError> for ApiError {
    fn from(err: DonationError) -> Self {
        let message = err.to_string();
        match err {
            DonationError::NotFound { .. } => Self::NotFound(message),
            DonationError::NotEligible(_) => Self::NotEligible(message),
            DonationError::ProgramNotOpen { .. } => Self::ProgramNotOpen(message),
            DonationError::Expired(_) => Self::Expired(message),
            DonationError::CapacityExceeded(_) => Self::CapacityExceeded(message),
            DonationError::DuplicateRegistration { .. } => Self::DuplicateRegistration(message),
            DonationError::AlreadyUsed { .. } => Self::AlreadyUsed(message),
            DonationError::Conflict(_) => Self::Conflict(message),
            DonationError::Validation(msg) => Self::Validation(msg),
            DonationError::Database(e) => Self::Database(e),
            DonationError::Serialization(_) | DonationError::Internal(_) => Self::Internal(message),
        }
    }
}

/// API 层 Result 类型别名
pub type Result<T> = std::result::Result<T, ApiError>;
