//! 领域错误类型
//!
//! 定义报名生命周期、审核和捐赠登记的业务错误和系统错误

use thiserror::Error;

/// 领域错误类型
#[derive(Debug, Error)]
pub enum DonationError {
    #[error("记录不存在: {entity} id={id}")]
    NotFound { entity: &'static str, id: String },

    #[error("不满足报名资格: {0}")]
    NotEligible(String),

    #[error("活动名额已满: program_id={0}")]
    CapacityExceeded(uuid::Uuid),

    #[error("重复报名: program_id={program_id}, beneficiary_id={beneficiary_id}")]
    DuplicateRegistration {
        program_id: uuid::Uuid,
        beneficiary_id: uuid::Uuid,
    },

    #[error("活动未开放报名: program_id={program_id}, 原因={reason}")]
    ProgramNotOpen {
        program_id: uuid::Uuid,
        reason: String,
    },

    #[error("二维码已使用或报名已结束: application_id={application_id}, status={status}")]
    AlreadyUsed {
        application_id: uuid::Uuid,
        status: String,
    },

    #[error("二维码已过期: application_id={0}")]
    Expired(uuid::Uuid),

    #[error("状态冲突: {0}")]
    Conflict(String),

    #[error("参数校验失败: {0}")]
    Validation(String),

    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),

    #[error("JSON 序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("内部错误: {0}")]
    Internal(String),
}

/// 领域 Result 类型别名
pub type Result<T> = std::result::Result<T, DonationError>;

impl DonationError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// 检查是否为业务错误（非系统错误）
    pub fn is_business_error(&self) -> bool {
        !matches!(
            self,
            Self::Database(_) | Self::Serialization(_) | Self::Internal(_)
        )
    }

    /// 获取错误码（用于 API 响应和指标标签）
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::NotEligible(_) => "NOT_ELIGIBLE",
            Self::CapacityExceeded(_) => "CAPACITY_EXCEEDED",
            Self::DuplicateRegistration { .. } => "DUPLICATE_REGISTRATION",
            Self::ProgramNotOpen { .. } => "PROGRAM_NOT_OPEN",
            Self::AlreadyUsed { .. } => "ALREADY_USED",
            Self::Expired(_) => "EXPIRED",
            Self::Conflict(_) => "CONFLICT",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_error_is_business_error() {
        assert!(DonationError::CapacityExceeded(Uuid::nil()).is_business_error());
        assert!(DonationError::Validation("bad".to_string()).is_business_error());
        assert!(!DonationError::Internal("panic".to_string()).is_business_error());
        assert!(!DonationError::Database(sqlx::Error::PoolTimedOut).is_business_error());
    }

    #[test]
    fn test_error_code() {
        assert_eq!(
            DonationError::not_found("Program", Uuid::nil()).error_code(),
            "NOT_FOUND"
        );
        assert_eq!(
            DonationError::Expired(Uuid::nil()).error_code(),
            "EXPIRED"
        );
        assert_eq!(
            DonationError::AlreadyUsed {
                application_id: Uuid::nil(),
                status: "CHECKED_IN".to_string()
            }
            .error_code(),
            "ALREADY_USED"
        );
    }

    #[test]
    fn test_error_display() {
        let id = Uuid::new_v4();
        let err = DonationError::not_found("Application", id);
        assert!(err.to_string().contains(&id.to_string()));

        let err = DonationError::ProgramNotOpen {
            program_id: id,
            reason: "DRAFT".to_string(),
        };
        assert!(err.to_string().contains("DRAFT"));
    }
}
