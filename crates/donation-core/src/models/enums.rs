//! 领域枚举类型定义
//!
//! 所有枚举都支持数据库（sqlx，varchar 存储）和 JSON（serde）序列化

use serde::{Deserialize, Serialize};

/// 报名状态
///
/// 单调推进 PENDING → CONFIRMED → CHECKED_IN，EXPIRED / CANCELLED 可从任意非终态进入。
/// 允许的转换表见 [`crate::lifecycle`]。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "varchar", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationStatus {
    /// 待确认
    #[default]
    Pending,
    /// 已确认，持有名额，可扫码核销
    Confirmed,
    /// 已核销
    CheckedIn,
    /// 已过期
    Expired,
    /// 已取消
    Cancelled,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 5] = [
        Self::Pending,
        Self::Confirmed,
        Self::CheckedIn,
        Self::Expired,
        Self::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::CheckedIn => "CHECKED_IN",
            Self::Expired => "EXPIRED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// 终态：二维码不可再使用
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::CheckedIn | Self::Expired | Self::Cancelled)
    }
}

impl std::fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 活动状态
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "varchar", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProgramStatus {
    /// 草稿 - 配置中，不接受报名
    #[default]
    Draft,
    /// 已发布 - 接受报名
    Published,
    /// 已取消
    Cancelled,
}

impl ProgramStatus {
    pub const ALL: [ProgramStatus; 3] = [Self::Draft, Self::Published, Self::Cancelled];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Published => "PUBLISHED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for ProgramStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 资料审核状态
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "varchar", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl ReviewStatus {
    pub const ALL: [ReviewStatus; 3] = [Self::Pending, Self::Approved, Self::Rejected];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        }
    }

    /// 审核决定对应的审核状态
    pub fn from_decision(approved: bool) -> Self {
        if approved { Self::Approved } else { Self::Rejected }
    }
}

/// 资料类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "varchar", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProfileKind {
    /// 捐赠人
    Donor,
    /// 受助人
    Beneficiary,
}

impl ProfileKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Donor => "DONOR",
            Self::Beneficiary => "BENEFICIARY",
        }
    }

    /// 错误信息中使用的实体名
    pub fn entity_name(&self) -> &'static str {
        match self {
            Self::Donor => "Donor",
            Self::Beneficiary => "Beneficiary",
        }
    }

    pub fn account_role(&self) -> AccountRole {
        match self {
            Self::Donor => AccountRole::Donor,
            Self::Beneficiary => AccountRole::Beneficiary,
        }
    }
}

/// 账号角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "varchar", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountRole {
    Donor,
    Beneficiary,
    Admin,
}

/// 账号状态
///
/// 审核通过后账号变为 ACTIVE，驳回后变为 REJECTED，登录与资格校验以此为准
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "varchar", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountStatus {
    #[default]
    Pending,
    Active,
    Rejected,
}

impl AccountStatus {
    pub fn from_decision(approved: bool) -> Self {
        if approved { Self::Active } else { Self::Rejected }
    }
}

/// 捐赠类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "varchar", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DonationKind {
    /// 现金捐赠
    Monetary,
    /// 农产品等实物捐赠
    Produce,
}

/// 通知任务状态
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "varchar", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationStatus {
    #[default]
    Pending,
    Sent,
    Failed,
}

/// 通知类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "varchar", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    /// 报名成功，附带二维码
    RegistrationConfirmed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_application_status_serde() {
        let json = serde_json::to_string(&ApplicationStatus::CheckedIn).unwrap();
        assert_eq!(json, "\"CHECKED_IN\"");
        let parsed: ApplicationStatus = serde_json::from_str("\"CANCELLED\"").unwrap();
        assert_eq!(parsed, ApplicationStatus::Cancelled);
    }

    #[test]
    fn test_as_str_matches_serde() {
        for status in ApplicationStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json.trim_matches('"'), status.as_str());
        }
        for status in ProgramStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json.trim_matches('"'), status.as_str());
        }
        for status in ReviewStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json.trim_matches('"'), status.as_str());
        }
    }

    #[test]
    fn test_terminal_states() {
        assert!(!ApplicationStatus::Pending.is_terminal());
        assert!(!ApplicationStatus::Confirmed.is_terminal());
        assert!(ApplicationStatus::CheckedIn.is_terminal());
        assert!(ApplicationStatus::Expired.is_terminal());
        assert!(ApplicationStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_decisions() {
        assert_eq!(ReviewStatus::from_decision(true), ReviewStatus::Approved);
        assert_eq!(ReviewStatus::from_decision(false), ReviewStatus::Rejected);
        assert_eq!(AccountStatus::from_decision(true), AccountStatus::Active);
        assert_eq!(AccountStatus::from_decision(false), AccountStatus::Rejected);
        assert_eq!(ProfileKind::Donor.account_role(), AccountRole::Donor);
    }
}
