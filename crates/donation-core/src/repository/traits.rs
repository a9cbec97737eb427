//! 仓储 Trait 定义
//!
//! 服务层只依赖这些接口。PostgreSQL 实现用于生产，内存实现用于本地开发和测试，
//! 测试中也可使用 mockall 生成的 Mock 实现。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::Result;
use crate::lifecycle::{Transition, TransitionOutcome};
use crate::models::{
    Account, ApplicationStatus, Donation, DonationKind, NotificationTask, Profile, ProfileKind,
    Program, ProgramApplication, ProgramStatus, ReviewStatus,
};

/// 报名写入时的名额预留结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeatOutcome {
    /// 名额已预留且报名已写入
    Reserved,
    /// 活动不存在
    ProgramMissing,
    /// 活动不在 PUBLISHED 状态
    ProgramNotOpen(ProgramStatus),
    /// 名额已满
    CapacityExceeded,
    /// 该受助人已有未取消的报名
    Duplicate,
}

/// 审核结果，资料与账号在同一事务中更新
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewedProfile {
    pub profile: Profile,
    pub account: Account,
}

/// 活动仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProgramRepositoryTrait: Send + Sync {
    async fn create(&self, program: &Program) -> Result<()>;
    async fn get(&self, id: Uuid) -> Result<Option<Program>>;
    async fn list(
        &self,
        status: Option<ProgramStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Program>>;
    async fn count(&self, status: Option<ProgramStatus>) -> Result<i64>;

    /// 条件更新活动状态，当前状态不在前驱集合中时返回 None
    async fn update_status(
        &self,
        id: Uuid,
        target: ProgramStatus,
        now: DateTime<Utc>,
    ) -> Result<Option<Program>>;

    async fn count_by_status(&self) -> Result<Vec<(ProgramStatus, i64)>>;
}

/// 报名仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ApplicationRepositoryTrait: Send + Sync {
    /// 原子地预留名额并写入报名
    ///
    /// 名额更新仅在活动为 PUBLISHED 且未满时生效，任一步失败整体回滚
    async fn insert_with_seat(&self, application: &ProgramApplication) -> Result<SeatOutcome>;

    async fn get(&self, id: Uuid) -> Result<Option<ProgramApplication>>;
    async fn find_by_token(&self, token: &str) -> Result<Option<ProgramApplication>>;

    /// 查找受助人在该活动下未取消的报名
    async fn find_active(
        &self,
        program_id: Uuid,
        beneficiary_id: Uuid,
    ) -> Result<Option<ProgramApplication>>;

    async fn list_by_program(&self, program_id: Uuid) -> Result<Vec<ProgramApplication>>;
    async fn list_by_beneficiary(&self, beneficiary_id: Uuid) -> Result<Vec<ProgramApplication>>;

    /// 执行一次条件状态转换，需要时在同一原子写入中释放名额
    async fn transition(
        &self,
        id: Uuid,
        transition: Transition,
        now: DateTime<Utc>,
    ) -> Result<TransitionOutcome<ProgramApplication>>;

    /// 将至多 limit 条已逾期的非终态报名置为 EXPIRED，返回实际转换的条数
    async fn expire_overdue(&self, now: DateTime<Utc>, limit: i64) -> Result<u64>;

    /// 取消活动下所有非终态报名并释放名额
    async fn cancel_for_program(&self, program_id: Uuid, now: DateTime<Utc>) -> Result<u64>;

    async fn count_by_status(
        &self,
        program_id: Option<Uuid>,
    ) -> Result<Vec<(ApplicationStatus, i64)>>;
}

/// 捐赠人 / 受助人资料仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileRepositoryTrait: Send + Sync {
    /// 在同一事务中创建账号和资料，邮箱重复返回 Conflict
    async fn create_with_account(&self, account: &Account, profile: &Profile) -> Result<()>;

    /// 按类型查询资料，类型不符视为不存在
    async fn get(&self, kind: ProfileKind, id: Uuid) -> Result<Option<Profile>>;
    async fn get_account(&self, account_id: Uuid) -> Result<Option<Account>>;

    async fn list(
        &self,
        kind: ProfileKind,
        review_status: Option<ReviewStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Profile>>;
    async fn count(&self, kind: ProfileKind, review_status: Option<ReviewStatus>) -> Result<i64>;

    /// 写入审核结果并同步账号状态
    async fn apply_review(
        &self,
        kind: ProfileKind,
        id: Uuid,
        approved: bool,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Option<ReviewedProfile>>;

    async fn count_by_review_status(&self, kind: ProfileKind)
    -> Result<Vec<(ReviewStatus, i64)>>;
}

/// 捐赠仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DonationRepositoryTrait: Send + Sync {
    async fn create(&self, donation: &Donation) -> Result<()>;
    async fn list_by_donor(&self, donor_id: Uuid) -> Result<Vec<Donation>>;

    /// 按币种汇总现金捐赠金额（分）
    async fn monetary_totals(&self) -> Result<Vec<(String, i64)>>;
    async fn count_by_kind(&self, kind: DonationKind) -> Result<i64>;
}

/// 通知发件箱接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationOutboxTrait: Send + Sync {
    async fn enqueue(&self, task: &NotificationTask) -> Result<()>;

    /// 领取到期的 PENDING 任务
    ///
    /// 领取即租约：attempts 加一，next_attempt_at 推迟到 lease_until，
    /// 投递进程崩溃时任务会在租约到期后被重新领取
    async fn claim_due(
        &self,
        now: DateTime<Utc>,
        limit: i64,
        lease_until: DateTime<Utc>,
    ) -> Result<Vec<NotificationTask>>;

    async fn mark_sent(&self, id: Uuid, now: DateTime<Utc>) -> Result<()>;
    async fn mark_retry(
        &self,
        id: Uuid,
        error: String,
        next_attempt_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<()>;
    async fn mark_failed(&self, id: Uuid, error: String, now: DateTime<Utc>) -> Result<()>;

    async fn get(&self, id: Uuid) -> Result<Option<NotificationTask>>;
}
