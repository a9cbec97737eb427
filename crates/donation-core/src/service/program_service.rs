//! 活动管理服务
//!
//! 活动创建、发布、取消与查询。取消活动会同时取消其下所有未结束的报名并释放名额。

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::{DonationError, Result};
use crate::lifecycle;
use crate::models::{Program, ProgramStatus};
use crate::repository::{ApplicationRepositoryTrait, ProgramRepositoryTrait};
use crate::service::dto::{ApplicationCounts, NewProgram, Paged, ProgramStats};

pub const MAX_TITLE_LEN: usize = 200;
pub const MAX_CAPACITY: i32 = 100_000;

/// 活动管理服务
pub struct ProgramService {
    programs: Arc<dyn ProgramRepositoryTrait>,
    applications: Arc<dyn ApplicationRepositoryTrait>,
}

impl ProgramService {
    pub fn new(
        programs: Arc<dyn ProgramRepositoryTrait>,
        applications: Arc<dyn ApplicationRepositoryTrait>,
    ) -> Self {
        Self {
            programs,
            applications,
        }
    }

    pub async fn create(&self, input: NewProgram) -> Result<Program> {
        self.create_at(input, Utc::now()).await
    }

    /// 创建草稿状态的活动
    #[instrument(skip(self, input), fields(title = %input.title))]
    pub async fn create_at(&self, input: NewProgram, now: DateTime<Utc>) -> Result<Program> {
        let title = input.title.trim();
        if title.is_empty() || title.chars().count() > MAX_TITLE_LEN {
            return Err(DonationError::Validation(format!(
                "活动标题长度必须在 1 到 {} 之间",
                MAX_TITLE_LEN
            )));
        }
        if !(1..=MAX_CAPACITY).contains(&input.max_participants) {
            return Err(DonationError::Validation(format!(
                "活动名额必须在 1 到 {} 之间",
                MAX_CAPACITY
            )));
        }

        let program = Program {
            id: Uuid::now_v7(),
            title: title.to_string(),
            description: input.description,
            location: input.location,
            scheduled_at: input.scheduled_at,
            max_participants: input.max_participants,
            current_participants: 0,
            status: ProgramStatus::Draft,
            created_at: now,
            updated_at: now,
        };
        self.programs.create(&program).await?;

        info!(program_id = %program.id, "活动已创建");
        Ok(program)
    }

    pub async fn publish(&self, id: Uuid) -> Result<Program> {
        self.change_status(id, ProgramStatus::Published, Utc::now())
            .await
    }

    /// 取消活动及其下所有未结束的报名
    #[instrument(skip(self), fields(program_id = %id))]
    pub async fn cancel(&self, id: Uuid) -> Result<Program> {
        let now = Utc::now();
        self.change_status(id, ProgramStatus::Cancelled, now).await?;

        let cancelled = self.applications.cancel_for_program(id, now).await?;
        info!(cancelled_applications = cancelled, "活动已取消");

        self.get(id).await
    }

    async fn change_status(
        &self,
        id: Uuid,
        target: ProgramStatus,
        now: DateTime<Utc>,
    ) -> Result<Program> {
        let current = self.get(id).await?;
        if !lifecycle::can_transition_program(current.status, target) {
            return Err(DonationError::Conflict(format!(
                "活动状态 {} 不能变更为 {}",
                current.status, target
            )));
        }

        // 条件更新未命中说明状态已被并发修改
        self.programs
            .update_status(id, target, now)
            .await?
            .ok_or_else(|| {
                DonationError::Conflict(format!("活动 {} 状态已被修改，请刷新后重试", id))
            })
    }

    pub async fn get(&self, id: Uuid) -> Result<Program> {
        self.programs
            .get(id)
            .await?
            .ok_or_else(|| DonationError::not_found("Program", id))
    }

    pub async fn list(
        &self,
        status: Option<ProgramStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Paged<Program>> {
        let items = self.programs.list(status, limit, offset).await?;
        let total = self.programs.count(status).await?;
        Ok(Paged { items, total })
    }

    /// 单个活动的报名状态统计
    pub async fn stats(&self, id: Uuid) -> Result<ProgramStats> {
        let program = self.get(id).await?;
        let rows = self.applications.count_by_status(Some(id)).await?;
        Ok(ProgramStats {
            program_id: program.id,
            max_participants: program.max_participants,
            current_participants: program.current_participants,
            counts: ApplicationCounts::from_rows(&rows),
        })
    }
}
