//! 审核服务
//!
//! 管理员对捐赠人 / 受助人资料作出通过或驳回决定，账号状态随之同步。
//! 对同一资料重复提交相同决定是允许的，会覆盖原因和审核时间。

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, instrument};
use uuid::Uuid;

use donation_shared::observability::metrics;

use crate::error::{DonationError, Result};
use crate::models::ProfileKind;
use crate::repository::{ProfileRepositoryTrait, ReviewedProfile};
use crate::service::dto::ReviewDecision;

/// 审核服务
pub struct ReviewService {
    profiles: Arc<dyn ProfileRepositoryTrait>,
}

impl ReviewService {
    pub fn new(profiles: Arc<dyn ProfileRepositoryTrait>) -> Self {
        Self { profiles }
    }

    pub async fn review(
        &self,
        kind: ProfileKind,
        id: Uuid,
        decision: ReviewDecision,
    ) -> Result<ReviewedProfile> {
        self.review_at(kind, id, decision, Utc::now()).await
    }

    #[instrument(skip(self, decision), fields(kind = kind.as_str(), approved = decision.approved))]
    pub async fn review_at(
        &self,
        kind: ProfileKind,
        id: Uuid,
        decision: ReviewDecision,
        now: DateTime<Utc>,
    ) -> Result<ReviewedProfile> {
        let reason = decision
            .reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());

        let reviewed = self
            .profiles
            .apply_review(kind, id, decision.approved, reason, now)
            .await?
            .ok_or_else(|| DonationError::not_found(kind.entity_name(), id))?;

        metrics::record_review(kind.as_str(), decision.approved);
        info!(
            profile_id = %id,
            review_status = reviewed.profile.review_status.as_str(),
            "审核完成"
        );

        Ok(reviewed)
    }
}
