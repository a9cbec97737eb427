//! 扫码核销服务
//!
//! 判定顺序：令牌格式 -> 令牌存在 -> 已结束 -> 已逾期 -> 核销。
//! 逾期与核销都是条件写入，并发扫码时只有一次写入生效，其余返回 AlreadyUsed。

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, instrument, warn};

use donation_shared::observability::metrics;

use crate::error::{DonationError, Result};
use crate::lifecycle::{Transition, TransitionOutcome};
use crate::models::{ApplicationStatus, ProgramApplication};
use crate::qr;
use crate::repository::ApplicationRepositoryTrait;

/// 扫码核销服务
pub struct CheckInService {
    applications: Arc<dyn ApplicationRepositoryTrait>,
}

impl CheckInService {
    pub fn new(applications: Arc<dyn ApplicationRepositoryTrait>) -> Self {
        Self { applications }
    }

    pub async fn scan(&self, token: &str) -> Result<ProgramApplication> {
        self.scan_at(token, Utc::now()).await
    }

    /// 按指定时间核销
    #[instrument(skip(self, token))]
    pub async fn scan_at(&self, token: &str, now: DateTime<Utc>) -> Result<ProgramApplication> {
        let result = self.try_scan(token, now).await;
        match &result {
            Ok(_) => metrics::record_qr_scan("checked_in"),
            Err(e) => metrics::record_qr_scan(e.error_code()),
        }
        result
    }

    async fn try_scan(&self, token: &str, now: DateTime<Utc>) -> Result<ProgramApplication> {
        let token = token.trim();
        let application_id = qr::decode_token(token)?;

        let application = self
            .applications
            .find_by_token(token)
            .await?
            .filter(|a| a.id == application_id)
            .ok_or_else(|| DonationError::not_found("Application", application_id))?;

        if application.status.is_terminal() {
            return Err(DonationError::AlreadyUsed {
                application_id: application.id,
                status: application.status.to_string(),
            });
        }
        if application.status == ApplicationStatus::Pending {
            return Err(DonationError::Conflict(format!(
                "报名 {} 尚未确认，不能核销",
                application.id
            )));
        }

        if application.is_overdue(now) {
            return self.expire(application, now).await;
        }

        match self
            .applications
            .transition(
                application.id,
                Transition::to(ApplicationStatus::CheckedIn),
                now,
            )
            .await?
        {
            TransitionOutcome::Applied(checked_in) => {
                info!(
                    application_id = %checked_in.id,
                    program_id = %checked_in.program_id,
                    "扫码核销成功"
                );
                Ok(checked_in)
            }
            TransitionOutcome::Rejected(status) => Err(DonationError::AlreadyUsed {
                application_id: application.id,
                status: status.to_string(),
            }),
            TransitionOutcome::Missing => {
                Err(DonationError::not_found("Application", application.id))
            }
        }
    }

    /// 逾期报名扫码：先置为 EXPIRED 并释放名额，再报告过期
    async fn expire(
        &self,
        application: ProgramApplication,
        now: DateTime<Utc>,
    ) -> Result<ProgramApplication> {
        match self
            .applications
            .transition(
                application.id,
                Transition::to(ApplicationStatus::Expired),
                now,
            )
            .await?
        {
            TransitionOutcome::Applied(expired) => {
                metrics::record_expirations("scan", 1);
                warn!(
                    application_id = %expired.id,
                    expires_at = %expired.expires_at,
                    "二维码已过期"
                );
                Err(DonationError::Expired(expired.id))
            }
            TransitionOutcome::Rejected(ApplicationStatus::Expired) => {
                Err(DonationError::Expired(application.id))
            }
            TransitionOutcome::Rejected(status) => Err(DonationError::AlreadyUsed {
                application_id: application.id,
                status: status.to_string(),
            }),
            TransitionOutcome::Missing => {
                Err(DonationError::not_found("Application", application.id))
            }
        }
    }
}
