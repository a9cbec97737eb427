//! 捐赠人 / 受助人注册与查询服务

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::{DonationError, Result};
use crate::models::{Account, AccountStatus, Profile, ProfileKind, ReviewStatus};
use crate::repository::ProfileRepositoryTrait;
use crate::service::dto::{NewProfile, Paged};

/// 资料服务
pub struct ProfileService {
    profiles: Arc<dyn ProfileRepositoryTrait>,
}

impl ProfileService {
    pub fn new(profiles: Arc<dyn ProfileRepositoryTrait>) -> Self {
        Self { profiles }
    }

    pub async fn register(&self, kind: ProfileKind, input: NewProfile) -> Result<Profile> {
        self.register_at(kind, input, Utc::now()).await
    }

    /// 创建待审核的账号和资料
    #[instrument(skip(self, input), fields(kind = kind.as_str()))]
    pub async fn register_at(
        &self,
        kind: ProfileKind,
        input: NewProfile,
        now: DateTime<Utc>,
    ) -> Result<Profile> {
        let email = input.email.trim().to_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(DonationError::Validation("邮箱格式不正确".to_string()));
        }
        let full_name = input.full_name.trim().to_string();
        if full_name.is_empty() {
            return Err(DonationError::Validation("姓名不能为空".to_string()));
        }
        if let Some(size) = input.household_size
            && size < 1
        {
            return Err(DonationError::Validation("家庭人数必须大于 0".to_string()));
        }

        let account = Account {
            id: Uuid::now_v7(),
            email,
            display_name: full_name.clone(),
            role: kind.account_role(),
            status: AccountStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        let (organization, household_size) = match kind {
            ProfileKind::Donor => (input.organization, None),
            ProfileKind::Beneficiary => (None, input.household_size),
        };
        let profile = Profile {
            id: Uuid::now_v7(),
            account_id: account.id,
            kind,
            full_name,
            phone: input.phone,
            address: input.address,
            organization,
            household_size,
            review_status: ReviewStatus::Pending,
            review_reason: None,
            reviewed_at: None,
            created_at: now,
            updated_at: now,
        };

        self.profiles.create_with_account(&account, &profile).await?;

        info!(profile_id = %profile.id, account_id = %account.id, "资料已提交，等待审核");
        Ok(profile)
    }

    pub async fn get(&self, kind: ProfileKind, id: Uuid) -> Result<Profile> {
        self.profiles
            .get(kind, id)
            .await?
            .ok_or_else(|| DonationError::not_found(kind.entity_name(), id))
    }

    pub async fn list(
        &self,
        kind: ProfileKind,
        review_status: Option<ReviewStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Paged<Profile>> {
        let items = self.profiles.list(kind, review_status, limit, offset).await?;
        let total = self.profiles.count(kind, review_status).await?;
        Ok(Paged { items, total })
    }
}
