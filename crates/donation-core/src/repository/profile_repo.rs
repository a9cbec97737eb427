//! 捐赠人 / 受助人资料仓储
//!
//! 资料与账号的写入、审核结果同步都在单个事务内完成

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::traits::{ProfileRepositoryTrait, ReviewedProfile};
use crate::error::{DonationError, Result};
use crate::models::{Account, AccountStatus, Profile, ProfileKind, ReviewStatus};

const PROFILE_COLUMNS: &str = r#"
    id, account_id, kind, full_name, phone, address, organization, household_size,
    review_status, review_reason, reviewed_at, created_at, updated_at
"#;

const ACCOUNT_COLUMNS: &str = "id, email, display_name, role, status, created_at, updated_at";

/// 资料仓储（PostgreSQL）
pub struct PgProfileRepository {
    pool: PgPool,
}

impl PgProfileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ==================== 注册 ====================

    pub async fn create_with_account(&self, account: &Account, profile: &Profile) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO accounts (id, email, display_name, role, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(account.id)
        .bind(&account.email)
        .bind(&account.display_name)
        .bind(account.role)
        .bind(account.status)
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&mut *tx)
        .await;

        if let Err(sqlx::Error::Database(db_err)) = &inserted
            && db_err.is_unique_violation()
        {
            return Err(DonationError::Conflict(format!(
                "邮箱已被注册: {}",
                account.email
            )));
        }
        inserted?;

        sqlx::query(
            r#"
            INSERT INTO profiles (id, account_id, kind, full_name, phone, address, organization,
                                  household_size, review_status, review_reason, reviewed_at,
                                  created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(profile.id)
        .bind(profile.account_id)
        .bind(profile.kind)
        .bind(&profile.full_name)
        .bind(&profile.phone)
        .bind(&profile.address)
        .bind(&profile.organization)
        .bind(profile.household_size)
        .bind(profile.review_status)
        .bind(&profile.review_reason)
        .bind(profile.reviewed_at)
        .bind(profile.created_at)
        .bind(profile.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    // ==================== 查询 ====================

    pub async fn get(&self, kind: ProfileKind, id: Uuid) -> Result<Option<Profile>> {
        let sql = format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = $1 AND kind = $2");
        let profile = sqlx::query_as::<_, Profile>(&sql)
            .bind(id)
            .bind(kind)
            .fetch_optional(&self.pool)
            .await?;

        Ok(profile)
    }

    pub async fn get_account(&self, account_id: Uuid) -> Result<Option<Account>> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1");
        let account = sqlx::query_as::<_, Account>(&sql)
            .bind(account_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(account)
    }

    pub async fn list(
        &self,
        kind: ProfileKind,
        review_status: Option<ReviewStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Profile>> {
        let sql = format!(
            r#"
            SELECT {PROFILE_COLUMNS}
            FROM profiles
            WHERE kind = $1 AND ($2::varchar IS NULL OR review_status = $2)
            ORDER BY created_at DESC, id ASC
            LIMIT $3 OFFSET $4
            "#
        );
        let profiles = sqlx::query_as::<_, Profile>(&sql)
            .bind(kind)
            .bind(review_status.map(|s| s.as_str()))
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(profiles)
    }

    pub async fn count(&self, kind: ProfileKind, review_status: Option<ReviewStatus>) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM profiles
            WHERE kind = $1 AND ($2::varchar IS NULL OR review_status = $2)
            "#,
        )
        .bind(kind)
        .bind(review_status.map(|s| s.as_str()))
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    pub async fn count_by_review_status(
        &self,
        kind: ProfileKind,
    ) -> Result<Vec<(ReviewStatus, i64)>> {
        let rows = sqlx::query_as::<_, (ReviewStatus, i64)>(
            "SELECT review_status, COUNT(*) FROM profiles WHERE kind = $1 GROUP BY review_status",
        )
        .bind(kind)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    // ==================== 审核 ====================

    /// 写入审核结果并同步账号状态
    ///
    /// 重复提交相同决定会重写原因与审核时间
    pub async fn apply_review(
        &self,
        kind: ProfileKind,
        id: Uuid,
        approved: bool,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Option<ReviewedProfile>> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            r#"
            UPDATE profiles
            SET review_status = $3, review_reason = $4, reviewed_at = $5, updated_at = $5
            WHERE id = $1 AND kind = $2
            RETURNING {PROFILE_COLUMNS}
            "#
        );
        let Some(profile) = sqlx::query_as::<_, Profile>(&sql)
            .bind(id)
            .bind(kind)
            .bind(ReviewStatus::from_decision(approved))
            .bind(reason)
            .bind(now)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        let account = Self::update_account_status_in_tx(
            &mut *tx,
            profile.account_id,
            AccountStatus::from_decision(approved),
            now,
        )
        .await?
        .ok_or_else(|| {
            DonationError::Internal(format!("资料 {} 关联的账号不存在", profile.id))
        })?;

        tx.commit().await?;
        Ok(Some(ReviewedProfile { profile, account }))
    }

    async fn update_account_status_in_tx(
        conn: &mut PgConnection,
        account_id: Uuid,
        status: AccountStatus,
        now: DateTime<Utc>,
    ) -> Result<Option<Account>> {
        let sql = format!(
            r#"
            UPDATE accounts
            SET status = $2, updated_at = $3
            WHERE id = $1
            RETURNING {ACCOUNT_COLUMNS}
            "#
        );
        let account = sqlx::query_as::<_, Account>(&sql)
            .bind(account_id)
            .bind(status)
            .bind(now)
            .fetch_optional(conn)
            .await?;

        Ok(account)
    }
}

#[async_trait]
impl ProfileRepositoryTrait for PgProfileRepository {
    async fn create_with_account(&self, account: &Account, profile: &Profile) -> Result<()> {
        self.create_with_account(account, profile).await
    }

    async fn get(&self, kind: ProfileKind, id: Uuid) -> Result<Option<Profile>> {
        self.get(kind, id).await
    }

    async fn get_account(&self, account_id: Uuid) -> Result<Option<Account>> {
        self.get_account(account_id).await
    }

    async fn list(
        &self,
        kind: ProfileKind,
        review_status: Option<ReviewStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Profile>> {
        self.list(kind, review_status, limit, offset).await
    }

    async fn count(&self, kind: ProfileKind, review_status: Option<ReviewStatus>) -> Result<i64> {
        self.count(kind, review_status).await
    }

    async fn apply_review(
        &self,
        kind: ProfileKind,
        id: Uuid,
        approved: bool,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Option<ReviewedProfile>> {
        self.apply_review(kind, id, approved, reason, now).await
    }

    async fn count_by_review_status(
        &self,
        kind: ProfileKind,
    ) -> Result<Vec<(ReviewStatus, i64)>> {
        self.count_by_review_status(kind).await
    }
}
