//! 报名仓储
//!
//! 所有状态变更都是条件写入：`WHERE status = ANY(前驱状态)`，
//! 名额变更与报名写入处于同一事务

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use tracing::debug;
use uuid::Uuid;

use super::program_repo::PgProgramRepository;
use super::traits::{ApplicationRepositoryTrait, SeatOutcome};
use crate::error::Result;
use crate::lifecycle::{Transition, TransitionOutcome};
use crate::models::{ApplicationStatus, ProgramApplication, ProgramStatus};

const APPLICATION_COLUMNS: &str = r#"
    id, program_id, beneficiary_id, status, qr_token,
    created_at, expires_at, checked_in_at, updated_at
"#;

/// 同一受助人同一活动未取消报名的唯一索引
const ACTIVE_PAIR_INDEX: &str = "uq_applications_active_pair";

/// 报名仓储（PostgreSQL）
pub struct PgApplicationRepository {
    pool: PgPool,
}

impl PgApplicationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 预留名额并写入报名
    pub async fn insert_with_seat(&self, application: &ProgramApplication) -> Result<SeatOutcome> {
        let mut tx = self.pool.begin().await?;

        let reserved = PgProgramRepository::reserve_seat_in_tx(
            &mut *tx,
            application.program_id,
            application.created_at,
        )
        .await?;

        if !reserved {
            // 区分失败原因，事务随 tx 丢弃回滚
            let outcome = match PgProgramRepository::get_in_tx(&mut *tx, application.program_id)
                .await?
            {
                None => SeatOutcome::ProgramMissing,
                Some(p) if p.status != ProgramStatus::Published => {
                    SeatOutcome::ProgramNotOpen(p.status)
                }
                Some(_) => SeatOutcome::CapacityExceeded,
            };
            return Ok(outcome);
        }

        match Self::insert_in_tx(&mut *tx, application).await {
            Ok(()) => {}
            Err(sqlx::Error::Database(db_err))
                if db_err.constraint() == Some(ACTIVE_PAIR_INDEX) =>
            {
                debug!(
                    program_id = %application.program_id,
                    beneficiary_id = %application.beneficiary_id,
                    "重复报名被唯一索引拦截"
                );
                return Ok(SeatOutcome::Duplicate);
            }
            Err(e) => return Err(e.into()),
        }

        tx.commit().await?;
        Ok(SeatOutcome::Reserved)
    }

    async fn insert_in_tx(
        conn: &mut PgConnection,
        application: &ProgramApplication,
    ) -> std::result::Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO program_applications (id, program_id, beneficiary_id, status, qr_token,
                                              created_at, expires_at, checked_in_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(application.id)
        .bind(application.program_id)
        .bind(application.beneficiary_id)
        .bind(application.status)
        .bind(&application.qr_token)
        .bind(application.created_at)
        .bind(application.expires_at)
        .bind(application.checked_in_at)
        .bind(application.updated_at)
        .execute(conn)
        .await?;

        Ok(())
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<ProgramApplication>> {
        let sql = format!("SELECT {APPLICATION_COLUMNS} FROM program_applications WHERE id = $1");
        let application = sqlx::query_as::<_, ProgramApplication>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(application)
    }

    pub async fn find_by_token(&self, token: &str) -> Result<Option<ProgramApplication>> {
        let sql =
            format!("SELECT {APPLICATION_COLUMNS} FROM program_applications WHERE qr_token = $1");
        let application = sqlx::query_as::<_, ProgramApplication>(&sql)
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;

        Ok(application)
    }

    pub async fn find_active(
        &self,
        program_id: Uuid,
        beneficiary_id: Uuid,
    ) -> Result<Option<ProgramApplication>> {
        let sql = format!(
            r#"
            SELECT {APPLICATION_COLUMNS}
            FROM program_applications
            WHERE program_id = $1 AND beneficiary_id = $2 AND status <> 'CANCELLED'
            "#
        );
        let application = sqlx::query_as::<_, ProgramApplication>(&sql)
            .bind(program_id)
            .bind(beneficiary_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(application)
    }

    pub async fn list_by_program(&self, program_id: Uuid) -> Result<Vec<ProgramApplication>> {
        let sql = format!(
            r#"
            SELECT {APPLICATION_COLUMNS}
            FROM program_applications
            WHERE program_id = $1
            ORDER BY created_at ASC
            "#
        );
        let applications = sqlx::query_as::<_, ProgramApplication>(&sql)
            .bind(program_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(applications)
    }

    pub async fn list_by_beneficiary(
        &self,
        beneficiary_id: Uuid,
    ) -> Result<Vec<ProgramApplication>> {
        let sql = format!(
            r#"
            SELECT {APPLICATION_COLUMNS}
            FROM program_applications
            WHERE beneficiary_id = $1
            ORDER BY created_at DESC
            "#
        );
        let applications = sqlx::query_as::<_, ProgramApplication>(&sql)
            .bind(beneficiary_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(applications)
    }

    /// 条件状态转换
    ///
    /// 更新未命中时再读取当前状态，用于区分记录不存在和已被其他写者推进
    pub async fn transition(
        &self,
        id: Uuid,
        transition: Transition,
        now: DateTime<Utc>,
    ) -> Result<TransitionOutcome<ProgramApplication>> {
        let checked_in_at =
            (transition.target == ApplicationStatus::CheckedIn).then_some(now);

        let mut tx = self.pool.begin().await?;

        let sql = format!(
            r#"
            UPDATE program_applications
            SET status = $2,
                updated_at = $3,
                checked_in_at = COALESCE($4, checked_in_at)
            WHERE id = $1 AND status = ANY($5)
            RETURNING {APPLICATION_COLUMNS}
            "#
        );
        let updated = sqlx::query_as::<_, ProgramApplication>(&sql)
            .bind(id)
            .bind(transition.target)
            .bind(now)
            .bind(checked_in_at)
            .bind(transition.from_strs())
            .fetch_optional(&mut *tx)
            .await?;

        let Some(application) = updated else {
            let current: Option<ApplicationStatus> =
                sqlx::query_scalar("SELECT status FROM program_applications WHERE id = $1")
                    .bind(id)
                    .fetch_optional(&mut *tx)
                    .await?;
            return Ok(match current {
                Some(status) => TransitionOutcome::Rejected(status),
                None => TransitionOutcome::Missing,
            });
        };

        if transition.release_seat {
            PgProgramRepository::release_seats_in_tx(&mut *tx, application.program_id, 1, now)
                .await?;
        }

        tx.commit().await?;
        Ok(TransitionOutcome::Applied(application))
    }

    /// 批量过期
    ///
    /// 逾期行加行锁并跳过已被其他扫描进程锁定的行，名额按活动聚合释放
    pub async fn expire_overdue(&self, now: DateTime<Utc>, limit: i64) -> Result<u64> {
        let from = Transition::to(ApplicationStatus::Expired).from_strs();

        let count: i64 = sqlx::query_scalar(
            r#"
            WITH due AS (
                SELECT id
                FROM program_applications
                WHERE status = ANY($1) AND expires_at < $2
                ORDER BY expires_at ASC
                LIMIT $3
                FOR UPDATE SKIP LOCKED
            ),
            expired AS (
                UPDATE program_applications a
                SET status = 'EXPIRED', updated_at = $2
                FROM due
                WHERE a.id = due.id AND a.status = ANY($1)
                RETURNING a.program_id
            ),
            released AS (
                UPDATE programs p
                SET current_participants = GREATEST(p.current_participants - c.n, 0),
                    updated_at = $2
                FROM (SELECT program_id, COUNT(*)::int AS n FROM expired GROUP BY program_id) c
                WHERE p.id = c.program_id
                RETURNING p.id
            )
            SELECT COUNT(*) FROM expired
            "#,
        )
        .bind(from)
        .bind(now)
        .bind(limit)
        .fetch_one(&self.pool)
        .await?;

        Ok(count as u64)
    }

    /// 取消活动下所有非终态报名
    pub async fn cancel_for_program(&self, program_id: Uuid, now: DateTime<Utc>) -> Result<u64> {
        let from = Transition::to(ApplicationStatus::Cancelled).from_strs();

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE program_applications
            SET status = 'CANCELLED', updated_at = $2
            WHERE program_id = $1 AND status = ANY($3)
            "#,
        )
        .bind(program_id)
        .bind(now)
        .bind(from)
        .execute(&mut *tx)
        .await?;

        let cancelled = result.rows_affected();
        if cancelled > 0 {
            PgProgramRepository::release_seats_in_tx(&mut *tx, program_id, cancelled as i32, now)
                .await?;
        }

        tx.commit().await?;
        Ok(cancelled)
    }

    pub async fn count_by_status(
        &self,
        program_id: Option<Uuid>,
    ) -> Result<Vec<(ApplicationStatus, i64)>> {
        let rows = sqlx::query_as::<_, (ApplicationStatus, i64)>(
            r#"
            SELECT status, COUNT(*)
            FROM program_applications
            WHERE ($1::uuid IS NULL OR program_id = $1)
            GROUP BY status
            "#,
        )
        .bind(program_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

#[async_trait]
impl ApplicationRepositoryTrait for PgApplicationRepository {
    async fn insert_with_seat(&self, application: &ProgramApplication) -> Result<SeatOutcome> {
        self.insert_with_seat(application).await
    }

    async fn get(&self, id: Uuid) -> Result<Option<ProgramApplication>> {
        self.get(id).await
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<ProgramApplication>> {
        self.find_by_token(token).await
    }

    async fn find_active(
        &self,
        program_id: Uuid,
        beneficiary_id: Uuid,
    ) -> Result<Option<ProgramApplication>> {
        self.find_active(program_id, beneficiary_id).await
    }

    async fn list_by_program(&self, program_id: Uuid) -> Result<Vec<ProgramApplication>> {
        self.list_by_program(program_id).await
    }

    async fn list_by_beneficiary(&self, beneficiary_id: Uuid) -> Result<Vec<ProgramApplication>> {
        self.list_by_beneficiary(beneficiary_id).await
    }

    async fn transition(
        &self,
        id: Uuid,
        transition: Transition,
        now: DateTime<Utc>,
    ) -> Result<TransitionOutcome<ProgramApplication>> {
        self.transition(id, transition, now).await
    }

    async fn expire_overdue(&self, now: DateTime<Utc>, limit: i64) -> Result<u64> {
        self.expire_overdue(now, limit).await
    }

    async fn cancel_for_program(&self, program_id: Uuid, now: DateTime<Utc>) -> Result<u64> {
        self.cancel_for_program(program_id, now).await
    }

    async fn count_by_status(
        &self,
        program_id: Option<Uuid>,
    ) -> Result<Vec<(ApplicationStatus, i64)>> {
        self.count_by_status(program_id).await
    }
}
