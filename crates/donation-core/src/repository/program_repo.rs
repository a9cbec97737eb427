//! 活动仓储
//!
//! 提供活动的创建、查询和条件状态更新

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::traits::ProgramRepositoryTrait;
use crate::error::Result;
use crate::lifecycle;
use crate::models::{Program, ProgramStatus};

const PROGRAM_COLUMNS: &str = r#"
    id, title, description, location, scheduled_at, max_participants,
    current_participants, status, created_at, updated_at
"#;

/// 活动仓储（PostgreSQL）
pub struct PgProgramRepository {
    pool: PgPool,
}

impl PgProgramRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 创建活动
    pub async fn create(&self, program: &Program) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO programs (id, title, description, location, scheduled_at,
                                  max_participants, current_participants, status,
                                  created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(program.id)
        .bind(&program.title)
        .bind(&program.description)
        .bind(&program.location)
        .bind(program.scheduled_at)
        .bind(program.max_participants)
        .bind(program.current_participants)
        .bind(program.status)
        .bind(program.created_at)
        .bind(program.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Program>> {
        let sql = format!("SELECT {PROGRAM_COLUMNS} FROM programs WHERE id = $1");
        let program = sqlx::query_as::<_, Program>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(program)
    }

    /// 分页列出活动，按活动时间倒序
    pub async fn list(
        &self,
        status: Option<ProgramStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Program>> {
        let sql = format!(
            r#"
            SELECT {PROGRAM_COLUMNS}
            FROM programs
            WHERE ($1::varchar IS NULL OR status = $1)
            ORDER BY scheduled_at DESC, id ASC
            LIMIT $2 OFFSET $3
            "#
        );
        let programs = sqlx::query_as::<_, Program>(&sql)
            .bind(status.map(|s| s.as_str()))
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(programs)
    }

    pub async fn count(&self, status: Option<ProgramStatus>) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM programs WHERE ($1::varchar IS NULL OR status = $1)",
        )
        .bind(status.map(|s| s.as_str()))
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// 条件更新活动状态
    pub async fn update_status(
        &self,
        id: Uuid,
        target: ProgramStatus,
        now: DateTime<Utc>,
    ) -> Result<Option<Program>> {
        let sql = format!(
            r#"
            UPDATE programs
            SET status = $2, updated_at = $3
            WHERE id = $1 AND status = ANY($4)
            RETURNING {PROGRAM_COLUMNS}
            "#
        );
        let program = sqlx::query_as::<_, Program>(&sql)
            .bind(id)
            .bind(target)
            .bind(now)
            .bind(lifecycle::program_from_strs(target))
            .fetch_optional(&self.pool)
            .await?;

        Ok(program)
    }

    pub async fn count_by_status(&self) -> Result<Vec<(ProgramStatus, i64)>> {
        let rows = sqlx::query_as::<_, (ProgramStatus, i64)>(
            "SELECT status, COUNT(*) FROM programs GROUP BY status",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    // ==================== 事务内操作 ====================

    /// 在事务中预留一个名额
    ///
    /// 仅当活动为 PUBLISHED 且未满时生效，返回是否预留成功
    pub async fn reserve_seat_in_tx(
        conn: &mut PgConnection,
        program_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE programs
            SET current_participants = current_participants + 1, updated_at = $2
            WHERE id = $1
              AND status = 'PUBLISHED'
              AND current_participants < max_participants
            "#,
        )
        .bind(program_id)
        .bind(now)
        .execute(conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// 在事务中释放名额
    pub async fn release_seats_in_tx(
        conn: &mut PgConnection,
        program_id: Uuid,
        count: i32,
        now: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE programs
            SET current_participants = GREATEST(current_participants - $2, 0), updated_at = $3
            WHERE id = $1
            "#,
        )
        .bind(program_id)
        .bind(count)
        .bind(now)
        .execute(conn)
        .await?;

        Ok(())
    }

    pub async fn get_in_tx(conn: &mut PgConnection, id: Uuid) -> Result<Option<Program>> {
        let sql = format!("SELECT {PROGRAM_COLUMNS} FROM programs WHERE id = $1");
        let program = sqlx::query_as::<_, Program>(&sql)
            .bind(id)
            .fetch_optional(conn)
            .await?;

        Ok(program)
    }
}

#[async_trait]
impl ProgramRepositoryTrait for PgProgramRepository {
    async fn create(&self, program: &Program) -> Result<()> {
        self.create(program).await
    }

    async fn get(&self, id: Uuid) -> Result<Option<Program>> {
        self.get(id).await
    }

    async fn list(
        &self,
        status: Option<ProgramStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Program>> {
        self.list(status, limit, offset).await
    }

    async fn count(&self, status: Option<ProgramStatus>) -> Result<i64> {
        self.count(status).await
    }

    async fn update_status(
        &self,
        id: Uuid,
        target: ProgramStatus,
        now: DateTime<Utc>,
    ) -> Result<Option<Program>> {
        self.update_status(id, target, now).await
    }

    async fn count_by_status(&self) -> Result<Vec<(ProgramStatus, i64)>> {
        self.count_by_status().await
    }
}
