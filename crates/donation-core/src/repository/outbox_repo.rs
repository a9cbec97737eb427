//! 通知发件箱仓储

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::traits::NotificationOutboxTrait;
use crate::error::Result;
use crate::models::NotificationTask;

const TASK_COLUMNS: &str = r#"
    id, recipient, kind, subject, body, payload, status, attempts,
    last_error, next_attempt_at, created_at, updated_at
"#;

/// 通知发件箱（PostgreSQL）
pub struct PgNotificationOutbox {
    pool: PgPool,
}

impl PgNotificationOutbox {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn enqueue(&self, task: &NotificationTask) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO notification_tasks (id, recipient, kind, subject, body, payload, status,
                                            attempts, last_error, next_attempt_at,
                                            created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(task.id)
        .bind(&task.recipient)
        .bind(task.kind)
        .bind(&task.subject)
        .bind(&task.body)
        .bind(&task.payload)
        .bind(task.status)
        .bind(task.attempts)
        .bind(&task.last_error)
        .bind(task.next_attempt_at)
        .bind(task.created_at)
        .bind(task.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// 领取到期任务
    ///
    /// 使用 FOR UPDATE SKIP LOCKED，多实例并发领取时互不阻塞
    pub async fn claim_due(
        &self,
        now: DateTime<Utc>,
        limit: i64,
        lease_until: DateTime<Utc>,
    ) -> Result<Vec<NotificationTask>> {
        let sql = format!(
            r#"
            WITH due AS (
                SELECT id
                FROM notification_tasks
                WHERE status = 'PENDING' AND next_attempt_at <= $1
                ORDER BY next_attempt_at ASC
                LIMIT $2
                FOR UPDATE SKIP LOCKED
            )
            UPDATE notification_tasks t
            SET attempts = t.attempts + 1, next_attempt_at = $3, updated_at = $1
            FROM due
            WHERE t.id = due.id
            RETURNING {TASK_COLUMNS}
            "#
        );
        let tasks = sqlx::query_as::<_, NotificationTask>(&sql)
            .bind(now)
            .bind(limit)
            .bind(lease_until)
            .fetch_all(&self.pool)
            .await?;

        Ok(tasks)
    }

    pub async fn mark_sent(&self, id: Uuid, now: DateTime<Utc>) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE notification_tasks
            SET status = 'SENT', last_error = NULL, updated_at = $2
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn mark_retry(
        &self,
        id: Uuid,
        error: String,
        next_attempt_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE notification_tasks
            SET last_error = $2, next_attempt_at = $3, updated_at = $4
            WHERE id = $1 AND status = 'PENDING'
            "#,
        )
        .bind(id)
        .bind(error)
        .bind(next_attempt_at)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn mark_failed(&self, id: Uuid, error: String, now: DateTime<Utc>) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE notification_tasks
            SET status = 'FAILED', last_error = $2, updated_at = $3
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(error)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<NotificationTask>> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM notification_tasks WHERE id = $1");
        let task = sqlx::query_as::<_, NotificationTask>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(task)
    }
}

#[async_trait]
impl NotificationOutboxTrait for PgNotificationOutbox {
    async fn enqueue(&self, task: &NotificationTask) -> Result<()> {
        self.enqueue(task).await
    }

    async fn claim_due(
        &self,
        now: DateTime<Utc>,
        limit: i64,
        lease_until: DateTime<Utc>,
    ) -> Result<Vec<NotificationTask>> {
        self.claim_due(now, limit, lease_until).await
    }

    async fn mark_sent(&self, id: Uuid, now: DateTime<Utc>) -> Result<()> {
        self.mark_sent(id, now).await
    }

    async fn mark_retry(
        &self,
        id: Uuid,
        error: String,
        next_attempt_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.mark_retry(id, error, next_attempt_at, now).await
    }

    async fn mark_failed(&self, id: Uuid, error: String, now: DateTime<Utc>) -> Result<()> {
        self.mark_failed(id, error, now).await
    }

    async fn get(&self, id: Uuid) -> Result<Option<NotificationTask>> {
        self.get(id).await
    }
}
