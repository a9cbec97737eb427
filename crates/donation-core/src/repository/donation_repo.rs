//! 捐赠仓储

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::traits::DonationRepositoryTrait;
use crate::error::Result;
use crate::models::{Donation, DonationKind};

/// 捐赠仓储（PostgreSQL）
pub struct PgDonationRepository {
    pool: PgPool,
}

impl PgDonationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, donation: &Donation) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO donations (id, donor_id, kind, amount_cents, currency, item_name,
                                   quantity, unit, note, received_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(donation.id)
        .bind(donation.donor_id)
        .bind(donation.kind)
        .bind(donation.amount_cents)
        .bind(&donation.currency)
        .bind(&donation.item_name)
        .bind(donation.quantity)
        .bind(&donation.unit)
        .bind(&donation.note)
        .bind(donation.received_at)
        .bind(donation.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn list_by_donor(&self, donor_id: Uuid) -> Result<Vec<Donation>> {
        let donations = sqlx::query_as::<_, Donation>(
            r#"
            SELECT id, donor_id, kind, amount_cents, currency, item_name,
                   quantity, unit, note, received_at, created_at
            FROM donations
            WHERE donor_id = $1
            ORDER BY received_at DESC
            "#,
        )
        .bind(donor_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(donations)
    }

    pub async fn monetary_totals(&self) -> Result<Vec<(String, i64)>> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            r#"
            SELECT currency, COALESCE(SUM(amount_cents), 0)::bigint
            FROM donations
            WHERE kind = 'MONETARY' AND currency IS NOT NULL
            GROUP BY currency
            ORDER BY currency
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn count_by_kind(&self, kind: DonationKind) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM donations WHERE kind = $1")
            .bind(kind)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[async_trait]
impl DonationRepositoryTrait for PgDonationRepository {
    async fn create(&self, donation: &Donation) -> Result<()> {
        self.create(donation).await
    }

    async fn list_by_donor(&self, donor_id: Uuid) -> Result<Vec<Donation>> {
        self.list_by_donor(donor_id).await
    }

    async fn monetary_totals(&self) -> Result<Vec<(String, i64)>> {
        self.monetary_totals().await
    }

    async fn count_by_kind(&self, kind: DonationKind) -> Result<i64> {
        self.count_by_kind(kind).await
    }
}
