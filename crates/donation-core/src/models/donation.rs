//! 捐赠记录实体定义

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::DonationKind;

/// 捐赠记录
///
/// 现金捐赠使用 amount_cents + currency，实物捐赠使用 item_name + quantity + unit
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Donation {
    pub id: Uuid,
    pub donor_id: Uuid,
    pub kind: DonationKind,
    #[sqlx(default)]
    pub amount_cents: Option<i64>,
    #[sqlx(default)]
    pub currency: Option<String>,
    #[sqlx(default)]
    pub item_name: Option<String>,
    #[sqlx(default)]
    pub quantity: Option<i32>,
    #[sqlx(default)]
    pub unit: Option<String>,
    #[sqlx(default)]
    pub note: Option<String>,
    pub received_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}
