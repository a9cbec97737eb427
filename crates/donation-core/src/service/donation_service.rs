//! 捐赠登记服务
//!
//! 只接受审核通过的捐赠人。现金捐赠以分为单位记录金额和币种，
//! 实物捐赠记录品名、数量和单位。

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::{DonationError, Result};
use crate::models::{Donation, DonationKind, ProfileKind};
use crate::repository::{DonationRepositoryTrait, ProfileRepositoryTrait};
use crate::service::dto::NewDonation;

/// 单笔现金捐赠上限（分），保证按币种汇总不会溢出
pub const MAX_AMOUNT_CENTS: i64 = 100_000_000_000;

/// 捐赠登记服务
pub struct DonationService {
    profiles: Arc<dyn ProfileRepositoryTrait>,
    donations: Arc<dyn DonationRepositoryTrait>,
}

impl DonationService {
    pub fn new(
        profiles: Arc<dyn ProfileRepositoryTrait>,
        donations: Arc<dyn DonationRepositoryTrait>,
    ) -> Self {
        Self {
            profiles,
            donations,
        }
    }

    pub async fn record(&self, input: NewDonation) -> Result<Donation> {
        self.record_at(input, Utc::now()).await
    }

    #[instrument(skip(self, input), fields(donor_id = %input.donor_id, kind = ?input.kind))]
    pub async fn record_at(&self, input: NewDonation, now: DateTime<Utc>) -> Result<Donation> {
        let donor = self
            .profiles
            .get(ProfileKind::Donor, input.donor_id)
            .await?
            .ok_or_else(|| DonationError::not_found("Donor", input.donor_id))?;
        if !donor.is_approved() {
            return Err(DonationError::NotEligible(format!(
                "捐赠人审核状态为 {}，需审核通过后才能登记捐赠",
                donor.review_status.as_str()
            )));
        }

        let donation = build_donation(input, now)?;
        self.donations.create(&donation).await?;

        info!(donation_id = %donation.id, "捐赠已登记");
        Ok(donation)
    }

    pub async fn list_by_donor(&self, donor_id: Uuid) -> Result<Vec<Donation>> {
        if self
            .profiles
            .get(ProfileKind::Donor, donor_id)
            .await?
            .is_none()
        {
            return Err(DonationError::not_found("Donor", donor_id));
        }
        self.donations.list_by_donor(donor_id).await
    }
}

/// 按捐赠类型校验并构造记录，另一类型的字段被丢弃
fn build_donation(input: NewDonation, now: DateTime<Utc>) -> Result<Donation> {
    let note = input.note.filter(|n| !n.trim().is_empty());
    let mut donation = Donation {
        id: Uuid::now_v7(),
        donor_id: input.donor_id,
        kind: input.kind,
        amount_cents: None,
        currency: None,
        item_name: None,
        quantity: None,
        unit: None,
        note,
        received_at: input.received_at.unwrap_or(now),
        created_at: now,
    };

    match input.kind {
        DonationKind::Monetary => {
            let amount = input
                .amount_cents
                .filter(|a| (1..=MAX_AMOUNT_CENTS).contains(a))
                .ok_or_else(|| {
                    DonationError::Validation(format!(
                        "现金捐赠金额必须在 1-{} 分之间",
                        MAX_AMOUNT_CENTS
                    ))
                })?;
            let currency = input
                .currency
                .map(|c| c.trim().to_uppercase())
                .filter(|c| c.len() == 3 && c.chars().all(|ch| ch.is_ascii_alphabetic()))
                .ok_or_else(|| {
                    DonationError::Validation("币种必须是 3 位字母代码".to_string())
                })?;
            donation.amount_cents = Some(amount);
            donation.currency = Some(currency);
        }
        DonationKind::Produce => {
            let item_name = input
                .item_name
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty())
                .ok_or_else(|| DonationError::Validation("实物捐赠需填写品名".to_string()))?;
            let quantity = input
                .quantity
                .filter(|q| *q > 0)
                .ok_or_else(|| DonationError::Validation("实物捐赠数量必须大于 0".to_string()))?;
            donation.item_name = Some(item_name);
            donation.quantity = Some(quantity);
            donation.unit = input.unit.filter(|u| !u.trim().is_empty());
        }
    }

    Ok(donation)
}
