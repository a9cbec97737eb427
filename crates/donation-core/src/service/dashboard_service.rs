//! 管理后台仪表盘

use std::sync::Arc;

use chrono::Utc;
use tracing::instrument;

use crate::error::Result;
use crate::models::{DonationKind, ProfileKind};
use crate::repository::{
    ApplicationRepositoryTrait, DonationRepositoryTrait, ProfileRepositoryTrait,
    ProgramRepositoryTrait,
};
use crate::service::dto::{
    ApplicationCounts, CurrencyTotal, DashboardSummary, ProgramCounts, ReviewCounts,
};

/// 仪表盘服务（只读）
pub struct DashboardService {
    profiles: Arc<dyn ProfileRepositoryTrait>,
    programs: Arc<dyn ProgramRepositoryTrait>,
    applications: Arc<dyn ApplicationRepositoryTrait>,
    donations: Arc<dyn DonationRepositoryTrait>,
}

impl DashboardService {
    pub fn new(
        profiles: Arc<dyn ProfileRepositoryTrait>,
        programs: Arc<dyn ProgramRepositoryTrait>,
        applications: Arc<dyn ApplicationRepositoryTrait>,
        donations: Arc<dyn DonationRepositoryTrait>,
    ) -> Self {
        Self {
            profiles,
            programs,
            applications,
            donations,
        }
    }

    #[instrument(skip(self))]
    pub async fn summary(&self) -> Result<DashboardSummary> {
        let (donors, beneficiaries, programs, applications, totals, produce) = tokio::try_join!(
            self.profiles.count_by_review_status(ProfileKind::Donor),
            self.profiles.count_by_review_status(ProfileKind::Beneficiary),
            self.programs.count_by_status(),
            self.applications.count_by_status(None),
            self.donations.monetary_totals(),
            self.donations.count_by_kind(DonationKind::Produce),
        )?;

        Ok(DashboardSummary {
            donors: ReviewCounts::from_rows(&donors),
            beneficiaries: ReviewCounts::from_rows(&beneficiaries),
            programs: ProgramCounts::from_rows(&programs),
            applications: ApplicationCounts::from_rows(&applications),
            monetary_totals: totals
                .into_iter()
                .map(|(currency, amount_cents)| CurrencyTotal {
                    currency,
                    amount_cents,
                })
                .collect(),
            produce_donations: produce,
            generated_at: Utc::now(),
        })
    }
}
