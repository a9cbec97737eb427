//! 审核与捐赠登记集成测试

mod common;

use chrono::Utc;
use uuid::Uuid;

use common::Harness;
use donation_core::dto::{NewDonation, NewProfile, ReviewDecision};
use donation_core::service::MAX_AMOUNT_CENTS;
use donation_core::{
    AccountStatus, DashboardService, Donation, DonationError, DonationKind,
    DonationRepositoryTrait, ProfileKind, ProfileRepositoryTrait, ReviewStatus,
};
use donation_shared::test_utils::test_email;

#[tokio::test]
async fn test_donor_rejection_updates_profile_and_account() {
    let h = Harness::new();
    let donor = h
        .profiles
        .register(
            ProfileKind::Donor,
            NewProfile {
                email: test_email("donor"),
                full_name: "陈七".to_string(),
                organization: Some("阳光农场".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(donor.review_status, ReviewStatus::Pending);

    let reviewed = h
        .reviews
        .review(
            ProfileKind::Donor,
            donor.id,
            ReviewDecision {
                approved: false,
                reason: Some("incomplete".to_string()),
            },
        )
        .await
        .unwrap();

    assert_eq!(reviewed.profile.review_status, ReviewStatus::Rejected);
    assert_eq!(reviewed.profile.review_reason.as_deref(), Some("incomplete"));
    assert!(reviewed.profile.reviewed_at.is_some());
    assert_eq!(reviewed.account.status, AccountStatus::Rejected);

    let account = h
        .store
        .get_account(donor.account_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(account.status, AccountStatus::Rejected);
}

#[tokio::test]
async fn test_repeated_decision_is_allowed() {
    let h = Harness::new();
    let id = h.approved_beneficiary().await;

    let again = h
        .reviews
        .review(
            ProfileKind::Beneficiary,
            id,
            ReviewDecision {
                approved: true,
                reason: Some("复核通过".to_string()),
            },
        )
        .await
        .unwrap();

    assert_eq!(again.profile.review_status, ReviewStatus::Approved);
    assert_eq!(again.account.status, AccountStatus::Active);
    assert_eq!(again.profile.review_reason.as_deref(), Some("复核通过"));
}

#[tokio::test]
async fn test_review_with_wrong_kind_is_not_found() {
    let h = Harness::new();
    let donor = h.approved_donor().await;

    let result = h
        .reviews
        .review(
            ProfileKind::Beneficiary,
            donor,
            ReviewDecision {
                approved: true,
                reason: None,
            },
        )
        .await;
    assert!(matches!(result, Err(DonationError::NotFound { .. })));

    let unknown = h
        .reviews
        .review(
            ProfileKind::Donor,
            Uuid::new_v4(),
            ReviewDecision {
                approved: true,
                reason: None,
            },
        )
        .await;
    assert!(matches!(unknown, Err(DonationError::NotFound { .. })));
}

#[tokio::test]
async fn test_duplicate_email_conflicts() {
    let h = Harness::new();
    let email = test_email("dup");
    let input = NewProfile {
        email: email.clone(),
        full_name: "重复".to_string(),
        ..Default::default()
    };

    h.profiles
        .register(ProfileKind::Donor, input.clone())
        .await
        .unwrap();
    let second = h.profiles.register(ProfileKind::Beneficiary, input).await;

    assert!(matches!(second, Err(DonationError::Conflict(_))));
}

#[tokio::test]
async fn test_list_profiles_by_review_status() {
    let h = Harness::new();
    h.approved_beneficiary().await;
    h.profiles
        .register(
            ProfileKind::Beneficiary,
            NewProfile {
                email: test_email("pending"),
                full_name: "待审".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let pending = h
        .profiles
        .list(ProfileKind::Beneficiary, Some(ReviewStatus::Pending), 20, 0)
        .await
        .unwrap();
    assert_eq!(pending.total, 1);
    assert_eq!(pending.items[0].full_name, "待审");

    let all = h
        .profiles
        .list(ProfileKind::Beneficiary, None, 1, 0)
        .await
        .unwrap();
    assert_eq!(all.total, 2);
    assert_eq!(all.items.len(), 1);
}

fn monetary(donor_id: Uuid, cents: i64, currency: &str) -> NewDonation {
    NewDonation {
        donor_id,
        kind: DonationKind::Monetary,
        amount_cents: Some(cents),
        currency: Some(currency.to_string()),
        item_name: None,
        quantity: None,
        unit: None,
        note: None,
        received_at: None,
    }
}

#[tokio::test]
async fn test_pending_donor_cannot_donate() {
    let h = Harness::new();
    let donor = h
        .profiles
        .register(
            ProfileKind::Donor,
            NewProfile {
                email: test_email("donor"),
                full_name: "未审核".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let result = h.donations.record(monetary(donor.id, 1_000, "CNY")).await;
    assert!(matches!(result, Err(DonationError::NotEligible(_))));

    let unknown = h
        .donations
        .record(monetary(Uuid::new_v4(), 1_000, "CNY"))
        .await;
    assert!(matches!(unknown, Err(DonationError::NotFound { .. })));
}

#[tokio::test]
async fn test_donations_feed_dashboard() {
    let h = Harness::new();
    let donor = h.approved_donor().await;

    h.donations
        .record(monetary(donor, 2_500, "cny"))
        .await
        .unwrap();
    h.donations
        .record(monetary(donor, 1_500, "CNY"))
        .await
        .unwrap();
    h.donations
        .record(monetary(donor, 900, "USD"))
        .await
        .unwrap();
    h.donations
        .record(NewDonation {
            donor_id: donor,
            kind: DonationKind::Produce,
            amount_cents: None,
            currency: None,
            item_name: Some("白菜".to_string()),
            quantity: Some(30),
            unit: Some("kg".to_string()),
            note: Some("周六送达".to_string()),
            received_at: Some(Utc::now()),
        })
        .await
        .unwrap();

    let listed = h.donations.list_by_donor(donor).await.unwrap();
    assert_eq!(listed.len(), 4);

    let dashboard = DashboardService::new(
        h.store.clone(),
        h.store.clone(),
        h.store.clone(),
        h.store.clone(),
    );
    let summary = dashboard.summary().await.unwrap();
    assert_eq!(summary.donors.approved, 1);
    assert_eq!(summary.produce_donations, 1);
    assert_eq!(summary.monetary_totals.len(), 2);
    assert_eq!(summary.monetary_totals[0].currency, "CNY");
    assert_eq!(summary.monetary_totals[0].amount_cents, 4_000);
    assert_eq!(summary.monetary_totals[1].amount_cents, 900);
}

#[tokio::test]
async fn test_oversized_amount_is_rejected() {
    let h = Harness::new();
    let donor = h.approved_donor().await;

    let result = h
        .donations
        .record(monetary(donor, MAX_AMOUNT_CENTS + 1, "USD"))
        .await;
    assert!(matches!(result, Err(DonationError::Validation(_))));
    let result = h.donations.record(monetary(donor, i64::MAX, "USD")).await;
    assert!(matches!(result, Err(DonationError::Validation(_))));

    h.donations
        .record(monetary(donor, MAX_AMOUNT_CENTS, "USD"))
        .await
        .unwrap();
    assert_eq!(h.donations.list_by_donor(donor).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_monetary_total_overflow_is_an_error() {
    let h = Harness::new();
    let donor = h.approved_donor().await;
    let now = Utc::now();

    for cents in [i64::MAX, 1] {
        let donation = Donation {
            id: Uuid::now_v7(),
            donor_id: donor,
            kind: DonationKind::Monetary,
            amount_cents: Some(cents),
            currency: Some("USD".to_string()),
            item_name: None,
            quantity: None,
            unit: None,
            note: None,
            received_at: now,
            created_at: now,
        };
        DonationRepositoryTrait::create(h.store.as_ref(), &donation)
            .await
            .unwrap();
    }

    let result = h.store.monetary_totals().await;
    assert!(matches!(result, Err(DonationError::Internal(_))));

    let dashboard = DashboardService::new(
        h.store.clone(),
        h.store.clone(),
        h.store.clone(),
        h.store.clone(),
    );
    assert!(dashboard.summary().await.is_err());
}
