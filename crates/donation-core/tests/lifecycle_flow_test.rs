//! 报名生命周期集成测试
//!
//! 基于内存存储驱动完整流程：报名 -> 核销 / 过期 / 取消 -> 统计

mod common;

use std::sync::Arc;

use chrono::{Duration, Utc};
use futures::future::join_all;

use common::{GRACE_MINUTES, Harness};
use donation_core::dto::RegistrationResult;
use donation_core::{
    ApplicationRepositoryTrait, ApplicationStatus, DonationError, NotificationOutboxTrait,
    NotificationStatus, qr,
};

// ==================== 报名 ====================

#[tokio::test]
async fn test_registration_confirms_and_takes_seat() {
    let h = Harness::new();
    let beneficiary = h.approved_beneficiary().await;
    let scheduled_at = Utc::now() + Duration::days(2);
    let program = h.published_program(5, scheduled_at).await;

    let result = h
        .registration
        .register(Harness::request(beneficiary, program.id))
        .await
        .unwrap();

    assert!(result.warnings.is_empty());
    assert_eq!(
        result.expires_at,
        scheduled_at + Duration::minutes(GRACE_MINUTES)
    );
    assert_eq!(qr::decode_token(&result.qr_token).unwrap(), result.application_id);

    let application = h
        .registration
        .get_application(result.application_id)
        .await
        .unwrap();
    assert_eq!(application.status, ApplicationStatus::Confirmed);
    assert_eq!(h.program(program.id).await.current_participants, 1);
}

#[tokio::test]
async fn test_capacity_plus_one_registration_fails() {
    let h = Harness::new();
    let program = h
        .published_program(3, Utc::now() + Duration::days(1))
        .await;

    for _ in 0..3 {
        let b = h.approved_beneficiary().await;
        h.registration
            .register(Harness::request(b, program.id))
            .await
            .unwrap();
    }

    let late = h.approved_beneficiary().await;
    let result = h
        .registration
        .register(Harness::request(late, program.id))
        .await;

    assert!(matches!(result, Err(DonationError::CapacityExceeded(_))));
    assert_eq!(h.program(program.id).await.current_participants, 3);
}

#[tokio::test]
async fn test_concurrent_registrations_never_overbook() {
    let h = Arc::new(Harness::new());
    let program = h
        .published_program(5, Utc::now() + Duration::days(1))
        .await;

    let mut beneficiaries = Vec::new();
    for _ in 0..12 {
        beneficiaries.push(h.approved_beneficiary().await);
    }

    let attempts = beneficiaries.into_iter().map(|b| {
        let h = h.clone();
        let program_id = program.id;
        async move {
            h.registration
                .register(Harness::request(b, program_id))
                .await
        }
    });
    let results = join_all(attempts).await;

    let succeeded = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(succeeded, 5);
    assert!(
        results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| matches!(e, DonationError::CapacityExceeded(_)))
    );
    assert_eq!(h.program(program.id).await.current_participants, 5);
}

#[tokio::test]
async fn test_duplicate_registration_rejected_until_cancelled() {
    let h = Harness::new();
    let beneficiary = h.approved_beneficiary().await;
    let program = h
        .published_program(5, Utc::now() + Duration::days(1))
        .await;

    let first = h
        .registration
        .register(Harness::request(beneficiary, program.id))
        .await
        .unwrap();
    let second = h
        .registration
        .register(Harness::request(beneficiary, program.id))
        .await;
    assert!(matches!(
        second,
        Err(DonationError::DuplicateRegistration { .. })
    ));

    h.registration.cancel(first.application_id).await.unwrap();
    assert_eq!(h.program(program.id).await.current_participants, 0);

    let again = h
        .registration
        .register(Harness::request(beneficiary, program.id))
        .await
        .unwrap();
    assert_ne!(again.qr_token, first.qr_token);
    assert_eq!(h.program(program.id).await.current_participants, 1);
}

#[tokio::test]
async fn test_registration_enqueues_confirmation() {
    let h = Harness::new();
    let beneficiary = h.approved_beneficiary().await;
    let program = h
        .published_program(5, Utc::now() + Duration::days(1))
        .await;

    h.registration
        .register(Harness::request(beneficiary, program.id))
        .await
        .unwrap();

    let now = Utc::now() + Duration::seconds(1);
    let tasks = h
        .store
        .claim_due(now, 10, now + Duration::minutes(5))
        .await
        .unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].status, NotificationStatus::Pending);
    assert!(tasks[0].payload["qr"]["dataUri"]
        .as_str()
        .unwrap()
        .starts_with("data:text/plain;base64,"));
}

// ==================== 扫码核销 ====================

#[tokio::test]
async fn test_scan_twice_checks_in_once() {
    let h = Harness::new();
    let beneficiary = h.approved_beneficiary().await;
    let program = h
        .published_program(5, Utc::now() + Duration::hours(1))
        .await;
    let registered = h
        .registration
        .register(Harness::request(beneficiary, program.id))
        .await
        .unwrap();

    let first = h.checkin.scan(&registered.qr_token).await.unwrap();
    assert_eq!(first.status, ApplicationStatus::CheckedIn);
    let checked_in_at = first.checked_in_at.unwrap();

    let second = h.checkin.scan(&registered.qr_token).await;
    assert!(matches!(second, Err(DonationError::AlreadyUsed { .. })));

    let stored = h
        .registration
        .get_application(registered.application_id)
        .await
        .unwrap();
    assert_eq!(stored.checked_in_at, Some(checked_in_at));
    // 已核销的报名继续占用名额
    assert_eq!(h.program(program.id).await.current_participants, 1);
}

#[tokio::test]
async fn test_scan_after_expiry_expires_and_releases_seat() {
    let h = Harness::new();
    let beneficiary = h.approved_beneficiary().await;
    let program = h
        .published_program(5, Utc::now() + Duration::hours(1))
        .await;
    let registered = h
        .registration
        .register(Harness::request(beneficiary, program.id))
        .await
        .unwrap();

    let later = registered.expires_at + Duration::minutes(1);
    let result = h.checkin.scan_at(&registered.qr_token, later).await;
    assert!(matches!(result, Err(DonationError::Expired(_))));

    let stored = h
        .registration
        .get_application(registered.application_id)
        .await
        .unwrap();
    assert_eq!(stored.status, ApplicationStatus::Expired);
    assert!(stored.checked_in_at.is_none());
    assert_eq!(h.program(program.id).await.current_participants, 0);

    let again = h.checkin.scan_at(&registered.qr_token, later).await;
    assert!(matches!(again, Err(DonationError::AlreadyUsed { .. })));
}

#[tokio::test]
async fn test_scan_unknown_and_malformed_tokens() {
    let h = Harness::new();

    let malformed = h.checkin.scan("definitely not a token").await;
    assert!(matches!(malformed, Err(DonationError::Validation(_))));

    let unknown = h
        .checkin
        .scan(&qr::issue_token(uuid::Uuid::new_v4()))
        .await;
    assert!(matches!(unknown, Err(DonationError::NotFound { .. })));
}

#[tokio::test]
async fn test_concurrent_scans_single_winner() {
    let h = Arc::new(Harness::new());
    let beneficiary = h.approved_beneficiary().await;
    let program = h
        .published_program(5, Utc::now() + Duration::hours(1))
        .await;
    let registered = h
        .registration
        .register(Harness::request(beneficiary, program.id))
        .await
        .unwrap();

    let scans = (0..8).map(|_| {
        let h = h.clone();
        let token = registered.qr_token.clone();
        async move { h.checkin.scan(&token).await }
    });
    let results = join_all(scans).await;

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(
        results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| matches!(e, DonationError::AlreadyUsed { .. }))
    );
}

// ==================== 过期扫描 ====================

#[tokio::test]
async fn test_sweep_expires_each_overdue_once() {
    let h = Harness::with_batch_size(2);
    let now = Utc::now();
    let soon = h.published_program(10, now + Duration::minutes(10)).await;
    let later = h.published_program(10, now + Duration::days(3)).await;

    let mut soon_apps = Vec::new();
    for _ in 0..5 {
        let b = h.approved_beneficiary().await;
        soon_apps.push(
            h.registration
                .register(Harness::request(b, soon.id))
                .await
                .unwrap(),
        );
    }
    let b = h.approved_beneficiary().await;
    h.registration
        .register(Harness::request(b, later.id))
        .await
        .unwrap();

    // 一条已核销，一条已取消，均不受扫描影响
    h.checkin.scan(&soon_apps[0].qr_token).await.unwrap();
    h.registration
        .cancel(soon_apps[1].application_id)
        .await
        .unwrap();
    assert_eq!(h.program(soon.id).await.current_participants, 4);

    let sweep_time = now + Duration::minutes(10 + GRACE_MINUTES + 1);
    let expired = h.expiry.sweep_at(sweep_time).await.unwrap();
    assert_eq!(expired, 3);
    assert_eq!(h.program(soon.id).await.current_participants, 1);
    assert_eq!(h.program(later.id).await.current_participants, 1);

    assert_eq!(h.expiry.sweep_at(sweep_time).await.unwrap(), 0);

    let stats = h.programs.stats(soon.id).await.unwrap();
    assert_eq!(stats.counts.expired, 3);
    assert_eq!(stats.counts.checked_in, 1);
    assert_eq!(stats.counts.cancelled, 1);
    assert_eq!(stats.counts.total, 5);
}

/// 同一活动下准备两条报名：一条已核销占位，一条待竞争
async fn contested_application(h: &Harness) -> (uuid::Uuid, RegistrationResult) {
    let program = h
        .published_program(5, Utc::now() + Duration::minutes(10))
        .await;
    let holder = h.approved_beneficiary().await;
    let held = h
        .registration
        .register(Harness::request(holder, program.id))
        .await
        .unwrap();
    h.checkin.scan(&held.qr_token).await.unwrap();

    let beneficiary = h.approved_beneficiary().await;
    let contested = h
        .registration
        .register(Harness::request(beneficiary, program.id))
        .await
        .unwrap();
    assert_eq!(h.program(program.id).await.current_participants, 2);
    (program.id, contested)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_scan_and_sweep_race_at_expiry_boundary() {
    for _ in 0..20 {
        let h = Harness::new();
        let (program_id, contested) = contested_application(&h).await;

        // 核销恰好在截止时刻，过期扫描在截止后一秒
        let (scanned, swept) = tokio::join!(
            h.checkin.scan_at(&contested.qr_token, contested.expires_at),
            h.expiry.sweep_at(contested.expires_at + Duration::seconds(1)),
        );
        let swept = swept.unwrap();
        let stored = h
            .registration
            .get_application(contested.application_id)
            .await
            .unwrap();
        let participants = h.program(program_id).await.current_participants;

        match scanned {
            Ok(_) => {
                assert_eq!(swept, 0);
                assert_eq!(stored.status, ApplicationStatus::CheckedIn);
                assert_eq!(participants, 2);
            }
            Err(DonationError::AlreadyUsed { .. }) => {
                assert_eq!(swept, 1);
                assert_eq!(stored.status, ApplicationStatus::Expired);
                assert_eq!(participants, 1);
            }
            Err(other) => panic!("unexpected scan error: {other:?}"),
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_scan_and_sweep_race_on_overdue_releases_once() {
    for _ in 0..20 {
        let h = Harness::new();
        let (program_id, contested) = contested_application(&h).await;

        let overdue = contested.expires_at + Duration::minutes(1);
        let (scanned, swept) = tokio::join!(
            h.checkin.scan_at(&contested.qr_token, overdue),
            h.expiry.sweep_at(overdue),
        );
        let swept = swept.unwrap();

        assert!(swept <= 1);
        match scanned {
            Err(DonationError::Expired(_)) => {}
            Err(DonationError::AlreadyUsed { .. }) => assert_eq!(swept, 1),
            other => panic!("unexpected scan result: {other:?}"),
        }

        let stored = h
            .registration
            .get_application(contested.application_id)
            .await
            .unwrap();
        assert_eq!(stored.status, ApplicationStatus::Expired);
        assert_eq!(h.program(program_id).await.current_participants, 1);
        assert_eq!(h.expiry.sweep_at(overdue).await.unwrap(), 0);
    }
}

#[tokio::test]
async fn test_sweep_without_overdue_is_noop() {
    let h = Harness::new();
    let program = h
        .published_program(2, Utc::now() + Duration::days(1))
        .await;
    let b = h.approved_beneficiary().await;
    h.registration
        .register(Harness::request(b, program.id))
        .await
        .unwrap();

    assert_eq!(h.expiry.sweep().await.unwrap(), 0);
    assert_eq!(
        h.store.count_by_status(Some(program.id)).await.unwrap(),
        vec![(ApplicationStatus::Confirmed, 1)]
    );
}

// ==================== 活动取消 ====================

#[tokio::test]
async fn test_program_cancel_cascades_to_open_applications() {
    let h = Harness::new();
    let program = h
        .published_program(5, Utc::now() + Duration::hours(2))
        .await;

    let mut tokens = Vec::new();
    for _ in 0..3 {
        let b = h.approved_beneficiary().await;
        tokens.push(
            h.registration
                .register(Harness::request(b, program.id))
                .await
                .unwrap()
                .qr_token,
        );
    }
    h.checkin.scan(&tokens[0]).await.unwrap();

    let cancelled = h.programs.cancel(program.id).await.unwrap();
    assert_eq!(cancelled.current_participants, 1);

    let stats = h.programs.stats(program.id).await.unwrap();
    assert_eq!(stats.counts.cancelled, 2);
    assert_eq!(stats.counts.checked_in, 1);

    let b = h.approved_beneficiary().await;
    let result = h
        .registration
        .register(Harness::request(b, program.id))
        .await;
    assert!(matches!(result, Err(DonationError::ProgramNotOpen { .. })));

    let again = h.programs.cancel(program.id).await;
    assert!(matches!(again, Err(DonationError::Conflict(_))));
}
