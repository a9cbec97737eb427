//! 集成测试共用的内存存储装配

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use fake::Fake;
use fake::faker::address::en::StreetName;
use fake::faker::name::en::Name;
use fake::faker::phone_number::en::PhoneNumber;
use uuid::Uuid;

use donation_core::dto::{NewProfile, NewProgram, RegisterRequest, ReviewDecision};
use donation_core::{
    CheckInService, DataUriQrEncoder, DonationService, ExpiryService, MemoryStore, ProfileKind,
    ProfileService, Program, ProgramService, RegistrationService, ReviewService,
};
use donation_shared::test_utils::test_email;

pub const GRACE_MINUTES: i64 = 120;

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub registration: RegistrationService,
    pub checkin: CheckInService,
    pub expiry: ExpiryService,
    pub programs: ProgramService,
    pub profiles: ProfileService,
    pub reviews: ReviewService,
    pub donations: DonationService,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_batch_size(500)
    }

    pub fn with_batch_size(batch_size: i64) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            registration: RegistrationService::new(
                store.clone(),
                store.clone(),
                store.clone(),
                store.clone(),
                Arc::new(DataUriQrEncoder),
                Duration::minutes(GRACE_MINUTES),
            ),
            checkin: CheckInService::new(store.clone()),
            expiry: ExpiryService::new(store.clone(), batch_size),
            programs: ProgramService::new(store.clone(), store.clone()),
            profiles: ProfileService::new(store.clone()),
            reviews: ReviewService::new(store.clone()),
            donations: DonationService::new(store.clone(), store.clone()),
            store,
        }
    }

    /// 创建并审核通过一名受助人
    pub async fn approved_beneficiary(&self) -> Uuid {
        self.approved(ProfileKind::Beneficiary).await
    }

    pub async fn approved_donor(&self) -> Uuid {
        self.approved(ProfileKind::Donor).await
    }

    pub async fn approved(&self, kind: ProfileKind) -> Uuid {
        let profile = self
            .profiles
            .register(
                kind,
                NewProfile {
                    email: test_email(kind.as_str()),
                    full_name: Name().fake(),
                    phone: Some(PhoneNumber().fake()),
                    address: Some(StreetName().fake()),
                    household_size: Some((1..6).fake()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        self.reviews
            .review(
                kind,
                profile.id,
                ReviewDecision {
                    approved: true,
                    reason: None,
                },
            )
            .await
            .unwrap();
        profile.id
    }

    /// 创建并发布一场活动
    pub async fn published_program(&self, capacity: i32, scheduled_at: DateTime<Utc>) -> Program {
        let program = self
            .programs
            .create(NewProgram {
                title: "社区食物发放".to_string(),
                description: None,
                location: Some("社区中心".to_string()),
                scheduled_at,
                max_participants: capacity,
            })
            .await
            .unwrap();
        self.programs.publish(program.id).await.unwrap()
    }

    pub async fn program(&self, id: Uuid) -> Program {
        self.programs.get(id).await.unwrap()
    }

    pub fn request(beneficiary_id: Uuid, program_id: Uuid) -> RegisterRequest {
        RegisterRequest {
            beneficiary_id,
            program_id,
        }
    }
}
