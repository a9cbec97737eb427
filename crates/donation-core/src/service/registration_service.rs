//! 活动报名服务
//!
//! 唯一的报名入口，流程：
//!
//! 1. 受助人资格 -> 2. 活动开放状态 -> 3. 重复报名 -> 4. 名额
//!    -> 5. 原子写入（名额 + 报名） -> 6. 通知入队
//!
//! 第 4、5 步的检查在写入时由条件更新再次保证，前置检查只用于给出更准确的错误。
//! 通知入队失败只记录告警，不回滚报名。

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use donation_shared::observability::metrics;

use crate::error::{DonationError, Result};
use crate::lifecycle::{Transition, TransitionOutcome};
use crate::models::{
    ApplicationStatus, Profile, ProfileKind, Program, ProgramApplication, ProgramStatus,
};
use crate::notification::registration_confirmed;
use crate::qr::{self, QrEncoder, QrPayload};
use crate::repository::{
    ApplicationRepositoryTrait, NotificationOutboxTrait, ProfileRepositoryTrait,
    ProgramRepositoryTrait, SeatOutcome,
};
use crate::service::dto::{RegisterRequest, RegistrationResult};

/// 活动报名服务
pub struct RegistrationService {
    programs: Arc<dyn ProgramRepositoryTrait>,
    applications: Arc<dyn ApplicationRepositoryTrait>,
    profiles: Arc<dyn ProfileRepositoryTrait>,
    outbox: Arc<dyn NotificationOutboxTrait>,
    qr_encoder: Arc<dyn QrEncoder>,
    /// 活动开始后二维码仍可核销的时长
    grace: Duration,
}

impl RegistrationService {
    pub fn new(
        programs: Arc<dyn ProgramRepositoryTrait>,
        applications: Arc<dyn ApplicationRepositoryTrait>,
        profiles: Arc<dyn ProfileRepositoryTrait>,
        outbox: Arc<dyn NotificationOutboxTrait>,
        qr_encoder: Arc<dyn QrEncoder>,
        grace: Duration,
    ) -> Self {
        Self {
            programs,
            applications,
            profiles,
            outbox,
            qr_encoder,
            grace,
        }
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<RegistrationResult> {
        self.register_at(request, Utc::now()).await
    }

    /// 按指定时间报名
    #[instrument(
        skip(self, request),
        fields(beneficiary_id = %request.beneficiary_id, program_id = %request.program_id)
    )]
    pub async fn register_at(
        &self,
        request: RegisterRequest,
        now: DateTime<Utc>,
    ) -> Result<RegistrationResult> {
        let result = self.try_register(&request, now).await;
        match &result {
            Ok(_) => metrics::record_registration("success"),
            Err(e) => metrics::record_registration(e.error_code()),
        }
        result
    }

    async fn try_register(
        &self,
        request: &RegisterRequest,
        now: DateTime<Utc>,
    ) -> Result<RegistrationResult> {
        let beneficiary = self
            .profiles
            .get(ProfileKind::Beneficiary, request.beneficiary_id)
            .await?
            .ok_or_else(|| DonationError::not_found("Beneficiary", request.beneficiary_id))?;
        if !beneficiary.is_approved() {
            return Err(DonationError::NotEligible(format!(
                "受助人审核状态为 {}，需审核通过后才能报名",
                beneficiary.review_status.as_str()
            )));
        }

        let program = self
            .programs
            .get(request.program_id)
            .await?
            .ok_or_else(|| DonationError::not_found("Program", request.program_id))?;
        let expires_at = self.check_open(&program, now)?;

        if self
            .applications
            .find_active(program.id, beneficiary.id)
            .await?
            .is_some()
        {
            return Err(DonationError::DuplicateRegistration {
                program_id: program.id,
                beneficiary_id: beneficiary.id,
            });
        }
        if program.is_full() {
            return Err(DonationError::CapacityExceeded(program.id));
        }

        let application_id = Uuid::now_v7();
        let application = ProgramApplication {
            id: application_id,
            program_id: program.id,
            beneficiary_id: beneficiary.id,
            status: ApplicationStatus::Confirmed,
            qr_token: qr::issue_token(application_id),
            created_at: now,
            expires_at,
            checked_in_at: None,
            updated_at: now,
        };

        match self.applications.insert_with_seat(&application).await? {
            SeatOutcome::Reserved => {}
            SeatOutcome::ProgramMissing => {
                return Err(DonationError::not_found("Program", program.id));
            }
            SeatOutcome::ProgramNotOpen(status) => {
                return Err(DonationError::ProgramNotOpen {
                    program_id: program.id,
                    reason: format!("活动状态为 {}", status),
                });
            }
            SeatOutcome::CapacityExceeded => {
                return Err(DonationError::CapacityExceeded(program.id));
            }
            SeatOutcome::Duplicate => {
                return Err(DonationError::DuplicateRegistration {
                    program_id: program.id,
                    beneficiary_id: beneficiary.id,
                });
            }
        }

        info!(
            application_id = %application.id,
            expires_at = %application.expires_at,
            "报名成功"
        );

        let mut warnings = Vec::new();
        if let Err(e) = self
            .enqueue_confirmation(&beneficiary, &program, &application, now)
            .await
        {
            warn!(
                application_id = %application.id,
                error = %e,
                "报名确认通知入队失败"
            );
            warnings.push(format!("报名确认通知发送失败: {}", e));
        }

        Ok(RegistrationResult {
            application_id: application.id,
            qr_token: application.qr_token,
            expires_at: application.expires_at,
            warnings,
        })
    }

    /// 检查活动是否可报名，返回报名的核销截止时间
    fn check_open(&self, program: &Program, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
        if program.status != ProgramStatus::Published {
            return Err(DonationError::ProgramNotOpen {
                program_id: program.id,
                reason: format!("活动状态为 {}", program.status),
            });
        }
        let expires_at = program.scheduled_at + self.grace;
        if expires_at <= now {
            return Err(DonationError::ProgramNotOpen {
                program_id: program.id,
                reason: "活动已结束".to_string(),
            });
        }
        Ok(expires_at)
    }

    async fn enqueue_confirmation(
        &self,
        beneficiary: &Profile,
        program: &Program,
        application: &ProgramApplication,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let account = self
            .profiles
            .get_account(beneficiary.account_id)
            .await?
            .ok_or_else(|| DonationError::not_found("Account", beneficiary.account_id))?;
        let qr = self.qr_encoder.encode(&application.qr_token)?;
        let task = registration_confirmed(
            &account.email,
            &beneficiary.full_name,
            program,
            application,
            &qr,
            now,
        );
        self.outbox.enqueue(&task).await
    }

    // ==================== 查询 ====================

    pub async fn get_application(&self, id: Uuid) -> Result<ProgramApplication> {
        self.applications
            .get(id)
            .await?
            .ok_or_else(|| DonationError::not_found("Application", id))
    }

    pub async fn list_by_program(&self, program_id: Uuid) -> Result<Vec<ProgramApplication>> {
        if self.programs.get(program_id).await?.is_none() {
            return Err(DonationError::not_found("Program", program_id));
        }
        self.applications.list_by_program(program_id).await
    }

    pub async fn list_by_beneficiary(
        &self,
        beneficiary_id: Uuid,
    ) -> Result<Vec<ProgramApplication>> {
        if self
            .profiles
            .get(ProfileKind::Beneficiary, beneficiary_id)
            .await?
            .is_none()
        {
            return Err(DonationError::not_found("Beneficiary", beneficiary_id));
        }
        self.applications.list_by_beneficiary(beneficiary_id).await
    }

    /// 报名二维码的可渲染内容
    pub async fn qr_payload(&self, id: Uuid) -> Result<QrPayload> {
        let application = self.get_application(id).await?;
        self.qr_encoder.encode(&application.qr_token)
    }

    // ==================== 取消 ====================

    pub async fn cancel(&self, id: Uuid) -> Result<ProgramApplication> {
        self.cancel_at(id, Utc::now()).await
    }

    /// 取消报名并释放名额
    #[instrument(skip(self), fields(application_id = %id))]
    pub async fn cancel_at(&self, id: Uuid, now: DateTime<Utc>) -> Result<ProgramApplication> {
        match self
            .applications
            .transition(id, Transition::to(ApplicationStatus::Cancelled), now)
            .await?
        {
            TransitionOutcome::Applied(application) => {
                info!(program_id = %application.program_id, "报名已取消");
                Ok(application)
            }
            TransitionOutcome::Rejected(status) => Err(DonationError::AlreadyUsed {
                application_id: id,
                status: status.to_string(),
            }),
            TransitionOutcome::Missing => Err(DonationError::not_found("Application", id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Account, AccountRole, AccountStatus, ReviewStatus};
    use crate::qr::DataUriQrEncoder;
    use crate::repository::{
        MockApplicationRepositoryTrait, MockNotificationOutboxTrait, MockProfileRepositoryTrait,
        MockProgramRepositoryTrait,
    };

    fn beneficiary(review_status: ReviewStatus) -> Profile {
        let now = Utc::now();
        Profile {
            id: Uuid::new_v4(),
            account_id: Uuid::new_v4(),
            kind: ProfileKind::Beneficiary,
            full_name: "李四".to_string(),
            phone: None,
            address: None,
            organization: None,
            household_size: Some(3),
            review_status,
            review_reason: None,
            reviewed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn program(status: ProgramStatus, scheduled_at: DateTime<Utc>, max: i32, current: i32) -> Program {
        Program {
            id: Uuid::new_v4(),
            title: "冬季物资发放".to_string(),
            description: None,
            location: None,
            scheduled_at,
            max_participants: max,
            current_participants: current,
            status,
            created_at: scheduled_at,
            updated_at: scheduled_at,
        }
    }

    fn account(id: Uuid) -> Account {
        let now = Utc::now();
        Account {
            id,
            email: "lisi@example.org".to_string(),
            display_name: "李四".to_string(),
            role: AccountRole::Beneficiary,
            status: AccountStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    struct Mocks {
        programs: MockProgramRepositoryTrait,
        applications: MockApplicationRepositoryTrait,
        profiles: MockProfileRepositoryTrait,
        outbox: MockNotificationOutboxTrait,
    }

    impl Mocks {
        fn new() -> Self {
            Self {
                programs: MockProgramRepositoryTrait::new(),
                applications: MockApplicationRepositoryTrait::new(),
                profiles: MockProfileRepositoryTrait::new(),
                outbox: MockNotificationOutboxTrait::new(),
            }
        }

        fn into_service(self) -> RegistrationService {
            RegistrationService::new(
                Arc::new(self.programs),
                Arc::new(self.applications),
                Arc::new(self.profiles),
                Arc::new(self.outbox),
                Arc::new(DataUriQrEncoder),
                Duration::minutes(120),
            )
        }
    }

    #[tokio::test]
    async fn test_pending_beneficiary_not_eligible() {
        let b = beneficiary(ReviewStatus::Pending);
        let mut mocks = Mocks::new();
        let returned = b.clone();
        mocks
            .profiles
            .expect_get()
            .returning(move |_, _| Ok(Some(returned.clone())));
        mocks.programs.expect_get().never();

        let result = mocks
            .into_service()
            .register(RegisterRequest {
                beneficiary_id: b.id,
                program_id: Uuid::new_v4(),
            })
            .await;

        assert!(matches!(result, Err(DonationError::NotEligible(_))));
    }

    #[tokio::test]
    async fn test_unknown_program_not_found() {
        let b = beneficiary(ReviewStatus::Approved);
        let mut mocks = Mocks::new();
        let returned = b.clone();
        mocks
            .profiles
            .expect_get()
            .returning(move |_, _| Ok(Some(returned.clone())));
        mocks.programs.expect_get().returning(|_| Ok(None));

        let result = mocks
            .into_service()
            .register(RegisterRequest {
                beneficiary_id: b.id,
                program_id: Uuid::new_v4(),
            })
            .await;

        assert!(matches!(
            result,
            Err(DonationError::NotFound { entity: "Program", .. })
        ));
    }

    #[tokio::test]
    async fn test_draft_and_past_programs_not_open() {
        let now = Utc::now();
        for p in [
            program(ProgramStatus::Draft, now + Duration::days(1), 10, 0),
            program(ProgramStatus::Published, now - Duration::hours(3), 10, 0),
        ] {
            let b = beneficiary(ReviewStatus::Approved);
            let mut mocks = Mocks::new();
            let returned = b.clone();
            mocks
                .profiles
                .expect_get()
                .returning(move |_, _| Ok(Some(returned.clone())));
            let program_id = p.id;
            mocks
                .programs
                .expect_get()
                .returning(move |_| Ok(Some(p.clone())));
            mocks.applications.expect_insert_with_seat().never();

            let result = mocks
                .into_service()
                .register_at(
                    RegisterRequest {
                        beneficiary_id: b.id,
                        program_id,
                    },
                    now,
                )
                .await;

            assert!(matches!(result, Err(DonationError::ProgramNotOpen { .. })));
        }
    }

    #[tokio::test]
    async fn test_seat_race_reports_capacity_exceeded() {
        let now = Utc::now();
        let b = beneficiary(ReviewStatus::Approved);
        let p = program(ProgramStatus::Published, now + Duration::days(1), 1, 0);
        let mut mocks = Mocks::new();
        let returned = b.clone();
        mocks
            .profiles
            .expect_get()
            .returning(move |_, _| Ok(Some(returned.clone())));
        let program_id = p.id;
        mocks
            .programs
            .expect_get()
            .returning(move |_| Ok(Some(p.clone())));
        mocks
            .applications
            .expect_find_active()
            .returning(|_, _| Ok(None));
        mocks
            .applications
            .expect_insert_with_seat()
            .times(1)
            .returning(|_| Ok(SeatOutcome::CapacityExceeded));
        mocks.outbox.expect_enqueue().never();

        let result = mocks
            .into_service()
            .register_at(
                RegisterRequest {
                    beneficiary_id: b.id,
                    program_id,
                },
                now,
            )
            .await;

        assert!(matches!(result, Err(DonationError::CapacityExceeded(id)) if id == program_id));
    }

    #[tokio::test]
    async fn test_enqueue_failure_is_a_warning() {
        let now = Utc::now();
        let b = beneficiary(ReviewStatus::Approved);
        let p = program(ProgramStatus::Published, now + Duration::days(1), 5, 0);
        let scheduled_at = p.scheduled_at;
        let mut mocks = Mocks::new();
        let returned = b.clone();
        mocks
            .profiles
            .expect_get()
            .returning(move |_, _| Ok(Some(returned.clone())));
        mocks
            .profiles
            .expect_get_account()
            .returning(|id| Ok(Some(account(id))));
        let program_id = p.id;
        mocks
            .programs
            .expect_get()
            .returning(move |_| Ok(Some(p.clone())));
        mocks
            .applications
            .expect_find_active()
            .returning(|_, _| Ok(None));
        mocks
            .applications
            .expect_insert_with_seat()
            .withf(|a| a.status == ApplicationStatus::Confirmed)
            .returning(|_| Ok(SeatOutcome::Reserved));
        mocks
            .outbox
            .expect_enqueue()
            .times(1)
            .returning(|_| Err(DonationError::Internal("outbox unavailable".to_string())));

        let result = mocks
            .into_service()
            .register_at(
                RegisterRequest {
                    beneficiary_id: b.id,
                    program_id,
                },
                now,
            )
            .await
            .unwrap();

        assert_eq!(result.expires_at, scheduled_at + Duration::minutes(120));
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(qr::decode_token(&result.qr_token).unwrap(), result.application_id);
    }
}
