//! 应用状态定义
//!
//! 启动时按存储后端装配一次仓储与服务，通过 Arc 在 handler 与后台 Worker 间共享

use std::sync::Arc;

use donation_core::{
    ApplicationRepositoryTrait, CheckInService, DashboardService, DataUriQrEncoder,
    DonationRepositoryTrait, DonationService, ExpiryService, MemoryStore, NotificationOutboxTrait,
    PgApplicationRepository, PgDonationRepository, PgNotificationOutbox, PgProfileRepository,
    PgProgramRepository, ProfileRepositoryTrait, ProfileService, ProgramRepositoryTrait,
    ProgramService, QrEncoder, RegistrationService, ReviewService,
};
use donation_shared::config::LifecycleConfig;
use sqlx::PgPool;

/// 仓储集合
#[derive(Clone)]
pub struct Repositories {
    pub programs: Arc<dyn ProgramRepositoryTrait>,
    pub applications: Arc<dyn ApplicationRepositoryTrait>,
    pub profiles: Arc<dyn ProfileRepositoryTrait>,
    pub donations: Arc<dyn DonationRepositoryTrait>,
    pub outbox: Arc<dyn NotificationOutboxTrait>,
}

impl Repositories {
    /// PostgreSQL 仓储
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            programs: Arc::new(PgProgramRepository::new(pool.clone())),
            applications: Arc::new(PgApplicationRepository::new(pool.clone())),
            profiles: Arc::new(PgProfileRepository::new(pool.clone())),
            donations: Arc::new(PgDonationRepository::new(pool.clone())),
            outbox: Arc::new(PgNotificationOutbox::new(pool)),
        }
    }

    /// 进程内仓储，所有接口共用同一份存储
    pub fn memory(store: Arc<MemoryStore>) -> Self {
        Self {
            programs: store.clone(),
            applications: store.clone(),
            profiles: store.clone(),
            donations: store.clone(),
            outbox: store,
        }
    }
}

/// Axum 应用共享状态
#[derive(Clone)]
pub struct AppState {
    pub registration: Arc<RegistrationService>,
    pub checkin: Arc<CheckInService>,
    pub expiry: Arc<ExpiryService>,
    pub programs: Arc<ProgramService>,
    pub profiles: Arc<ProfileService>,
    pub reviews: Arc<ReviewService>,
    pub donations: Arc<DonationService>,
    pub dashboard: Arc<DashboardService>,
}

impl AppState {
    /// 创建新的应用状态
    pub fn new(repos: &Repositories, lifecycle: &LifecycleConfig) -> Self {
        let qr_encoder: Arc<dyn QrEncoder> = Arc::new(DataUriQrEncoder);
        let grace = chrono::Duration::minutes(lifecycle.expiry_grace_minutes);

        Self {
            registration: Arc::new(RegistrationService::new(
                repos.programs.clone(),
                repos.applications.clone(),
                repos.profiles.clone(),
                repos.outbox.clone(),
                qr_encoder,
                grace,
            )),
            checkin: Arc::new(CheckInService::new(repos.applications.clone())),
            expiry: Arc::new(ExpiryService::new(
                repos.applications.clone(),
                lifecycle.sweep_batch_size,
            )),
            programs: Arc::new(ProgramService::new(
                repos.programs.clone(),
                repos.applications.clone(),
            )),
            profiles: Arc::new(ProfileService::new(repos.profiles.clone())),
            reviews: Arc::new(ReviewService::new(repos.profiles.clone())),
            donations: Arc::new(DonationService::new(
                repos.profiles.clone(),
                repos.donations.clone(),
            )),
            dashboard: Arc::new(DashboardService::new(
                repos.profiles.clone(),
                repos.programs.clone(),
                repos.applications.clone(),
                repos.donations.clone(),
            )),
        }
    }

    /// 基于内存存储的状态，用于本地演示和测试
    pub fn in_memory(lifecycle: &LifecycleConfig) -> (Self, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let state = Self::new(&Repositories::memory(store.clone()), lifecycle);
        (state, store)
    }
}
