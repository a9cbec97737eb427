//! 捐赠平台领域核心
//!
//! 提供受助人活动报名、二维码核销、过期处理、捐赠人/受助人审核以及捐赠登记等业务能力。
//!
//! ## 核心功能
//!
//! - **活动报名**：校验受助人资格与活动名额，签发二维码令牌
//! - **扫码核销**：按令牌核销报名，防止重复核销，过期自动失效
//! - **过期扫描**：批量将逾期未核销的报名置为过期并释放名额
//! - **审核流程**：捐赠人/受助人资料审核，同步账号状态
//! - **捐赠登记**：现金与农产品捐赠入账
//! - **通知发件箱**：报名确认通知先落库，再由后台投递
//!
//! ## 模块结构
//!
//! - `models`: 领域模型定义
//! - `lifecycle`: 报名与活动状态机，所有状态变更都经由这里
//! - `error`: 错误类型定义
//! - `repository`: 仓储接口与 PostgreSQL / 内存实现
//! - `service`: 业务服务层
//! - `notification`: 通知渠道与发件箱投递
//! - `qr`: 二维码令牌签发与编码

pub mod error;
pub mod lifecycle;
pub mod models;
pub mod notification;
pub mod qr;
pub mod repository;
pub mod service;

pub use error::{DonationError, Result};
pub use models::*;
pub use notification::{
    DispatchReport, EmailChannel, EmailChannelConfig, NotificationChannel, OutboxDispatcher,
};
pub use qr::{DataUriQrEncoder, QrEncoder, QrPayload};
pub use repository::{
    ApplicationRepositoryTrait, DonationRepositoryTrait, MemoryStore, NotificationOutboxTrait,
    PgApplicationRepository, PgDonationRepository, PgNotificationOutbox, PgProfileRepository,
    PgProgramRepository, ProfileRepositoryTrait, ProgramRepositoryTrait, ReviewedProfile,
    SeatOutcome,
};
pub use service::{
    CheckInService, DashboardService, DonationService, ExpiryService, ProfileService,
    ProgramService, RegistrationService, ReviewService, dto,
};
