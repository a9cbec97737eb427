//! 服务层
//!
//! 实现报名生命周期、审核与捐赠登记的业务逻辑，只依赖仓储接口。
//!
//! ## 模块结构
//!
//! - `dto`: 数据传输对象定义
//! - `registration_service`: 报名、报名查询与取消
//! - `checkin_service`: 扫码核销
//! - `expiry_service`: 过期扫描
//! - `program_service`: 活动管理与统计
//! - `profile_service` / `review_service`: 资料注册与审核
//! - `donation_service`: 捐赠登记
//! - `dashboard_service`: 管理后台汇总

pub mod dto;

mod checkin_service;
mod dashboard_service;
mod donation_service;
mod expiry_service;
mod profile_service;
mod program_service;
mod registration_service;
mod review_service;

pub use checkin_service::CheckInService;
pub use dashboard_service::DashboardService;
pub use donation_service::{DonationService, MAX_AMOUNT_CENTS};
pub use expiry_service::ExpiryService;
pub use profile_service::ProfileService;
pub use program_service::{MAX_CAPACITY, MAX_TITLE_LEN, ProgramService};
pub use registration_service::RegistrationService;
pub use review_service::ReviewService;
