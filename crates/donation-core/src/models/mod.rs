//! 领域模型
//!
//! 包含账号与资料、活动、报名、捐赠、通知任务等实体

mod account;
mod application;
mod donation;
mod enums;
mod notification;
mod program;

pub use account::{Account, Profile};
pub use application::ProgramApplication;
pub use donation::Donation;
pub use enums::*;
pub use notification::NotificationTask;
pub use program::Program;
