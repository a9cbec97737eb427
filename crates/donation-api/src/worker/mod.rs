//! 后台 Worker
//!
//! 轮询间隔配置为 0 时由 main 跳过启动

pub mod expire_worker;
pub mod notification_worker;

pub use expire_worker::ExpireWorker;
pub use notification_worker::NotificationWorker;
