//! 通知模块
//!
//! 业务流程只把通知写入发件箱，由 [`OutboxDispatcher`] 领取到期任务并经
//! [`NotificationChannel`] 投递。投递失败按指数退避重试，超过最大次数后标记为 FAILED。

mod channel;
mod dispatcher;
mod email;
mod template;

pub use channel::{DeliveryReceipt, NotificationChannel};
pub use dispatcher::{DispatchReport, OutboxDispatcher};
pub use email::{EmailChannel, EmailChannelConfig};
pub use template::registration_confirmed;

#[cfg(test)]
pub use channel::MockNotificationChannel;
