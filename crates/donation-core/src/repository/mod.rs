//! 数据仓储层
//!
//! 提供所有实体的数据访问接口，封装 SQL 操作细节。
//!
//! ## 设计原则
//!
//! - 仓储只负责数据持久化，不包含业务逻辑
//! - 状态变更一律是条件写入，前驱状态由 `lifecycle` 模块给出
//! - 名额变更与对应的报名写入在同一事务内完成
//! - 定义 trait 接口以支持内存实现和 mock 测试

mod application_repo;
mod donation_repo;
mod memory;
mod outbox_repo;
mod profile_repo;
mod program_repo;
mod traits;

pub use application_repo::PgApplicationRepository;
pub use donation_repo::PgDonationRepository;
pub use memory::MemoryStore;
pub use outbox_repo::PgNotificationOutbox;
pub use profile_repo::PgProfileRepository;
pub use program_repo::PgProgramRepository;
pub use traits::*;
