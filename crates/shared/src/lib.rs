//! 共享库
//!
//! 包含 API 服务与领域核心共用的配置、错误处理、数据库连接、重试策略和可观测性等基础设施代码。

pub mod config;
pub mod database;
pub mod error;
pub mod observability;
pub mod retry;
pub mod test_utils;
