//! 捐赠平台 REST API 服务
//!
//! 对外提供活动报名、扫码核销、资料审核、捐赠登记与管理后台汇总接口。
//!
//! ## 模块结构
//!
//! - `dto`: 请求和响应的数据传输对象
//! - `error`: HTTP 错误类型与领域错误映射
//! - `handlers`: HTTP 请求处理器
//! - `routes`: 路由配置
//! - `state`: 应用状态与仓储装配
//! - `worker`: 过期扫描与通知投递后台任务
//!
//! ## 技术栈
//!
//! - Web 框架：Axum
//! - 数据验证：validator
//! - 序列化：serde (camelCase)

pub mod dto;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;
pub mod worker;

pub use dto::{ApiResponse, PageResponse, PaginationParams};
pub use error::{ApiError, Result};
pub use state::{AppState, Repositories};
