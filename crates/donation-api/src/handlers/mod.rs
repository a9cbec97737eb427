//! HTTP 请求处理器

pub mod application;
pub mod dashboard;
pub mod donation;
pub mod profile;
pub mod program;
