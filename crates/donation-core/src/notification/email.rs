//! Email 邮件通知渠道
//!
//! 配置了中继端点时通过 HTTP 调用邮件服务，否则只记录日志（本地开发）。

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use super::channel::{DeliveryReceipt, NotificationChannel};
use crate::error::{DonationError, Result};
use crate::models::NotificationTask;

/// Email 渠道配置
#[derive(Debug, Clone)]
pub struct EmailChannelConfig {
    /// 邮件中继 HTTP 端点
    pub endpoint: Option<String>,
    pub from_address: String,
    pub timeout: Duration,
}

impl Default for EmailChannelConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            from_address: "noreply@donation-hub.org".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Serialize)]
struct RelayRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
    metadata: &'a serde_json::Value,
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct RelayResponse {
    #[serde(default)]
    message_id: Option<String>,
}

/// Email 邮件通知渠道
pub struct EmailChannel {
    config: EmailChannelConfig,
    client: reqwest::Client,
}

impl EmailChannel {
    pub fn new(config: EmailChannelConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| DonationError::Internal(format!("创建 HTTP 客户端失败: {}", e)))?;
        Ok(Self { config, client })
    }

    /// 通过中继投递
    async fn relay(&self, endpoint: &str, task: &NotificationTask) -> Result<DeliveryReceipt> {
        let request = RelayRequest {
            from: &self.config.from_address,
            to: &task.recipient,
            subject: &task.subject,
            text: &task.body,
            metadata: &task.payload,
        };

        let response = self
            .client
            .post(endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| DonationError::Internal(format!("邮件中继请求失败: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DonationError::Internal(format!(
                "邮件中继返回错误状态: {}",
                status
            )));
        }

        let body: RelayResponse = response.json().await.unwrap_or(RelayResponse {
            message_id: None,
        });
        let message_id = body
            .message_id
            .unwrap_or_else(|| format!("email_{}", task.id));

        Ok(DeliveryReceipt { message_id })
    }
}

#[async_trait]
impl NotificationChannel for EmailChannel {
    fn name(&self) -> &str {
        "Email"
    }

    async fn send(&self, task: &NotificationTask) -> Result<DeliveryReceipt> {
        if task.recipient.trim().is_empty() || !task.recipient.contains('@') {
            return Err(DonationError::Validation(format!(
                "收件人邮箱地址无效: {}",
                task.recipient
            )));
        }

        let receipt = match &self.config.endpoint {
            Some(endpoint) => self.relay(endpoint, task).await?,
            None => {
                debug!(
                    task_id = %task.id,
                    from = %self.config.from_address,
                    to = %task.recipient,
                    subject = %task.subject,
                    "未配置邮件中继，仅记录邮件内容"
                );
                DeliveryReceipt {
                    message_id: format!("email_{}", Uuid::new_v4()),
                }
            }
        };

        info!(
            task_id = %task.id,
            message_id = %receipt.message_id,
            "Email 发送成功"
        );
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NotificationKind;
    use chrono::Utc;

    fn task(recipient: &str) -> NotificationTask {
        NotificationTask::pending(
            recipient,
            NotificationKind::RegistrationConfirmed,
            "主题",
            "正文",
            serde_json::json!({}),
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_log_only_delivery() {
        let channel = EmailChannel::new(EmailChannelConfig::default()).unwrap();
        let receipt = channel.send(&task("a@example.org")).await.unwrap();
        assert!(receipt.message_id.starts_with("email_"));
    }

    #[tokio::test]
    async fn test_invalid_recipient() {
        let channel = EmailChannel::new(EmailChannelConfig::default()).unwrap();
        let result = channel.send(&task("not-an-email")).await;
        assert!(matches!(result, Err(DonationError::Validation(_))));
    }
}
