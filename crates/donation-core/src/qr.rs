//! 二维码令牌签发与编码
//!
//! 令牌格式：base64url(报名 ID 16 字节 ‖ 随机数 16 字节 ‖ SHA-256(ID ‖ 随机数) 前 4 字节)，
//! 不含填充。校验和用于在查库前拒绝被篡改或截断的令牌。

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::{DonationError, Result};

const ID_LEN: usize = 16;
const NONCE_LEN: usize = 16;
const CHECKSUM_LEN: usize = 4;
const RAW_LEN: usize = ID_LEN + NONCE_LEN + CHECKSUM_LEN;

/// 编码后的令牌长度（36 字节 base64url 无填充）
pub const TOKEN_LEN: usize = RAW_LEN / 3 * 4;

fn checksum(id: &[u8], nonce: &[u8]) -> [u8; CHECKSUM_LEN] {
    let mut hasher = Sha256::new();
    hasher.update(id);
    hasher.update(nonce);
    let digest = hasher.finalize();
    let mut out = [0u8; CHECKSUM_LEN];
    out.copy_from_slice(&digest[..CHECKSUM_LEN]);
    out
}

/// 为报名签发新令牌
///
/// 随机数保证同一报名多次签发得到不同令牌
pub fn issue_token(application_id: Uuid) -> String {
    let mut nonce = [0u8; NONCE_LEN];
    rand::rng().fill_bytes(&mut nonce);

    let id = application_id.as_bytes();
    let mut raw = Vec::with_capacity(RAW_LEN);
    raw.extend_from_slice(id);
    raw.extend_from_slice(&nonce);
    raw.extend_from_slice(&checksum(id, &nonce));

    URL_SAFE_NO_PAD.encode(raw)
}

/// 解析令牌中的报名 ID
///
/// 格式错误或校验和不匹配返回 `Validation`，调用方仍需按令牌查库确认令牌存在
pub fn decode_token(token: &str) -> Result<Uuid> {
    let token = token.trim();
    if token.len() != TOKEN_LEN {
        return Err(DonationError::Validation("二维码令牌格式错误".to_string()));
    }

    let raw = URL_SAFE_NO_PAD
        .decode(token)
        .map_err(|_| DonationError::Validation("二维码令牌格式错误".to_string()))?;
    if raw.len() != RAW_LEN {
        return Err(DonationError::Validation("二维码令牌格式错误".to_string()));
    }

    let (id, rest) = raw.split_at(ID_LEN);
    let (nonce, sum) = rest.split_at(NONCE_LEN);
    if checksum(id, nonce) != sum {
        return Err(DonationError::Validation("二维码令牌校验失败".to_string()));
    }

    Uuid::from_slice(id).map_err(|e| DonationError::Validation(e.to_string()))
}

/// 可供客户端渲染的二维码内容
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrPayload {
    /// 扫码得到的原始内容
    pub content: String,
    pub media_type: String,
    pub data_uri: String,
}

/// 二维码编码器
pub trait QrEncoder: Send + Sync {
    fn encode(&self, token: &str) -> Result<QrPayload>;
}

/// 返回 data URI 的编码器，由 Web 客户端绘制二维码图像
#[derive(Debug, Clone, Default)]
pub struct DataUriQrEncoder;

impl QrEncoder for DataUriQrEncoder {
    fn encode(&self, token: &str) -> Result<QrPayload> {
        if token.is_empty() {
            return Err(DonationError::Validation("二维码内容不能为空".to_string()));
        }
        let media_type = "text/plain";
        Ok(QrPayload {
            content: token.to_string(),
            media_type: media_type.to_string(),
            data_uri: format!("data:{};base64,{}", media_type, STANDARD.encode(token)),
        })
    }
}
