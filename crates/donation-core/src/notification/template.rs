//! 通知内容模板

use chrono::{DateTime, Utc};
use serde_json::json;

use crate::models::{NotificationKind, NotificationTask, Program, ProgramApplication};
use crate::qr::QrPayload;

/// 报名成功通知，正文附带二维码内容
pub fn registration_confirmed(
    recipient: &str,
    full_name: &str,
    program: &Program,
    application: &ProgramApplication,
    qr: &QrPayload,
    now: DateTime<Utc>,
) -> NotificationTask {
    let subject = format!("报名成功：{}", program.title);
    let body = format!(
        "{}，您好！\n\n您已成功报名「{}」。\n活动时间：{}\n活动地点：{}\n\n\
         请在 {} 前凭二维码到场核销。",
        full_name,
        program.title,
        program.scheduled_at.format("%Y-%m-%d %H:%M UTC"),
        program.location.as_deref().unwrap_or("待定"),
        application.expires_at.format("%Y-%m-%d %H:%M UTC"),
    );
    let payload = json!({
        "applicationId": application.id,
        "programId": program.id,
        "expiresAt": application.expires_at,
        "qr": qr,
    });

    NotificationTask::pending(
        recipient,
        NotificationKind::RegistrationConfirmed,
        subject,
        body,
        payload,
        now,
    )
}
