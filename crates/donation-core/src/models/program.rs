//! 活动实体定义

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::ProgramStatus;

/// 活动
///
/// 不变量：current_participants <= max_participants，已确认和已核销的报名占用名额
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Program {
    pub id: Uuid,
    pub title: String,
    #[sqlx(default)]
    pub description: Option<String>,
    #[sqlx(default)]
    pub location: Option<String>,
    pub scheduled_at: DateTime<Utc>,
    pub max_participants: i32,
    pub current_participants: i32,
    pub status: ProgramStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Program {
    pub fn is_full(&self) -> bool {
        self.current_participants >= self.max_participants
    }

    pub fn remaining_seats(&self) -> i32 {
        (self.max_participants - self.current_participants).max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn program(max: i32, current: i32) -> Program {
        let now = Utc::now();
        Program {
            id: Uuid::new_v4(),
            title: "周末蔬菜发放".to_string(),
            description: None,
            location: None,
            scheduled_at: now,
            max_participants: max,
            current_participants: current,
            status: ProgramStatus::Published,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_capacity_helpers() {
        assert!(!program(2, 1).is_full());
        assert!(program(2, 2).is_full());
        assert_eq!(program(5, 3).remaining_seats(), 2);
        assert_eq!(program(1, 1).remaining_seats(), 0);
    }
}
