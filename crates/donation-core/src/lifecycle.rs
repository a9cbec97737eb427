//! 报名与活动状态机
//!
//! 所有 `ProgramApplication.status` 和 `Program.status` 的变更都由本模块给出合法前驱状态，
//! 仓储层据此执行条件更新（`WHERE status = ANY(前驱状态)`），保证并发下只有一个写者成功。
//!
//! ```text
//! PENDING ──► CONFIRMED ──► CHECKED_IN
//!    │            │
//!    └────────────┴──► EXPIRED / CANCELLED
//! ```

use crate::models::{ApplicationStatus, ProgramStatus};

/// 非终态集合
pub const NON_TERMINAL: &[ApplicationStatus] =
    &[ApplicationStatus::Pending, ApplicationStatus::Confirmed];

/// 返回允许转换到目标状态的前驱状态集合
///
/// 空集合表示目标状态不可通过转换到达（如 PENDING 只能在创建时设置）
pub fn predecessors(target: ApplicationStatus) -> &'static [ApplicationStatus] {
    match target {
        ApplicationStatus::Pending => &[],
        ApplicationStatus::Confirmed => &[ApplicationStatus::Pending],
        ApplicationStatus::CheckedIn => &[ApplicationStatus::Confirmed],
        ApplicationStatus::Expired | ApplicationStatus::Cancelled => NON_TERMINAL,
    }
}

/// 检查状态转换是否合法
pub fn can_transition(from: ApplicationStatus, to: ApplicationStatus) -> bool {
    predecessors(to).contains(&from)
}

/// 转换到目标状态时是否释放活动名额
///
/// 只有从非终态进入 EXPIRED / CANCELLED 才会释放，CHECKED_IN 继续占用名额
pub fn releases_seat(target: ApplicationStatus) -> bool {
    matches!(
        target,
        ApplicationStatus::Expired | ApplicationStatus::Cancelled
    )
}

/// 一次报名状态转换
///
/// 由服务层构造并交给仓储层执行，仓储层只做条件写入，不做业务判断
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub target: ApplicationStatus,
    pub from: &'static [ApplicationStatus],
    pub release_seat: bool,
}

impl Transition {
    pub fn to(target: ApplicationStatus) -> Self {
        Self {
            target,
            from: predecessors(target),
            release_seat: releases_seat(target),
        }
    }

    /// 条件更新绑定用的前驱状态字符串
    pub fn from_strs(&self) -> Vec<&'static str> {
        self.from.iter().map(|s| s.as_str()).collect()
    }

    pub fn allows(&self, current: ApplicationStatus) -> bool {
        self.from.contains(&current)
    }
}

/// 条件转换的执行结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome<T> {
    /// 本次写入生效
    Applied(T),
    /// 当前状态不在前驱集合中（已被其他写者推进），携带当前状态
    Rejected(ApplicationStatus),
    /// 记录不存在
    Missing,
}

// ==================== 活动状态 ====================

/// 活动状态的前驱集合
pub fn program_predecessors(target: ProgramStatus) -> &'static [ProgramStatus] {
    match target {
        ProgramStatus::Draft => &[],
        ProgramStatus::Published => &[ProgramStatus::Draft],
        ProgramStatus::Cancelled => &[ProgramStatus::Draft, ProgramStatus::Published],
    }
}

pub fn can_transition_program(from: ProgramStatus, to: ProgramStatus) -> bool {
    program_predecessors(to).contains(&from)
}

pub fn program_from_strs(target: ProgramStatus) -> Vec<&'static str> {
    program_predecessors(target)
        .iter()
        .map(|s| s.as_str())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ApplicationStatus::*;

    #[test]
    fn test_forward_path() {
        assert!(can_transition(Pending, Confirmed));
        assert!(can_transition(Confirmed, CheckedIn));
        assert!(!can_transition(Pending, CheckedIn));
        assert!(!can_transition(CheckedIn, Confirmed));
    }

    #[test]
    fn test_terminal_states_have_no_exit() {
        for from in [CheckedIn, Expired, Cancelled] {
            for to in ApplicationStatus::ALL {
                assert!(!can_transition(from, to), "{from} -> {to} 不应允许");
            }
        }
    }

    #[test]
    fn test_expire_and_cancel_from_any_non_terminal() {
        for from in [Pending, Confirmed] {
            assert!(can_transition(from, Expired));
            assert!(can_transition(from, Cancelled));
        }
    }

    #[test]
    fn test_seat_release() {
        assert!(Transition::to(Expired).release_seat);
        assert!(Transition::to(Cancelled).release_seat);
        assert!(!Transition::to(CheckedIn).release_seat);
        assert!(!Transition::to(Confirmed).release_seat);
    }

    #[test]
    fn test_transition_from_strs() {
        assert_eq!(Transition::to(CheckedIn).from_strs(), vec!["CONFIRMED"]);
        assert_eq!(
            Transition::to(Expired).from_strs(),
            vec!["PENDING", "CONFIRMED"]
        );
        assert!(Transition::to(Pending).from.is_empty());
    }

    #[test]
    fn test_program_transitions() {
        assert!(can_transition_program(ProgramStatus::Draft, ProgramStatus::Published));
        assert!(!can_transition_program(ProgramStatus::Published, ProgramStatus::Published));
        assert!(can_transition_program(ProgramStatus::Published, ProgramStatus::Cancelled));
        assert!(!can_transition_program(ProgramStatus::Cancelled, ProgramStatus::Published));
        assert!(!can_transition_program(ProgramStatus::Cancelled, ProgramStatus::Cancelled));
        assert_eq!(
            program_from_strs(ProgramStatus::Cancelled),
            vec!["DRAFT", "PUBLISHED"]
        );
    }
}
