//! 内存存储
//!
//! 实现全部仓储接口，适用于本地开发、演示和测试。
//! 所有状态保存在同一把锁下，状态转换和名额变更在一次加锁内完成，
//! 与 PostgreSQL 实现的条件更新语义一致。

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use uuid::Uuid;

use super::traits::{
    ApplicationRepositoryTrait, DonationRepositoryTrait, NotificationOutboxTrait,
    ProfileRepositoryTrait, ProgramRepositoryTrait, ReviewedProfile, SeatOutcome,
};
use crate::error::{DonationError, Result};
use crate::lifecycle::{self, Transition, TransitionOutcome};
use crate::models::{
    Account, AccountStatus, ApplicationStatus, Donation, DonationKind, NotificationStatus,
    NotificationTask, Profile, ProfileKind, Program, ProgramApplication, ProgramStatus,
    ReviewStatus,
};

#[derive(Debug, Default)]
struct MemoryState {
    accounts: HashMap<Uuid, Account>,
    profiles: HashMap<Uuid, Profile>,
    programs: HashMap<Uuid, Program>,
    applications: HashMap<Uuid, ProgramApplication>,
    donations: HashMap<Uuid, Donation>,
    notifications: HashMap<Uuid, NotificationTask>,
}

impl MemoryState {
    fn release_seats(&mut self, program_id: Uuid, count: i32, now: DateTime<Utc>) {
        if let Some(program) = self.programs.get_mut(&program_id) {
            program.current_participants = (program.current_participants - count).max(0);
            program.updated_at = now;
        }
    }
}

/// 内存存储
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn paginate<T>(items: Vec<T>, limit: i64, offset: i64) -> Vec<T> {
    items
        .into_iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect()
}

fn tally<K: Eq + std::hash::Hash + Copy>(keys: impl Iterator<Item = K>) -> Vec<(K, i64)> {
    let mut counts: HashMap<K, i64> = HashMap::new();
    for key in keys {
        *counts.entry(key).or_default() += 1;
    }
    counts.into_iter().collect()
}

// ==================== 活动 ====================

#[async_trait]
impl ProgramRepositoryTrait for MemoryStore {
    async fn create(&self, program: &Program) -> Result<()> {
        let mut state = self.state.lock();
        if state.programs.contains_key(&program.id) {
            return Err(DonationError::Conflict(format!("活动已存在: {}", program.id)));
        }
        state.programs.insert(program.id, program.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Program>> {
        Ok(self.state.lock().programs.get(&id).cloned())
    }

    async fn list(
        &self,
        status: Option<ProgramStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Program>> {
        let state = self.state.lock();
        let mut programs: Vec<Program> = state
            .programs
            .values()
            .filter(|p| status.is_none_or(|s| p.status == s))
            .cloned()
            .collect();
        programs.sort_by(|a, b| b.scheduled_at.cmp(&a.scheduled_at).then(a.id.cmp(&b.id)));
        Ok(paginate(programs, limit, offset))
    }

    async fn count(&self, status: Option<ProgramStatus>) -> Result<i64> {
        let state = self.state.lock();
        Ok(state
            .programs
            .values()
            .filter(|p| status.is_none_or(|s| p.status == s))
            .count() as i64)
    }

    async fn update_status(
        &self,
        id: Uuid,
        target: ProgramStatus,
        now: DateTime<Utc>,
    ) -> Result<Option<Program>> {
        let mut state = self.state.lock();
        let Some(program) = state.programs.get_mut(&id) else {
            return Ok(None);
        };
        if !lifecycle::can_transition_program(program.status, target) {
            return Ok(None);
        }
        program.status = target;
        program.updated_at = now;
        Ok(Some(program.clone()))
    }

    async fn count_by_status(&self) -> Result<Vec<(ProgramStatus, i64)>> {
        let state = self.state.lock();
        Ok(tally(state.programs.values().map(|p| p.status)))
    }
}

// ==================== 报名 ====================

#[async_trait]
impl ApplicationRepositoryTrait for MemoryStore {
    async fn insert_with_seat(&self, application: &ProgramApplication) -> Result<SeatOutcome> {
        let mut state = self.state.lock();

        let Some(program) = state.programs.get(&application.program_id) else {
            return Ok(SeatOutcome::ProgramMissing);
        };
        if program.status != ProgramStatus::Published {
            return Ok(SeatOutcome::ProgramNotOpen(program.status));
        }
        if program.is_full() {
            return Ok(SeatOutcome::CapacityExceeded);
        }

        let duplicate = state.applications.values().any(|a| {
            a.program_id == application.program_id
                && a.beneficiary_id == application.beneficiary_id
                && a.status != ApplicationStatus::Cancelled
        });
        if duplicate {
            return Ok(SeatOutcome::Duplicate);
        }
        if state
            .applications
            .values()
            .any(|a| a.qr_token == application.qr_token)
        {
            return Err(DonationError::Internal("二维码令牌冲突".to_string()));
        }

        if let Some(program) = state.programs.get_mut(&application.program_id) {
            program.current_participants += 1;
            program.updated_at = application.created_at;
        }
        state
            .applications
            .insert(application.id, application.clone());

        Ok(SeatOutcome::Reserved)
    }

    async fn get(&self, id: Uuid) -> Result<Option<ProgramApplication>> {
        Ok(self.state.lock().applications.get(&id).cloned())
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<ProgramApplication>> {
        let state = self.state.lock();
        Ok(state
            .applications
            .values()
            .find(|a| a.qr_token == token)
            .cloned())
    }

    async fn find_active(
        &self,
        program_id: Uuid,
        beneficiary_id: Uuid,
    ) -> Result<Option<ProgramApplication>> {
        let state = self.state.lock();
        Ok(state
            .applications
            .values()
            .find(|a| {
                a.program_id == program_id
                    && a.beneficiary_id == beneficiary_id
                    && a.status != ApplicationStatus::Cancelled
            })
            .cloned())
    }

    async fn list_by_program(&self, program_id: Uuid) -> Result<Vec<ProgramApplication>> {
        let state = self.state.lock();
        let mut applications: Vec<ProgramApplication> = state
            .applications
            .values()
            .filter(|a| a.program_id == program_id)
            .cloned()
            .collect();
        applications.sort_by_key(|a| a.created_at);
        Ok(applications)
    }

    async fn list_by_beneficiary(&self, beneficiary_id: Uuid) -> Result<Vec<ProgramApplication>> {
        let state = self.state.lock();
        let mut applications: Vec<ProgramApplication> = state
            .applications
            .values()
            .filter(|a| a.beneficiary_id == beneficiary_id)
            .cloned()
            .collect();
        applications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(applications)
    }

    async fn transition(
        &self,
        id: Uuid,
        transition: Transition,
        now: DateTime<Utc>,
    ) -> Result<TransitionOutcome<ProgramApplication>> {
        let mut state = self.state.lock();

        let Some(application) = state.applications.get_mut(&id) else {
            return Ok(TransitionOutcome::Missing);
        };
        if !transition.allows(application.status) {
            return Ok(TransitionOutcome::Rejected(application.status));
        }

        application.status = transition.target;
        application.updated_at = now;
        if transition.target == ApplicationStatus::CheckedIn {
            application.checked_in_at = Some(now);
        }
        let updated = application.clone();

        if transition.release_seat {
            state.release_seats(updated.program_id, 1, now);
        }

        Ok(TransitionOutcome::Applied(updated))
    }

    async fn expire_overdue(&self, now: DateTime<Utc>, limit: i64) -> Result<u64> {
        let mut state = self.state.lock();
        let transition = Transition::to(ApplicationStatus::Expired);

        let mut due: Vec<(DateTime<Utc>, Uuid)> = state
            .applications
            .values()
            .filter(|a| transition.allows(a.status) && a.is_overdue(now))
            .map(|a| (a.expires_at, a.id))
            .collect();
        due.sort();
        due.truncate(limit.max(0) as usize);

        let mut released: HashMap<Uuid, i32> = HashMap::new();
        for (_, id) in &due {
            if let Some(application) = state.applications.get_mut(id) {
                application.status = ApplicationStatus::Expired;
                application.updated_at = now;
                *released.entry(application.program_id).or_default() += 1;
            }
        }
        for (program_id, count) in released {
            state.release_seats(program_id, count, now);
        }

        Ok(due.len() as u64)
    }

    async fn cancel_for_program(&self, program_id: Uuid, now: DateTime<Utc>) -> Result<u64> {
        let mut state = self.state.lock();
        let transition = Transition::to(ApplicationStatus::Cancelled);

        let mut cancelled = 0;
        for application in state.applications.values_mut() {
            if application.program_id == program_id && transition.allows(application.status) {
                application.status = ApplicationStatus::Cancelled;
                application.updated_at = now;
                cancelled += 1;
            }
        }
        if cancelled > 0 {
            state.release_seats(program_id, cancelled, now);
        }

        Ok(cancelled as u64)
    }

    async fn count_by_status(
        &self,
        program_id: Option<Uuid>,
    ) -> Result<Vec<(ApplicationStatus, i64)>> {
        let state = self.state.lock();
        Ok(tally(
            state
                .applications
                .values()
                .filter(|a| program_id.is_none_or(|id| a.program_id == id))
                .map(|a| a.status),
        ))
    }
}

// ==================== 资料 ====================

#[async_trait]
impl ProfileRepositoryTrait for MemoryStore {
    async fn create_with_account(&self, account: &Account, profile: &Profile) -> Result<()> {
        let mut state = self.state.lock();
        let email_taken = state
            .accounts
            .values()
            .any(|a| a.email.eq_ignore_ascii_case(&account.email));
        if email_taken {
            return Err(DonationError::Conflict(format!(
                "邮箱已被注册: {}",
                account.email
            )));
        }
        state.accounts.insert(account.id, account.clone());
        state.profiles.insert(profile.id, profile.clone());
        Ok(())
    }

    async fn get(&self, kind: ProfileKind, id: Uuid) -> Result<Option<Profile>> {
        let state = self.state.lock();
        Ok(state.profiles.get(&id).filter(|p| p.kind == kind).cloned())
    }

    async fn get_account(&self, account_id: Uuid) -> Result<Option<Account>> {
        Ok(self.state.lock().accounts.get(&account_id).cloned())
    }

    async fn list(
        &self,
        kind: ProfileKind,
        review_status: Option<ReviewStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Profile>> {
        let state = self.state.lock();
        let mut profiles: Vec<Profile> = state
            .profiles
            .values()
            .filter(|p| p.kind == kind && review_status.is_none_or(|s| p.review_status == s))
            .cloned()
            .collect();
        profiles.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(paginate(profiles, limit, offset))
    }

    async fn count(&self, kind: ProfileKind, review_status: Option<ReviewStatus>) -> Result<i64> {
        let state = self.state.lock();
        Ok(state
            .profiles
            .values()
            .filter(|p| p.kind == kind && review_status.is_none_or(|s| p.review_status == s))
            .count() as i64)
    }

    async fn apply_review(
        &self,
        kind: ProfileKind,
        id: Uuid,
        approved: bool,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Option<ReviewedProfile>> {
        let mut state = self.state.lock();

        let account_id = match state.profiles.get(&id) {
            Some(p) if p.kind == kind => p.account_id,
            _ => return Ok(None),
        };
        let Some(account) = state.accounts.get_mut(&account_id) else {
            return Err(DonationError::Internal(format!(
                "资料 {} 关联的账号不存在",
                id
            )));
        };
        account.status = AccountStatus::from_decision(approved);
        account.updated_at = now;
        let account = account.clone();

        let Some(profile) = state.profiles.get_mut(&id) else {
            return Ok(None);
        };
        profile.review_status = ReviewStatus::from_decision(approved);
        profile.review_reason = reason;
        profile.reviewed_at = Some(now);
        profile.updated_at = now;

        Ok(Some(ReviewedProfile {
            profile: profile.clone(),
            account,
        }))
    }

    async fn count_by_review_status(
        &self,
        kind: ProfileKind,
    ) -> Result<Vec<(ReviewStatus, i64)>> {
        let state = self.state.lock();
        Ok(tally(
            state
                .profiles
                .values()
                .filter(|p| p.kind == kind)
                .map(|p| p.review_status),
        ))
    }
}

// ==================== 捐赠 ====================

#[async_trait]
impl DonationRepositoryTrait for MemoryStore {
    async fn create(&self, donation: &Donation) -> Result<()> {
        self.state
            .lock()
            .donations
            .insert(donation.id, donation.clone());
        Ok(())
    }

    async fn list_by_donor(&self, donor_id: Uuid) -> Result<Vec<Donation>> {
        let state = self.state.lock();
        let mut donations: Vec<Donation> = state
            .donations
            .values()
            .filter(|d| d.donor_id == donor_id)
            .cloned()
            .collect();
        donations.sort_by(|a, b| b.received_at.cmp(&a.received_at));
        Ok(donations)
    }

    async fn monetary_totals(&self) -> Result<Vec<(String, i64)>> {
        let state = self.state.lock();
        let mut totals: HashMap<String, i64> = HashMap::new();
        for donation in state.donations.values() {
            if donation.kind == DonationKind::Monetary
                && let Some(currency) = &donation.currency
            {
                let total = totals.entry(currency.clone()).or_default();
                *total = total
                    .checked_add(donation.amount_cents.unwrap_or(0))
                    .ok_or_else(|| {
                        DonationError::Internal(format!("{} 捐赠总额超出 i64 范围", currency))
                    })?;
            }
        }
        let mut totals: Vec<(String, i64)> = totals.into_iter().collect();
        totals.sort();
        Ok(totals)
    }

    async fn count_by_kind(&self, kind: DonationKind) -> Result<i64> {
        let state = self.state.lock();
        Ok(state.donations.values().filter(|d| d.kind == kind).count() as i64)
    }
}

// ==================== 通知发件箱 ====================

#[async_trait]
impl NotificationOutboxTrait for MemoryStore {
    async fn enqueue(&self, task: &NotificationTask) -> Result<()> {
        self.state
            .lock()
            .notifications
            .insert(task.id, task.clone());
        Ok(())
    }

    async fn claim_due(
        &self,
        now: DateTime<Utc>,
        limit: i64,
        lease_until: DateTime<Utc>,
    ) -> Result<Vec<NotificationTask>> {
        let mut state = self.state.lock();

        let mut due: Vec<(DateTime<Utc>, Uuid)> = state
            .notifications
            .values()
            .filter(|t| t.status == NotificationStatus::Pending && t.next_attempt_at <= now)
            .map(|t| (t.next_attempt_at, t.id))
            .collect();
        due.sort();
        due.truncate(limit.max(0) as usize);

        let mut claimed = Vec::with_capacity(due.len());
        for (_, id) in due {
            if let Some(task) = state.notifications.get_mut(&id) {
                task.attempts += 1;
                task.next_attempt_at = lease_until;
                task.updated_at = now;
                claimed.push(task.clone());
            }
        }
        Ok(claimed)
    }

    async fn mark_sent(&self, id: Uuid, now: DateTime<Utc>) -> Result<()> {
        if let Some(task) = self.state.lock().notifications.get_mut(&id) {
            task.status = NotificationStatus::Sent;
            task.last_error = None;
            task.updated_at = now;
        }
        Ok(())
    }

    async fn mark_retry(
        &self,
        id: Uuid,
        error: String,
        next_attempt_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        if let Some(task) = self.state.lock().notifications.get_mut(&id)
            && task.status == NotificationStatus::Pending
        {
            task.last_error = Some(error);
            task.next_attempt_at = next_attempt_at;
            task.updated_at = now;
        }
        Ok(())
    }

    async fn mark_failed(&self, id: Uuid, error: String, now: DateTime<Utc>) -> Result<()> {
        if let Some(task) = self.state.lock().notifications.get_mut(&id) {
            task.status = NotificationStatus::Failed;
            task.last_error = Some(error);
            task.updated_at = now;
        }
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<NotificationTask>> {
        Ok(self.state.lock().notifications.get(&id).cloned())
    }
}
