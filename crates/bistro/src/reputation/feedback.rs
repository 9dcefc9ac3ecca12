use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use super::domain::{
    AccountId, AccountRecord, Dispute, FeedbackDecision, FeedbackId, FeedbackItem,
    FeedbackStatus, FeedbackSubmission, FeedbackTargetKind, WarningEntry, WarningReason,
};
use super::evaluation::StatusEvaluator;
use super::locks::AccountLocks;
use super::repository::{AccountRepository, FeedbackRepository};
use super::service::{
    issue_warnings, require_account, settle_standing, Missing, ReputationError,
};

const VIP_FEEDBACK_WEIGHT: u32 = 2;
const STANDARD_FEEDBACK_WEIGHT: u32 = 1;
const DISMISSAL_PENALTY: u32 = 1;

static FEEDBACK_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_feedback_id() -> (FeedbackId, u64) {
    let sequence = FEEDBACK_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    (FeedbackId(format!("fb-{sequence:06}")), sequence)
}

/// Orchestrates filing, disputes, and manager decisions on complaints and compliments.
pub struct FeedbackResolutionService<S> {
    store: Arc<S>,
    evaluator: Arc<StatusEvaluator>,
    locks: Arc<AccountLocks>,
}

impl<S> FeedbackResolutionService<S>
where
    S: AccountRepository + FeedbackRepository + 'static,
{
    pub fn new(store: Arc<S>, evaluator: Arc<StatusEvaluator>, locks: Arc<AccountLocks>) -> Self {
        Self {
            store,
            evaluator,
            locks,
        }
    }

    /// File a complaint or compliment; the weight reflects the filer's tier right now.
    ///
    /// The filer must be in good standing and may not target itself. The submitted kind must
    /// match the target account's role.
    pub fn file_feedback(
        &self,
        submission: FeedbackSubmission,
    ) -> Result<FeedbackItem, ReputationError> {
        if submission.filer_id == submission.target_id {
            return Err(ReputationError::SelfFeedback);
        }

        let filer = require_account(&*self.store, &submission.filer_id)?;
        if filer.blacklisted {
            return Err(ReputationError::AccountBlacklisted(filer.id));
        }
        if filer.closed {
            return Err(ReputationError::AccountClosed(filer.id));
        }

        let target = require_account(&*self.store, &submission.target_id)?;
        if FeedbackTargetKind::from(target.role) != submission.target_kind {
            return Err(ReputationError::TargetKindMismatch {
                submitted: submission.target_kind,
                actual: target.role,
            });
        }

        let weight = if filer.is_vip() {
            VIP_FEEDBACK_WEIGHT
        } else {
            STANDARD_FEEDBACK_WEIGHT
        };
        let (id, sequence) = next_feedback_id();

        let item = FeedbackItem {
            id,
            sequence,
            filer_id: submission.filer_id,
            target_kind: submission.target_kind,
            target_id: submission.target_id,
            is_compliment: submission.is_compliment,
            weight,
            message: submission.message,
            status: FeedbackStatus::Pending,
            filed_at: Utc::now(),
            resolved_at: None,
            cancelled_with: None,
            dispute: None,
            decision_note: None,
        };

        let stored = self.store.insert_feedback(item)?;
        info!(
            feedback = %stored.id,
            filer = %stored.filer_id,
            target = %stored.target_id,
            weight = stored.weight,
            compliment = stored.is_compliment,
            "feedback filed"
        );
        Ok(stored)
    }

    /// Record the target's rebuttal of a pending complaint for the manager to weigh.
    pub fn dispute_feedback(
        &self,
        feedback_id: &FeedbackId,
        disputed_by: &AccountId,
        reason: String,
    ) -> Result<FeedbackItem, ReputationError> {
        let snapshot = self.require_feedback(feedback_id)?;
        let scope = self.locks.scope([&snapshot.filer_id, &snapshot.target_id]);
        let _held = scope.enter();

        let mut item = self.require_feedback(feedback_id)?;
        if !item.is_pending() {
            return Err(ReputationError::AlreadyResolved(item.id));
        }
        if item.is_compliment || &item.target_id != disputed_by || item.dispute.is_some() {
            return Err(ReputationError::NotDisputable(item.id));
        }

        item.dispute = Some(Dispute {
            disputed_by: disputed_by.clone(),
            reason,
            disputed_at: Utc::now(),
        });
        self.store.update_feedback(item.clone())?;
        info!(feedback = %item.id, disputed_by = %disputed_by, "complaint disputed");
        Ok(item)
    }

    /// Apply a manager decision to a pending item.
    pub fn resolve_feedback(
        &self,
        feedback_id: &FeedbackId,
        decision: FeedbackDecision,
    ) -> Result<FeedbackItem, ReputationError> {
        self.resolve_feedback_with_note(feedback_id, decision, None)
    }

    /// Apply a manager decision, keeping `note` on the item and on any warning it issues.
    ///
    /// Filer and target are locked together for the whole decision, including any
    /// cancellation it triggers.
    pub fn resolve_feedback_with_note(
        &self,
        feedback_id: &FeedbackId,
        decision: FeedbackDecision,
        note: Option<String>,
    ) -> Result<FeedbackItem, ReputationError> {
        let snapshot = self.require_feedback(feedback_id)?;
        let scope = self.locks.scope([&snapshot.filer_id, &snapshot.target_id]);
        let _held = scope.enter();

        let mut item = self.require_feedback(feedback_id)?;
        if !item.is_pending() {
            warn!(
                feedback = %item.id,
                status = item.status.label(),
                "duplicate resolution ignored"
            );
            return Err(ReputationError::AlreadyResolved(item.id));
        }

        item.decision_note = note;
        match (decision, item.is_compliment) {
            (FeedbackDecision::Accept, false) => self.accept_complaint(item)?,
            (FeedbackDecision::Accept, true) => self.accept_compliment(item)?,
            (FeedbackDecision::Dismiss, false) => self.dismiss_complaint(item)?,
            (FeedbackDecision::Dismiss, true) => return Err(ReputationError::UnsupportedDecision),
        }

        self.require_feedback(feedback_id)
    }

    /// Manager queue, oldest filing first.
    pub fn pending_feedback(&self, limit: usize) -> Result<Vec<FeedbackItem>, ReputationError> {
        Ok(self.store.pending_feedback(limit)?)
    }

    pub fn feedback(&self, feedback_id: &FeedbackId) -> Result<FeedbackItem, ReputationError> {
        self.require_feedback(feedback_id)
    }

    fn accept_complaint(&self, mut item: FeedbackItem) -> Result<(), ReputationError> {
        let mut target = require_account(&*self.store, &item.target_id)?;
        let entry = WarningEntry::new(&target, WarningReason::ComplaintUpheld, item.weight)
            .with_feedback(&item);
        issue_warnings(&*self.store, &mut target, entry)?;

        item.status = FeedbackStatus::Accepted;
        item.resolved_at = Some(Utc::now());
        self.store.update_feedback(item.clone())?;
        info!(
            feedback = %item.id,
            target = %target.id,
            warnings = target.warnings,
            "complaint upheld"
        );

        self.cancel_oldest_pair(&mut target)?;
        settle_standing(&*self.store, &self.evaluator, target)?;
        Ok(())
    }

    fn accept_compliment(&self, mut item: FeedbackItem) -> Result<(), ReputationError> {
        item.status = FeedbackStatus::Accepted;
        item.resolved_at = Some(Utc::now());
        self.store.update_feedback(item.clone())?;
        info!(feedback = %item.id, target = %item.target_id, "compliment accepted");

        let mut target = require_account(&*self.store, &item.target_id)?;
        if self.cancel_oldest_pair(&mut target)? {
            settle_standing(&*self.store, &self.evaluator, target)?;
        }
        Ok(())
    }

    fn dismiss_complaint(&self, mut item: FeedbackItem) -> Result<(), ReputationError> {
        let mut filer = require_account(&*self.store, &item.filer_id)?;
        let entry = WarningEntry::new(&filer, WarningReason::ComplaintDismissed, DISMISSAL_PENALTY)
            .with_feedback(&item);
        issue_warnings(&*self.store, &mut filer, entry)?;

        item.status = FeedbackStatus::Dismissed;
        item.resolved_at = Some(Utc::now());
        self.store.update_feedback(item.clone())?;
        warn!(
            feedback = %item.id,
            filer = %filer.id,
            warnings = filer.warnings,
            "complaint dismissed, filer warned"
        );

        settle_standing(&*self.store, &self.evaluator, filer)?;
        Ok(())
    }

    /// Cancel the oldest accepted complaint against the oldest accepted compliment for `target`.
    ///
    /// At most one pair per call. The caller persists `target` after evaluating it.
    fn cancel_oldest_pair(&self, target: &mut AccountRecord) -> Result<bool, ReputationError> {
        let ledger = self.store.feedback_for_target(&target.id)?;
        let Some((mut complaint, mut compliment)) = oldest_accepted_pair(&ledger) else {
            return Ok(false);
        };

        let now = Utc::now();
        complaint.status = FeedbackStatus::Cancelled;
        complaint.cancelled_with = Some(compliment.id.clone());
        complaint.resolved_at = Some(now);
        compliment.status = FeedbackStatus::Cancelled;
        compliment.cancelled_with = Some(complaint.id.clone());
        compliment.resolved_at = Some(now);

        self.store.update_feedback(complaint.clone())?;
        self.store.update_feedback(compliment.clone())?;
        target.warnings = target.warnings.saturating_sub(1);

        info!(
            target = %target.id,
            complaint = %complaint.id,
            compliment = %compliment.id,
            warnings = target.warnings,
            "compliment cancelled complaint"
        );
        Ok(true)
    }

    fn require_feedback(&self, feedback_id: &FeedbackId) -> Result<FeedbackItem, ReputationError> {
        self.store
            .fetch_feedback(feedback_id)?
            .ok_or_else(|| ReputationError::NotFound(Missing::Feedback(feedback_id.clone())))
    }
}

/// Oldest accepted complaint and oldest accepted compliment, by filing sequence.
pub(crate) fn oldest_accepted_pair(items: &[FeedbackItem]) -> Option<(FeedbackItem, FeedbackItem)> {
    let oldest = |want_compliment: bool| {
        items
            .iter()
            .filter(|item| {
                item.status == FeedbackStatus::Accepted && item.is_compliment == want_compliment
            })
            .min_by_key(|item| item.sequence)
            .cloned()
    };

    Some((oldest(false)?, oldest(true)?))
}
